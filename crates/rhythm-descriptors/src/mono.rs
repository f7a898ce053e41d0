//! Descriptors of a single binary onset stream.
//!
//! Syncopation, evenness and balance are measured against a [`Meter`] and
//! require the stream to be exactly one metric window long.

use crate::meter::Meter;
use crate::pattern::OnsetStream;
use crate::Result;

/// Number of onsets in the stream.
pub fn density(stream: &OnsetStream) -> usize {
    stream.density()
}

/// Per-step syncopation: for every onset followed (cyclically) by a rest,
/// the salience of the rest minus the salience of the onset.
fn step_syncopation(stream: &OnsetStream, salience: &[i32]) -> Vec<i32> {
    let n = stream.len();
    (0..n)
        .map(|step| {
            let next = (step + 1) % n;
            if stream.is_onset(step) && !stream.is_onset(next) {
                salience[next] - salience[step]
            } else {
                0
            }
        })
        .collect()
}

/// Syncopation of a stream against the meter's salience profile.
///
/// Onsets on weak positions followed by silence on stronger ones pull the
/// value down, so syncopated patterns score negative.
pub fn syncopation(stream: &OnsetStream, meter: &Meter) -> Result<i32> {
    meter.check_len(stream.len())?;
    Ok(step_syncopation(stream, &meter.salience).iter().sum())
}

/// [`syncopation`] against the default 16-step profile.
pub fn syncopation16(stream: &OnsetStream) -> Result<i32> {
    syncopation(stream, &Meter::default())
}

/// Awareness-weighted syncopation.
///
/// The window is split into equal consecutive groups; each group's partial
/// syncopation is scaled by its awareness weight before summing.
pub fn syncopation_awareness(stream: &OnsetStream, meter: &Meter) -> Result<i32> {
    meter.check_len(stream.len())?;
    let per_step = step_syncopation(stream, &meter.salience);
    Ok(per_step
        .chunks(meter.awareness_group_len()?)
        .zip(&meter.awareness)
        .map(|(group, weight)| group.iter().sum::<i32>() * weight)
        .sum())
}

/// How close the onsets are to a regular polygon with as many vertices.
///
/// The ideal polygon is rotated so its first vertex sits on the first onset.
/// Each onset contributes the absolute cosine of its angular distance to the
/// matching vertex; the result is their mean, 1.0 for a perfectly even
/// pattern. A stream without onsets has evenness 0.
pub fn evenness(stream: &OnsetStream, meter: &Meter) -> Result<f64> {
    meter.check_len(stream.len())?;

    let onsets: Vec<usize> = stream.onset_steps().collect();
    let Some(&first) = onsets.first() else {
        return Ok(0.0);
    };

    let d = onsets.len() as f64;
    let step_angle = meter.step_angle();
    let first_angle = first as f64 * step_angle;
    let vertex_angle = 2.0 * std::f64::consts::PI / d;

    let cosines: f64 = onsets
        .iter()
        .enumerate()
        .map(|(i, &step)| {
            let vertex = i as f64 * vertex_angle;
            (vertex - step as f64 * step_angle + first_angle).cos().abs()
        })
        .sum();

    Ok(cosines / d)
}

/// Proximity of the onsets' centre of mass to the centre of the circle.
///
/// Each onset is a unit vector at its step angle; balance is
/// `1 - |sum| / onsets`. A stream without onsets has balance 1.
pub fn balance(stream: &OnsetStream, meter: &Meter) -> Result<f64> {
    meter.check_len(stream.len())?;

    let d = stream.density();
    if d == 0 {
        return Ok(1.0);
    }

    let step_angle = meter.step_angle();
    let (x, y) = stream.onset_steps().fold((0.0, 0.0), |(x, y), step| {
        let angle = step as f64 * step_angle;
        (x + angle.cos(), y + angle.sin())
    });

    Ok(1.0 - (x * x + y * y).sqrt() / d as f64)
}

/// Syncopation per onset, 0 for a stream without onsets.
pub fn syness(stream: &OnsetStream, meter: &Meter) -> Result<f64> {
    let sync = syncopation(stream, meter)?;
    let d = stream.density();
    if d == 0 {
        return Ok(0.0);
    }
    Ok(sync as f64 / d as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const EPS: f64 = 1e-9;

    fn patt_1() -> OnsetStream {
        OnsetStream::from_bits(&[1, 0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 1, 0, 0, 0])
    }

    fn patt_2() -> OnsetStream {
        OnsetStream::from_bits(&[1, 0, 0, 1, 1, 1, 1, 0, 1, 0, 1, 0, 1, 1, 1, 0])
    }

    fn silent() -> OnsetStream {
        OnsetStream::from_bits(&[0; 16])
    }

    #[test]
    fn syncopation_reference_values() {
        assert_eq!(syncopation16(&patt_1()).unwrap(), -4);
        assert_eq!(syncopation16(&patt_2()).unwrap(), -10);
    }

    #[test]
    fn awareness_reference_values() {
        let meter = Meter::default();
        assert_eq!(syncopation_awareness(&patt_1(), &meter).unwrap(), -11);
        assert_eq!(syncopation_awareness(&patt_2(), &meter).unwrap(), -39);
    }

    #[test]
    fn evenness_reference_values() {
        let meter = Meter::default();
        assert!((evenness(&patt_1(), &meter).unwrap() - 0.9816064222042191).abs() < EPS);
        assert!((evenness(&patt_2(), &meter).unwrap() - 0.971165288619607).abs() < EPS);
    }

    #[test]
    fn balance_reference_values() {
        let meter = Meter::default();
        assert!((balance(&patt_1(), &meter).unwrap() - 0.9297693395285831).abs() < EPS);
        assert!((balance(&patt_2(), &meter).unwrap() - 0.9609819355967744).abs() < EPS);
    }

    #[test]
    fn silent_stream_fallbacks() {
        let meter = Meter::default();
        assert_eq!(density(&silent()), 0);
        assert_eq!(syncopation(&silent(), &meter).unwrap(), 0);
        assert_eq!(syncopation_awareness(&silent(), &meter).unwrap(), 0);
        assert_eq!(evenness(&silent(), &meter).unwrap(), 0.0);
        assert_eq!(balance(&silent(), &meter).unwrap(), 1.0);
        assert_eq!(syness(&silent(), &meter).unwrap(), 0.0);
    }

    #[test]
    fn single_onset_is_perfectly_even() {
        let meter = Meter::default();
        for step in 0..16 {
            let mut bits = [0u8; 16];
            bits[step] = 1;
            let stream = OnsetStream::from_bits(&bits);
            assert_eq!(evenness(&stream, &meter).unwrap(), 1.0);
            assert_eq!(
                syness(&stream, &meter).unwrap(),
                syncopation(&stream, &meter).unwrap() as f64
            );
        }
    }

    #[test]
    fn four_on_the_floor_is_even_and_balanced() {
        let meter = Meter::default();
        let stream = OnsetStream::from_bits(&[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]);
        assert!((evenness(&stream, &meter).unwrap() - 1.0).abs() < EPS);
        assert!((balance(&stream, &meter).unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn syness_divides_by_density() {
        let meter = Meter::default();
        let stream = patt_2();
        assert!((syness(&stream, &meter).unwrap() - (-10.0 / 10.0)).abs() < EPS);
    }

    #[test]
    fn bounds_hold_for_every_single_and_double_onset_stream() {
        let meter = Meter::default();
        for a in 0..16 {
            for b in a..16 {
                let mut bits = [0u8; 16];
                bits[a] = 1;
                bits[b] = 1;
                let stream = OnsetStream::from_bits(&bits);
                let e = evenness(&stream, &meter).unwrap();
                let bal = balance(&stream, &meter).unwrap();
                assert!((0.0..=1.0 + EPS).contains(&e), "evenness {e} for {stream}");
                assert!((-EPS..=1.0 + EPS).contains(&bal), "balance {bal} for {stream}");
            }
        }
    }

    #[test]
    fn syncopation_depends_on_absolute_position() {
        let stream = patt_1();
        let rotated = stream.rotated_left(1);
        assert_ne!(
            syncopation16(&stream).unwrap(),
            syncopation16(&rotated).unwrap()
        );
    }

    #[test]
    fn syncopation_invariant_for_symmetric_rotation() {
        // Silence and full streams have no onset/rest pairs at any rotation
        let full = OnsetStream::from_bits(&[1; 16]);
        assert_eq!(syncopation16(&full.rotated_left(3)).unwrap(), 0);
        assert_eq!(syncopation16(&silent().rotated_left(3)).unwrap(), 0);
    }

    #[test]
    fn wrong_length_rejected() {
        let meter = Meter::default();
        let short = OnsetStream::from_bits(&[1, 0, 1, 0]);
        assert!(matches!(
            syncopation(&short, &meter),
            Err(Error::StreamLength {
                expected: 16,
                actual: 4
            })
        ));
        assert!(evenness(&short, &meter).is_err());
        assert!(balance(&short, &meter).is_err());
    }

    #[test]
    fn wraparound_pairs_last_step_with_first() {
        // Onset on the last step followed by a rest on the downbeat
        let mut bits = [0u8; 16];
        bits[15] = 1;
        let stream = OnsetStream::from_bits(&bits);
        assert_eq!(syncopation16(&stream).unwrap(), 5 - 1);
    }

    #[test]
    fn hand_built_meter_without_awareness_rejected() {
        let meter = Meter {
            awareness: vec![],
            ..Meter::default()
        };
        assert!(matches!(
            syncopation_awareness(&patt_1(), &meter),
            Err(Error::InvalidMeter(_))
        ));
        assert!(matches!(
            evenness(&patt_1(), &meter),
            Err(Error::InvalidMeter(_))
        ));
    }
}
