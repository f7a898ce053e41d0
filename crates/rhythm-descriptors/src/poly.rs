//! Cross-band descriptors over aligned low/mid/high onset streams.

use serde::{Deserialize, Serialize};

use crate::gm::Band;
use crate::meter::Meter;
use crate::mono;
use crate::pattern::{OnsetRoll, OnsetStream};
use crate::{Error, Result};

/// Low, mid and high onset streams of one pattern, index-aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandStreams {
    pub low: OnsetStream,
    pub mid: OnsetStream,
    pub high: OnsetStream,
}

impl BandStreams {
    /// Bundle three streams, rejecting streams of different lengths.
    pub fn new(low: OnsetStream, mid: OnsetStream, high: OnsetStream) -> Result<Self> {
        if low.len() != mid.len() || mid.len() != high.len() {
            return Err(Error::MismatchedBands {
                low: low.len(),
                mid: mid.len(),
                high: high.len(),
            });
        }
        Ok(Self { low, mid, high })
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    pub fn get(&self, band: Band) -> &OnsetStream {
        match band {
            Band::Low => &self.low,
            Band::Mid => &self.mid,
            Band::High => &self.high,
        }
    }

    pub fn window(&self, start: usize, len: usize) -> BandStreams {
        BandStreams {
            low: self.low.window(start, len),
            mid: self.mid.window(start, len),
            high: self.high.window(start, len),
        }
    }

    /// The `(low, mid, high)` event at `step`.
    pub fn event(&self, step: usize) -> [bool; 3] {
        [
            self.low.is_onset(step),
            self.mid.is_onset(step),
            self.high.is_onset(step),
        ]
    }
}

/// Per-band weights of the polyphonic evenness and balance descriptors,
/// ordered low, mid, high.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandWeights {
    pub evenness: [f64; 3],
    /// Scale of each band's onset vectors in the balance sum
    pub balance_vector: [f64; 3],
    /// Scale of each band's onset count in the balance normalizer
    pub balance_mass: [f64; 3],
}

impl Default for BandWeights {
    fn default() -> Self {
        Self {
            evenness: [3.0, 2.0, 1.0],
            balance_vector: [3.0, 2.0, 2.0],
            balance_mass: [3.0, 2.0, 1.0],
        }
    }
}

/// Distinct instruments sounding anywhere in the roll, silence excluded.
pub fn instrument_count(roll: &OnsetRoll) -> usize {
    roll.instruments().count_ones() as usize
}

/// Fraction of steps carrying at least one onset; 0 for an empty roll.
pub fn step_density(roll: &OnsetRoll) -> f64 {
    if roll.is_empty() {
        return 0.0;
    }
    roll.onset_step_count() as f64 / roll.len() as f64
}

/// Share of onset-bearing steps that include this band's onsets.
pub fn bandness(band: &OnsetStream, onset_steps: usize) -> f64 {
    if onset_steps == 0 {
        return 0.0;
    }
    band.density() as f64 / onset_steps as f64
}

/// Sum of the three band densities. Steps sounding in two bands count twice.
pub fn poly_density(bands: &BandStreams) -> usize {
    bands.low.density() + bands.mid.density() + bands.high.density()
}

/// Weighted sum of the three band evenness values.
pub fn poly_evenness(bands: &BandStreams, meter: &Meter, weights: &BandWeights) -> Result<f64> {
    let mut total = 0.0;
    for (band, weight) in Band::ALL.iter().zip(weights.evenness) {
        total += weight * mono::evenness(bands.get(*band), meter)?;
    }
    Ok(total)
}

/// Balance over the onsets of all three bands, each band's vectors and
/// onset count scaled by its weights. 1 when the weighted count is 0.
pub fn poly_balance(bands: &BandStreams, meter: &Meter, weights: &BandWeights) -> Result<f64> {
    meter.check_len(bands.len())?;

    let mut mass = 0.0;
    let (mut x, mut y) = (0.0, 0.0);
    let step_angle = meter.step_angle();

    for (i, band) in Band::ALL.iter().enumerate() {
        let stream = bands.get(*band);
        mass += weights.balance_mass[i] * stream.density() as f64;
        for step in stream.onset_steps() {
            let angle = step as f64 * step_angle;
            x += weights.balance_vector[i] * angle.cos();
            y += weights.balance_vector[i] * angle.sin();
        }
    }

    if mass == 0.0 {
        return Ok(1.0);
    }
    Ok(1.0 - (x * x + y * y).sqrt() / mass)
}

/// Instrumental weight of an event followed by a different event.
///
/// Rules are tried in order and a later match overrides an earlier one.
/// Returns `None` when no rule applies.
fn instrumental_weight(event: [bool; 3], next: [bool; 3]) -> Option<i32> {
    let [low, mid, _] = event;
    let [next_low, next_mid, next_high] = next;
    let mut weight = None;

    // Rule 1: low against mid and high
    if low && next_mid && next_high {
        weight = Some(2);
    }

    // Rule 2: mid against low and high
    if mid && next_low && next_high {
        weight = Some(1);
    }

    // Rule 3: low or mid against high alone
    if (low || mid) && next == [false, false, true] {
        weight = Some(5);
    }

    // Rule 4: low alone against mid alone
    if event == [true, false, false] && next == [false, true, false] {
        weight = Some(2);
    }

    // Rule 5: mid alone against low alone
    if event == [false, true, false] && next == [true, false, false] {
        weight = Some(2);
    }

    weight
}

/// Instrumental-weighted polyphonic syncopation.
///
/// Every step whose (cyclic) successor carries a different event on an
/// equally strong or stronger position is a candidate. A candidate scores
/// the salience gap plus its instrumental weight; candidates no rule
/// matches score nothing.
pub fn poly_syncopation(bands: &BandStreams, meter: &Meter) -> Result<i32> {
    meter.check_len(bands.len())?;

    let salience = &meter.poly_salience;
    let n = bands.len();
    let mut total = 0;

    for step in 0..n {
        let next = (step + 1) % n;
        let (event, next_event) = (bands.event(step), bands.event(next));
        if event == next_event || salience[next] < salience[step] {
            continue;
        }
        if let Some(weight) = instrumental_weight(event, next_event) {
            total += (salience[step] - salience[next]).abs() + weight;
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gm::InstrumentTable;
    use crate::pattern::PatternList;

    const EPS: f64 = 1e-9;

    fn bands_of(steps: Vec<Vec<u8>>) -> BandStreams {
        let roll = OnsetRoll::from_pattern_list(&PatternList::from_steps(steps)).unwrap();
        roll.band_streams(&InstrumentTable::default())
    }

    fn scenario() -> Vec<Vec<u8>> {
        vec![
            vec![36, 38, 42],
            vec![],
            vec![],
            vec![38, 42],
            vec![46],
            vec![46],
            vec![36, 38, 42],
            vec![],
            vec![42],
            vec![38],
            vec![36, 42],
            vec![],
            vec![38, 46],
            vec![46],
            vec![42, 64],
            vec![],
        ]
    }

    #[test]
    fn scenario_cross_band_values() {
        let bands = bands_of(scenario());
        let meter = Meter::default();
        let weights = BandWeights::default();

        assert_eq!(poly_density(&bands), 19);
        assert_eq!(poly_syncopation(&bands, &meter).unwrap(), 9);
        assert!(
            (poly_evenness(&bands, &meter, &weights).unwrap() - 5.2753683906977775).abs() < EPS
        );
        assert!(
            (poly_balance(&bands, &meter, &weights).unwrap() - 0.9618538544571633).abs() < EPS
        );
    }

    #[test]
    fn later_rule_overrides_earlier() {
        // low alone then mid alone matches only rule 4
        assert_eq!(
            instrumental_weight([true, false, false], [false, true, false]),
            Some(2)
        );
        // low+mid then low+high matches only rule 2
        assert_eq!(
            instrumental_weight([true, true, false], [true, false, true]),
            Some(1)
        );
        // low+mid then mid+high+low: rule 1 then rule 2 both match, rule 2 wins
        assert_eq!(
            instrumental_weight([true, true, false], [true, true, true]),
            Some(1)
        );
        // high then low: no rule
        assert_eq!(
            instrumental_weight([false, false, true], [true, false, false]),
            None
        );
        assert_eq!(
            instrumental_weight([false, true, true], [false, false, true]),
            Some(5)
        );
    }

    #[test]
    fn unmatched_candidates_contribute_nothing() {
        // High hat alone on off-beats followed by rests on strong beats
        let mut steps = vec![vec![]; 16];
        steps[3] = vec![42];
        steps[7] = vec![42];
        let bands = bands_of(steps);
        assert_eq!(poly_syncopation(&bands, &Meter::default()).unwrap(), 0);
    }

    #[test]
    fn silent_bands_fallbacks() {
        let bands = bands_of(vec![vec![]; 16]);
        let meter = Meter::default();
        let weights = BandWeights::default();
        assert_eq!(poly_density(&bands), 0);
        assert_eq!(poly_syncopation(&bands, &meter).unwrap(), 0);
        assert_eq!(poly_evenness(&bands, &meter, &weights).unwrap(), 0.0);
        assert_eq!(poly_balance(&bands, &meter, &weights).unwrap(), 1.0);
    }

    #[test]
    fn mismatched_band_lengths_rejected() {
        let err = BandStreams::new(
            OnsetStream::from_bits(&[1, 0]),
            OnsetStream::from_bits(&[1, 0, 0]),
            OnsetStream::from_bits(&[1, 0]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::MismatchedBands {
                low: 2,
                mid: 3,
                high: 2
            }
        ));
    }

    #[test]
    fn wrong_window_length_rejected() {
        let bands = bands_of(vec![vec![36]; 8]);
        assert!(matches!(
            poly_syncopation(&bands, &Meter::default()),
            Err(Error::StreamLength {
                expected: 16,
                actual: 8
            })
        ));
    }

    #[test]
    fn short_poly_salience_rejected() {
        let meter = Meter {
            poly_salience: vec![0; 4],
            ..Meter::default()
        };
        let bands = bands_of(scenario());
        assert!(matches!(
            poly_syncopation(&bands, &meter),
            Err(Error::InvalidMeter(_))
        ));
        assert!(matches!(
            poly_balance(&bands, &meter, &BandWeights::default()),
            Err(Error::InvalidMeter(_))
        ));
    }

    #[test]
    fn instrument_and_step_density() {
        let roll = OnsetRoll::from_pattern_list(&PatternList::from_steps(scenario())).unwrap();
        assert_eq!(instrument_count(&roll), 5);
        assert!((step_density(&roll) - 0.6875).abs() < EPS);
        assert_eq!(step_density(&OnsetRoll::silent(0)), 0.0);
    }

    #[test]
    fn bandness_guards_zero_onsets() {
        let stream = OnsetStream::from_bits(&[1, 0, 1, 0]);
        assert_eq!(bandness(&stream, 0), 0.0);
        assert!((bandness(&stream, 4) - 0.5).abs() < EPS);
    }

    #[test]
    fn event_reads_all_three_bands() {
        let bands = bands_of(scenario());
        assert_eq!(bands.event(0), [true, true, true]);
        assert_eq!(bands.event(1), [false, false, false]);
        assert_eq!(bands.event(14), [true, false, true]);
        assert_eq!(bands.get(Band::High).density(), 10);
    }
}
