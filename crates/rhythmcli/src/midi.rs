//! Standard MIDI File loading into 16th-note onset rolls.

use anyhow::{bail, Context, Result};
use midly::{MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use rhythm_descriptors::OnsetRoll;
use tracing::debug;

/// Quantization grid of MIDI input: 16th notes.
pub const STEPS_PER_BEAT: u32 = 4;

const BAR_STEPS: usize = 16;

/// Note-on ticks and keys of a track, plus its end tick. `None` when the
/// track has no notes.
fn track_onsets(track: &[TrackEvent<'_>]) -> Option<(Vec<(u64, u8)>, u64)> {
    let mut tick: u64 = 0;
    let mut onsets = Vec::new();

    for event in track {
        tick += event.delta.as_int() as u64;
        if let TrackEventKind::Midi {
            message: MidiMessage::NoteOn { key, vel },
            ..
        } = event.kind
        {
            // vel=0 NoteOn is NoteOff
            if vel.as_int() > 0 {
                onsets.push((tick, key.as_int()));
            }
        }
    }

    (!onsets.is_empty()).then_some((onsets, tick))
}

/// Parse MIDI bytes into a binary onset roll at 4 steps per beat.
///
/// Only the first track with notes is read. The roll is padded to whole
/// bars; an onset that rounds past the last step lands on the last step.
/// A file without notes yields an empty roll.
pub fn roll_from_bytes(bytes: &[u8]) -> Result<OnsetRoll> {
    let smf = Smf::parse(bytes).context("failed to parse MIDI file")?;

    let ppq = match smf.header.timing {
        Timing::Metrical(ticks) => ticks.as_int(),
        Timing::Timecode(fps, subframes) => bail!(
            "SMPTE timecode timing ({} fps, {subframes} subframes) has no beat grid; \
             re-export the file with ticks per beat",
            fps.as_int()
        ),
    };
    if (ppq as u32) < STEPS_PER_BEAT {
        bail!("MIDI resolution of {ppq} ticks per beat is too coarse for 16th notes");
    }
    let ticks_per_step = ppq as f64 / STEPS_PER_BEAT as f64;

    let Some((onsets, end_tick)) = smf.tracks.iter().find_map(|track| track_onsets(track)) else {
        debug!("MIDI file has no notes");
        return Ok(OnsetRoll::silent(0));
    };

    let last_onset = onsets.iter().map(|&(tick, _)| tick).max().unwrap_or(0);
    let span = (end_tick.max(last_onset) as f64 / ticks_per_step).ceil() as usize;
    let steps = span.max(1).div_ceil(BAR_STEPS) * BAR_STEPS;

    let mut roll = OnsetRoll::silent(steps);
    for (tick, key) in onsets {
        let step = ((tick as f64 / ticks_per_step).round() as usize).min(steps - 1);
        roll.set(step, key)?;
    }

    debug!(ppq, steps, "quantized MIDI track");
    Ok(roll)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
        let mut bytes = vec![(value & 0x7F) as u8];
        value >>= 7;
        while value > 0 {
            bytes.push((value & 0x7F) as u8 | 0x80);
            value >>= 7;
        }
        bytes.reverse();
        buf.extend_from_slice(&bytes);
    }

    /// Track chunk from `(tick, event bytes)` pairs, ending at `end_tick`.
    fn track(mut events: Vec<(u32, Vec<u8>)>, end_tick: u32) -> Vec<u8> {
        events.sort_by_key(|(tick, _)| *tick);
        let mut data = Vec::new();
        let mut last = 0;
        for (tick, bytes) in events {
            write_vlq(&mut data, tick - last);
            data.extend_from_slice(&bytes);
            last = tick;
        }
        write_vlq(&mut data, end_tick - last);
        data.extend_from_slice(&[0xFF, 0x2F, 0x00]);
        data
    }

    fn smf(ppq: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"MThd");
        buf.extend_from_slice(&6u32.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
        buf.extend_from_slice(&ppq.to_be_bytes());
        for data in tracks {
            buf.extend_from_slice(b"MTrk");
            buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
            buf.extend_from_slice(data);
        }
        buf
    }

    fn hit(tick: u32, key: u8) -> Vec<(u32, Vec<u8>)> {
        vec![
            (tick, vec![0x99, key, 100]),
            (tick + 10, vec![0x89, key, 0]),
        ]
    }

    #[test]
    fn backbeat_quantizes_to_sixteenths() {
        let mut events = Vec::new();
        for (tick, key) in [(0, 36), (480, 38), (960, 36), (1440, 38)] {
            events.extend(hit(tick, key));
        }
        let bytes = smf(480, &[track(events, 1920)]);

        let roll = roll_from_bytes(&bytes).unwrap();
        assert_eq!(roll.len(), 16);
        assert_eq!(roll.keys_at(0), vec![36]);
        assert_eq!(roll.keys_at(4), vec![38]);
        assert_eq!(roll.keys_at(8), vec![36]);
        assert_eq!(roll.keys_at(12), vec![38]);
        assert_eq!(roll.onset_step_count(), 4);
    }

    #[test]
    fn off_grid_onsets_round_to_nearest_step() {
        let events = [hit(130, 42), hit(350, 42)].concat();
        let roll = roll_from_bytes(&smf(480, &[track(events, 1920)])).unwrap();
        assert!(roll.contains(1, 42));
        assert!(roll.contains(3, 42));
    }

    #[test]
    fn onset_past_the_end_moves_to_last_step() {
        let events = hit(1905, 42);
        let roll = roll_from_bytes(&smf(480, &[track(events, 1920)])).unwrap();
        assert_eq!(roll.len(), 16);
        assert!(roll.contains(15, 42));
    }

    #[test]
    fn partial_bar_is_padded() {
        let events = hit(0, 36);
        let roll = roll_from_bytes(&smf(96, &[track(events, 100)])).unwrap();
        assert_eq!(roll.len(), 16);

        let events = hit(0, 36);
        let roll = roll_from_bytes(&smf(96, &[track(events, 96 * 5)])).unwrap();
        assert_eq!(roll.len(), 32);
    }

    #[test]
    fn first_track_with_notes_is_used() {
        let tempo = track(vec![(0, vec![0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20])], 0);
        let drums = track(hit(480, 42), 1920);
        let later = track(hit(0, 36), 1920);
        let roll = roll_from_bytes(&smf(480, &[tempo, drums, later])).unwrap();
        assert_eq!(roll.keys_at(4), vec![42]);
        assert!(!roll.contains(0, 36));
    }

    #[test]
    fn file_without_notes_is_empty() {
        let tempo = track(vec![(0, vec![0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20])], 0);
        let roll = roll_from_bytes(&smf(480, &[tempo])).unwrap();
        assert!(roll.is_empty());
    }

    #[test]
    fn timecode_timing_is_rejected() {
        // Division 0xE728: -25 fps, 40 subframes per frame
        let bytes = smf(0xE728, &[track(hit(0, 36), 1000)]);
        let err = roll_from_bytes(&bytes).unwrap_err();
        assert!(err.to_string().contains("timecode"));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(roll_from_bytes(b"not a midi file").is_err());
    }
}
