//! Pattern encodings: step lists, onset rolls and binary onset streams.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::gm::{Band, InstrumentTable, NUM_KEYS, SILENCE_KEY};
use crate::poly::BandStreams;
use crate::{Error, Result};

/// A pattern as a list of time steps, each holding the keys that sound on it.
///
/// Keys within a step are unordered and deduplicated. An empty step is a rest.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternList {
    steps: Vec<BTreeSet<u8>>,
}

impl PatternList {
    pub fn new(steps: Vec<BTreeSet<u8>>) -> Self {
        Self { steps }
    }

    pub fn from_steps<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = u8>,
    {
        Self {
            steps: steps
                .into_iter()
                .map(|step| step.into_iter().collect())
                .collect(),
        }
    }

    pub fn steps(&self) -> &[BTreeSet<u8>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Binary time-by-instrument matrix with one `u128` bitmask per step.
///
/// Bit `k` of a row is set when key `k` sounds on that step. Key 0 is the
/// silence sentinel and is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnsetRoll {
    rows: Vec<u128>,
}

impl OnsetRoll {
    /// An all-silent roll of `steps` steps.
    pub fn silent(steps: usize) -> Self {
        Self {
            rows: vec![0; steps],
        }
    }

    pub fn from_pattern_list(pattern: &PatternList) -> Result<Self> {
        let mut roll = Self::silent(pattern.len());
        for (step, keys) in pattern.steps().iter().enumerate() {
            for &key in keys {
                roll.set(step, key)?;
            }
        }
        Ok(roll)
    }

    /// Build a roll from a dense `[steps][instruments]` matrix.
    ///
    /// Any non-zero cell is an onset, so velocity matrices are thresholded
    /// here. Rows must all have the same width; columns past 127 must be zero.
    pub fn from_matrix<R: AsRef<[u8]>>(matrix: &[R]) -> Result<Self> {
        let width = matrix.first().map(|row| row.as_ref().len()).unwrap_or(0);
        let mut roll = Self::silent(matrix.len());

        for (step, row) in matrix.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return Err(Error::RaggedMatrix {
                    row: step,
                    expected: width,
                    actual: row.len(),
                });
            }
            for (key, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let key = u8::try_from(key).map_err(|_| Error::KeyOutOfRange(key as u16))?;
                roll.set(step, key)?;
            }
        }

        Ok(roll)
    }

    /// Mark `key` as sounding on `step`. The silence key is ignored.
    pub fn set(&mut self, step: usize, key: u8) -> Result<()> {
        if key as usize >= NUM_KEYS {
            return Err(Error::KeyOutOfRange(key as u16));
        }
        let len = self.rows.len();
        let row = self
            .rows
            .get_mut(step)
            .ok_or(Error::StepOutOfRange { step, len })?;
        if key != SILENCE_KEY {
            *row |= 1u128 << key;
        }
        Ok(())
    }

    pub fn contains(&self, step: usize, key: u8) -> bool {
        (key as usize) < NUM_KEYS
            && self
                .rows
                .get(step)
                .is_some_and(|row| row & (1u128 << key) != 0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keys sounding on `step`, ascending.
    pub fn keys_at(&self, step: usize) -> Vec<u8> {
        let row = self.rows.get(step).copied().unwrap_or(0);
        (0..NUM_KEYS as u8)
            .filter(|&key| row & (1u128 << key) != 0)
            .collect()
    }

    pub fn to_pattern_list(&self) -> PatternList {
        PatternList::from_steps((0..self.len()).map(|step| self.keys_at(step)))
    }

    /// Dense `[steps][128]` 0/1 matrix.
    pub fn to_matrix(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|&row| {
                (0..NUM_KEYS)
                    .map(|key| ((row >> key) & 1) as u8)
                    .collect()
            })
            .collect()
    }

    /// Union of every key that sounds anywhere in the roll.
    pub fn instruments(&self) -> u128 {
        self.rows.iter().fold(0, |acc, row| acc | row)
    }

    /// Number of steps carrying at least one onset.
    pub fn onset_step_count(&self) -> usize {
        self.rows.iter().filter(|&&row| row != 0).count()
    }

    /// Whole-pattern stream: 1 wherever any instrument sounds.
    pub fn step_stream(&self) -> OnsetStream {
        self.rows.iter().map(|&row| row != 0).collect()
    }

    /// Stream of the steps where any instrument in `mask` sounds.
    pub fn masked_stream(&self, mask: u128) -> OnsetStream {
        self.rows.iter().map(|&row| row & mask != 0).collect()
    }

    /// Onset stream of one frequency band.
    pub fn band_stream(&self, table: &InstrumentTable, band: Band) -> OnsetStream {
        self.masked_stream(table.band_mask(band))
    }

    /// Low, mid and high streams derived together, index-aligned.
    pub fn band_streams(&self, table: &InstrumentTable) -> BandStreams {
        BandStreams {
            low: self.band_stream(table, Band::Low),
            mid: self.band_stream(table, Band::Mid),
            high: self.band_stream(table, Band::High),
        }
    }

    /// Sub-roll of `len` steps starting at `start`.
    pub fn window(&self, start: usize, len: usize) -> OnsetRoll {
        Self {
            rows: self.rows[start..start + len].to_vec(),
        }
    }

    /// Re-quantize the time axis from `from_resolution` to `to_resolution`
    /// steps per beat by nearest-neighbour sampling.
    ///
    /// Lossy when downsampling: onsets between sampled rows are dropped.
    pub fn resample(&self, from_resolution: u32, to_resolution: u32) -> Result<OnsetRoll> {
        if from_resolution == 0 {
            return Err(Error::InvalidResolution(from_resolution));
        }
        if to_resolution == 0 {
            return Err(Error::InvalidResolution(to_resolution));
        }
        if from_resolution == to_resolution || self.is_empty() {
            return Ok(self.clone());
        }

        let n_in = self.len();
        let factor = to_resolution as f64 / from_resolution as f64;
        let n_out = (n_in as f64 * factor).round() as usize;

        let rows = (0..n_out)
            .map(|out| {
                let source = if n_out > 1 {
                    (out as f64 * (n_in - 1) as f64 / (n_out - 1) as f64).round() as usize
                } else {
                    0
                };
                self.rows[source.min(n_in - 1)]
            })
            .collect();

        Ok(Self { rows })
    }
}

/// A binary onset sequence: `true` where the stream has an onset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OnsetStream(Vec<bool>);

impl OnsetStream {
    /// Build from 0/1 values; any non-zero value is an onset.
    pub fn from_bits(bits: &[u8]) -> Self {
        bits.iter().map(|&bit| bit != 0).collect()
    }

    pub fn to_bits(&self) -> Vec<u8> {
        self.0.iter().map(|&onset| onset as u8).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_onset(&self, step: usize) -> bool {
        self.0.get(step).copied().unwrap_or(false)
    }

    /// Number of onsets.
    pub fn density(&self) -> usize {
        self.0.iter().filter(|&&onset| onset).count()
    }

    /// Indices of the onset steps, ascending.
    pub fn onset_steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(step, &onset)| onset.then_some(step))
    }

    pub fn window(&self, start: usize, len: usize) -> OnsetStream {
        OnsetStream(self.0[start..start + len].to_vec())
    }

    /// Stream shifted `n` steps earlier, wrapping around.
    pub fn rotated_left(&self, n: usize) -> OnsetStream {
        let mut steps = self.0.clone();
        if !steps.is_empty() {
            let n = n % steps.len();
            steps.rotate_left(n);
        }
        OnsetStream(steps)
    }
}

impl From<Vec<bool>> for OnsetStream {
    fn from(steps: Vec<bool>) -> Self {
        Self(steps)
    }
}

impl FromIterator<bool> for OnsetStream {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for OnsetStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &onset in &self.0 {
            f.write_str(if onset { "x" } else { "." })?;
        }
        Ok(())
    }
}
