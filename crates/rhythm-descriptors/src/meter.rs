//! Metric salience profiles that anchor syncopation to beat positions.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Monophonic metric weights for one 4/4 bar of 16th notes (higher = stronger).
pub const LHL_16: [i32; 16] = [5, 1, 2, 1, 3, 1, 2, 1, 4, 1, 2, 1, 3, 1, 2, 1];

/// Witek's metric profile for one 4/4 bar of 16th notes (0 = downbeat).
pub const WITEK_16: [i32; 16] = [0, -3, -2, -3, -1, -3, -2, -3, -1, -3, -2, -3, -1, -3, -2, -3];

/// Perceptual weight of each beat quarter of the bar, first quarter strongest.
pub const AWARENESS_4: [i32; 4] = [5, 1, 4, 2];

/// A metric window: the salience profiles every 16-step-restricted
/// descriptor is measured against.
///
/// The window length is the profile length. Onsets are laid out on a circle
/// of that many points for evenness and balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meter {
    /// Salience used by monophonic syncopation
    pub salience: Vec<i32>,
    /// Salience used by polyphonic syncopation
    pub poly_salience: Vec<i32>,
    /// Weights for equal consecutive groups of steps (awareness syncopation)
    pub awareness: Vec<i32>,
}

impl Default for Meter {
    fn default() -> Self {
        Self {
            salience: LHL_16.to_vec(),
            poly_salience: WITEK_16.to_vec(),
            awareness: AWARENESS_4.to_vec(),
        }
    }
}

impl Meter {
    /// Number of steps in one metric window.
    pub fn steps(&self) -> usize {
        self.salience.len()
    }

    pub fn validate(&self) -> Result<()> {
        if self.salience.is_empty() {
            return Err(Error::InvalidMeter("salience profile is empty".into()));
        }
        if self.poly_salience.len() != self.salience.len() {
            return Err(Error::InvalidMeter(format!(
                "polyphonic profile has {} steps, monophonic has {}",
                self.poly_salience.len(),
                self.salience.len()
            )));
        }
        if self.awareness.is_empty() || self.steps() % self.awareness.len() != 0 {
            return Err(Error::InvalidMeter(format!(
                "{} awareness weights do not divide {} steps",
                self.awareness.len(),
                self.steps()
            )));
        }
        Ok(())
    }

    /// Fail unless the meter is valid and `len` equals the window length.
    pub fn check_len(&self, len: usize) -> Result<()> {
        self.validate()?;
        if len != self.steps() {
            return Err(Error::StreamLength {
                expected: self.steps(),
                actual: len,
            });
        }
        Ok(())
    }

    /// Angle between adjacent steps on the onset circle, in radians.
    pub fn step_angle(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.steps() as f64
    }

    /// Steps covered by each awareness weight.
    pub fn awareness_group_len(&self) -> Result<usize> {
        self.validate()?;
        Ok(self.steps() / self.awareness.len())
    }
}
