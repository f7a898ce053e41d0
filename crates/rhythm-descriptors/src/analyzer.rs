//! Descriptor aggregation: pattern in, complete descriptor record out.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, trace};

use crate::config::DescriptorConfig;
use crate::descriptors::{Descriptor, Descriptors};
use crate::mono;
use crate::pattern::{OnsetRoll, OnsetStream, PatternList};
use crate::poly::{self, BandStreams};
use crate::{Error, Result};

/// How patterns longer than one metric window are cut into windows for
/// the window-restricted descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Windowing {
    /// Only a pattern exactly one window long gets values
    #[default]
    Exact,
    /// Consecutive non-overlapping windows; the length must be a multiple
    /// of the window
    Tumbling,
    /// Every window at stride 1, without wrapping
    Sliding,
}

impl Windowing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Tumbling => "tumbling",
            Self::Sliding => "sliding",
        }
    }

    /// Start steps of the windows of a pattern of `len` steps, or `None`
    /// when the length does not fit this windowing.
    pub fn window_starts(&self, len: usize, window: usize) -> Option<Vec<usize>> {
        if window == 0 || len < window {
            return None;
        }
        match self {
            Self::Exact => (len == window).then(|| vec![0]),
            Self::Tumbling => (len % window == 0).then(|| (0..len).step_by(window).collect()),
            Self::Sliding => Some((0..=len - window).collect()),
        }
    }
}

impl std::fmt::Display for Windowing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Windowing {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "exact" | "none" => Ok(Self::Exact),
            "tumbling" => Ok(Self::Tumbling),
            "sliding" => Ok(Self::Sliding),
            _ => Err(Error::Config(format!(
                "unknown windowing `{s}`, expected exact, tumbling or sliding"
            ))),
        }
    }
}

/// What the aggregator can compute for a given pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthState {
    /// No onset anywhere; every descriptor is not applicable
    Empty,
    /// Length does not fit the windowing; windowed descriptors are not applicable
    LengthInvalid,
    /// Exactly one window
    Exact,
    /// Several windows, windowed descriptors are averaged
    Multiple,
}

/// Computes descriptor records under one validated configuration.
///
/// Holds no mutable state, so one analyzer can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct RhythmAnalyzer {
    config: DescriptorConfig,
}

impl RhythmAnalyzer {
    pub fn new(config: DescriptorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DescriptorConfig {
        &self.config
    }

    fn window_len(&self) -> usize {
        self.config.meter.steps()
    }

    pub fn length_state(&self, roll: &OnsetRoll) -> LengthState {
        if roll.onset_step_count() == 0 {
            return LengthState::Empty;
        }
        match self
            .config
            .windowing
            .window_starts(roll.len(), self.window_len())
        {
            None => LengthState::LengthInvalid,
            Some(starts) if starts.len() == 1 => LengthState::Exact,
            Some(_) => LengthState::Multiple,
        }
    }

    /// Low, mid and high streams under the configured instrument table.
    pub fn band_streams(&self, roll: &OnsetRoll) -> BandStreams {
        roll.band_streams(&self.config.instruments)
    }

    pub fn describe_pattern_list(&self, pattern: &PatternList) -> Result<Descriptors> {
        self.describe_roll(&OnsetRoll::from_pattern_list(pattern)?)
    }

    pub fn describe_matrix<R: AsRef<[u8]>>(&self, matrix: &[R]) -> Result<Descriptors> {
        self.describe_roll(&OnsetRoll::from_matrix(matrix)?)
    }

    pub fn describe_roll(&self, roll: &OnsetRoll) -> Result<Descriptors> {
        let state = self.length_state(roll);
        let onset_steps = roll.onset_step_count();
        debug!(
            steps = roll.len(),
            onset_steps,
            ?state,
            drums = self.config.drums,
            "describing pattern"
        );

        let mut record = Descriptors::not_applicable();
        if state == LengthState::Empty {
            return Ok(record);
        }

        record.number_of_instruments = Some(poly::instrument_count(roll) as f64);
        record.step_density = Some(poly::step_density(roll));

        let step_stream = roll.step_stream();
        let bands = self.config.drums.then(|| self.band_streams(roll));

        match &bands {
            Some(bands) => {
                record.low_density = Some(bands.low.density() as f64);
                record.mid_density = Some(bands.mid.density() as f64);
                record.hi_density = Some(bands.high.density() as f64);
                record.polyphonic_density = Some(poly::poly_density(bands) as f64);
                record.lowness = Some(poly::bandness(&bands.low, onset_steps));
                record.midness = Some(poly::bandness(&bands.mid, onset_steps));
                record.hiness = Some(poly::bandness(&bands.high, onset_steps));
            }
            None => {
                record.polyphonic_density = Some(step_stream.density() as f64);
            }
        }

        let window = self.window_len();
        let Some(starts) = self.config.windowing.window_starts(roll.len(), window) else {
            return Ok(record);
        };

        let windows = starts
            .iter()
            .map(|&start| {
                let bands = bands.as_ref().map(|bands| bands.window(start, window));
                self.describe_window(&step_stream.window(start, window), bands.as_ref())
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(windows = windows.len(), "averaging windowed descriptors");

        for descriptor in Descriptor::ALL.into_iter().filter(Descriptor::is_windowed) {
            let values: Option<Vec<f64>> = windows.iter().map(|w| w.get(descriptor)).collect();
            if let Some(values) = values.filter(|values| !values.is_empty()) {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                record.set(descriptor, Some(mean));
            }
        }

        Ok(record)
    }

    /// Window-restricted descriptors of one window.
    fn describe_window(
        &self,
        stream: &OnsetStream,
        bands: Option<&BandStreams>,
    ) -> Result<Descriptors> {
        let meter = &self.config.meter;
        let mut record = Descriptors::not_applicable();

        record.syncopation = Some(mono::syncopation(stream, meter)? as f64);
        record.syness = Some(mono::syness(stream, meter)?);
        record.balance = Some(mono::balance(stream, meter)?);
        record.evenness = Some(mono::evenness(stream, meter)?);

        if let Some(bands) = bands {
            let weights = &self.config.weights;
            record.low_sync = Some(mono::syncopation(&bands.low, meter)? as f64);
            record.mid_sync = Some(mono::syncopation(&bands.mid, meter)? as f64);
            record.hi_sync = Some(mono::syncopation(&bands.high, meter)? as f64);
            record.low_syness = Some(mono::syness(&bands.low, meter)?);
            record.mid_syness = Some(mono::syness(&bands.mid, meter)?);
            record.hi_syness = Some(mono::syness(&bands.high, meter)?);
            record.polyphonic_balance = Some(poly::poly_balance(bands, meter, weights)?);
            record.polyphonic_evenness = Some(poly::poly_evenness(bands, meter, weights)?);
            record.polyphonic_syncopation = Some(poly::poly_syncopation(bands, meter)? as f64);
        }

        trace!(stream = %stream, syncopation = ?record.syncopation, "window");
        Ok(record)
    }
}

/// Descriptors of a pattern list under the default configuration.
pub fn pattern_list_to_descriptors(pattern: &PatternList) -> Result<Descriptors> {
    RhythmAnalyzer::default().describe_pattern_list(pattern)
}

/// Descriptors of an onset roll under the default configuration.
pub fn roll_to_descriptors(roll: &OnsetRoll) -> Result<Descriptors> {
    RhythmAnalyzer::default().describe_roll(roll)
}
