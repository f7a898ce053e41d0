//! Rhythmic descriptors for symbolic polyphonic drum patterns.
//!
//! A pattern is a sequence of time steps (usually 16th notes), each holding
//! the General MIDI percussion keys that sound on that step. The crate turns
//! a pattern into low/mid/high onset streams and derives density,
//! syncopation, evenness and balance descriptors from them.
//!
//! # Example
//!
//! ```
//! use rhythm_descriptors::{pattern_list_to_descriptors, Descriptor, PatternList};
//!
//! let pattern = PatternList::from_steps([
//!     vec![36, 42], vec![], vec![42], vec![],
//!     vec![38, 42], vec![], vec![42], vec![],
//!     vec![36, 42], vec![], vec![42], vec![],
//!     vec![38, 42], vec![], vec![42], vec![],
//! ]);
//!
//! let descriptors = pattern_list_to_descriptors(&pattern).unwrap();
//! assert_eq!(descriptors.get(Descriptor::LowDensity), Some(2.0));
//! assert_eq!(descriptors.get(Descriptor::StepDensity), Some(0.5));
//! ```

pub mod analyzer;
pub mod config;
pub mod descriptors;
pub mod gm;
pub mod meter;
pub mod mono;
pub mod pattern;
pub mod poly;

pub use analyzer::{
    pattern_list_to_descriptors, roll_to_descriptors, LengthState, RhythmAnalyzer, Windowing,
};
pub use config::DescriptorConfig;
pub use descriptors::{Descriptor, Descriptors};
pub use gm::{Band, InstrumentTable};
pub use meter::Meter;
pub use pattern::{OnsetRoll, OnsetStream, PatternList};
pub use poly::{BandStreams, BandWeights};

/// Errors from pattern conversion and descriptor computation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid band `{0}`, must be low, mid or hi")]
    InvalidBand(String),

    #[error("instrument key {0} is outside the 0-127 range")]
    KeyOutOfRange(u16),

    #[error("matrix row {row} has {actual} columns, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("step {step} is outside a pattern of {len} steps")]
    StepOutOfRange { step: usize, len: usize },

    #[error("stream has {actual} steps, the meter expects {expected}")]
    StreamLength { expected: usize, actual: usize },

    #[error("band streams differ in length (low {low}, mid {mid}, high {high})")]
    MismatchedBands { low: usize, mid: usize, high: usize },

    #[error("invalid meter: {0}")]
    InvalidMeter(String),

    #[error("invalid resolution {0}, must be at least 1 step per beat")]
    InvalidResolution(u32),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
