//! Pattern file loading, dispatched on file extension.

use anyhow::{bail, Context, Result};
use rhythm_descriptors::{OnsetRoll, PatternList};
use std::path::Path;
use tracing::debug;

use crate::library;
use crate::midi;

/// One pattern ready for analysis.
#[derive(Debug, Clone)]
pub struct LoadedPattern {
    pub source: String,
    pub name: String,
    pub roll: OnsetRoll,
}

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Steps per beat of JSON pattern lists
    pub resolution: u32,
    /// Steps each library pattern is forced to
    pub length: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            resolution: midi::STEPS_PER_BEAT,
            length: 16,
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load every pattern in a `.json`, `.txt`, `.mid` or `.midi` file.
pub fn load_patterns(path: &Path, options: &LoadOptions) -> Result<Vec<LoadedPattern>> {
    let source = path.display().to_string();
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    let patterns = match extension.as_str() {
        "json" => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {source}"))?;
            let pattern: PatternList = serde_json::from_str(&contents)
                .with_context(|| format!("{source} is not a JSON pattern list"))?;
            let roll = OnsetRoll::from_pattern_list(&pattern)
                .with_context(|| format!("invalid pattern in {source}"))?
                .resample(options.resolution, midi::STEPS_PER_BEAT)?;
            vec![LoadedPattern {
                source: source.clone(),
                name: file_stem(path),
                roll,
            }]
        }
        "txt" => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {source}"))?;
            library::parse_library(&contents, options.length)
                .with_context(|| format!("invalid pattern library {source}"))?
                .into_iter()
                .map(|entry| -> Result<LoadedPattern> {
                    Ok(LoadedPattern {
                        source: source.clone(),
                        roll: OnsetRoll::from_pattern_list(&entry.pattern)?,
                        name: entry.name,
                    })
                })
                .collect::<Result<Vec<_>>>()?
        }
        "mid" | "midi" => {
            let bytes = std::fs::read(path).with_context(|| format!("failed to read {source}"))?;
            let roll = midi::roll_from_bytes(&bytes).with_context(|| format!("in {source}"))?;
            vec![LoadedPattern {
                source: source.clone(),
                name: file_stem(path),
                roll,
            }]
        }
        _ => bail!("unsupported input {source}: expected .json, .txt, .mid or .midi"),
    };

    debug!(source = %source, patterns = patterns.len(), "loaded patterns");
    Ok(patterns)
}
