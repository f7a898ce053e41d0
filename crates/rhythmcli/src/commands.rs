//! Subcommand implementations. Results go to `out`; logs go to stderr.

use anyhow::{Context, Result};
use rhythm_descriptors::gm::{self, InstrumentTable};
use rhythm_descriptors::{
    Band, Descriptor, DescriptorConfig, Descriptors, OnsetRoll, RhythmAnalyzer,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

use crate::config::ConfigSources;
use crate::input::{self, LoadOptions};

/// One line of `describe` output.
#[derive(Debug, Serialize)]
pub struct PatternReport {
    pub source: String,
    pub name: String,
    pub descriptors: Descriptors,
}

pub fn describe<W: Write>(
    out: &mut W,
    config: DescriptorConfig,
    files: &[PathBuf],
    options: &LoadOptions,
    pretty: bool,
) -> Result<()> {
    let analyzer = RhythmAnalyzer::new(config)?;
    let mut reports = Vec::new();

    for path in files {
        for pattern in input::load_patterns(path, options)? {
            let descriptors = analyzer.describe_roll(&pattern.roll).with_context(|| {
                format!("failed to describe {} in {}", pattern.name, pattern.source)
            })?;
            let report = PatternReport {
                source: pattern.source,
                name: pattern.name,
                descriptors,
            };

            if pretty {
                reports.push(report);
            } else {
                writeln!(out, "{}", serde_json::to_string(&report)?)?;
            }
        }
    }

    if pretty {
        writeln!(out, "{}", serde_json::to_string_pretty(&reports)?)?;
    }

    info!(files = files.len(), "described patterns");
    Ok(())
}

fn join_codes(codes: &[u8]) -> String {
    codes
        .iter()
        .map(|code| code.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per onset step: keys with their GM names, three-band codes,
/// eight-voice kit codes and simplified-kit keys.
fn write_step_codes<W: Write>(
    out: &mut W,
    roll: &OnsetRoll,
    table: &InstrumentTable,
) -> Result<()> {
    for step in 0..roll.len() {
        let keys = roll.keys_at(step);
        if keys.is_empty() {
            continue;
        }
        let names = keys
            .iter()
            .map(|&key| format!("{key} {}", gm::name_of(key).unwrap_or("unknown")))
            .collect::<Vec<_>>()
            .join(", ");
        let simplified: Vec<u8> = keys.iter().map(|&key| gm::simplified_key(key)).collect();

        writeln!(
            out,
            "  {step:>3}  bands {:<6} voices {:<8} simplified {:<12} {names}",
            join_codes(&gm::three_band_codes(table, &keys)),
            join_codes(&gm::eight_voice_codes(&keys)),
            join_codes(&simplified),
        )?;
    }
    Ok(())
}

pub fn bands<W: Write>(
    out: &mut W,
    config: DescriptorConfig,
    files: &[PathBuf],
    options: &LoadOptions,
    codes: bool,
) -> Result<()> {
    let analyzer = RhythmAnalyzer::new(config)?;

    for path in files {
        for pattern in input::load_patterns(path, options)? {
            let streams = analyzer.band_streams(&pattern.roll);
            writeln!(out, "{} ({})", pattern.name, pattern.source)?;
            for band in Band::ALL {
                writeln!(out, "  {:<4} {}", band.as_str(), streams.get(band))?;
            }
            writeln!(out, "  {:<4} {}", "all", pattern.roll.step_stream())?;
            if codes {
                write_step_codes(out, &pattern.roll, &analyzer.config().instruments)?;
            }
        }
    }

    Ok(())
}

pub fn names<W: Write>(out: &mut W) -> Result<()> {
    for descriptor in Descriptor::ALL {
        writeln!(out, "{descriptor}")?;
    }
    Ok(())
}

pub fn show_config<W: Write>(
    out: &mut W,
    config: &DescriptorConfig,
    sources: &ConfigSources,
) -> Result<()> {
    writeln!(out, "# rhythmcli configuration")?;
    if sources.files.is_empty() {
        writeln!(out, "# no config files, compiled defaults")?;
    }
    for file in &sources.files {
        writeln!(out, "# loaded: {}", file.display())?;
    }
    for var in &sources.env_overrides {
        writeln!(out, "# env: {var}")?;
    }
    writeln!(out)?;
    write!(out, "{}", config.to_toml_string()?)?;
    Ok(())
}
