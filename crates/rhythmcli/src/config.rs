//! Config file discovery, layering and environment overlay.
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/rhythmcli/config.toml` (system)
//! 2. `~/.config/rhythmcli/config.toml` (user)
//! 3. `./rhythmcli.toml`, or the `--config` path when given
//! 4. Environment variables (`RHYTHMCLI_*`)
//!
//! Tables are merged key by key before the result is deserialized, so a
//! file only needs the settings it changes.

use anyhow::{bail, Context, Result};
use rhythm_descriptors::{DescriptorConfig, Windowing};
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files, optionally with a CLI override path.
///
/// An explicit path replaces the local `./rhythmcli.toml` and must exist.
pub fn discover_config_files(cli_path: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/rhythmcli/config.toml");
    if system.exists() {
        files.push(system);
    }

    // User config (XDG_CONFIG_HOME or ~/.config)
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("rhythmcli/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        files.push(path.to_path_buf());
        return Ok(files);
    }

    let local = PathBuf::from("rhythmcli.toml");
    if local.exists() {
        files.push(local);
    }

    Ok(files)
}

fn load_table(path: &Path) -> Result<toml::Table> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    contents
        .parse::<toml::Table>()
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Merge `overlay` into `base`; nested tables merge, everything else replaces.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Apply `RHYTHMCLI_*` overrides, reading variables through `lookup`.
pub fn apply_env_overrides<F>(
    config: &mut DescriptorConfig,
    sources: &mut ConfigSources,
    lookup: F,
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("RHYTHMCLI_WINDOWING") {
        config.windowing = v
            .parse::<Windowing>()
            .context("invalid RHYTHMCLI_WINDOWING")?;
        sources.env_overrides.push("RHYTHMCLI_WINDOWING".to_string());
    }
    if let Some(v) = lookup("RHYTHMCLI_DRUMS") {
        let Some(drums) = parse_bool(&v) else {
            bail!("invalid RHYTHMCLI_DRUMS `{v}`, expected true or false");
        };
        config.drums = drums;
        sources.env_overrides.push("RHYTHMCLI_DRUMS".to_string());
    }
    Ok(())
}

/// Load configuration from all sources and report where it came from.
pub fn load_with_sources(cli_path: Option<&Path>) -> Result<(DescriptorConfig, ConfigSources)> {
    let mut sources = ConfigSources::default();
    let mut table = toml::Table::new();

    for path in discover_config_files(cli_path)? {
        merge_tables(&mut table, load_table(&path)?);
        sources.files.push(path);
    }

    let mut config = DescriptorConfig::from_toml_table(table).with_context(|| {
        format!(
            "invalid configuration from {}",
            sources
                .files
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;

    apply_env_overrides(&mut config, &mut sources, |name| std::env::var(name).ok())?;
    config.validate()?;

    Ok((config, sources))
}
