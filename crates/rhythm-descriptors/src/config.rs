//! Analyzer configuration.
//!
//! Every field has a compiled default, so an empty TOML document is a
//! valid configuration:
//!
//! ```toml
//! drums = true
//! windowing = "tumbling"
//!
//! [meter]
//! salience = [5, 1, 2, 1, 3, 1, 2, 1, 4, 1, 2, 1, 3, 1, 2, 1]
//! awareness = [5, 1, 4, 2]
//!
//! [weights]
//! evenness = [3.0, 2.0, 1.0]
//!
//! [instruments]
//! low = [35, 36, 41, 45, 47, 64]
//! mid = [37, 38, 39, 40]
//! high = [42, 44, 46]
//! ```

use serde::{Deserialize, Serialize};

use crate::analyzer::Windowing;
use crate::gm::InstrumentTable;
use crate::meter::Meter;
use crate::poly::BandWeights;
use crate::{Error, Result};

/// Settings shared by every descriptor computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorConfig {
    /// Compute band and cross-band descriptors; off for non-percussion input
    pub drums: bool,
    pub windowing: Windowing,
    pub meter: Meter,
    pub weights: BandWeights,
    pub instruments: InstrumentTable,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self {
            drums: true,
            windowing: Windowing::default(),
            meter: Meter::default(),
            weights: BandWeights::default(),
            instruments: InstrumentTable::default(),
        }
    }
}

impl DescriptorConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Build from an already-merged TOML table.
    pub fn from_toml_table(table: toml::Table) -> Result<Self> {
        let config: Self = toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        self.meter.validate()
    }
}
