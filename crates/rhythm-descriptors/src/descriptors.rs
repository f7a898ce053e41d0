//! The canonical descriptor record.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Error;

/// Name of one descriptor in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Descriptor {
    NumberOfInstruments,
    LowDensity,
    MidDensity,
    HiDensity,
    PolyphonicDensity,
    StepDensity,
    Lowness,
    Midness,
    Hiness,
    LowSync,
    MidSync,
    HiSync,
    Syncopation,
    LowSyness,
    MidSyness,
    HiSyness,
    Syness,
    Balance,
    PolyphonicBalance,
    Evenness,
    PolyphonicEvenness,
    PolyphonicSyncopation,
}

impl Descriptor {
    /// Every descriptor, in record order.
    pub const ALL: [Descriptor; 22] = [
        Self::NumberOfInstruments,
        Self::LowDensity,
        Self::MidDensity,
        Self::HiDensity,
        Self::PolyphonicDensity,
        Self::StepDensity,
        Self::Lowness,
        Self::Midness,
        Self::Hiness,
        Self::LowSync,
        Self::MidSync,
        Self::HiSync,
        Self::Syncopation,
        Self::LowSyness,
        Self::MidSyness,
        Self::HiSyness,
        Self::Syness,
        Self::Balance,
        Self::PolyphonicBalance,
        Self::Evenness,
        Self::PolyphonicEvenness,
        Self::PolyphonicSyncopation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumberOfInstruments => "numberOfInstruments",
            Self::LowDensity => "lowDensity",
            Self::MidDensity => "midDensity",
            Self::HiDensity => "hiDensity",
            Self::PolyphonicDensity => "polyphonicDensity",
            Self::StepDensity => "stepDensity",
            Self::Lowness => "lowness",
            Self::Midness => "midness",
            Self::Hiness => "hiness",
            Self::LowSync => "lowSync",
            Self::MidSync => "midSync",
            Self::HiSync => "hiSync",
            Self::Syncopation => "syncopation",
            Self::LowSyness => "lowSyness",
            Self::MidSyness => "midSyness",
            Self::HiSyness => "hiSyness",
            Self::Syness => "syness",
            Self::Balance => "balance",
            Self::PolyphonicBalance => "polyphonicBalance",
            Self::Evenness => "evenness",
            Self::PolyphonicEvenness => "polyphonicEvenness",
            Self::PolyphonicSyncopation => "polyphonicSyncopation",
        }
    }

    /// Whether the descriptor is measured against a metric window and so
    /// depends on the pattern length.
    pub fn is_windowed(&self) -> bool {
        matches!(
            self,
            Self::LowSync
                | Self::MidSync
                | Self::HiSync
                | Self::Syncopation
                | Self::LowSyness
                | Self::MidSyness
                | Self::HiSyness
                | Self::Syness
                | Self::Balance
                | Self::PolyphonicBalance
                | Self::Evenness
                | Self::PolyphonicEvenness
                | Self::PolyphonicSyncopation
        )
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Descriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|descriptor| descriptor.as_str() == s)
            .ok_or_else(|| Error::Config(format!("unknown descriptor `{s}`")))
    }
}

/// One value per descriptor; `None` means not applicable and serializes
/// as `null`, so every key is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptors {
    pub number_of_instruments: Option<f64>,
    pub low_density: Option<f64>,
    pub mid_density: Option<f64>,
    pub hi_density: Option<f64>,
    pub polyphonic_density: Option<f64>,
    pub step_density: Option<f64>,
    pub lowness: Option<f64>,
    pub midness: Option<f64>,
    pub hiness: Option<f64>,
    pub low_sync: Option<f64>,
    pub mid_sync: Option<f64>,
    pub hi_sync: Option<f64>,
    pub syncopation: Option<f64>,
    pub low_syness: Option<f64>,
    pub mid_syness: Option<f64>,
    pub hi_syness: Option<f64>,
    pub syness: Option<f64>,
    pub balance: Option<f64>,
    pub polyphonic_balance: Option<f64>,
    pub evenness: Option<f64>,
    pub polyphonic_evenness: Option<f64>,
    pub polyphonic_syncopation: Option<f64>,
}

impl Descriptors {
    /// A record with every descriptor not applicable.
    pub fn not_applicable() -> Self {
        Self::default()
    }

    fn slot(&mut self, descriptor: Descriptor) -> &mut Option<f64> {
        match descriptor {
            Descriptor::NumberOfInstruments => &mut self.number_of_instruments,
            Descriptor::LowDensity => &mut self.low_density,
            Descriptor::MidDensity => &mut self.mid_density,
            Descriptor::HiDensity => &mut self.hi_density,
            Descriptor::PolyphonicDensity => &mut self.polyphonic_density,
            Descriptor::StepDensity => &mut self.step_density,
            Descriptor::Lowness => &mut self.lowness,
            Descriptor::Midness => &mut self.midness,
            Descriptor::Hiness => &mut self.hiness,
            Descriptor::LowSync => &mut self.low_sync,
            Descriptor::MidSync => &mut self.mid_sync,
            Descriptor::HiSync => &mut self.hi_sync,
            Descriptor::Syncopation => &mut self.syncopation,
            Descriptor::LowSyness => &mut self.low_syness,
            Descriptor::MidSyness => &mut self.mid_syness,
            Descriptor::HiSyness => &mut self.hi_syness,
            Descriptor::Syness => &mut self.syness,
            Descriptor::Balance => &mut self.balance,
            Descriptor::PolyphonicBalance => &mut self.polyphonic_balance,
            Descriptor::Evenness => &mut self.evenness,
            Descriptor::PolyphonicEvenness => &mut self.polyphonic_evenness,
            Descriptor::PolyphonicSyncopation => &mut self.polyphonic_syncopation,
        }
    }

    pub fn get(&self, descriptor: Descriptor) -> Option<f64> {
        match descriptor {
            Descriptor::NumberOfInstruments => self.number_of_instruments,
            Descriptor::LowDensity => self.low_density,
            Descriptor::MidDensity => self.mid_density,
            Descriptor::HiDensity => self.hi_density,
            Descriptor::PolyphonicDensity => self.polyphonic_density,
            Descriptor::StepDensity => self.step_density,
            Descriptor::Lowness => self.lowness,
            Descriptor::Midness => self.midness,
            Descriptor::Hiness => self.hiness,
            Descriptor::LowSync => self.low_sync,
            Descriptor::MidSync => self.mid_sync,
            Descriptor::HiSync => self.hi_sync,
            Descriptor::Syncopation => self.syncopation,
            Descriptor::LowSyness => self.low_syness,
            Descriptor::MidSyness => self.mid_syness,
            Descriptor::HiSyness => self.hi_syness,
            Descriptor::Syness => self.syness,
            Descriptor::Balance => self.balance,
            Descriptor::PolyphonicBalance => self.polyphonic_balance,
            Descriptor::Evenness => self.evenness,
            Descriptor::PolyphonicEvenness => self.polyphonic_evenness,
            Descriptor::PolyphonicSyncopation => self.polyphonic_syncopation,
        }
    }

    pub fn set(&mut self, descriptor: Descriptor, value: Option<f64>) {
        *self.slot(descriptor) = value;
    }

    /// `(descriptor, value)` pairs in record order.
    pub fn iter(&self) -> impl Iterator<Item = (Descriptor, Option<f64>)> + '_ {
        Descriptor::ALL
            .into_iter()
            .map(move |descriptor| (descriptor, self.get(descriptor)))
    }

    /// True when no descriptor has a value.
    pub fn is_not_applicable(&self) -> bool {
        self.iter().all(|(_, value)| value.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn names_round_trip() {
        for descriptor in Descriptor::ALL {
            assert_eq!(descriptor.as_str().parse::<Descriptor>().unwrap(), descriptor);
        }
        assert!("tempo".parse::<Descriptor>().is_err());
    }

    #[test]
    fn serde_names_match_canonical_names() {
        for descriptor in Descriptor::ALL {
            let json = serde_json::to_string(&descriptor).unwrap();
            assert_eq!(json, format!("\"{}\"", descriptor.as_str()));
        }
    }

    #[test]
    fn record_serializes_every_key() {
        let mut record = Descriptors::not_applicable();
        record.set(Descriptor::StepDensity, Some(0.5));

        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 22);
        for descriptor in Descriptor::ALL {
            assert!(object.contains_key(descriptor.as_str()), "{descriptor}");
        }
        assert_eq!(object["stepDensity"], serde_json::json!(0.5));
        assert!(object["polyphonicSyncopation"].is_null());
    }

    #[test]
    fn get_and_set_agree() {
        let mut record = Descriptors::default();
        assert!(record.is_not_applicable());
        for (i, descriptor) in Descriptor::ALL.into_iter().enumerate() {
            record.set(descriptor, Some(i as f64));
        }
        for (i, (descriptor, value)) in record.iter().enumerate() {
            assert_eq!(value, Some(i as f64), "{descriptor}");
        }
        assert!(!record.is_not_applicable());
    }

    #[test]
    fn windowed_descriptors() {
        assert!(Descriptor::Syncopation.is_windowed());
        assert!(Descriptor::PolyphonicBalance.is_windowed());
        assert!(!Descriptor::Lowness.is_windowed());
        assert!(!Descriptor::NumberOfInstruments.is_windowed());
        assert_eq!(Descriptor::ALL.iter().filter(|d| d.is_windowed()).count(), 13);
    }
}
