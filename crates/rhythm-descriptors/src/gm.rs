//! General MIDI percussion key map, grouped into three frequency bands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::{Error, Result};

/// Number of addressable instrument keys (MIDI notes 0-127).
pub const NUM_KEYS: usize = 128;

/// Reserved key meaning "no instrument" in legacy pattern files.
pub const SILENCE_KEY: u8 = 0;

/// Frequency band an instrument sounds in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Low, Band::Mid, Band::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }

    /// Numeric band code used by the three-band event representation.
    pub fn code(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Mid => 2,
            Self::High => 3,
        }
    }
}

impl std::fmt::Display for Band {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "mid" => Ok(Self::Mid),
            "hi" | "high" => Ok(Self::High),
            _ => Err(Error::InvalidBand(s.to_string())),
        }
    }
}

/// One row of the GM percussion key map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GmPercussion {
    pub key: u8,
    pub name: &'static str,
    pub band: Option<Band>,
    /// Substitute key for a simplified kit (one kick, one snare, ...)
    pub simplified_key: u8,
    /// Short name in the eight-voice kit, empty when there is none
    pub short_name: &'static str,
    /// Voice number in the eight-voice kit (kick 1, snare 2, closed hat 3,
    /// open hat 4, clap 5, rimshot 6, low tom 7, high tom 8)
    pub eight_voice: Option<u8>,
}

const fn gm(
    key: u8,
    name: &'static str,
    band: Option<Band>,
    simplified_key: u8,
    short_name: &'static str,
    eight_voice: Option<u8>,
) -> GmPercussion {
    GmPercussion {
        key,
        name,
        band,
        simplified_key,
        short_name,
        eight_voice,
    }
}

use self::Band::{High, Low, Mid};

/// The GM percussion key map with band assignments.
///
/// Bands follow the low/mid/high instrument lists used for stream
/// derivation. Keys with no band (agogos, cuicas, triangles, ...) still
/// count as instruments but never reach a band stream.
pub const GM_PERCUSSION: [GmPercussion; 49] = [
    gm(22, "Closed Hi-Hat edge", Some(High), 42, "CH", Some(3)),
    gm(26, "Open Hi-Hat edge", Some(High), 46, "OH", Some(4)),
    gm(35, "Acoustic Bass Drum", Some(Low), 36, "K", Some(1)),
    gm(36, "Bass Drum 1", Some(Low), 36, "K", Some(1)),
    gm(37, "Side Stick", Some(Mid), 37, "RS", Some(6)),
    gm(38, "Acoustic Snare", Some(Mid), 38, "SN", Some(2)),
    gm(39, "Hand Clap", Some(Mid), 39, "CP", Some(5)),
    gm(40, "Electric Snare", Some(Mid), 38, "SN", Some(2)),
    gm(41, "Low Floor Tom", Some(Low), 45, "LT", Some(7)),
    gm(42, "Closed Hi Hat", Some(High), 42, "CH", Some(3)),
    gm(43, "High Floor Tom", Some(Mid), 45, "HT", Some(8)),
    gm(44, "Pedal Hi-Hat", Some(High), 46, "OH", Some(4)),
    gm(45, "Low Tom", Some(Low), 45, "LT", Some(7)),
    gm(46, "Open Hi-Hat", Some(High), 46, "OH", Some(4)),
    gm(47, "Low-Mid Tom", Some(Low), 47, "MT", Some(7)),
    gm(48, "Hi-Mid Tom", Some(Mid), 47, "MT", Some(7)),
    gm(49, "Crash Cymbal 1", Some(High), 49, "CC", Some(4)),
    gm(50, "High Tom", Some(Mid), 50, "HT", Some(8)),
    gm(51, "Ride Cymbal 1", Some(High), 51, "RC", None),
    gm(52, "Chinese Cymbal", Some(High), 52, "", None),
    gm(53, "Ride Bell", Some(High), 53, "", None),
    gm(54, "Tambourine", Some(High), 54, "", None),
    gm(55, "Splash Cymbal", Some(High), 55, "OH", Some(4)),
    gm(56, "Cowbell", Some(High), 56, "CB", None),
    gm(57, "Crash Cymbal 2", Some(High), 57, "CC", Some(4)),
    gm(58, "Vibraslap", Some(Mid), 58, "VS", Some(6)),
    gm(59, "Ride Cymbal 2", Some(High), 59, "RC", Some(3)),
    gm(60, "Hi Bongo", Some(High), 60, "LB", Some(8)),
    gm(61, "Low Bongo", Some(Mid), 61, "HB", Some(7)),
    gm(62, "Mute Hi Conga", Some(Mid), 62, "MC", Some(8)),
    gm(63, "Open Hi Conga", None, 63, "HC", Some(8)),
    gm(64, "Low Conga", Some(Low), 64, "LC", Some(7)),
    gm(65, "High Timbale", Some(Mid), 65, "", Some(8)),
    gm(66, "Low Timbale", None, 66, "", Some(7)),
    gm(67, "High Agogo", None, 67, "", None),
    gm(68, "Low Agogo", None, 68, "", None),
    gm(69, "Cabasa", Some(High), 69, "MA", None),
    gm(70, "Maracas", Some(High), 69, "MA", None),
    gm(71, "Short Whistle", Some(High), 71, "", None),
    gm(72, "Long Whistle", Some(High), 72, "", None),
    gm(73, "Short Guiro", None, 73, "", None),
    gm(74, "Long Guiro", None, 74, "", None),
    gm(75, "Claves", None, 75, "", None),
    gm(76, "Hi Wood Block", Some(High), 76, "", Some(8)),
    gm(77, "Low Wood Block", Some(Mid), 77, "", Some(7)),
    gm(78, "Mute Cuica", None, 78, "", None),
    gm(79, "Open Cuica", None, 79, "", None),
    gm(80, "Mute Triangle", None, 80, "", None),
    gm(81, "Open Triangle", None, 81, "", None),
];

/// Look up a key in the GM percussion map.
pub fn lookup(key: u8) -> Option<&'static GmPercussion> {
    GM_PERCUSSION.iter().find(|entry| entry.key == key)
}

pub fn name_of(key: u8) -> Option<&'static str> {
    lookup(key).map(|entry| entry.name)
}

/// Substitute key for a simplified kit; unknown keys map to themselves.
pub fn simplified_key(key: u8) -> u8 {
    lookup(key).map(|entry| entry.simplified_key).unwrap_or(key)
}

/// Immutable instrument-to-band lookup, one slot per MIDI key.
///
/// Built once and shared by reference; a key maps to at most one band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BandLists", into = "BandLists")]
pub struct InstrumentTable {
    bands: [Option<Band>; NUM_KEYS],
}

impl InstrumentTable {
    /// Build a table from per-band key lists.
    ///
    /// Fails if a key is out of range or listed in more than one band.
    pub fn from_band_lists(low: &[u8], mid: &[u8], high: &[u8]) -> Result<Self> {
        let mut bands = [None; NUM_KEYS];
        for (band, keys) in [(Band::Low, low), (Band::Mid, mid), (Band::High, high)] {
            for &key in keys {
                let slot = bands
                    .get_mut(key as usize)
                    .ok_or(Error::KeyOutOfRange(key as u16))?;
                match *slot {
                    Some(existing) if existing != band => {
                        return Err(Error::Config(format!(
                            "key {key} is listed in both {existing} and {band}"
                        )));
                    }
                    _ => *slot = Some(band),
                }
            }
        }
        Ok(Self { bands })
    }

    pub fn band_of(&self, key: u8) -> Option<Band> {
        self.bands.get(key as usize).copied().flatten()
    }

    /// Keys assigned to `band`, ascending.
    pub fn keys_in(&self, band: Band) -> Vec<u8> {
        (0..NUM_KEYS as u8)
            .filter(|&key| self.band_of(key) == Some(band))
            .collect()
    }

    /// Bitmask with bit `k` set for every key `k` in `band`.
    pub fn band_mask(&self, band: Band) -> u128 {
        self.keys_in(band)
            .into_iter()
            .fold(0u128, |mask, key| mask | (1u128 << key))
    }
}

impl Default for InstrumentTable {
    fn default() -> Self {
        let mut bands = [None; NUM_KEYS];
        for entry in &GM_PERCUSSION {
            bands[entry.key as usize] = entry.band;
        }
        Self { bands }
    }
}

/// Serialized form of an [`InstrumentTable`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BandLists {
    #[serde(default)]
    low: Vec<u8>,
    #[serde(default)]
    mid: Vec<u8>,
    #[serde(default)]
    high: Vec<u8>,
}

impl TryFrom<BandLists> for InstrumentTable {
    type Error = Error;

    fn try_from(lists: BandLists) -> Result<Self> {
        InstrumentTable::from_band_lists(&lists.low, &lists.mid, &lists.high)
    }
}

impl From<InstrumentTable> for BandLists {
    fn from(table: InstrumentTable) -> Self {
        BandLists {
            low: table.keys_in(Band::Low),
            mid: table.keys_in(Band::Mid),
            high: table.keys_in(Band::High),
        }
    }
}

/// Sorted distinct band codes (low 1, mid 2, high 3) of a step's keys.
///
/// Returns `[0]` for a silent step. Keys without a band are dropped.
pub fn three_band_codes(table: &InstrumentTable, keys: &[u8]) -> Vec<u8> {
    let codes: BTreeSet<u8> = keys
        .iter()
        .filter_map(|&key| table.band_of(key))
        .map(|band| band.code())
        .collect();
    if codes.is_empty() {
        return vec![0];
    }
    codes.into_iter().collect()
}

/// Sorted distinct eight-voice kit codes of a step's keys.
///
/// Returns `[0]` for a silent step. Keys with no eight-voice slot are dropped.
pub fn eight_voice_codes(keys: &[u8]) -> Vec<u8> {
    let codes: BTreeSet<u8> = keys
        .iter()
        .filter_map(|&key| lookup(key).and_then(|entry| entry.eight_voice))
        .collect();
    if codes.is_empty() {
        return vec![0];
    }
    codes.into_iter().collect()
}
