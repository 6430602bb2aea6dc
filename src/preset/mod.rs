//! Timbre descriptors and the bank they are looked up in.
//!
//! The bank is loaded once and read-only afterwards. Note events name timbres
//! by string id; the bank resolves that to a compact [`TimbreId`] which is
//! what the polyphony manager keys its note table on.

mod timbre;

pub use timbre::{FmOperator, SampleParams, Synthesis, SynthesisKind, TimbreDescriptor};

use std::collections::HashSet;

use crate::error::PresetError;

/// Index of a timbre inside its [`PresetBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimbreId(u16);

impl TimbreId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

pub const DX7_E_PIANO_1: &str = "DX7_E_PIANO_1";
pub const ROLAND_FANTASIA_PAD: &str = "ROLAND_FANTASIA_PAD";
pub const MOTIF_POWER_GRAND: &str = "MOTIF_POWER_GRAND";

#[derive(Debug, Clone)]
pub struct PresetBank {
    timbres: Vec<TimbreDescriptor>,
}

impl PresetBank {
    pub fn new(timbres: Vec<TimbreDescriptor>) -> Result<Self, PresetError> {
        if timbres.len() > u16::MAX as usize {
            return Err(PresetError::InvalidParameter {
                id: String::new(),
                reason: format!("bank holds {} timbres", timbres.len()),
            });
        }

        let mut seen = HashSet::with_capacity(timbres.len());
        for timbre in &timbres {
            timbre.validate()?;
            if !seen.insert(timbre.id.as_str()) {
                return Err(PresetError::DuplicateId(timbre.id.clone()));
            }
        }

        Ok(Self { timbres })
    }

    /// The factory bank: an FM electric piano and two sample-based sounds.
    pub fn builtin() -> Self {
        let stages = [0.01, 0.5, 0.5, 0.5];
        let timbres = vec![
            TimbreDescriptor::fm(
                DX7_E_PIANO_1,
                "DX7 E.Piano 1",
                3,
                vec![
                    FmOperator::new(1.0, stages),
                    FmOperator::new(1.41, stages),
                    FmOperator::new(1.0, [0.01, 0.8, 0.5, 1.0]),
                ],
            ),
            TimbreDescriptor::sample(
                ROLAND_FANTASIA_PAD,
                "Roland Fantasia Pad",
                2,
                SampleParams {
                    source_buffer_ref: "assets/samples/fantasia_pad.wav".to_owned(),
                    attack: 1.5,
                    release: 2.0,
                },
            ),
            TimbreDescriptor::sample(
                MOTIF_POWER_GRAND,
                "Motif Power Grand",
                4,
                SampleParams {
                    source_buffer_ref: "assets/samples/motif_power_grand_low.wav".to_owned(),
                    ..SampleParams::default()
                },
            ),
        ];

        Self { timbres }
    }

    /// Parse a JSON array of timbre records.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, PresetError> {
        let timbres: Vec<TimbreDescriptor> = serde_json::from_str(json)?;
        Self::new(timbres)
    }

    #[cfg(feature = "serde")]
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, PresetError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(&self.timbres)?)
    }

    pub fn resolve(&self, id: &str) -> Option<TimbreId> {
        self.timbres
            .iter()
            .position(|timbre| timbre.id == id)
            .map(|index| TimbreId(index as u16))
    }

    pub fn get(&self, id: TimbreId) -> Option<&TimbreDescriptor> {
        self.timbres.get(id.index())
    }

    pub fn by_name(&self, id: &str) -> Option<&TimbreDescriptor> {
        self.resolve(id).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TimbreId, &TimbreDescriptor)> {
        self.timbres
            .iter()
            .enumerate()
            .map(|(index, timbre)| (TimbreId(index as u16), timbre))
    }

    pub fn len(&self) -> usize {
        self.timbres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timbres.is_empty()
    }
}

impl Default for PresetBank {
    fn default() -> Self {
        Self::builtin()
    }
}
