#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::synth::SustainPolicy;

/// Construction-time engine settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: f32,
    /// Split evenly between the FM and sample pools.
    pub max_voices: usize,
    pub master_gain: f32,
    pub sustain_policy: SustainPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            max_voices: 256,
            master_gain: 0.7,
            sustain_policy: SustainPolicy::default(),
        }
    }
}
