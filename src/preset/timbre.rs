#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::PresetError;

/// How a timbre produces sound. Fixed per voice for its whole lifetime.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynthesisKind {
    #[cfg_attr(feature = "serde", serde(rename = "FM"))]
    Fm,
    #[cfg_attr(feature = "serde", serde(rename = "SAMPLE"))]
    Sample,
}

impl SynthesisKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SynthesisKind::Fm => "FM",
            SynthesisKind::Sample => "SAMPLE",
        }
    }
}

/// One FM operator: frequency ratio to the fundamental and its envelope
/// stages `[attack, decay, sustain, release]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmOperator {
    pub ratio: f32,
    pub envelope_stages: [f32; 4],
}

impl FmOperator {
    pub fn new(ratio: f32, envelope_stages: [f32; 4]) -> Self {
        Self {
            ratio,
            envelope_stages,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq)]
pub struct SampleParams {
    pub source_buffer_ref: String,
    /// Attack time in seconds.
    pub attack: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl Default for SampleParams {
    fn default() -> Self {
        Self {
            source_buffer_ref: String::new(),
            attack: 0.01,
            release: 0.5,
        }
    }
}

/// Kind-specific synthesis parameters. The variant is the synthesis kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Synthesis {
    Fm(Vec<FmOperator>),
    Sample(SampleParams),
}

impl Synthesis {
    pub fn kind(&self) -> SynthesisKind {
        match self {
            Synthesis::Fm(_) => SynthesisKind::Fm,
            Synthesis::Sample(_) => SynthesisKind::Sample,
        }
    }
}

/// Static description of one instrument sound.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "TimbreRecord", into = "TimbreRecord")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct TimbreDescriptor {
    pub id: String,
    pub name: String,
    /// Voices one key press consumes.
    pub layer_count: usize,
    pub synthesis: Synthesis,
}

impl TimbreDescriptor {
    pub fn fm(id: &str, name: &str, layer_count: usize, operators: Vec<FmOperator>) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            layer_count,
            synthesis: Synthesis::Fm(operators),
        }
    }

    pub fn sample(id: &str, name: &str, layer_count: usize, params: SampleParams) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            layer_count,
            synthesis: Synthesis::Sample(params),
        }
    }

    pub fn kind(&self) -> SynthesisKind {
        self.synthesis.kind()
    }

    pub fn validate(&self) -> Result<(), PresetError> {
        if self.layer_count == 0 {
            return Err(PresetError::NoLayers(self.id.clone()));
        }

        let invalid = |reason: String| PresetError::InvalidParameter {
            id: self.id.clone(),
            reason,
        };

        match &self.synthesis {
            Synthesis::Fm(operators) => {
                for (i, op) in operators.iter().enumerate() {
                    if !op.ratio.is_finite() || op.ratio < 0.0 {
                        return Err(invalid(format!("operator {i} ratio {}", op.ratio)));
                    }
                    if op.envelope_stages.iter().any(|s| !s.is_finite() || *s < 0.0) {
                        return Err(invalid(format!("operator {i} envelope stages")));
                    }
                }
            }
            Synthesis::Sample(params) => {
                for (label, value) in [("attack", params.attack), ("release", params.release)] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(invalid(format!("{label} {value}")));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Wire shape of a timbre: `{ id, name, kind, layerCount, parameters }`.
#[cfg(feature = "serde")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimbreRecord {
    id: String,
    #[serde(default)]
    name: String,
    kind: SynthesisKind,
    layer_count: usize,
    parameters: RecordParameters,
}

#[cfg(feature = "serde")]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RecordParameters {
    Fm(Vec<FmOperator>),
    Sample(SampleParams),
}

#[cfg(feature = "serde")]
impl TryFrom<TimbreRecord> for TimbreDescriptor {
    type Error = PresetError;

    fn try_from(record: TimbreRecord) -> Result<Self, Self::Error> {
        let synthesis = match (record.kind, record.parameters) {
            (SynthesisKind::Fm, RecordParameters::Fm(operators)) => Synthesis::Fm(operators),
            (SynthesisKind::Sample, RecordParameters::Sample(params)) => Synthesis::Sample(params),
            (kind, _) => {
                return Err(PresetError::KindMismatch {
                    id: record.id,
                    kind: kind.as_str(),
                })
            }
        };

        let descriptor = TimbreDescriptor {
            id: record.id,
            name: record.name,
            layer_count: record.layer_count,
            synthesis,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}

#[cfg(feature = "serde")]
impl From<TimbreDescriptor> for TimbreRecord {
    fn from(descriptor: TimbreDescriptor) -> Self {
        let kind = descriptor.kind();
        let parameters = match descriptor.synthesis {
            Synthesis::Fm(operators) => RecordParameters::Fm(operators),
            Synthesis::Sample(params) => RecordParameters::Sample(params),
        };
        Self {
            id: descriptor.id,
            name: descriptor.name,
            kind,
            layer_count: descriptor.layer_count,
            parameters,
        }
    }
}
