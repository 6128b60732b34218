//! Per-instrument configuration.
//!
//! Facts an SFZ file cannot tell about itself (the sample file extension,
//! the velocity layer scheme, descriptive metadata) live in an
//! [`InstrumentProfile`]. Profiles are plain data: the two bundled pianos are
//! defined below and any other instrument can be described in configuration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::velocity::{VelocityLayer, VelocityLayerTable};

const DEFAULT_FILE_EXTENSION: &str = "flac";

/// Data-driven settings for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentProfile {
    /// Extension of the sample files, reported as `fileExtension`
    pub file_extension: String,
    /// Layer table used when the instrument defines `$VEL*` macros;
    /// the standard 16-layer split when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity_layers: Option<Vec<VelocityLayer>>,
    /// Extra fields merged into the document metadata
    pub metadata: Map<String, Value>,
}

impl Default for InstrumentProfile {
    fn default() -> Self {
        Self {
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            velocity_layers: None,
            metadata: Map::new(),
        }
    }
}

impl InstrumentProfile {
    pub fn layer_table(&self) -> VelocityLayerTable {
        self.velocity_layers
            .clone()
            .map(VelocityLayerTable::new)
            .unwrap_or_default()
    }

    fn with_metadata(metadata: Value) -> Self {
        let metadata = match metadata {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            metadata,
            ..Self::default()
        }
    }
}

/// The bundled profiles, by name.
pub fn builtin_profiles() -> Vec<(&'static str, InstrumentProfile)> {
    vec![
        (
            "splendid",
            InstrumentProfile::with_metadata(json!({
                "type": "Splendid Grand Piano",
                "publicDomain": true,
                "halfPedaling": true,
                "stringResonance": true,
            })),
        ),
        (
            "salamander",
            InstrumentProfile::with_metadata(json!({
                "type": "Salamander Grand Piano V3",
                "yamahaC5": true,
                "retunedVersion": true,
                "keyswitches": ["Natural", "Retuned"],
            })),
        ),
    ]
}

pub fn builtin_profile(name: &str) -> Option<InstrumentProfile> {
    builtin_profiles()
        .into_iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, profile)| profile)
}
