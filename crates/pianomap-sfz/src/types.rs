//! Output document type definitions.
//!
//! Everything here serializes to the per-key JSON document with camelCase
//! field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::notes::{note_name, piano_keys};

/// Per-key sample map of one instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Summary built from the root file's comments.
    pub description: String,
    /// Instrument-level facts.
    pub metadata: Metadata,
    /// Exactly one entry per piano key, keyed by MIDI note.
    pub keys: KeyMap,
}

impl Document {
    /// Number of keys with at least one sample.
    pub fn keys_with_samples(&self) -> usize {
        self.keys.values().filter(|entry| !entry.samples.is_empty()).count()
    }

    /// Number of sample descriptors over all keys.
    ///
    /// A region spanning several keys is counted once per key.
    pub fn total_samples(&self) -> usize {
        self.keys.values().map(|entry| entry.samples.len()).sum()
    }
}

/// Instrument-level facts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub instrument_name: String,
    pub file_extension: String,
    pub key_count: usize,
    /// Controller labels from `label_ccN=` in `<control>`, keyed by CC number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_cc: Option<BTreeMap<String, String>>,
    /// `default_path=` from `<control>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_path: Option<String>,
    /// `"lovel-hivel"` to layer file, from the `<group> #include` idiom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_layers: Option<BTreeMap<String, String>>,
    /// Profile-specific fields, emitted at the same level as the others.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Key entries in ascending MIDI order; serialized with string keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap(BTreeMap<u8, KeyEntry>);

impl KeyMap {
    /// All 88 piano keys, each with an empty sample list.
    pub fn piano() -> Self {
        Self(piano_keys().map(|note| (note, KeyEntry::new(note))).collect())
    }

    pub fn get(&self, midi_note: u8) -> Option<&KeyEntry> {
        self.0.get(&midi_note)
    }

    pub fn get_mut(&mut self, midi_note: u8) -> Option<&mut KeyEntry> {
        self.0.get_mut(&midi_note)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &KeyEntry> {
        self.0.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut KeyEntry> {
        self.0.values_mut()
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::piano()
    }
}

/// The samples covering one key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEntry {
    pub midi_note: u8,
    pub note_name: String,
    /// Ordered low to high velocity.
    pub samples: Vec<SampleDescriptor>,
}

impl KeyEntry {
    pub fn new(midi_note: u8) -> Self {
        Self {
            midi_note,
            note_name: note_name(midi_note),
            samples: Vec::new(),
        }
    }
}

/// One region as seen from a key it covers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleDescriptor {
    /// Sample path exactly as written in the region.
    pub file: String,
    /// The region's declared key range, not clipped to the piano.
    pub key_range: KeyRange,
    /// Velocity layer label, e.g. `VEL02`, `PP` or `27-34`.
    pub velocity_range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tune: Option<String>,
    /// `region_label=`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub low: i32,
    pub high: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor() -> SampleDescriptor {
        SampleDescriptor {
            file: "Samples/C4v1.flac".to_string(),
            key_range: KeyRange { low: 59, high: 61 },
            velocity_range: "VEL01".to_string(),
            volume: None,
            tune: Some("-3".to_string()),
            label: None,
        }
    }

    #[test]
    fn test_piano_key_map() {
        let keys = KeyMap::piano();
        assert_eq!(keys.len(), 88);
        assert_eq!(keys.get(21).unwrap().note_name, "A0");
        assert_eq!(keys.get(108).unwrap().note_name, "C8");
        assert!(keys.get(20).is_none());
        assert!(keys.get(109).is_none());
    }

    #[test]
    fn test_key_entry_json_shape() {
        let mut entry = KeyEntry::new(60);
        entry.samples.push(descriptor());
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "midiNote": 60,
                "noteName": "C4",
                "samples": [{
                    "file": "Samples/C4v1.flac",
                    "keyRange": { "low": 59, "high": 61 },
                    "velocityRange": "VEL01",
                    "tune": "-3"
                }]
            })
        );
    }

    #[test]
    fn test_keys_serialize_in_numeric_order() {
        let json = serde_json::to_string(&KeyMap::piano()).unwrap();
        let a0 = json.find("\"21\"").unwrap();
        let a6 = json.find("\"93\"").unwrap();
        let c8 = json.find("\"108\"").unwrap();
        assert!(a0 < a6 && a6 < c8);
    }

    #[test]
    fn test_metadata_flattens_extras() {
        let mut extra = serde_json::Map::new();
        extra.insert("type".to_string(), json!("Test Piano"));
        let metadata = Metadata {
            instrument_name: "test".to_string(),
            file_extension: "flac".to_string(),
            key_count: 88,
            midi_cc: Some(BTreeMap::from([("64".to_string(), "Sustain".to_string())])),
            sample_path: None,
            velocity_layers: None,
            extra,
        };
        let value = serde_json::to_value(&metadata).unwrap();
        assert_eq!(
            value,
            json!({
                "instrumentName": "test",
                "fileExtension": "flac",
                "keyCount": 88,
                "midiCc": { "64": "Sustain" },
                "type": "Test Piano"
            })
        );
        let back: Metadata = serde_json::from_value(value).unwrap();
        assert_eq!(back, metadata);
    }
}
