//! Description and metadata assembly.

use std::collections::BTreeMap;

use crate::notes::PIANO_KEY_COUNT;
use crate::parser::lexer::COMMENT_MARKER;
use crate::parser::SfzSection;
use crate::profile::InstrumentProfile;
use crate::types::Metadata;
use crate::velocity::VelocityMapping;

/// Used when the root file has no usable comment.
pub const DEFAULT_DESCRIPTION: &str = "Piano instrument SFZ file";

/// Longest description kept before truncation, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

const CC_LABEL_PREFIX: &str = "label_cc";

/// Summarize an instrument from the comment lines of its raw root file
///
/// Only whole-line comments count. Empty comments, decorative rules and
/// lines about MIDI CCs, file folders or web links are skipped; the rest is
/// joined with single spaces and cut to [`MAX_DESCRIPTION_CHARS`] characters
/// followed by `...`.
pub fn extract_description(raw: &str) -> String {
    let parts: Vec<&str> = raw
        .lines()
        .filter_map(|line| line.trim().strip_prefix(COMMENT_MARKER))
        .map(str::trim)
        .filter(|comment| is_descriptive(comment))
        .collect();

    if parts.is_empty() {
        return DEFAULT_DESCRIPTION.to_string();
    }

    let description = parts.join(" ");
    match description.char_indices().nth(MAX_DESCRIPTION_CHARS) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description,
    }
}

fn is_descriptive(comment: &str) -> bool {
    !comment.is_empty()
        && !comment
            .chars()
            .all(|c| matches!(c, '-' | '/' | '*' | '=' | '_'))
        && !comment.starts_with("midi cc")
        && !comment.starts_with("file-folder")
        && !comment.contains("https://")
}

/// Facts taken from the merged `<control>` section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlInfo {
    /// `label_ccN=` values keyed by `N`
    pub midi_cc: BTreeMap<String, String>,
    /// `default_path=`
    pub sample_path: Option<String>,
}

impl ControlInfo {
    pub fn from_section(control: &SfzSection) -> Self {
        let midi_cc = control
            .opcodes
            .iter()
            .filter_map(|(key, value)| {
                let number = key.strip_prefix(CC_LABEL_PREFIX)?;
                if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                Some((number.to_string(), value.clone()))
            })
            .collect();

        Self {
            midi_cc,
            sample_path: control.opcodes.get("default_path").cloned(),
        }
    }
}

/// Combine control facts, the velocity mapping and profile extras.
pub fn build_metadata(
    instrument_name: &str,
    control: Option<&SfzSection>,
    velocity_mapping: &VelocityMapping,
    profile: &InstrumentProfile,
) -> Metadata {
    let control = control.map(ControlInfo::from_section).unwrap_or_default();

    Metadata {
        instrument_name: instrument_name.to_string(),
        file_extension: profile.file_extension.clone(),
        key_count: PIANO_KEY_COUNT,
        midi_cc: Some(control.midi_cc).filter(|cc| !cc.is_empty()),
        sample_path: control.sample_path,
        velocity_layers: Some(velocity_mapping.to_labels()).filter(|layers| !layers.is_empty()),
        extra: profile.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::SfzSectionType;

    #[test]
    fn test_description_filters_noise() {
        let raw = "//////////////////////////\n\
                   // Salamander Grand Piano V3\n\
                   //\n\
                   // -----------------\n\
                   // midi cc 64: sustain\n\
                   // file-folder: Samples\n\
                   // see https://example.org\n\
                   // by Alexander Holm\n\
                   <control> // not a whole-line comment\n";
        assert_eq!(
            extract_description(raw),
            "Salamander Grand Piano V3 by Alexander Holm"
        );
    }

    #[test]
    fn test_description_default() {
        assert_eq!(extract_description("<region> sample=a.wav"), DEFAULT_DESCRIPTION);
        assert_eq!(extract_description("// ****\n// ====\n"), DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_description_truncation() {
        let raw = format!("// {}", "a".repeat(250));
        let description = extract_description(&raw);
        assert_eq!(description.len(), MAX_DESCRIPTION_CHARS + 3);
        assert!(description.ends_with("..."));

        let exact = format!("// {}", "b".repeat(MAX_DESCRIPTION_CHARS));
        assert_eq!(extract_description(&exact).len(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_control_info() {
        let mut control = SfzSection::new(SfzSectionType::Control);
        control.add_opcode("label_cc64".to_string(), "Sustain Pedal".to_string());
        control.add_opcode("label_cc67".to_string(), "Soft".to_string());
        control.add_opcode("label_ccx".to_string(), "ignored".to_string());
        control.add_opcode("default_path".to_string(), "Samples/".to_string());

        let info = ControlInfo::from_section(&control);
        assert_eq!(info.midi_cc.len(), 2);
        assert_eq!(info.midi_cc.get("64").map(String::as_str), Some("Sustain Pedal"));
        assert_eq!(info.sample_path.as_deref(), Some("Samples/"));
    }

    #[test]
    fn test_metadata_omits_empty_sections() {
        let metadata = build_metadata(
            "plain",
            None,
            &VelocityMapping::default(),
            &InstrumentProfile::default(),
        );
        assert_eq!(metadata.instrument_name, "plain");
        assert_eq!(metadata.file_extension, "flac");
        assert_eq!(metadata.key_count, 88);
        assert!(metadata.midi_cc.is_none());
        assert!(metadata.sample_path.is_none());
        assert!(metadata.velocity_layers.is_none());
        assert!(metadata.extra.is_empty());
    }
}
