use std::collections::HashMap;

use crate::parser::opcodes::SfzOpcodes;
use crate::velocity::LayerStrategy;

/// The preprocessed content of an SFZ instrument, grouped by section
///
/// Only the sections the key mapper needs are kept:
///
/// - `<control>`: instrument-wide settings such as `default_path` and
///   `label_ccN` controller names. All control sections are merged.
/// - `<region>`: one sample each, with the opcodes of the enclosing
///   `<global>`, `<master>` and `<group>` sections already folded in.
///
/// # Inheritance
///
/// Opcodes cascade down the hierarchy, the most specific section winning:
/// 1. Global settings apply to all regions
/// 2. Master settings override global settings
/// 3. Group settings override master settings
/// 4. Region settings override group settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SfzFile {
    /// Merged `<control>` opcodes, if any control section exists
    pub control: Option<SfzSection>,

    /// Region sections in document order
    pub regions: Vec<RegionSection>,
}

impl SfzFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if this SFZ file contains at least one region
    pub fn has_regions(&self) -> bool {
        !self.regions.is_empty()
    }

    /// Get the default path from the control section if available
    ///
    /// ```text
    /// <control>
    /// default_path=Samples/
    /// ```
    pub fn get_default_path(&self) -> Option<&str> {
        self.control
            .as_ref()
            .and_then(|ctrl| ctrl.get_opcode_str("default_path"))
    }
}

/// A region together with the layer strategy in scope at its header
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSection {
    pub section: SfzSection,
    pub layer_strategy: LayerStrategy,
}

impl SfzOpcodes for RegionSection {
    fn get_opcode_str(&self, name: &str) -> Option<&str> {
        self.section.get_opcode_str(name)
    }
}

/// Represents a section in an SFZ file
#[derive(Debug, Clone, PartialEq)]
pub struct SfzSection {
    /// Type of the section
    pub section_type: SfzSectionType,

    /// Opcodes defined in this section (own and inherited)
    pub opcodes: HashMap<String, String>,
}

impl SfzSection {
    /// Creates a new empty section of the specified type
    pub fn new(section_type: SfzSectionType) -> Self {
        Self {
            section_type,
            opcodes: HashMap::new(),
        }
    }

    /// Adds or overwrites an opcode
    pub fn add_opcode(&mut self, name: String, value: String) {
        self.opcodes.insert(name, value);
    }

    /// Copies every opcode of `parent` that this section does not set itself
    pub fn inherit_from(&mut self, parent: &SfzSection) {
        for (name, value) in &parent.opcodes {
            self.opcodes
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

impl SfzOpcodes for SfzSection {
    fn get_opcode_str(&self, name: &str) -> Option<&str> {
        self.opcodes.get(name).map(|s| s.as_str())
    }
}

/// Types of sections in an SFZ file
///
/// Section headers are enclosed in angle brackets; a section runs until the
/// next header. `<curve>` and `<effect>` are recognized so that their opcodes
/// are not mistaken for region opcodes, but their content is not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SfzSectionType {
    /// `<control>`: instrument-wide settings
    Control,
    /// `<global>`: defaults for every region
    Global,
    /// `<master>`: defaults for the following groups
    Master,
    /// `<group>`: defaults for the following regions
    Group,
    /// `<region>`: a single sample
    Region,
    /// `<curve>`: response curve definition
    Curve,
    /// `<effect>`: effect settings
    Effect,
}

impl SfzSectionType {
    /// Converts a header name (without angle brackets) to a section type
    ///
    /// # Example
    ///
    /// ```
    /// use pianomap_sfz::parser::SfzSectionType;
    ///
    /// assert_eq!(SfzSectionType::from_header("region"), Some(SfzSectionType::Region));
    /// assert_eq!(SfzSectionType::from_header("GROUP"), Some(SfzSectionType::Group));
    /// assert_eq!(SfzSectionType::from_header("unknown"), None);
    /// ```
    pub fn from_header(header: &str) -> Option<Self> {
        match header.to_lowercase().as_str() {
            "control" => Some(SfzSectionType::Control),
            "global" => Some(SfzSectionType::Global),
            "master" => Some(SfzSectionType::Master),
            "group" => Some(SfzSectionType::Group),
            "region" => Some(SfzSectionType::Region),
            "curve" => Some(SfzSectionType::Curve),
            "effect" => Some(SfzSectionType::Effect),
            _ => None,
        }
    }
}
