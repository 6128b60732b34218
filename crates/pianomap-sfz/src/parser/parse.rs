use crate::parser::lexer::{Lexer, Token};
use crate::parser::macros::MacroTable;
use crate::parser::types::{RegionSection, SfzFile, SfzSection, SfzSectionType};
use crate::velocity::LayerStrategy;

/// Parse preprocessed SFZ text into control and region sections
///
/// `content` is expected to be flattened already: comments stripped, includes
/// spliced in and macros substituted. `macros` is the table the preprocessor
/// ended with.
///
/// # SFZ Inheritance Model
///
/// SFZ uses a hierarchical inheritance model where opcodes cascade down from
/// higher-level sections to lower-level sections:
///
/// ```text
/// <global>       // Global parameters apply to all regions
/// volume=0
///
/// <master>       // Master parameters override global parameters
/// volume=-6      // This overrides the global volume
///
/// <group>        // Group parameters override master parameters
/// lovel=64
/// hivel=127
///
/// <region>       // Region parameters override group parameters
/// sample=C4.wav  // Sample-specific parameters
/// key=60
/// ```
///
/// A new `<global>` starts over with empty master and group defaults, and a
/// new `<master>` with empty group defaults. Opcodes under `<curve>`,
/// `<effect>` or an unknown header are skipped, as are opcodes that appear
/// before the first header.
///
/// # Layer scope
///
/// Each region records the [`LayerStrategy`] of the macros in scope at its
/// header. The scope starts as the full document table and every `#define`
/// is replayed in document order, so an instrument that redefines `$DYN` per
/// dynamics file labels each file's regions with its own value.
pub fn parse_sfz(content: &str, macros: &MacroTable) -> SfzFile {
    let mut builder = SectionBuilder::new(macros.clone());

    for spanned in Lexer::new(content) {
        match spanned.token {
            Token::Define { name, value } => builder.scope.define(name, value),
            Token::Header(name) => builder.start_section(name),
            Token::Opcode { key, value } => builder.add_opcode(key, value),
            Token::Include { .. } | Token::Comment(_) | Token::Unknown(_) => {}
        }
    }

    builder.finish()
}

struct SectionBuilder {
    sfz: SfzFile,
    scope: MacroTable,
    global: SfzSection,
    master: SfzSection,
    group: SfzSection,
    region: Option<RegionSection>,
    active: Option<SfzSectionType>,
}

impl SectionBuilder {
    fn new(scope: MacroTable) -> Self {
        Self {
            sfz: SfzFile::new(),
            scope,
            global: SfzSection::new(SfzSectionType::Global),
            master: SfzSection::new(SfzSectionType::Master),
            group: SfzSection::new(SfzSectionType::Group),
            region: None,
            active: None,
        }
    }

    fn start_section(&mut self, header: &str) {
        self.finish_region();

        let section_type = SfzSectionType::from_header(header);
        match section_type {
            Some(SfzSectionType::Control) => {
                self.sfz
                    .control
                    .get_or_insert_with(|| SfzSection::new(SfzSectionType::Control));
            }
            Some(SfzSectionType::Global) => {
                self.global = SfzSection::new(SfzSectionType::Global);
                self.master = SfzSection::new(SfzSectionType::Master);
                self.group = SfzSection::new(SfzSectionType::Group);
            }
            Some(SfzSectionType::Master) => {
                self.master = SfzSection::new(SfzSectionType::Master);
                self.group = SfzSection::new(SfzSectionType::Group);
            }
            Some(SfzSectionType::Group) => {
                self.group = SfzSection::new(SfzSectionType::Group);
            }
            Some(SfzSectionType::Region) => {
                self.region = Some(RegionSection {
                    section: SfzSection::new(SfzSectionType::Region),
                    layer_strategy: LayerStrategy::detect(&self.scope),
                });
            }
            Some(SfzSectionType::Curve) | Some(SfzSectionType::Effect) => {}
            None => log::debug!("Skipping unknown section <{}>", header),
        }
        self.active = section_type;
    }

    fn add_opcode(&mut self, key: &str, value: &str) {
        let target = match self.active {
            Some(SfzSectionType::Control) => self.sfz.control.as_mut(),
            Some(SfzSectionType::Global) => Some(&mut self.global),
            Some(SfzSectionType::Master) => Some(&mut self.master),
            Some(SfzSectionType::Group) => Some(&mut self.group),
            Some(SfzSectionType::Region) => self.region.as_mut().map(|r| &mut r.section),
            _ => None,
        };
        if let Some(section) = target {
            section.add_opcode(key.to_string(), value.to_string());
        }
    }

    fn finish_region(&mut self) {
        if let Some(mut region) = self.region.take() {
            region.section.inherit_from(&self.group);
            region.section.inherit_from(&self.master);
            region.section.inherit_from(&self.global);
            self.sfz.regions.push(region);
        }
    }

    fn finish(mut self) -> SfzFile {
        self.finish_region();
        self.sfz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::opcodes::SfzOpcodes;

    fn parse(content: &str) -> SfzFile {
        parse_sfz(content, &MacroTable::new())
    }

    #[test]
    fn test_regions_in_document_order() {
        let sfz = parse("<region> sample=a.wav key=60\n<region> sample=b.wav key=61");
        assert_eq!(sfz.regions.len(), 2);
        assert_eq!(sfz.regions[0].get_opcode_str("sample"), Some("a.wav"));
        assert_eq!(sfz.regions[1].get_opcode_str("sample"), Some("b.wav"));
    }

    #[test]
    fn test_inheritance_precedence() {
        let sfz = parse(
            "<global> volume=1 tune=1 pan=1 amp_veltrack=1\n\
             <master> volume=2 tune=2 pan=2\n\
             <group> volume=3 tune=3\n\
             <region> volume=4 sample=a.wav",
        );
        let region = &sfz.regions[0];
        assert_eq!(region.get_opcode_str("volume"), Some("4"));
        assert_eq!(region.get_opcode_str("tune"), Some("3"));
        assert_eq!(region.get_opcode_str("pan"), Some("2"));
        assert_eq!(region.get_opcode_str("amp_veltrack"), Some("1"));
    }

    #[test]
    fn test_new_group_resets_group_opcodes() {
        let sfz = parse(
            "<group> lovel=1 hivel=26 <region> sample=a.wav\n\
             <group> <region> sample=b.wav",
        );
        assert_eq!(sfz.regions[0].get_opcode_str("lovel"), Some("1"));
        assert_eq!(sfz.regions[1].get_opcode_str("lovel"), None);
    }

    #[test]
    fn test_new_master_resets_group() {
        let sfz = parse("<group> hivel=26 <master> volume=-3 <region> sample=a.wav");
        assert_eq!(sfz.regions[0].get_opcode_str("hivel"), None);
        assert_eq!(sfz.regions[0].get_opcode_str("volume"), Some("-3"));
    }

    #[test]
    fn test_control_sections_are_merged() {
        let sfz = parse(
            "<control> default_path=Samples/\n<region> sample=a.wav\n\
             <control> label_cc64=Sustain",
        );
        let control = sfz.control.as_ref().unwrap();
        assert_eq!(sfz.get_default_path(), Some("Samples/"));
        assert_eq!(control.get_opcode_str("label_cc64"), Some("Sustain"));
        assert_eq!(sfz.regions.len(), 1);
        assert_eq!(sfz.regions[0].get_opcode_str("default_path"), None);
    }

    #[test]
    fn test_skipped_sections_do_not_leak() {
        let sfz = parse(
            "sample=orphan.wav\n<curve> v000=0 v127=1\n<effect> type=reverb\n\
             <unknown> sample=nope.wav\n<region> sample=a.wav",
        );
        assert_eq!(sfz.regions.len(), 1);
        let region = &sfz.regions[0];
        assert_eq!(region.get_opcode_str("v127"), None);
        assert_eq!(region.get_opcode_str("type"), None);
        assert_eq!(region.get_opcode_str("sample"), Some("a.wav"));
    }

    #[test]
    fn test_layer_strategy_follows_define_order() {
        let mut macros = MacroTable::new();
        macros.define("DYN", "FF");
        let sfz = parse_sfz(
            "#define $DYN PP\n<region> sample=pp.wav\n\
             #define $DYN FF\n<region> sample=ff.wav",
            &macros,
        );
        assert_eq!(
            sfz.regions[0].layer_strategy,
            LayerStrategy::Dynamics("PP".to_string())
        );
        assert_eq!(
            sfz.regions[1].layer_strategy,
            LayerStrategy::Dynamics("FF".to_string())
        );
    }

    #[test]
    fn test_document_table_applies_before_first_define() {
        let mut macros = MacroTable::new();
        macros.define("VEL", "v");
        let sfz = parse_sfz("<region> sample=a.wav\n#define $VEL v", &macros);
        assert_eq!(sfz.regions[0].layer_strategy, LayerStrategy::Table);
    }

    #[test]
    fn test_empty_input() {
        let sfz = parse("");
        assert!(!sfz.has_regions());
        assert!(sfz.control.is_none());
    }
}
