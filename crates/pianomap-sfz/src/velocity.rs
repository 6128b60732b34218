//! Velocity layer naming.
//!
//! Every sample in the output carries a human-meaningful layer label instead of
//! a raw `lovel`/`hivel` pair. Which label is used depends on how the
//! instrument encodes its layers:
//!
//! 1. Instruments that define any `$VEL*` macro use an explicit layer table
//!    (by default the standard 16-layer split, `VEL01` ... `VEL16`); pairs
//!    missing from the table fall back to `"lovel-hivel"`.
//! 2. Instruments that define `$DYN` use its value (`PP`, `MF`, `FF`, ...).
//! 3. Everything else is labelled `"lovel-hivel"`.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parser::lexer::{Lexer, Token};
use crate::parser::macros::{MacroTable, DYNAMICS_MACRO};

/// The standard 16-layer velocity split used by round-robin multi-sample pianos.
const STANDARD_LAYERS: [(i32, i32); 16] = [
    (1, 26),
    (27, 34),
    (35, 36),
    (37, 43),
    (44, 46),
    (47, 50),
    (51, 56),
    (57, 64),
    (65, 72),
    (73, 80),
    (81, 88),
    (89, 96),
    (97, 104),
    (105, 112),
    (113, 120),
    (121, 127),
];

/// An inclusive `lovel`..`hivel` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VelocityRange {
    pub lovel: i32,
    pub hivel: i32,
}

impl VelocityRange {
    pub fn new(lovel: i32, hivel: i32) -> Self {
        Self { lovel, hivel }
    }
}

impl fmt::Display for VelocityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.lovel, self.hivel)
    }
}

/// One named entry of a layer table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocityLayer {
    pub lovel: i32,
    pub hivel: i32,
    pub name: String,
}

/// Exact `(lovel, hivel)` → layer name table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VelocityLayerTable {
    layers: Vec<VelocityLayer>,
}

impl VelocityLayerTable {
    pub fn new(layers: Vec<VelocityLayer>) -> Self {
        Self { layers }
    }

    /// `VEL01` ... `VEL16` over the standard split.
    pub fn standard() -> Self {
        let layers = STANDARD_LAYERS
            .iter()
            .enumerate()
            .map(|(i, &(lovel, hivel))| VelocityLayer {
                lovel,
                hivel,
                name: format!("VEL{:02}", i + 1),
            })
            .collect();
        Self { layers }
    }

    pub fn lookup(&self, lovel: i32, hivel: i32) -> Option<&str> {
        self.layers
            .iter()
            .find(|layer| layer.lovel == lovel && layer.hivel == hivel)
            .map(|layer| layer.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VelocityLayer> {
        self.layers.iter()
    }
}

impl Default for VelocityLayerTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// How layer labels are derived for a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerStrategy {
    /// Explicit table lookup (a `$VEL*` macro is defined)
    Table,
    /// Fixed dynamics label (the value of `$DYN`)
    Dynamics(String),
    /// `"lovel-hivel"`
    Numeric,
}

impl LayerStrategy {
    /// Pick the strategy for the macros currently in scope.
    pub fn detect(macros: &MacroTable) -> Self {
        if macros.has_velocity_variables() {
            Self::Table
        } else if let Some(raw) = macros.get(DYNAMICS_MACRO) {
            let dynamics = macros.resolve(DYNAMICS_MACRO);
            Self::Dynamics(dynamics.unwrap_or_else(|| raw.to_string()))
        } else {
            Self::Numeric
        }
    }

    pub fn resolve_label(&self, table: &VelocityLayerTable, lovel: i32, hivel: i32) -> String {
        let range = VelocityRange::new(lovel, hivel);
        match self {
            Self::Table => table
                .lookup(lovel, hivel)
                .map(str::to_string)
                .unwrap_or_else(|| range.to_string()),
            Self::Dynamics(label) => label.clone(),
            Self::Numeric => range.to_string(),
        }
    }
}

/// Resolve the layer label of one `lovel`/`hivel` pair against a macro table.
pub fn resolve_label(macros: &MacroTable, table: &VelocityLayerTable, lovel: i32, hivel: i32) -> String {
    LayerStrategy::detect(macros).resolve_label(table, lovel, hivel)
}

/// First integer embedded in a layer label, or 0.
///
/// `VEL07` → 7, `27-34` → 27, `PP` → 0. A digit run too long for `u64`
/// saturates to `u64::MAX`.
pub fn velocity_sort_key(label: &str) -> u64 {
    label
        .split(|c: char| !c.is_ascii_digit())
        .find(|digits| !digits.is_empty())
        .map(|digits| digits.parse().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Velocity layers declared through the group idiom
///
/// ```text
/// <group> #include "Data/vel_01.txt" lovel=1 hivel=26 #include "Data/region_01.txt"
/// ```
///
/// maps `1-26` to `vel_01.txt`. Only the file name of the first include of
/// the group is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VelocityMapping {
    layers: BTreeMap<VelocityRange, String>,
}

#[derive(Default)]
struct GroupIdiom<'a> {
    includes: Vec<&'a str>,
    lovel: Option<i32>,
    hivel: Option<i32>,
}

impl VelocityMapping {
    /// Record every group idiom found in not-yet-expanded text.
    ///
    /// Returns the number of groups recorded.
    pub fn scan(&mut self, text: &str) -> usize {
        let mut found = 0;
        let mut group: Option<GroupIdiom<'_>> = None;

        for spanned in Lexer::new(text) {
            match spanned.token {
                Token::Header(name) => {
                    if let Some(done) = group.take() {
                        found += usize::from(self.record(done));
                    }
                    if name.eq_ignore_ascii_case("group") {
                        group = Some(GroupIdiom::default());
                    }
                }
                Token::Include { path } => {
                    if let Some(current) = group.as_mut() {
                        current.includes.push(path);
                    }
                }
                Token::Opcode { key, value } => {
                    if let Some(current) = group.as_mut() {
                        match key {
                            "lovel" => current.lovel = value.parse().ok(),
                            "hivel" => current.hivel = value.parse().ok(),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        if let Some(done) = group {
            found += usize::from(self.record(done));
        }
        found
    }

    fn record(&mut self, group: GroupIdiom<'_>) -> bool {
        let (Some(lovel), Some(hivel)) = (group.lovel, group.hivel) else {
            return false;
        };
        if group.includes.len() < 2 {
            return false;
        }

        let first = group.includes[0];
        let layer = Path::new(first)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(first);
        self.layers
            .insert(VelocityRange::new(lovel, hivel), layer.to_string());
        true
    }

    pub fn get(&self, lovel: i32, hivel: i32) -> Option<&str> {
        self.layers
            .get(&VelocityRange::new(lovel, hivel))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// `"lovel-hivel"` → layer file, for the output metadata.
    pub fn to_labels(&self) -> BTreeMap<String, String> {
        self.layers
            .iter()
            .map(|(range, layer)| (range.to_string(), layer.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn macros(defs: &[(&str, &str)]) -> MacroTable {
        let mut table = MacroTable::new();
        for (name, value) in defs {
            table.define(*name, *value);
        }
        table
    }

    #[test]
    fn test_standard_table() {
        let table = VelocityLayerTable::standard();
        assert_eq!(table.len(), 16);
        assert_eq!(table.lookup(1, 26), Some("VEL01"));
        assert_eq!(table.lookup(27, 34), Some("VEL02"));
        assert_eq!(table.lookup(121, 127), Some("VEL16"));
        assert_eq!(table.lookup(1, 27), None);
    }

    #[test]
    fn test_velocity_macro_selects_table() {
        let table = VelocityLayerTable::default();
        let with_vel = macros(&[("VEL", "v1")]);
        assert_eq!(resolve_label(&with_vel, &table, 27, 34), "VEL02");
        assert_eq!(resolve_label(&with_vel, &table, 10, 11), "10-11");
    }

    #[test]
    fn test_velocity_macro_wins_over_dynamics() {
        let table = VelocityLayerTable::default();
        let both = macros(&[("DYN", "PP"), ("VEL05", "x")]);
        assert_eq!(resolve_label(&both, &table, 44, 46), "VEL05");
    }

    #[test]
    fn test_dynamics_label_ignores_range() {
        let table = VelocityLayerTable::default();
        let dynamics = macros(&[("DYN", "PP")]);
        assert_eq!(resolve_label(&dynamics, &table, 1, 26), "PP");
        assert_eq!(resolve_label(&dynamics, &table, 0, 127), "PP");
    }

    #[test]
    fn test_numeric_fallback() {
        let table = VelocityLayerTable::default();
        assert_eq!(resolve_label(&MacroTable::new(), &table, 27, 34), "27-34");
    }

    #[test]
    fn test_custom_table() {
        let table = VelocityLayerTable::new(vec![VelocityLayer {
            lovel: 0,
            hivel: 63,
            name: "soft".to_string(),
        }]);
        assert_eq!(LayerStrategy::Table.resolve_label(&table, 0, 63), "soft");
        assert_eq!(LayerStrategy::Table.resolve_label(&table, 1, 26), "1-26");
    }

    #[test]
    fn test_sort_key() {
        assert_eq!(velocity_sort_key("VEL07"), 7);
        assert_eq!(velocity_sort_key("27-34"), 27);
        assert_eq!(velocity_sort_key("PP"), 0);
        assert_eq!(velocity_sort_key("layer 3 of 4"), 3);
        assert_eq!(velocity_sort_key("VEL99999999999999999999999"), u64::MAX);
        assert!(velocity_sort_key("x18446744073709551616") > velocity_sort_key("VEL16"));
    }

    #[test]
    fn test_dynamics_label_resolves_nested_macro() {
        let table = VelocityLayerTable::default();
        let nested = macros(&[("DYN", "$LEVEL"), ("LEVEL", "MF")]);
        assert_eq!(resolve_label(&nested, &table, 1, 26), "MF");

        let cyclic = macros(&[("DYN", "$DYN")]);
        assert_eq!(resolve_label(&cyclic, &table, 1, 26), "$DYN");
    }

    #[test]
    fn test_mapping_from_group_idiom() {
        let text = "<group> #include \"Data/vel_01.txt\" lovel=1 hivel=26 #include \"Data/region.txt\"\n\
                    <group> #include \"Data/vel_02.txt\"\nlovel=27 hivel=34\n#include \"Data/region.txt\"\n\
                    <group> lovel=35 hivel=36 #include \"Data/only_one.txt\"\n\
                    <region> sample=x.wav lovel=1 hivel=2";
        let mut mapping = VelocityMapping::default();
        assert_eq!(mapping.scan(text), 2);
        assert_eq!(mapping.get(1, 26), Some("vel_01.txt"));
        assert_eq!(mapping.get(27, 34), Some("vel_02.txt"));
        assert_eq!(mapping.get(35, 36), None);
        assert_eq!(mapping.to_labels().get("1-26").map(String::as_str), Some("vel_01.txt"));
    }

    #[test]
    fn test_mapping_header_is_case_insensitive() {
        let text = "<GROUP> #include \"Data/vel_03.txt\" lovel=44 hivel=46 #include \"Data/region.txt\"\n\
                    <Group> #include \"Data/vel_04.txt\" lovel=47 hivel=50 #include \"Data/region.txt\"";
        let mut mapping = VelocityMapping::default();
        assert_eq!(mapping.scan(text), 2);
        assert_eq!(mapping.get(44, 46), Some("vel_03.txt"));
        assert_eq!(mapping.get(47, 50), Some("vel_04.txt"));
    }
}
