//! Region to key mapping.

use crate::notes::{PIANO_HIGH_KEY, PIANO_LOW_KEY};
use crate::parser::{RegionLogicOpcodes, RegionSection, Result, SfzFile, SfzOpcodes};
use crate::types::{KeyMap, KeyRange, SampleDescriptor};
use crate::velocity::{velocity_sort_key, VelocityLayerTable};

/// Key and velocity bounds of one region, defaults applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegionBounds {
    lokey: i32,
    hikey: i32,
    lovel: i32,
    hivel: i32,
    /// Parsed for completeness; nothing downstream uses it yet.
    #[allow(dead_code)]
    pitch_keycenter: i32,
}

impl RegionBounds {
    /// `lokey`/`hikey` fall back to `key=`, then to 0/127; velocities to 0/127.
    fn of(region: &RegionSection) -> Result<Self> {
        let key = region.key()?;
        let lokey = region.lokey()?.or(key).unwrap_or(0);
        let hikey = region.hikey()?.or(key).unwrap_or(127);
        let pitch_keycenter = region.pitch_keycenter()?.or(key).unwrap_or(lokey);
        Ok(Self {
            lokey,
            hikey,
            lovel: region.lovel()?.unwrap_or(0),
            hivel: region.hivel()?.unwrap_or(127),
            pitch_keycenter,
        })
    }

    fn misses_piano(&self) -> bool {
        self.lokey > i32::from(PIANO_HIGH_KEY) || self.hikey < i32::from(PIANO_LOW_KEY)
    }

    /// The part of the key range that lies on the piano.
    fn piano_keys(&self) -> std::ops::RangeInclusive<u8> {
        let low = self.lokey.max(i32::from(PIANO_LOW_KEY)) as u8;
        let high = self.hikey.min(i32::from(PIANO_HIGH_KEY)) as u8;
        low..=high
    }
}

/// Spread every region of `sfz` over the 88 piano keys
///
/// The result always holds all 88 keys. Regions without a `sample`, with
/// unparseable bounds, or whose key range misses the piano entirely are
/// dropped. Each key's samples end up stably sorted by the first number in
/// their velocity label, so regions sharing a sort key keep their document
/// order.
pub fn extract_keys(sfz: &SfzFile, layers: &VelocityLayerTable) -> KeyMap {
    let mut keys = KeyMap::piano();

    for region in &sfz.regions {
        let Some(sample) = region.sample() else {
            continue;
        };
        let bounds = match RegionBounds::of(region) {
            Ok(bounds) => bounds,
            Err(e) => {
                log::debug!("Dropping region {}: {}", sample, e);
                continue;
            }
        };
        if bounds.misses_piano() {
            continue;
        }

        let descriptor = SampleDescriptor {
            file: sample.to_string(),
            key_range: KeyRange {
                low: bounds.lokey,
                high: bounds.hikey,
            },
            velocity_range: region
                .layer_strategy
                .resolve_label(layers, bounds.lovel, bounds.hivel),
            volume: region.get_opcode_str("volume").map(str::to_string),
            tune: region.get_opcode_str("tune").map(str::to_string),
            label: region.get_opcode_str("region_label").map(str::to_string),
        };

        for note in bounds.piano_keys() {
            if let Some(entry) = keys.get_mut(note) {
                entry.samples.push(descriptor.clone());
            }
        }
    }

    for entry in keys.values_mut() {
        entry
            .samples
            .sort_by_key(|sample| velocity_sort_key(&sample.velocity_range));
    }

    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_sfz, MacroTable};

    fn keys_for(content: &str, macros: &MacroTable) -> KeyMap {
        extract_keys(&parse_sfz(content, macros), &VelocityLayerTable::standard())
    }

    fn files(keys: &KeyMap, note: u8) -> Vec<&str> {
        keys.get(note)
            .unwrap()
            .samples
            .iter()
            .map(|s| s.file.as_str())
            .collect()
    }

    #[test]
    fn test_always_88_keys() {
        let keys = keys_for("", &MacroTable::new());
        assert_eq!(keys.len(), 88);
        assert!(keys.values().all(|entry| entry.samples.is_empty()));
    }

    #[test]
    fn test_range_is_clipped_to_piano() {
        let keys = keys_for(
            "<region> sample=low.wav lokey=20 hikey=30\n\
             <region> sample=below.wav lokey=0 hikey=20",
            &MacroTable::new(),
        );
        assert!(files(&keys, 21).contains(&"low.wav"));
        assert!(files(&keys, 30).contains(&"low.wav"));
        assert!(files(&keys, 31).is_empty());
        assert!(keys.values().all(|entry| !entry
            .samples
            .iter()
            .any(|s| s.file == "below.wav")));

        let descriptor = &keys.get(21).unwrap().samples[0];
        assert_eq!(descriptor.key_range, KeyRange { low: 20, high: 30 });
    }

    #[test]
    fn test_region_above_piano_is_dropped() {
        let keys = keys_for("<region> sample=high.wav lokey=109", &MacroTable::new());
        assert_eq!(keys.values().map(|e| e.samples.len()).sum::<usize>(), 0);
    }

    #[test]
    fn test_defaults_cover_whole_piano() {
        let keys = keys_for("<region> sample=all.wav", &MacroTable::new());
        assert!(keys.values().all(|entry| entry.samples.len() == 1));
        let descriptor = &keys.get(60).unwrap().samples[0];
        assert_eq!(descriptor.key_range, KeyRange { low: 0, high: 127 });
        assert_eq!(descriptor.velocity_range, "0-127");
    }

    #[test]
    fn test_regions_without_sample_are_ignored() {
        let keys = keys_for(
            "<region> lokey=60 hikey=60\n<region> sample= key=60\n<region> sample=ok.wav key=60",
            &MacroTable::new(),
        );
        assert_eq!(files(&keys, 60), vec!["ok.wav"]);
    }

    #[test]
    fn test_key_shorthand_and_note_names() {
        let keys = keys_for(
            "<region> sample=key.wav key=60\n<region> sample=named.wav lokey=c4 hikey=c#4",
            &MacroTable::new(),
        );
        assert_eq!(files(&keys, 60), vec!["key.wav", "named.wav"]);
        assert_eq!(files(&keys, 61), vec!["named.wav"]);
        assert!(files(&keys, 59).is_empty());
    }

    #[test]
    fn test_unparseable_bounds_drop_region() {
        let keys = keys_for(
            "<region> sample=bad.wav lokey=sixty hikey=61\n<region> sample=good.wav key=61",
            &MacroTable::new(),
        );
        assert_eq!(files(&keys, 61), vec!["good.wav"]);
    }

    #[test]
    fn test_optional_fields() {
        let keys = keys_for(
            "<region> sample=a.wav key=60 volume=-6 tune=12 region_label=Soft A",
            &MacroTable::new(),
        );
        let descriptor = &keys.get(60).unwrap().samples[0];
        assert_eq!(descriptor.volume.as_deref(), Some("-6"));
        assert_eq!(descriptor.tune.as_deref(), Some("12"));
        assert_eq!(descriptor.label.as_deref(), Some("Soft A"));
    }

    #[test]
    fn test_velocity_table_labels_and_order() {
        let mut macros = MacroTable::new();
        macros.define("VEL", "x");
        let keys = keys_for(
            "<region> sample=v3.wav key=60 lovel=35 hivel=36\n\
             <region> sample=odd.wav key=60 lovel=10 hivel=11\n\
             <region> sample=v1.wav key=60 lovel=1 hivel=26\n\
             <region> sample=v2.wav key=60 lovel=27 hivel=34",
            &macros,
        );
        let entry = keys.get(60).unwrap();
        let labels: Vec<&str> = entry
            .samples
            .iter()
            .map(|s| s.velocity_range.as_str())
            .collect();
        assert_eq!(labels, vec!["VEL01", "VEL02", "VEL03", "10-11"]);
    }

    #[test]
    fn test_dynamics_labels_keep_document_order() {
        let keys = keys_for(
            "#define $DYN PP\n<region> sample=pp.wav key=60 lovel=1 hivel=60\n\
             #define $DYN MF\n<region> sample=mf.wav key=60 lovel=61 hivel=100\n\
             #define $DYN FF\n<region> sample=ff.wav key=60 lovel=101 hivel=127",
            &MacroTable::new(),
        );
        let entry = keys.get(60).unwrap();
        let labels: Vec<&str> = entry
            .samples
            .iter()
            .map(|s| s.velocity_range.as_str())
            .collect();
        assert_eq!(labels, vec!["PP", "MF", "FF"]);
        assert_eq!(files(&keys, 60), vec!["pp.wav", "mf.wav", "ff.wav"]);
    }

    #[test]
    fn test_numeric_labels_sort_by_low_velocity() {
        let keys = keys_for(
            "<region> sample=loud.wav key=60 lovel=100 hivel=127\n\
             <region> sample=soft.wav key=60 lovel=1 hivel=99",
            &MacroTable::new(),
        );
        assert_eq!(files(&keys, 60), vec!["soft.wav", "loud.wav"]);
    }
}
