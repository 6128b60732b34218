//! SFZ Opcodes
//!
//! Typed access to the handful of opcodes the key mapper cares about.
//! Opcodes are `key=value` pairs; all values are strings in the file and are
//! converted on access.
//!
//! # Example SFZ region
//!
//! ```text
//! <group>
//! lovel=27
//! hivel=34
//!
//! <region>
//! sample=Samples/C4v2.flac
//! lokey=59 hikey=61 pitch_keycenter=60
//! volume=-2 tune=5
//! ```
//!
//! In this example the region inherits its velocity range from the group and
//! declares its own key range, root key and mix adjustments.

use crate::notes::parse_note_name;
use crate::parser::error::Error;

type Result<T> = std::result::Result<T, Error>;

/// Trait for parsing opcode values
///
/// SFZ values can be numbers, note names or free text; each implementation
/// accepts the spellings valid for its type.
pub trait OpcodeValue: Sized {
    /// Parse an opcode value from string
    fn parse_opcode(s: &str) -> Result<Self>;
}

impl OpcodeValue for String {
    fn parse_opcode(s: &str) -> Result<Self> {
        Ok(s.to_string())
    }
}

impl OpcodeValue for i32 {
    /// Parse an integer opcode value
    ///
    /// ```text
    /// lovel=27
    /// hivel=34
    /// ```
    fn parse_opcode(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i32>()
            .map_err(|_| Error::InvalidOpcodeValue(s.to_string(), "integer".to_string()))
    }
}

/// A MIDI key given either as a number or as a note name
///
/// ```text
/// lokey=21     // A0
/// hikey=c#4    // 61
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidiKey(pub i32);

impl OpcodeValue for MidiKey {
    fn parse_opcode(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i32>()
            .ok()
            .or_else(|| parse_note_name(s))
            .map(MidiKey)
            .ok_or_else(|| Error::InvalidOpcodeValue(s.to_string(), "MIDI key".to_string()))
    }
}

/// Trait for type-safe access to SFZ opcodes
///
/// `get_opcode` distinguishes a missing opcode (`Ok(None)`) from one that is
/// present but unparseable (`Err`), so callers can apply defaults to the
/// former and reject the latter.
pub trait SfzOpcodes {
    /// Get an opcode value as a string
    fn get_opcode_str(&self, name: &str) -> Option<&str>;

    /// Get a typed opcode value
    fn get_opcode<T: OpcodeValue>(&self, name: &str) -> Result<Option<T>> {
        self.get_opcode_str(name)
            .map(T::parse_opcode)
            .transpose()
    }
}

/// Opcodes that decide which keys and velocities a region answers to
pub trait RegionLogicOpcodes: SfzOpcodes {
    /// Sample file of the region (`sample=`), if present and non-empty
    fn sample(&self) -> Option<&str> {
        self.get_opcode_str("sample").filter(|s| !s.is_empty())
    }

    /// Lowest key of the range (`lokey=`)
    fn lokey(&self) -> Result<Option<i32>> {
        Ok(self.get_opcode::<MidiKey>("lokey")?.map(|k| k.0))
    }

    /// Highest key of the range (`hikey=`)
    fn hikey(&self) -> Result<Option<i32>> {
        Ok(self.get_opcode::<MidiKey>("hikey")?.map(|k| k.0))
    }

    /// Single key shorthand (`key=`), equivalent to lokey = hikey = pitch_keycenter
    fn key(&self) -> Result<Option<i32>> {
        Ok(self.get_opcode::<MidiKey>("key")?.map(|k| k.0))
    }

    /// Root key of the sample (`pitch_keycenter=`)
    fn pitch_keycenter(&self) -> Result<Option<i32>> {
        Ok(self.get_opcode::<MidiKey>("pitch_keycenter")?.map(|k| k.0))
    }

    /// Lowest velocity (`lovel=`)
    fn lovel(&self) -> Result<Option<i32>> {
        self.get_opcode("lovel")
    }

    /// Highest velocity (`hivel=`)
    fn hivel(&self) -> Result<Option<i32>> {
        self.get_opcode("hivel")
    }
}

impl<T: SfzOpcodes> RegionLogicOpcodes for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    impl SfzOpcodes for HashMap<String, String> {
        fn get_opcode_str(&self, name: &str) -> Option<&str> {
            self.get(name).map(String::as_str)
        }
    }

    fn opcodes(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_vs_invalid() {
        let region = opcodes(&[("lovel", "soft")]);
        assert!(region.hivel().unwrap().is_none());
        assert!(matches!(region.lovel(), Err(Error::InvalidOpcodeValue(_, _))));
    }

    #[test]
    fn test_keys_accept_note_names() {
        let region = opcodes(&[("lokey", "a0"), ("hikey", "108"), ("key", "c#4")]);
        assert_eq!(region.lokey().unwrap(), Some(21));
        assert_eq!(region.hikey().unwrap(), Some(108));
        assert_eq!(region.key().unwrap(), Some(61));
    }

    #[test]
    fn test_empty_sample_counts_as_missing() {
        assert_eq!(opcodes(&[("sample", "")]).sample(), None);
        assert_eq!(opcodes(&[("sample", "a.wav")]).sample(), Some("a.wav"));
    }
}
