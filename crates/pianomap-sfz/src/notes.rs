//! MIDI note numbers and note names.

use std::ops::RangeInclusive;

/// Lowest key of an 88-key piano (A0).
pub const PIANO_LOW_KEY: u8 = 21;

/// Highest key of an 88-key piano (C8).
pub const PIANO_HIGH_KEY: u8 = 108;

/// Number of keys on a piano.
pub const PIANO_KEY_COUNT: usize = 88;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// All piano keys, A0 through C8.
pub fn piano_keys() -> RangeInclusive<u8> {
    PIANO_LOW_KEY..=PIANO_HIGH_KEY
}

/// Convert a MIDI note number to a note name (60 → "C4")
pub fn note_name(note: u8) -> String {
    let octave = (note / 12) as i8 - 1;
    let name = NOTE_NAMES[(note % 12) as usize];
    format!("{}{}", name, octave)
}

/// Parse a note name such as `c4`, `F#2`, `eb3` or `a-1` into a MIDI number
///
/// Uses the same octave convention as [`note_name`] (C4 = 60). The result is
/// not range-checked.
pub fn parse_note_name(name: &str) -> Option<i32> {
    let mut chars = name.trim().chars();
    let semitone = match chars.next()?.to_ascii_lowercase() {
        'c' => 0,
        'd' => 2,
        'e' => 4,
        'f' => 5,
        'g' => 7,
        'a' => 9,
        'b' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (accidental, octave) = if let Some(octave) = rest.strip_prefix('#') {
        (1, octave)
    } else if let Some(octave) = rest.strip_prefix('b') {
        (-1, octave)
    } else {
        (0, rest)
    };

    let octave: i32 = octave.parse().ok()?;
    Some((octave + 1) * 12 + semitone + accidental)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(21), "A0");
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(61), "C#4");
        assert_eq!(note_name(108), "C8");
        assert_eq!(note_name(0), "C-1");
    }

    #[test]
    fn test_piano_keys() {
        assert_eq!(piano_keys().count(), PIANO_KEY_COUNT);
    }

    #[test]
    fn test_parse_note_name() {
        assert_eq!(parse_note_name("c4"), Some(60));
        assert_eq!(parse_note_name("A0"), Some(21));
        assert_eq!(parse_note_name("F#2"), Some(42));
        assert_eq!(parse_note_name("eb3"), Some(51));
        assert_eq!(parse_note_name("c-1"), Some(0));
        assert_eq!(parse_note_name("h3"), None);
        assert_eq!(parse_note_name("c"), None);
        assert_eq!(parse_note_name("60"), None);
    }
}
