//! SFZ piano instruments mapped to per-key sample lists.
//!
//! This crate turns an SFZ instrument definition into a document that lists,
//! for every key of an 88-key piano (MIDI 21 to 108), the samples covering
//! that key ordered from soft to loud:
//! - Preprocessing: comment stripping, `#define` macros and recursive
//!   `#include` expansion with cycle avoidance
//! - Section parsing with `<global>`/`<master>`/`<group>` inheritance
//! - Velocity layer naming (layer table, `$DYN` label or numeric range)
//! - Region expansion over the piano keys
//!
//! # Architecture
//!
//! All state of one parse lives in a [`parser::ParseContext`] created for that
//! parse, so independent instruments can be parsed concurrently. Facts the
//! SFZ file cannot provide come from an [`InstrumentProfile`].
//!
//! # Example
//!
//! ```no_run
//! use pianomap_sfz::{parse_instrument, InstrumentProfile};
//!
//! let document = parse_instrument("my_piano", "path/to/piano.sfz", &InstrumentProfile::default())?;
//! let c4 = document.keys.get(60).expect("every piano key is present");
//! for sample in &c4.samples {
//!     println!("{} ({})", sample.file, sample.velocity_range);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod extract;
pub mod loader;
pub mod metadata;
pub mod notes;
pub mod parser;
pub mod profile;
pub mod types;
pub mod velocity;

pub use extract::extract_keys;
pub use loader::{parse_instrument, parse_instrument_source, parse_instrument_str};
pub use metadata::{extract_description, ControlInfo};
pub use profile::{builtin_profile, builtin_profiles, InstrumentProfile};
pub use types::*;
pub use velocity::{LayerStrategy, VelocityLayer, VelocityLayerTable, VelocityMapping};
