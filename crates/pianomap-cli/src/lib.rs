//! pianomap - SFZ pianos to per-key JSON sample maps
//!
//! Drives [`pianomap_sfz`] over a list of instruments:
//!
//! - TOML configuration with instruments, output directory and profiles
//! - Batch conversion that keeps going when one instrument fails
//! - JSON output written through a temporary file
//!
//! # Usage as a Library
//!
//! ```no_run
//! use pianomap_cli::{run_batch, Config};
//!
//! let config = Config::load_or_default();
//! let report = run_batch(&config);
//! println!("{} converted, {} failed", report.succeeded(), report.failed());
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod output;

// Re-export main types
pub use batch::{run_batch, BatchReport, ConvertedInstrument, InstrumentReport};
pub use config::{Config, InstrumentEntry};
pub use error::{Error, Result};
pub use output::{to_json, write_document};
