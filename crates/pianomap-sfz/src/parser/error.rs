use thiserror::Error;
use std::path::PathBuf;
use std::io;

/// Errors that can occur while preprocessing and parsing SFZ text
///
/// Only a few of these are ever fatal. The include resolver records
/// `MissingInclude`, `CircularInclude` and `IO` as non-fatal diagnostics on the
/// parse context and keeps going, so a broken include costs samples but never
/// the whole instrument.
///
/// # Common SFZ Errors
///
/// - Missing include files: paths in `#include` are resolved against the
///   directory of the root `.sfz` file, not the including file
/// - Include cycles: a file that (directly or indirectly) includes itself
/// - Invalid key values: `lokey=foo` is neither a number nor a note name
#[derive(Error, Debug)]
pub enum Error {
    /// Input/Output error when reading files
    ///
    /// This occurs when an SFZ or include file exists but cannot be read,
    /// for example because of permissions or invalid UTF-8.
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Root SFZ file not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// An `#include` directive pointing at a file that does not exist
    ///
    /// A `// Missing include: ...` placeholder is spliced in its place.
    #[error("Include file not found: {0}")]
    MissingInclude(PathBuf),

    /// An `#include` of a file already expanded in this parse
    ///
    /// A `// Circular include avoided: ...` placeholder is spliced in its place.
    #[error("Circular include avoided: {0}")]
    CircularInclude(PathBuf),

    /// Invalid opcode value for a particular type
    ///
    /// For example `hikey=foo`: key opcodes accept MIDI numbers or note
    /// names, velocity opcodes only numbers.
    #[error("Invalid value '{0}' for type {1}")]
    InvalidOpcodeValue(String, String),
}
