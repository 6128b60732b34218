//! SFZ preprocessor and section parser
//!
//! Turns SFZ source text into an [`SfzFile`] in two steps: [`preprocess`]
//! strips comments, expands `#include`s and substitutes `#define` macros,
//! then [`parse_sfz`] groups the flattened opcodes into control and region
//! sections.

mod context;
mod error;
mod include;
pub mod lexer;
pub mod macros;
pub mod opcodes;
mod parse;
pub mod path_utils;
mod types;

pub use context::ParseContext;
pub use error::Error;
pub use include::{expand_includes, preprocess};
pub use lexer::{strip_comments, Lexer, Spanned, Token};
pub use macros::MacroTable;
pub use opcodes::{MidiKey, OpcodeValue, RegionLogicOpcodes, SfzOpcodes};
pub use parse::parse_sfz;
pub use path_utils::{normalize_path, resolve_include_path};
pub use types::{RegionSection, SfzFile, SfzSection, SfzSectionType};

pub type Result<T> = std::result::Result<T, Error>;

/// Preprocess and parse SFZ source text in one go
///
/// Includes are resolved against `ctx.base_dir`; diagnostics and the final
/// macro table are left in `ctx`.
pub fn parse_sfz_str(source: &str, ctx: &mut ParseContext) -> SfzFile {
    let flattened = preprocess(source, ctx);
    parse_sfz(&flattened, &ctx.macros)
}
