//! Per-parse state.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::parser::error::Error;
use crate::parser::macros::MacroTable;
use crate::parser::path_utils::{absolute_path, base_dir_of};
use crate::velocity::VelocityMapping;

/// Mutable state of one top-level instrument parse
///
/// A fresh context is built for every instrument and threaded explicitly
/// through preprocessing and parsing, so nothing leaks from one instrument to
/// the next and independent instruments can be parsed on separate threads.
#[derive(Debug, Default)]
pub struct ParseContext {
    /// Directory `#include` paths are resolved against.
    pub base_dir: PathBuf,
    /// Macros discovered so far; only ever grows during a parse.
    pub macros: MacroTable,
    /// Absolute paths of every file expanded so far, the root included.
    pub visited: HashSet<PathBuf>,
    /// Velocity layers declared through the `<group> #include` idiom.
    pub velocity_mapping: VelocityMapping,
    /// Non-fatal problems (missing, circular or unreadable includes).
    pub diagnostics: Vec<Error>,
}

impl ParseContext {
    /// Context for source text that does not come from a file.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Context for a root SFZ file, which counts as already visited.
    pub fn for_root(sfz_path: &Path) -> Self {
        let mut ctx = Self::new(base_dir_of(sfz_path));
        ctx.visited.insert(absolute_path(sfz_path));
        ctx
    }

    pub fn missing_includes(&self) -> impl Iterator<Item = &Path> {
        self.diagnostics.iter().filter_map(|e| match e {
            Error::MissingInclude(path) => Some(path.as_path()),
            _ => None,
        })
    }

    pub fn circular_includes(&self) -> impl Iterator<Item = &Path> {
        self.diagnostics.iter().filter_map(|e| match e {
            Error::CircularInclude(path) => Some(path.as_path()),
            _ => None,
        })
    }
}
