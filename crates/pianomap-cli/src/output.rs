//! JSON document output.

use std::fs;
use std::io::Write;
use std::path::Path;

use pianomap_sfz::Document;
use tempfile::NamedTempFile;

use crate::error::Result;

/// Pretty-printed JSON of a document, with a trailing newline.
pub fn to_json(document: &Document) -> Result<String> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    Ok(json)
}

/// Write `document` to `path`, creating the parent directory if needed.
///
/// The JSON goes to a temporary file next to `path` that only replaces it
/// once fully written, so a failure never leaves a partial document behind.
pub fn write_document(document: &Document, path: &Path) -> Result<()> {
    let json = to_json(document)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(json.as_bytes())?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
