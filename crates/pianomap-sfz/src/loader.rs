//! SFZ instrument loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::extract::extract_keys;
use crate::metadata::{build_metadata, extract_description};
use crate::parser::{parse_sfz_str, Error, ParseContext};
use crate::profile::InstrumentProfile;
use crate::types::Document;

/// Build the per-key document of an SFZ instrument.
///
/// Missing, unreadable and circular includes only reduce what ends up in the
/// document (each is logged); the only failure is a root file that cannot be
/// read.
///
/// # Arguments
///
/// * `name` - Instrument name, reported as `instrumentName`
/// * `sfz_path` - Path to the root SFZ file; includes resolve against its directory
/// * `profile` - File extension, layer table and extra metadata for this instrument
///
/// # Example
///
/// ```no_run
/// use pianomap_sfz::{builtin_profile, parse_instrument};
///
/// let profile = builtin_profile("salamander").unwrap_or_default();
/// let document = parse_instrument(
///     "salamander",
///     "data/salamander/Salamander Grand Piano V3.sfz",
///     &profile,
/// )?;
/// println!("{} samples", document.total_samples());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_instrument<P: AsRef<Path>>(
    name: &str,
    sfz_path: P,
    profile: &InstrumentProfile,
) -> Result<Document> {
    let sfz_path = sfz_path.as_ref();
    if !sfz_path.is_file() {
        return Err(Error::FileNotFound(sfz_path.to_path_buf()).into());
    }

    log::info!("Parsing SFZ instrument '{}' from {}", name, sfz_path.display());

    let source = fs::read_to_string(sfz_path)
        .with_context(|| format!("Failed to read SFZ file: {}", sfz_path.display()))?;

    let document = parse_instrument_source(name, &source, sfz_path, profile);

    log::info!(
        "Instrument '{}': {} keys with samples, {} samples total",
        name,
        document.keys_with_samples(),
        document.total_samples()
    );
    Ok(document)
}

/// Build a document from the in-memory source of the SFZ file at `sfz_path`.
///
/// Includes resolve against the file's directory, and an include that leads
/// back to `sfz_path` itself becomes a circular-include placeholder.
pub fn parse_instrument_source<P: AsRef<Path>>(
    name: &str,
    source: &str,
    sfz_path: P,
    profile: &InstrumentProfile,
) -> Document {
    let mut ctx = ParseContext::for_root(sfz_path.as_ref());
    build_document(name, source, &mut ctx, profile)
}

/// Build a document from SFZ source that is already in memory.
///
/// `base_dir` is the directory `#include` paths are resolved against. The
/// source has no file of its own, so an include chain that reaches the file
/// the source was read from splices it in once more before the cycle is
/// cut; use [`parse_instrument_source`] when that path is known.
pub fn parse_instrument_str<P: AsRef<Path>>(
    name: &str,
    source: &str,
    base_dir: P,
    profile: &InstrumentProfile,
) -> Document {
    let mut ctx = ParseContext::new(base_dir.as_ref());
    build_document(name, source, &mut ctx, profile)
}

fn build_document(
    name: &str,
    source: &str,
    ctx: &mut ParseContext,
    profile: &InstrumentProfile,
) -> Document {
    let sfz = parse_sfz_str(source, ctx);
    log::debug!(
        "Instrument '{}': {} macros, {} regions",
        name,
        ctx.macros.len(),
        sfz.regions.len()
    );
    if !ctx.diagnostics.is_empty() {
        log::info!(
            "Instrument '{}': {} include problem(s) while preprocessing",
            name,
            ctx.diagnostics.len()
        );
    }

    Document {
        description: extract_description(source),
        metadata: build_metadata(name, sfz.control.as_ref(), &ctx.velocity_mapping, profile),
        keys: extract_keys(&sfz, &profile.layer_table()),
    }
}
