//! Batch conversion of the configured instruments.

use std::path::PathBuf;

use anyhow::{Context, Result};
use pianomap_sfz::parse_instrument;

use crate::config::{Config, InstrumentEntry};
use crate::output::write_document;

/// Outcome of converting one instrument
#[derive(Debug)]
pub struct InstrumentReport {
    pub name: String,
    pub result: Result<ConvertedInstrument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedInstrument {
    pub output: PathBuf,
    pub keys_with_samples: usize,
    pub total_samples: usize,
}

/// Outcome of a whole batch, in configuration order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub instruments: Vec<InstrumentReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.instruments.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.instruments.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Convert every configured instrument
///
/// A failing instrument is logged and recorded in the report; the remaining
/// instruments are still converted.
pub fn run_batch(config: &Config) -> BatchReport {
    let mut report = BatchReport::default();

    for instrument in &config.instruments {
        log::info!("Processing {}...", instrument.name);
        let result = convert(config, instrument);
        match &result {
            Ok(converted) => log::info!(
                "Wrote {} ({} keys with samples, {} samples)",
                converted.output.display(),
                converted.keys_with_samples,
                converted.total_samples
            ),
            Err(e) => log::error!("Failed to convert {}: {:#}", instrument.name, e),
        }
        report.instruments.push(InstrumentReport {
            name: instrument.name.clone(),
            result,
        });
    }

    report
}

fn convert(config: &Config, instrument: &InstrumentEntry) -> Result<ConvertedInstrument> {
    let sfz_path = config.sfz_path(instrument);
    let profile = config.profile_for(instrument);
    let document = parse_instrument(&instrument.name, &sfz_path, &profile)?;

    let output = config.output_path(instrument);
    write_document(&document, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(ConvertedInstrument {
        output,
        keys_with_samples: document.keys_with_samples(),
        total_samples: document.total_samples(),
    })
}
