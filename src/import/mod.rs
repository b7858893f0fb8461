mod assembler;
mod normalize;
mod stats;
mod tokenizer;
mod values;

use log::{info, warn};
use std::path::Path;

use crate::error::IngestError;

pub(crate) use normalize::Normalized;
pub(crate) use stats::IngestStats;
pub(crate) use values::DateOrder;

/// Files above this size still load, with a warning.
const LARGE_FILE_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub(crate) struct IngestOptions {
    pub(crate) date_order: DateOrder,
    /// Above this share of malformed records the whole load fails.
    pub(crate) max_malformed_ratio: f64,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            date_order: DateOrder::MonthFirst,
            max_malformed_ratio: 0.5,
        }
    }
}

/// Read a QIF file. Bytes that are not UTF-8 are replaced rather than
/// failing the load.
pub(crate) fn read_qif(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.len() > LARGE_FILE_BYTES {
        warn!(
            "Large QIF file: {:.1}MB",
            bytes.len() as f64 / (1024.0 * 1024.0)
        );
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Tokenize, assemble and normalize QIF text in one pass.
pub(crate) fn ingest(content: &str, options: &IngestOptions) -> Result<Normalized, IngestError> {
    if content.trim().is_empty() {
        return Err(IngestError::Empty);
    }

    let mut assembler = assembler::Assembler::new();
    for line in tokenizer::tokenize(content) {
        assembler.feed(line);
    }
    let normalized = normalize::normalize(assembler.finish(), options.date_order);

    let stats = &normalized.stats;
    if stats.malformed_ratio() > options.max_malformed_ratio {
        return Err(IngestError::TooManyMalformed {
            malformed: stats.malformed_records,
            attempted: stats.records,
            limit: options.max_malformed_ratio * 100.0,
        });
    }

    info!(
        "Parsed {} accounts, {} categories, {} transactions, {} splits ({} malformed, {} skipped lines)",
        stats.accounts,
        stats.categories,
        stats.transactions,
        stats.splits,
        stats.malformed_records,
        stats.skipped_lines
    );
    Ok(normalized)
}

pub(crate) fn ingest_file(path: &Path, options: &IngestOptions) -> Result<Normalized, IngestError> {
    info!("Parsing QIF file: {}", path.display());
    let content = read_qif(path)?;
    ingest(&content, options)
}
