use rust_decimal::Decimal;
use serde::Serialize;

/// Reasons kept verbatim; anything past this is only counted.
pub(crate) const MAX_REPORTED_PROBLEMS: usize = 100;

/// What an ingestion run produced and what it had to skip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct IngestStats {
    pub(crate) accounts: usize,
    pub(crate) categories: usize,
    pub(crate) transactions: usize,
    pub(crate) splits: usize,
    /// Terminated records handed to the normalizer, of any section.
    pub(crate) records: usize,
    pub(crate) malformed_records: usize,
    pub(crate) skipped_lines: usize,
    pub(crate) ignored_records: usize,
    pub(crate) malformed: Vec<MalformedRecord>,
    pub(crate) split_mismatches: Vec<SplitMismatch>,
    pub(crate) category_conflicts: Vec<CategoryConflict>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct MalformedRecord {
    pub(crate) line: usize,
    pub(crate) reason: String,
}

/// A split transaction whose parts do not add up to its total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SplitMismatch {
    pub(crate) transaction_id: i64,
    pub(crate) amount: Decimal,
    pub(crate) split_total: Decimal,
}

/// Two category definitions that disagree on expense/income. The later one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct CategoryConflict {
    pub(crate) category: String,
    pub(crate) previous: String,
    pub(crate) current: String,
    pub(crate) line: usize,
}

impl IngestStats {
    pub(crate) fn record_malformed(&mut self, line: usize, reason: String) {
        self.malformed_records += 1;
        if self.malformed.len() < MAX_REPORTED_PROBLEMS {
            self.malformed.push(MalformedRecord { line, reason });
        }
    }

    /// Share of records that had to be rejected, in `0.0..=1.0`.
    pub(crate) fn malformed_ratio(&self) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            self.malformed_records as f64 / self.records as f64
        }
    }
}
