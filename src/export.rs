//! CSV renderings of the ledger, served as read-only resources and by the
//! `export` subcommand.

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

use crate::db::{Ledger, TransactionFilter};

const TRANSACTIONS_HEADER: &[&str] = &[
    "Date",
    "Account Type",
    "Payee",
    "Amount",
    "Category",
    "Memo",
];

const SUMMARY_HEADER: &[&str] = &[
    "Category",
    "Transaction Count",
    "Total Amount",
    "Average Amount",
    "First Transaction",
    "Last Transaction",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Resource {
    /// Every transaction, newest first.
    Transactions,
    /// The per-category aggregate view.
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ResourceDefinition {
    pub(crate) uri: &'static str,
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    #[serde(rename = "mimeType")]
    pub(crate) mime_type: &'static str,
}

impl Resource {
    pub(crate) const ALL: [Resource; 2] = [Resource::Summary, Resource::Transactions];

    pub(crate) fn uri(self) -> &'static str {
        match self {
            Resource::Transactions => "quicken://transactions_export",
            Resource::Summary => "quicken://ledger_summary",
        }
    }

    pub(crate) fn from_uri(uri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.uri() == uri)
    }

    pub(crate) fn definition(self) -> ResourceDefinition {
        let (name, description) = match self {
            Resource::Transactions => ("Transactions Export", "All transactions in CSV format"),
            Resource::Summary => (
                "Ledger Summary",
                "Per-category totals for the whole ledger in CSV format",
            ),
        };
        ResourceDefinition {
            uri: self.uri(),
            name,
            description,
            mime_type: "text/csv",
        }
    }

    pub(crate) fn write(self, ledger: &Ledger, writer: impl Write) -> Result<()> {
        match self {
            Resource::Transactions => write_transactions_csv(ledger, writer),
            Resource::Summary => write_summary_csv(ledger, writer),
        }
    }

    pub(crate) fn render(self, ledger: &Ledger) -> Result<String> {
        let mut buf = Vec::new();
        self.write(ledger, &mut buf)?;
        String::from_utf8(buf).context("CSV output was not UTF-8")
    }
}

fn csv_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn write_transactions_csv(ledger: &Ledger, writer: impl Write) -> Result<()> {
    let mut csv = csv_writer(writer);
    csv.write_record(TRANSACTIONS_HEADER)
        .context("CSV write error")?;

    for detail in ledger.transactions(&TransactionFilter::default()) {
        let t = &detail.transaction;
        let category = match (&t.category, &t.transfer_account) {
            (Some(c), _) => c.clone(),
            (None, Some(account)) => format!("[{account}]"),
            (None, None) => String::new(),
        };
        csv.write_record([
            t.date.format("%Y-%m-%d").to_string(),
            t.account_type.as_str().to_string(),
            t.payee.clone(),
            t.amount.to_string(),
            category,
            t.memo.clone(),
        ])
        .context("CSV write error")?;
    }

    csv.flush().context("CSV flush error")?;
    Ok(())
}

fn write_summary_csv(ledger: &Ledger, writer: impl Write) -> Result<()> {
    let mut csv = csv_writer(writer);
    csv.write_record(SUMMARY_HEADER).context("CSV write error")?;

    for row in &ledger.views().categories {
        csv.write_record([
            row.category.clone(),
            row.transaction_count.to_string(),
            row.total_amount.to_string(),
            row.avg_amount.to_string(),
            row.first_transaction.format("%Y-%m-%d").to_string(),
            row.last_transaction.format("%Y-%m-%d").to_string(),
        ])
        .context("CSV write error")?;
    }

    csv.flush().context("CSV flush error")?;
    Ok(())
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
