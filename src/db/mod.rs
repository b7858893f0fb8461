mod functions;
mod schema;
mod views;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{params, types::ValueRef, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

use crate::error::ToolError;
use crate::guard::{GuardedQuery, LimitAction};
use crate::import::{IngestStats, Normalized};
use crate::models::*;

pub(crate) use views::{AccountTypeSummary, CategorySummary, MonthlySummary, OverallStats, Views};

/// The loaded ledger. Built once from normalized QIF data and read-only
/// afterwards; the SQL connection is the only part behind a lock.
pub(crate) struct Ledger {
    accounts: Vec<Account>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    /// Grouped by transaction id, in source order within a transaction.
    splits: Vec<Split>,
    views: Views,
    stats: IngestStats,
    conn: Mutex<Connection>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TransactionFilter {
    pub(crate) account_type: Option<AccountType>,
    pub(crate) date_from: Option<NaiveDate>,
    pub(crate) date_to: Option<NaiveDate>,
    /// Case-insensitive substring of the category name.
    pub(crate) category: Option<String>,
    /// Case-insensitive substring of the payee.
    pub(crate) payee: Option<String>,
    /// Case-insensitive substring of payee, memo or category.
    pub(crate) text: Option<String>,
    pub(crate) limit: Option<usize>,
    pub(crate) order: SortOrder,
}

impl TransactionFilter {
    fn matches(&self, txn: &Transaction) -> bool {
        fn contains(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        self.account_type.map_or(true, |t| txn.account_type == t)
            && self.date_from.map_or(true, |d| txn.date >= d)
            && self.date_to.map_or(true, |d| txn.date <= d)
            && self.category.as_deref().map_or(true, |c| {
                txn.category.as_deref().is_some_and(|name| contains(name, c))
            })
            && self.payee.as_deref().map_or(true, |p| contains(&txn.payee, p))
            && self.text.as_deref().map_or(true, |t| txn.matches_text(t))
    }
}

/// A transaction together with its splits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TransactionDetail {
    #[serde(flatten)]
    pub(crate) transaction: Transaction,
    pub(crate) splits: Vec<Split>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Period {
    #[default]
    Month,
    Category,
    Account,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Summaries {
    pub(crate) period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) monthly: Option<Vec<MonthlySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) categories: Option<Vec<CategorySummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) account_types: Option<Vec<AccountTypeSummary>>,
    pub(crate) statistics: OverallStats,
}

/// Rows returned by a guarded query, one value per column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct QueryResult {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<Vec<serde_json::Value>>,
    pub(crate) count: usize,
    /// The statement as executed, after limit injection or clamping.
    pub(crate) query: String,
    pub(crate) limit: LimitAction,
}

impl Ledger {
    pub(crate) fn build(normalized: Normalized) -> Result<Self> {
        let Normalized {
            accounts,
            categories,
            transactions,
            splits,
            stats,
        } = normalized;
        let views = Views::compute(&transactions)?;

        let mut conn =
            Connection::open_in_memory().context("Failed to open in-memory database")?;
        functions::register(&conn).context("Failed to register decimal aggregates")?;
        conn.execute_batch(schema::SCHEMA)
            .context("Failed to create ledger schema")?;

        populate(&mut conn, &accounts, &categories, &transactions, &splits, &views)
            .context("Failed to load ledger into SQLite")?;
        conn.execute_batch("PRAGMA query_only = ON;")
            .context("Failed to make the ledger read-only")?;

        let ledger = Self {
            accounts,
            categories,
            transactions,
            splits,
            views,
            stats,
            conn: Mutex::new(conn),
        };
        info!(
            "Ledger ready: {} accounts, {} categories, {} transactions, {} splits",
            ledger.accounts.len(),
            ledger.categories.len(),
            ledger.transactions.len(),
            ledger.splits.len()
        );
        Ok(ledger)
    }

    #[cfg(test)]
    pub(crate) fn from_qif(content: &str) -> Result<Self> {
        let normalized = crate::import::ingest(content, &crate::import::IngestOptions::default())?;
        Self::build(normalized)
    }

    // ── Accounts & categories ─────────────────────────────────

    pub(crate) fn accounts(&self) -> Vec<Account> {
        let mut accounts = self.accounts.clone();
        accounts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        accounts
    }

    pub(crate) fn categories(&self) -> Vec<Category> {
        let mut categories = self.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        categories
    }

    // ── Transactions ──────────────────────────────────────────

    fn splits_of(&self, transaction_id: i64) -> &[Split] {
        let start = self
            .splits
            .partition_point(|s| s.transaction_id < transaction_id);
        let end = self
            .splits
            .partition_point(|s| s.transaction_id <= transaction_id);
        &self.splits[start..end]
    }

    pub(crate) fn transactions(&self, filter: &TransactionFilter) -> Vec<TransactionDetail> {
        let mut matched: Vec<&Transaction> = self
            .transactions
            .iter()
            .filter(|t| filter.matches(t))
            .collect();
        match filter.order {
            SortOrder::NewestFirst => {
                matched.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)))
            }
            SortOrder::OldestFirst => {
                matched.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)))
            }
        }
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }

        matched
            .into_iter()
            .map(|t| TransactionDetail {
                transaction: t.clone(),
                splits: self.splits_of(t.id).to_vec(),
            })
            .collect()
    }

    // ── Aggregates ────────────────────────────────────────────

    pub(crate) fn views(&self) -> &Views {
        &self.views
    }

    /// The views selected by `period`, each capped at `max_rows`.
    pub(crate) fn summaries(&self, period: Period, max_rows: usize) -> Summaries {
        let monthly = matches!(period, Period::Month | Period::All);
        let categories = matches!(period, Period::Category | Period::All);
        let account_types = matches!(period, Period::Account | Period::All);

        Summaries {
            period,
            monthly: monthly.then(|| capped(&self.views.monthly, max_rows)),
            categories: categories.then(|| capped(&self.views.categories, max_rows)),
            account_types: account_types.then(|| capped(&self.views.account_types, max_rows)),
            statistics: self.views.overall.clone(),
        }
    }

    pub(crate) fn stats(&self) -> &IngestStats {
        &self.stats
    }

    // ── Guarded SQL ───────────────────────────────────────────

    pub(crate) fn execute(&self, query: &GuardedQuery) -> Result<QueryResult, ToolError> {
        let failed = |e: rusqlite::Error| ToolError::QueryExecutionFailed {
            message: e.to_string(),
        };

        // A panic elsewhere cannot leave the connection half-written; it is
        // query-only once built.
        let conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        let mut stmt = conn.prepare(&query.sql).map_err(failed)?;
        if !stmt.readonly() {
            return Err(ToolError::QueryExecutionFailed {
                message: "statement would modify the ledger".into(),
            });
        }

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut rows = stmt.query([]).map_err(failed)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(failed)? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(to_json(row.get_ref(i).map_err(failed)?));
            }
            out.push(values);
        }
        debug!("Query returned {} rows: {}", out.len(), query.sql);

        Ok(QueryResult {
            columns,
            count: out.len(),
            rows: out,
            query: query.sql.clone(),
            limit: query.limit_action,
        })
    }
}

fn populate(
    conn: &mut Connection,
    accounts: &[Account],
    categories: &[Category],
    transactions: &[Transaction],
    splits: &[Split],
    views: &Views,
) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO accounts (account_id, name, type, description, balance, credit_limit, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for a in accounts {
            stmt.execute(params![
                a.id,
                a.name,
                a.account_type.as_str(),
                a.description,
                a.balance.to_string(),
                a.credit_limit.map(|l| l.to_string()),
                a.note,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO categories (category_id, name, description, expense_category, income_category, tax_related, tax_schedule, parent)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for c in categories {
            stmt.execute(params![
                c.id,
                c.name,
                c.description,
                c.is_expense,
                c.is_income,
                c.is_tax_related,
                c.tax_schedule,
                c.parent,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO transactions (tx_id, account_id, account_type, date, payee, memo, amount, cleared, number, category, transfer_account, class)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        for t in transactions {
            stmt.execute(params![
                t.id,
                t.account_id,
                t.account_type.as_str(),
                t.date.to_string(),
                t.payee,
                t.memo,
                t.amount.to_string(),
                t.cleared,
                t.number,
                t.category,
                t.transfer_account,
                t.class,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO transaction_splits (split_id, tx_id, category, transfer_account, amount, memo)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for s in splits {
            stmt.execute(params![
                s.id,
                s.transaction_id,
                s.category,
                s.transfer_account,
                s.amount.to_string(),
                s.memo,
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO monthly_summaries (month, category, transaction_count, total_amount, avg_amount, min_amount, max_amount)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for m in &views.monthly {
            stmt.execute(params![
                m.month,
                m.category,
                m.transaction_count as i64,
                m.total_amount.to_string(),
                m.avg_amount.to_string(),
                m.min_amount.to_string(),
                m.max_amount.to_string(),
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO category_summaries (category, transaction_count, total_amount, avg_amount, first_transaction, last_transaction)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for c in &views.categories {
            stmt.execute(params![
                c.category,
                c.transaction_count as i64,
                c.total_amount.to_string(),
                c.avg_amount.to_string(),
                c.first_transaction.to_string(),
                c.last_transaction.to_string(),
            ])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO account_type_summaries (account_type, transaction_count, total_amount, avg_amount)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for a in &views.account_types {
            stmt.execute(params![
                a.account_type.as_str(),
                a.transaction_count as i64,
                a.total_amount.to_string(),
                a.avg_amount.to_string(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn capped<T: Clone>(rows: &[T], max_rows: usize) -> Vec<T> {
    rows.iter().take(max_rows).cloned().collect()
}

fn to_json(value: ValueRef<'_>) -> serde_json::Value {
    use serde_json::Value;
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(b.iter().map(|byte| format!("{byte:02x}")).collect()),
    }
}

#[cfg(test)]
mod tests;
