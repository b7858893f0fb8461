use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::assembler::{Assembled, Record, Section};
use super::stats::{CategoryConflict, IngestStats, SplitMismatch};
use super::values::{parse_amount, parse_date, DateOrder};
use crate::models::{Account, AccountType, Category, Split, Transaction};

/// Largest tolerated gap between a transaction and the sum of its splits.
const SPLIT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Entities produced from one QIF file, ready to be loaded into the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Normalized {
    pub(crate) accounts: Vec<Account>,
    pub(crate) categories: Vec<Category>,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) splits: Vec<Split>,
    pub(crate) stats: IngestStats,
}

/// The `L`/`S` field: `Category[:Sub][/Class]` or `[Transfer Account][/Class]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CategoryRef {
    pub(crate) category: Option<String>,
    pub(crate) transfer: Option<String>,
    pub(crate) class: Option<String>,
}

impl CategoryRef {
    pub(crate) fn parse(raw: &str) -> Self {
        let (target, class) = match raw.split_once('/') {
            Some((t, c)) => (t.trim(), Some(c.trim()).filter(|c| !c.is_empty())),
            None => (raw.trim(), None),
        };

        let mut out = CategoryRef {
            class: class.map(str::to_string),
            ..CategoryRef::default()
        };
        if let Some(inner) = target.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            out.transfer = Some(inner.trim().to_string()).filter(|t| !t.is_empty());
        } else if !target.is_empty() {
            out.category = Some(target.to_string());
        }
        out
    }
}

/// Flags carried by an explicit category definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Kind {
    expense: bool,
    income: bool,
}

impl Kind {
    fn describe(self) -> &'static str {
        match (self.expense, self.income) {
            (true, true) => "expense+income",
            (true, false) => "expense",
            (false, true) => "income",
            (false, false) => "unflagged",
        }
    }
}

struct Normalizer {
    order: DateOrder,
    accounts: Vec<Account>,
    account_index: HashMap<(String, AccountType), usize>,
    categories: Vec<Category>,
    category_index: HashMap<String, usize>,
    /// Flags from the last explicit definition, per category slot.
    defined: Vec<Option<Kind>>,
    transactions: Vec<Transaction>,
    splits: Vec<Split>,
    /// Sum of absolute amounts accepted so far. Every balance and total
    /// over the accepted transactions is bounded by it.
    magnitude: Decimal,
    stats: IngestStats,
}

pub(crate) fn normalize(assembled: Assembled, order: DateOrder) -> Normalized {
    let mut n = Normalizer {
        order,
        accounts: Vec::new(),
        account_index: HashMap::new(),
        categories: Vec::new(),
        category_index: HashMap::new(),
        defined: Vec::new(),
        transactions: Vec::new(),
        splits: Vec::new(),
        magnitude: Decimal::ZERO,
        stats: IngestStats {
            skipped_lines: assembled.skipped_lines,
            records: assembled.records.len(),
            ..IngestStats::default()
        },
    };

    for record in &assembled.records {
        match &record.section {
            Section::AccountList => n.account_record(record),
            Section::Categories => n.category_record(record),
            Section::Transactions(account_type) => n.transaction_record(record, *account_type),
            Section::Other(name) => {
                debug!("Line {}: ignoring record in '{name}' section", record.line);
                n.stats.ignored_records += 1;
            }
        }
    }

    n.finish()
}

impl Normalizer {
    fn finish(mut self) -> Normalized {
        // Cannot overflow: bounded by `magnitude`.
        let mut balances: HashMap<i64, Decimal> = HashMap::new();
        for txn in &self.transactions {
            *balances.entry(txn.account_id).or_default() += txn.amount;
        }
        for account in &mut self.accounts {
            account.balance = balances.get(&account.id).copied().unwrap_or_default();
        }

        self.stats.accounts = self.accounts.len();
        self.stats.categories = self.categories.len();
        self.stats.transactions = self.transactions.len();
        self.stats.splits = self.splits.len();

        Normalized {
            accounts: self.accounts,
            categories: self.categories,
            transactions: self.transactions,
            splits: self.splits,
            stats: self.stats,
        }
    }

    // ── Accounts ──────────────────────────────────────────────

    fn resolve_account(&mut self, name: &str, account_type: AccountType) -> usize {
        let key = (name.to_string(), account_type);
        if let Some(&idx) = self.account_index.get(&key) {
            return idx;
        }
        let idx = self.accounts.len();
        self.accounts
            .push(Account::new(idx as i64 + 1, name.to_string(), account_type));
        self.account_index.insert(key, idx);
        idx
    }

    fn account_record(&mut self, record: &Record) {
        let Some(name) = record.value('N').filter(|n| !n.is_empty()) else {
            self.reject(record, "account record without a name".into());
            return;
        };

        let account_type = match record.value('T') {
            None | Some("") => AccountType::Bank,
            Some(t) => AccountType::from_qif(t).unwrap_or_else(|| {
                warn!("Line {}: unknown account type '{t}', using other-asset", record.line);
                AccountType::OtherAsset
            }),
        };

        let idx = self.resolve_account(name, account_type);
        let account = &mut self.accounts[idx];
        if let Some(d) = record.value('D').filter(|d| !d.is_empty()) {
            account.description = d.to_string();
        }
        if let Some(a) = record.value('A').filter(|a| !a.is_empty()) {
            account.note = a.to_string();
        }
        if let Some(l) = record.value('L').filter(|l| !l.is_empty()) {
            match parse_amount(l) {
                Some(limit) => account.credit_limit = Some(limit),
                None => warn!("Line {}: ignoring invalid credit limit '{l}'", record.line),
            }
        }
    }

    // ── Categories ────────────────────────────────────────────

    fn resolve_category(&mut self, name: &str) -> usize {
        let key = name.to_lowercase();
        if let Some(&idx) = self.category_index.get(&key) {
            return idx;
        }

        if let Some(parent) = Category::parent_of(name) {
            self.resolve_category(&parent);
        }

        let idx = self.categories.len();
        self.categories
            .push(Category::new(idx as i64 + 1, name.to_string()));
        self.defined.push(None);
        self.category_index.insert(key, idx);
        idx
    }

    /// The name a reference resolves to, spelled as first seen.
    fn canonical_category(&mut self, name: &str) -> String {
        let idx = self.resolve_category(name);
        self.categories[idx].name.clone()
    }

    fn category_record(&mut self, record: &Record) {
        let Some(name) = record.value('N').filter(|n| !n.is_empty()) else {
            self.reject(record, "category record without a name".into());
            return;
        };

        let idx = self.resolve_category(name);
        let kind = Kind {
            expense: record.has('E'),
            income: record.has('I'),
        };

        if let Some(previous) = self.defined[idx] {
            if previous != kind {
                let category = &self.categories[idx];
                warn!(
                    "Line {}: category '{category}' redefined as {} (was {})",
                    record.line,
                    kind.describe(),
                    previous.describe()
                );
                self.stats.category_conflicts.push(CategoryConflict {
                    category: category.name.clone(),
                    previous: previous.describe().to_string(),
                    current: kind.describe().to_string(),
                    line: record.line,
                });
            }
        }
        self.defined[idx] = Some(kind);

        let category = &mut self.categories[idx];
        category.is_expense = kind.expense;
        category.is_income = kind.income;
        category.is_tax_related = category.is_tax_related || record.has('T');
        if let Some(d) = record.value('D').filter(|d| !d.is_empty()) {
            category.description = d.to_string();
        }
        if let Some(r) = record.value('R').filter(|r| !r.is_empty()) {
            category.tax_schedule = Some(r.to_string());
        }
    }

    // ── Transactions ──────────────────────────────────────────

    fn transaction_record(&mut self, record: &Record, account_type: AccountType) {
        let date = match record.value('D') {
            None | Some("") => return self.reject(record, "missing date".into()),
            Some(raw) => match parse_date(raw, self.order) {
                Some(d) => d,
                None => return self.reject(record, format!("invalid date '{raw}'")),
            },
        };

        // `U` duplicates `T` in newer exports; only fall back to it.
        let amount = match record.value('T').or_else(|| record.value('U')) {
            None | Some("") => return self.reject(record, "missing amount".into()),
            Some(raw) => match parse_amount(raw) {
                Some(a) => a,
                None => return self.reject(record, format!("invalid amount '{raw}'")),
            },
        };

        let mut split_amounts = Vec::with_capacity(record.splits.len());
        for split in &record.splits {
            match split.amount.as_deref() {
                None | Some("") => split_amounts.push(Decimal::ZERO),
                Some(raw) => match parse_amount(raw) {
                    Some(a) => split_amounts.push(a),
                    None => {
                        return self.reject(record, format!("invalid split amount '{raw}'"));
                    }
                },
            }
        }

        let Some(split_total) = split_amounts
            .iter()
            .try_fold(Decimal::ZERO, |total, a| total.checked_add(*a))
        else {
            return self.reject(record, "split amounts overflow".into());
        };
        let Some(magnitude) = self.magnitude.checked_add(amount.abs()) else {
            return self.reject(record, format!("amount {amount} overflows the ledger totals"));
        };
        self.magnitude = magnitude;

        let account_name = record
            .account
            .clone()
            .unwrap_or_else(|| account_type.label().to_string());
        let account_idx = self.resolve_account(&account_name, account_type);
        let account_id = self.accounts[account_idx].id;

        let target = record.value('L').map(CategoryRef::parse).unwrap_or_default();
        let category = target.category.as_deref().map(|name| self.canonical_category(name));

        let id = self.transactions.len() as i64 + 1;
        self.transactions.push(Transaction {
            id,
            account_id,
            account_type,
            date,
            payee: record.value('P').unwrap_or_default().to_string(),
            memo: record.value('M').unwrap_or_default().to_string(),
            amount,
            cleared: record.value('C').unwrap_or_default().to_string(),
            number: record.value('N').unwrap_or_default().to_string(),
            category,
            transfer_account: target.transfer,
            class: target.class,
        });

        for (split, split_amount) in record.splits.iter().zip(split_amounts.iter()) {
            let target = split
                .category
                .as_deref()
                .map(CategoryRef::parse)
                .unwrap_or_default();
            let category = target.category.as_deref().map(|name| self.canonical_category(name));
            self.splits.push(Split {
                id: self.splits.len() as i64 + 1,
                transaction_id: id,
                category,
                transfer_account: target.transfer,
                amount: *split_amount,
                memo: split.memo.clone().unwrap_or_default(),
            });
        }

        if !split_amounts.is_empty() {
            let mismatched = amount
                .checked_sub(split_total)
                .map_or(true, |gap| gap.abs() > SPLIT_TOLERANCE);
            if mismatched {
                warn!(
                    "Line {}: transaction {id} amount {amount} does not match split total {split_total}",
                    record.line
                );
                self.stats.split_mismatches.push(SplitMismatch {
                    transaction_id: id,
                    amount,
                    split_total,
                });
            }
        }
    }

    fn reject(&mut self, record: &Record, reason: String) {
        warn!("Line {}: skipping record: {reason}", record.line);
        self.stats.record_malformed(record.line, reason);
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
