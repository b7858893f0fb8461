use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{AccountType, Transaction};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MonthlySummary {
    pub(crate) month: String,
    pub(crate) category: Option<String>,
    pub(crate) transaction_count: usize,
    pub(crate) total_amount: Decimal,
    pub(crate) avg_amount: Decimal,
    pub(crate) min_amount: Decimal,
    pub(crate) max_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct CategorySummary {
    pub(crate) category: String,
    pub(crate) transaction_count: usize,
    pub(crate) total_amount: Decimal,
    pub(crate) avg_amount: Decimal,
    pub(crate) first_transaction: NaiveDate,
    pub(crate) last_transaction: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct AccountTypeSummary {
    pub(crate) account_type: AccountType,
    pub(crate) transaction_count: usize,
    pub(crate) total_amount: Decimal,
    pub(crate) avg_amount: Decimal,
}

/// Whole-ledger figures, returned with every summary request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct OverallStats {
    pub(crate) total_transactions: usize,
    pub(crate) unique_categories: usize,
    pub(crate) unique_account_types: usize,
    pub(crate) unique_payees: usize,
    pub(crate) earliest_date: Option<NaiveDate>,
    pub(crate) latest_date: Option<NaiveDate>,
    pub(crate) total_amount: Decimal,
    pub(crate) total_income: Decimal,
    pub(crate) total_expenses: Decimal,
    pub(crate) transfer_count: usize,
}

/// Aggregates computed once when the store is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Views {
    pub(crate) monthly: Vec<MonthlySummary>,
    pub(crate) categories: Vec<CategorySummary>,
    pub(crate) account_types: Vec<AccountTypeSummary>,
    pub(crate) overall: OverallStats,
}

#[derive(Default)]
struct Totals {
    count: usize,
    total: Decimal,
    min: Option<Decimal>,
    max: Option<Decimal>,
    first: Option<NaiveDate>,
    last: Option<NaiveDate>,
}

impl Totals {
    fn add(&mut self, txn: &Transaction) -> Result<()> {
        self.count += 1;
        self.total = checked_total(self.total, txn)?;
        self.min = Some(self.min.map_or(txn.amount, |m| m.min(txn.amount)));
        self.max = Some(self.max.map_or(txn.amount, |m| m.max(txn.amount)));
        self.first = Some(self.first.map_or(txn.date, |d| d.min(txn.date)));
        self.last = Some(self.last.map_or(txn.date, |d| d.max(txn.date)));
        Ok(())
    }

    fn average(&self) -> Decimal {
        if self.count == 0 {
            Decimal::ZERO
        } else {
            let mut avg = (self.total / Decimal::from(self.count)).round_dp(2);
            avg.rescale(2);
            avg
        }
    }
}

fn checked_total(total: Decimal, txn: &Transaction) -> Result<Decimal> {
    total
        .checked_add(txn.amount)
        .with_context(|| format!("Transaction {} overflows the ledger totals", txn.id))
}

impl Views {
    pub(crate) fn compute(transactions: &[Transaction]) -> Result<Self> {
        let mut monthly: BTreeMap<(String, Option<String>), Totals> = BTreeMap::new();
        let mut categories: BTreeMap<String, Totals> = BTreeMap::new();
        let mut account_types: BTreeMap<AccountType, Totals> = BTreeMap::new();
        let mut payees = BTreeSet::new();
        let mut overall = OverallStats::default();
        let mut all = Totals::default();

        for txn in transactions {
            monthly
                .entry((txn.month(), txn.category.clone()))
                .or_default()
                .add(txn)?;
            if let Some(category) = &txn.category {
                categories.entry(category.clone()).or_default().add(txn)?;
            }
            account_types.entry(txn.account_type).or_default().add(txn)?;
            if !txn.payee.is_empty() {
                payees.insert(txn.payee.as_str());
            }

            all.add(txn)?;
            if txn.is_income() {
                overall.total_income = checked_total(overall.total_income, txn)?;
            } else if txn.is_expense() {
                overall.total_expenses = checked_total(overall.total_expenses, txn)?;
            }
            if txn.is_transfer() {
                overall.transfer_count += 1;
            }
        }

        overall.total_transactions = all.count;
        overall.total_amount = all.total;
        overall.earliest_date = all.first;
        overall.latest_date = all.last;
        overall.unique_categories = categories.len();
        overall.unique_account_types = account_types.len();
        overall.unique_payees = payees.len();

        let mut monthly: Vec<MonthlySummary> = monthly
            .into_iter()
            .map(|((month, category), t)| MonthlySummary {
                month,
                category,
                transaction_count: t.count,
                total_amount: t.total,
                avg_amount: t.average(),
                min_amount: t.min.unwrap_or_default(),
                max_amount: t.max.unwrap_or_default(),
            })
            .collect();
        // Newest month first, largest total first within a month.
        monthly.sort_by(|a, b| {
            b.month
                .cmp(&a.month)
                .then(b.total_amount.cmp(&a.total_amount))
                .then(a.category.cmp(&b.category))
        });

        let mut categories: Vec<CategorySummary> = categories
            .into_iter()
            .filter_map(|(category, t)| {
                Some(CategorySummary {
                    transaction_count: t.count,
                    total_amount: t.total,
                    avg_amount: t.average(),
                    first_transaction: t.first?,
                    last_transaction: t.last?,
                    category,
                })
            })
            .collect();
        categories.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then(a.category.cmp(&b.category))
        });

        let mut account_types: Vec<AccountTypeSummary> = account_types
            .into_iter()
            .map(|(account_type, t)| AccountTypeSummary {
                account_type,
                transaction_count: t.count,
                total_amount: t.total,
                avg_amount: t.average(),
            })
            .collect();
        account_types.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then(a.account_type.cmp(&b.account_type))
        });

        Ok(Self {
            monthly,
            categories,
            account_types,
            overall,
        })
    }
}
