use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::AccountType;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub account_type: AccountType,
    pub date: NaiveDate,
    pub payee: String,
    pub memo: String,
    pub amount: Decimal,
    pub cleared: String,
    pub number: String,
    pub category: Option<String>,
    /// Target account when the category field was a `[Account]` transfer.
    pub transfer_account: Option<String>,
    pub class: Option<String>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_expense(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn is_transfer(&self) -> bool {
        self.transfer_account.is_some()
    }

    /// `YYYY-MM` bucket used by the monthly views.
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }

    /// Case-insensitive substring match over payee, memo and category.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.payee.to_lowercase().contains(&needle)
            || self.memo.to_lowercase().contains(&needle)
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Split {
    pub id: i64,
    pub transaction_id: i64,
    pub category: Option<String>,
    pub transfer_account: Option<String>,
    pub amount: Decimal,
    pub memo: String,
}
