//! Typed tool arguments. Everything is checked here, before the ledger is
//! touched.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Period, SortOrder, TransactionFilter};
use crate::error::ToolError;
use crate::models::AccountType;

pub(crate) const MAX_LIMIT: i64 = 1000;
pub(crate) const DEFAULT_LIST_LIMIT: i64 = 100;
pub(crate) const DEFAULT_SEARCH_LIMIT: i64 = 50;

/// Decode a tool's argument object. A missing/null argument list means `{}`.
pub(crate) fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => arguments,
        other => {
            return Err(ToolError::invalid(format!(
                "arguments must be a JSON object, got {other}"
            )))
        }
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid(e.to_string()))
}

fn check_limit(limit: Option<i64>, default: i64) -> Result<usize, ToolError> {
    let limit = limit.unwrap_or(default);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ToolError::invalid(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        )));
    }
    Ok(limit as usize)
}

fn parse_day(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ToolError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| {
                ToolError::invalid(format!("{field} must be a date in YYYY-MM-DD form, got '{v}'"))
            })
        })
        .transpose()
}

/// Blank strings are treated as absent filters.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoParams {}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ListTransactionsParams {
    pub(crate) account_type: Option<String>,
    pub(crate) date_from: Option<String>,
    pub(crate) date_to: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) payee: Option<String>,
    pub(crate) limit: Option<i64>,
    pub(crate) order: Option<SortOrder>,
}

impl ListTransactionsParams {
    pub(crate) fn to_filter(&self) -> Result<TransactionFilter, ToolError> {
        let account_type = match non_blank(self.account_type.clone()) {
            None => None,
            Some(t) => Some(AccountType::parse(&t).ok_or_else(|| {
                let known: Vec<&str> = AccountType::all().iter().map(|t| t.as_str()).collect();
                ToolError::invalid(format!(
                    "unknown account_type '{t}'; expected one of {}",
                    known.join(", ")
                ))
            })?),
        };

        let date_from = parse_day("date_from", self.date_from.as_deref())?;
        let date_to = parse_day("date_to", self.date_to.as_deref())?;
        if let (Some(from), Some(to)) = (date_from, date_to) {
            if from > to {
                return Err(ToolError::invalid(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }

        Ok(TransactionFilter {
            account_type,
            date_from,
            date_to,
            category: non_blank(self.category.clone()),
            payee: non_blank(self.payee.clone()),
            text: None,
            limit: Some(check_limit(self.limit, DEFAULT_LIST_LIMIT)?),
            order: self.order.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RunSqlParams {
    pub(crate) query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SummariesParams {
    #[serde(default)]
    pub(crate) period: Period,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SearchParams {
    pub(crate) search_term: String,
    pub(crate) limit: Option<i64>,
}

impl SearchParams {
    pub(crate) fn to_filter(&self) -> Result<TransactionFilter, ToolError> {
        let term = self.search_term.trim();
        if term.is_empty() {
            return Err(ToolError::invalid("search_term must not be empty"));
        }
        Ok(TransactionFilter {
            text: Some(term.to_string()),
            limit: Some(check_limit(self.limit, DEFAULT_SEARCH_LIMIT)?),
            ..TransactionFilter::default()
        })
    }
}
