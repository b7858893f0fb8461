//! The closed set of read-only operations exposed to tool-calling clients.

mod params;

use log::{debug, warn};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::db::Ledger;
use crate::error::{ErrorKind, ToolError};
use crate::export::{Resource, ResourceDefinition};
use crate::guard::{self, RejectReason};
use crate::import::IngestStats;

use params::{
    decode, ListTransactionsParams, NoParams, RunSqlParams, SearchParams, SummariesParams,
    MAX_LIMIT,
};

/// Rows per view returned by `get_summaries`.
const SUMMARY_ROWS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tool {
    ListAccounts,
    ListTransactions,
    RunSql,
    GetSummaries,
    GetCategories,
    SearchTransactions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ToolDefinition {
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    #[serde(rename = "inputSchema")]
    pub(crate) input_schema: Value,
}

impl Tool {
    pub(crate) const ALL: [Tool; 6] = [
        Tool::ListAccounts,
        Tool::ListTransactions,
        Tool::RunSql,
        Tool::GetSummaries,
        Tool::GetCategories,
        Tool::SearchTransactions,
    ];

    pub(crate) fn name(self) -> &'static str {
        match self {
            Tool::ListAccounts => "list_accounts",
            Tool::ListTransactions => "list_transactions",
            Tool::RunSql => "run_sql",
            Tool::GetSummaries => "get_summaries",
            Tool::GetCategories => "get_categories",
            Tool::SearchTransactions => "search_transactions",
        }
    }

    pub(crate) fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            Tool::ListAccounts => "List all accounts with type, description, balance and credit limit",
            Tool::ListTransactions => "List transactions, newest first, filtered by account type, date range, category or payee",
            Tool::RunSql => "Run a single read-only SELECT against the ledger tables; a row limit is always applied",
            Tool::GetSummaries => "Get aggregate views (monthly, per category, per account type) plus overall statistics",
            Tool::GetCategories => "List all categories with their expense, income and tax flags",
            Tool::SearchTransactions => "Search transactions by text in payee, memo or category",
        }
    }

    pub(crate) fn input_schema(self) -> Value {
        let limit = |default: i64| {
            json!({
                "type": "integer",
                "minimum": 1,
                "maximum": MAX_LIMIT,
                "default": default,
                "description": "Maximum number of transactions to return"
            })
        };

        match self {
            Tool::ListAccounts | Tool::GetCategories => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            Tool::ListTransactions => json!({
                "type": "object",
                "properties": {
                    "account_type": {
                        "type": "string",
                        "enum": ["bank", "cash", "credit-card", "investment", "other-asset", "other-liability"],
                        "description": "Only transactions from accounts of this type"
                    },
                    "date_from": {"type": "string", "format": "date", "description": "Earliest date, YYYY-MM-DD"},
                    "date_to": {"type": "string", "format": "date", "description": "Latest date, YYYY-MM-DD"},
                    "category": {"type": "string", "description": "Substring of the category name"},
                    "payee": {"type": "string", "description": "Substring of the payee"},
                    "limit": limit(params::DEFAULT_LIST_LIMIT),
                    "order": {
                        "type": "string",
                        "enum": ["newest_first", "oldest_first"],
                        "default": "newest_first"
                    }
                },
                "additionalProperties": false
            }),
            Tool::RunSql => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": format!(
                            "A single SELECT statement over: {}",
                            guard::ALLOWED_TABLES.join(", ")
                        )
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
            Tool::GetSummaries => json!({
                "type": "object",
                "properties": {
                    "period": {
                        "type": "string",
                        "enum": ["month", "category", "account", "all"],
                        "default": "month",
                        "description": "Which aggregate view to return"
                    }
                },
                "additionalProperties": false
            }),
            Tool::SearchTransactions => json!({
                "type": "object",
                "properties": {
                    "search_term": {"type": "string", "minLength": 1, "description": "Text to look for"},
                    "limit": limit(params::DEFAULT_SEARCH_LIMIT)
                },
                "required": ["search_term"],
                "additionalProperties": false
            }),
        }
    }

    pub(crate) fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) kind: ErrorKind,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reason: Option<RejectReason>,
}

/// Uniform response for every tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Envelope {
    pub(crate) success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<ErrorBody>,
}

impl Envelope {
    pub(crate) fn ok(result: Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub(crate) fn err(error: &ToolError) -> Self {
        let reason = match error {
            ToolError::QueryRejected(rejection) => Some(rejection.reason),
            _ => None,
        };
        Self {
            success: false,
            result: None,
            error: Some(ErrorBody {
                kind: error.kind(),
                message: error.to_string(),
                reason,
            }),
        }
    }
}

impl From<Result<Value, ToolError>> for Envelope {
    fn from(result: Result<Value, ToolError>) -> Self {
        match result {
            Ok(value) => Envelope::ok(value),
            Err(e) => Envelope::err(&e),
        }
    }
}

/// Routes tool calls to the shared ledger. Cheap to clone; every clone reads
/// the same store.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    ledger: Arc<Ledger>,
    row_limit: u64,
}

impl Dispatcher {
    pub(crate) fn new(ledger: Arc<Ledger>, row_limit: u64) -> Self {
        Self { ledger, row_limit }
    }

    pub(crate) fn tools(&self) -> Vec<ToolDefinition> {
        Tool::ALL.into_iter().map(Tool::definition).collect()
    }

    pub(crate) fn resources(&self) -> Vec<ResourceDefinition> {
        Resource::ALL.into_iter().map(Resource::definition).collect()
    }

    pub(crate) fn stats(&self) -> &IngestStats {
        self.ledger.stats()
    }

    pub(crate) fn call(&self, name: &str, arguments: Value) -> Envelope {
        let result = self.dispatch(name, arguments);
        if let Err(e) = &result {
            warn!("Tool '{name}' failed: {e}");
        }
        result.into()
    }

    pub(crate) fn read_resource(&self, uri: &str) -> Result<String, ToolError> {
        let resource =
            Resource::from_uri(uri).ok_or_else(|| ToolError::UnknownResource(uri.to_string()))?;
        resource
            .render(&self.ledger)
            .map_err(|e| ToolError::QueryExecutionFailed {
                message: format!("{e:#}"),
            })
    }

    fn dispatch(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool = Tool::parse(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        debug!("Calling tool '{name}' with {arguments}");

        match tool {
            Tool::ListAccounts => {
                decode::<NoParams>(arguments)?;
                let accounts = self.ledger.accounts();
                Ok(json!({ "count": accounts.len(), "accounts": accounts }))
            }
            Tool::ListTransactions => {
                let params: ListTransactionsParams = decode(arguments)?;
                let filter = params.to_filter()?;
                let transactions = self.ledger.transactions(&filter);
                Ok(json!({
                    "count": transactions.len(),
                    "transactions": transactions,
                    "filters": params,
                }))
            }
            Tool::RunSql => {
                let params: RunSqlParams = decode(arguments)?;
                let query = guard::check(&params.query, self.row_limit)?;
                let result = self.ledger.execute(&query)?;
                Ok(json!(result))
            }
            Tool::GetSummaries => {
                let params: SummariesParams = decode(arguments)?;
                Ok(json!(self.ledger.summaries(params.period, SUMMARY_ROWS)))
            }
            Tool::GetCategories => {
                decode::<NoParams>(arguments)?;
                let categories = self.ledger.categories();
                Ok(json!({ "count": categories.len(), "categories": categories }))
            }
            Tool::SearchTransactions => {
                let params: SearchParams = decode(arguments)?;
                let filter = params.to_filter()?;
                let transactions = self.ledger.transactions(&filter);
                Ok(json!({
                    "count": transactions.len(),
                    "search_term": params.search_term,
                    "transactions": transactions,
                }))
            }
        }
    }
}
