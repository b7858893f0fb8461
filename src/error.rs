//! Error kinds surfaced by ingestion and by the tool surface.

use serde::Serialize;
use thiserror::Error;

use crate::guard::Rejection;

/// Stable codes for callers that branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ErrorKind {
    IngestionFailed,
    InvalidParameter,
    QueryRejected,
    QueryExecutionFailed,
    UnknownTool,
    UnknownResource,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::IngestionFailed => write!(f, "ingestion_failed"),
            ErrorKind::InvalidParameter => write!(f, "invalid_parameter"),
            ErrorKind::QueryRejected => write!(f, "query_rejected"),
            ErrorKind::QueryExecutionFailed => write!(f, "query_execution_failed"),
            ErrorKind::UnknownTool => write!(f, "unknown_tool"),
            ErrorKind::UnknownResource => write!(f, "unknown_resource"),
        }
    }
}

/// Fatal ingestion outcomes. The store is never published after one of these.
#[derive(Error, Debug)]
pub(crate) enum IngestError {
    #[error("Failed to read QIF file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("QIF input is empty")]
    Empty,

    #[error("{malformed} of {attempted} records were malformed (limit {limit:.0}%)")]
    TooManyMalformed {
        malformed: usize,
        attempted: usize,
        limit: f64,
    },
}

impl IngestError {
    pub(crate) fn kind(&self) -> ErrorKind {
        ErrorKind::IngestionFailed
    }
}

/// Errors returned from a tool call. None of them leave the ledger in a
/// different state than before the call.
#[derive(Error, Debug)]
pub(crate) enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },

    #[error("Query rejected: {0}")]
    QueryRejected(Rejection),

    #[error("Query failed: {message}")]
    QueryExecutionFailed { message: String },
}

impl ToolError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        ToolError::InvalidParameter {
            message: message.into(),
        }
    }

    pub(crate) fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool(_) => ErrorKind::UnknownTool,
            ToolError::UnknownResource(_) => ErrorKind::UnknownResource,
            ToolError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            ToolError::QueryRejected(_) => ErrorKind::QueryRejected,
            ToolError::QueryExecutionFailed { .. } => ErrorKind::QueryExecutionFailed,
        }
    }
}

impl From<Rejection> for ToolError {
    fn from(rejection: Rejection) -> Self {
        ToolError::QueryRejected(rejection)
    }
}
