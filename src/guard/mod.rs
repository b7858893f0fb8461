//! Static validation of caller-supplied SQL.
//!
//! A statement is accepted only if it is a single `SELECT` over the ledger
//! tables, carries no data-definition, modification or session keyword, and
//! ends up with a row limit no larger than the configured ceiling. Checks run
//! over lexed tokens, so string literals, quoted identifiers and comments are
//! never mistaken for keywords.

mod lexer;

use serde::Serialize;

use lexer::{lex, Token, TokenKind};

/// Tables and views a guarded query may read.
pub(crate) const ALLOWED_TABLES: &[&str] = &[
    "accounts",
    "categories",
    "transactions",
    "transaction_splits",
    "transactions_with_categories",
    "monthly_summaries",
    "category_summaries",
    "account_type_summaries",
];

/// Row ceiling used when none is configured.
pub(crate) const DEFAULT_ROW_LIMIT: u64 = 1000;

const FORBIDDEN_KEYWORDS: &[&str] = &[
    "create",
    "drop",
    "alter",
    "insert",
    "update",
    "delete",
    "attach",
    "detach",
    "copy",
    "pragma",
    "grant",
    "revoke",
    "truncate",
    "vacuum",
    "reindex",
    "analyze",
    "begin",
    "commit",
    "rollback",
    "savepoint",
    "release",
    "set",
    "merge",
    "call",
    "exec",
    "execute",
    "load",
    "install",
    "export",
    "import",
    "load_extension",
];

/// Words that end a table reference instead of naming its alias.
const CLAUSE_KEYWORDS: &[&str] = &[
    "where", "group", "order", "limit", "having", "window", "union", "intersect", "except",
    "join", "inner", "left", "right", "full", "outer", "cross", "natural", "on", "using",
    "indexed", "not",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RejectReason {
    MalformedSql,
    MultipleStatements,
    NotASelect,
    ForbiddenKeyword,
    UnknownTable,
    UnsupportedTableSource,
    InvalidLimit,
}

impl RejectReason {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedSql => "malformed_sql",
            Self::MultipleStatements => "multiple_statements",
            Self::NotASelect => "not_a_select",
            Self::ForbiddenKeyword => "forbidden_keyword",
            Self::UnknownTable => "unknown_table",
            Self::UnsupportedTableSource => "unsupported_table_source",
            Self::InvalidLimit => "invalid_limit",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct Rejection {
    pub(crate) reason: RejectReason,
    pub(crate) message: String,
}

impl Rejection {
    fn new(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.reason)
    }
}

/// What the guard did to the statement's row limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum LimitAction {
    Kept,
    Injected,
    Clamped { requested: u64 },
}

/// A statement that passed every check, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct GuardedQuery {
    pub(crate) sql: String,
    /// Effective row limit of `sql`.
    pub(crate) limit: u64,
    pub(crate) limit_action: LimitAction,
}

/// Validate `sql` and bound its result to `ceiling` rows.
pub(crate) fn check(sql: &str, ceiling: u64) -> Result<GuardedQuery, Rejection> {
    let tokens = lex(sql).map_err(|e| Rejection::new(RejectReason::MalformedSql, e.message))?;

    single_statement(sql, &tokens)?;
    leading_select(&tokens)?;
    no_forbidden_keywords(&tokens)?;
    table_sources(&tokens)?;
    bound_limit(sql, &tokens, ceiling)
}

fn single_statement(sql: &str, tokens: &[Token<'_>]) -> Result<(), Rejection> {
    let Some(semi) = tokens.iter().find(|t| t.kind == TokenKind::Semicolon) else {
        return Ok(());
    };
    let rest = sql[semi.end..].trim();
    let message = if rest.is_empty() {
        "only one statement is allowed; remove the trailing ';'".to_string()
    } else {
        format!("only one statement is allowed; found another after ';': '{rest}'")
    };
    Err(Rejection::new(RejectReason::MultipleStatements, message))
}

fn leading_select(tokens: &[Token<'_>]) -> Result<(), Rejection> {
    match tokens.first() {
        Some(t) if t.is_word("select") => Ok(()),
        Some(t) => Err(Rejection::new(
            RejectReason::NotASelect,
            format!("only SELECT statements are allowed, got '{}'", t.text),
        )),
        None => Err(Rejection::new(RejectReason::NotASelect, "query is empty")),
    }
}

fn no_forbidden_keywords(tokens: &[Token<'_>]) -> Result<(), Rejection> {
    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Word {
            continue;
        }
        let lower = token.text.to_ascii_lowercase();
        let replace_into = lower == "replace" && tokens.get(i + 1).is_some_and(|t| t.is_word("into"));
        if replace_into || FORBIDDEN_KEYWORDS.contains(&lower.as_str()) {
            return Err(Rejection::new(
                RejectReason::ForbiddenKeyword,
                format!("keyword '{}' is not allowed in a read-only query", token.text),
            ));
        }
    }
    Ok(())
}

/// Every `FROM`/`JOIN` source, at any depth, must name an allowed table.
fn table_sources(tokens: &[Token<'_>]) -> Result<(), Rejection> {
    for (i, token) in tokens.iter().enumerate() {
        if token.is_word("join") || (token.is_word("from") && !is_distinct_from(tokens, i)) {
            source_list(tokens, i + 1, token)?;
        }
    }
    Ok(())
}

/// `a IS [NOT] DISTINCT FROM b` compares values; it names no table.
fn is_distinct_from(tokens: &[Token<'_>], from: usize) -> bool {
    from >= 2
        && tokens[from - 1].is_word("distinct")
        && (tokens[from - 2].is_word("is")
            || (tokens[from - 2].is_word("not")
                && from >= 3
                && tokens[from - 3].is_word("is")))
}

/// Check the comma-separated sources starting at `pos`, up to the first
/// token that is neither an alias nor a `,`.
fn source_list(tokens: &[Token<'_>], mut pos: usize, keyword: &Token<'_>) -> Result<(), Rejection> {
    loop {
        let Some(source) = tokens.get(pos) else {
            return Err(Rejection::new(
                RejectReason::MalformedSql,
                format!("'{}' is not followed by a table", keyword.text),
            ));
        };

        if source.is_symbol('(') {
            // A subquery's own FROM/JOIN are visited by the outer scan; a
            // parenthesised join names its first table right here.
            if !tokens.get(pos + 1).is_some_and(|t| t.is_word("select")) {
                source_list(tokens, pos + 1, keyword)?;
            }
            pos = closing_paren(tokens, pos).ok_or_else(|| {
                Rejection::new(RejectReason::MalformedSql, "unbalanced parentheses")
            })? + 1;
        } else {
            table_name(tokens, pos)?;
            pos += 1;
        }

        // Optional alias, with or without AS.
        if tokens.get(pos).is_some_and(|t| t.is_word("as")) {
            pos += 2;
        } else if tokens.get(pos).is_some_and(|t| {
            t.kind == TokenKind::QuotedIdent
                || (t.kind == TokenKind::Word
                    && !CLAUSE_KEYWORDS.iter().any(|k| t.text.eq_ignore_ascii_case(k)))
        }) {
            pos += 1;
        }

        if tokens.get(pos).is_some_and(|t| t.is_symbol(',')) {
            pos += 1;
        } else {
            return Ok(());
        }
    }
}

fn table_name(tokens: &[Token<'_>], pos: usize) -> Result<(), Rejection> {
    let source = &tokens[pos];
    let Some(name) = source.identifier() else {
        return Err(Rejection::new(
            RejectReason::UnsupportedTableSource,
            format!("unsupported table source '{}'", source.text),
        ));
    };

    match tokens.get(pos + 1) {
        Some(next) if next.is_symbol('.') => {
            return Err(Rejection::new(
                RejectReason::UnsupportedTableSource,
                format!("schema-qualified table '{name}' is not allowed"),
            ));
        }
        Some(next) if next.is_symbol('(') => {
            return Err(Rejection::new(
                RejectReason::UnsupportedTableSource,
                format!("table-valued function '{name}' is not allowed"),
            ));
        }
        _ => {}
    }

    if !ALLOWED_TABLES.iter().any(|t| t.eq_ignore_ascii_case(&name)) {
        return Err(Rejection::new(
            RejectReason::UnknownTable,
            format!(
                "table '{name}' is not queryable; allowed tables: {}",
                ALLOWED_TABLES.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Index of the `)` matching the `(` at `open`.
fn closing_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Inject or clamp the top-level `LIMIT`.
fn bound_limit(sql: &str, tokens: &[Token<'_>], ceiling: u64) -> Result<GuardedQuery, Rejection> {
    let mut depth = 0usize;
    let mut limit_at = None;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && token.is_word("limit") {
            limit_at = Some(i);
            break;
        }
    }

    let Some(at) = limit_at else {
        return Ok(GuardedQuery {
            sql: format!("{sql}\nLIMIT {ceiling}"),
            limit: ceiling,
            limit_action: LimitAction::Injected,
        });
    };

    let clause = &tokens[at + 1..];
    let count = match clause {
        [n] => n,
        [_, offset, _] if offset.is_word("offset") => &clause[0],
        [_, comma, n] if comma.is_symbol(',') => n,
        _ => {
            let text = sql[tokens[at].start..].trim();
            return Err(Rejection::new(
                RejectReason::InvalidLimit,
                format!("'{text}' must be LIMIT <n>, LIMIT <n> OFFSET <m> or LIMIT <m>, <n> with integer literals at the end of the query"),
            ));
        }
    };
    for t in clause.iter().filter(|t| !t.is_symbol(',') && !t.is_word("offset")) {
        if !is_integer_literal(t) {
            return Err(Rejection::new(
                RejectReason::InvalidLimit,
                format!("LIMIT/OFFSET value '{}' is not a non-negative integer literal", t.text),
            ));
        }
    }

    // Digits only, so the only parse failure is overflow.
    let requested = count.text.parse::<u64>().unwrap_or(u64::MAX);
    if requested <= ceiling {
        return Ok(GuardedQuery {
            sql: sql.to_string(),
            limit: requested,
            limit_action: LimitAction::Kept,
        });
    }

    let mut clamped = String::with_capacity(sql.len());
    clamped.push_str(&sql[..count.start]);
    clamped.push_str(&ceiling.to_string());
    clamped.push_str(&sql[count.end..]);
    Ok(GuardedQuery {
        sql: clamped,
        limit: ceiling,
        limit_action: LimitAction::Clamped { requested },
    })
}

fn is_integer_literal(token: &Token<'_>) -> bool {
    token.kind == TokenKind::Number && token.text.bytes().all(|b| b.is_ascii_digit())
}
