/// Tables for the normalized ledger. Amounts are NUMERIC so comparisons and
/// ordering work numerically. `sum`, `total` and `avg` are replaced by the
/// decimal aggregates in `functions`, so totals over them stay exact.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE accounts (
    account_id   INTEGER PRIMARY KEY,
    name         TEXT NOT NULL,
    type         TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    balance      NUMERIC NOT NULL,
    credit_limit NUMERIC,
    note         TEXT NOT NULL DEFAULT ''
);

CREATE TABLE categories (
    category_id      INTEGER PRIMARY KEY,
    name             TEXT NOT NULL UNIQUE,
    description      TEXT NOT NULL DEFAULT '',
    expense_category BOOLEAN NOT NULL DEFAULT 0,
    income_category  BOOLEAN NOT NULL DEFAULT 0,
    tax_related      BOOLEAN NOT NULL DEFAULT 0,
    tax_schedule     TEXT,
    parent           TEXT
);

CREATE TABLE transactions (
    tx_id            INTEGER PRIMARY KEY,
    account_id       INTEGER NOT NULL REFERENCES accounts(account_id),
    account_type     TEXT NOT NULL,
    date             TEXT NOT NULL,
    payee            TEXT NOT NULL DEFAULT '',
    memo             TEXT NOT NULL DEFAULT '',
    amount           NUMERIC NOT NULL,
    cleared          TEXT NOT NULL DEFAULT '',
    number           TEXT NOT NULL DEFAULT '',
    category         TEXT,
    transfer_account TEXT,
    class            TEXT
);

CREATE INDEX idx_transactions_date ON transactions(date);
CREATE INDEX idx_transactions_category ON transactions(category);

CREATE TABLE transaction_splits (
    split_id         INTEGER PRIMARY KEY,
    tx_id            INTEGER NOT NULL REFERENCES transactions(tx_id),
    category         TEXT,
    transfer_account TEXT,
    amount           NUMERIC NOT NULL,
    memo             TEXT NOT NULL DEFAULT ''
);

CREATE INDEX idx_splits_tx ON transaction_splits(tx_id);

CREATE VIEW transactions_with_categories AS
SELECT
    t.*,
    c.description AS category_description,
    c.expense_category,
    c.income_category,
    c.tax_related
FROM transactions t
LEFT JOIN categories c ON t.category = c.name;

CREATE TABLE monthly_summaries (
    month             TEXT NOT NULL,
    category          TEXT,
    transaction_count INTEGER NOT NULL,
    total_amount      NUMERIC NOT NULL,
    avg_amount        NUMERIC NOT NULL,
    min_amount        NUMERIC NOT NULL,
    max_amount        NUMERIC NOT NULL
);

CREATE TABLE category_summaries (
    category          TEXT NOT NULL,
    transaction_count INTEGER NOT NULL,
    total_amount      NUMERIC NOT NULL,
    avg_amount        NUMERIC NOT NULL,
    first_transaction TEXT NOT NULL,
    last_transaction  TEXT NOT NULL
);

CREATE TABLE account_type_summaries (
    account_type      TEXT NOT NULL,
    transaction_count INTEGER NOT NULL,
    total_amount      NUMERIC NOT NULL,
    avg_amount        NUMERIC NOT NULL
);
"#;
