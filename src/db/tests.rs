#![allow(clippy::unwrap_used)]

use super::*;
use crate::guard;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

const SAMPLE: &str = include_str!("../../testdata/sample.qif");

fn ledger() -> Ledger {
    Ledger::from_qif(SAMPLE).unwrap()
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn run(ledger: &Ledger, sql: &str) -> QueryResult {
    let query = guard::check(sql, guard::DEFAULT_ROW_LIMIT).unwrap();
    ledger.execute(&query).unwrap()
}

// ── Build ─────────────────────────────────────────────────────

#[test]
fn test_build_counts() {
    let l = ledger();
    assert_eq!(l.accounts().len(), 2);
    assert_eq!(l.categories().len(), 6);
    assert_eq!(l.transactions(&TransactionFilter::default()).len(), 9);
    assert_eq!(l.stats().splits, 2);
    assert_eq!(l.stats().malformed_records, 0);
}

#[test]
fn test_extreme_amounts_build_without_overflow() {
    let max = "79228162514264337593543950335";
    let l = Ledger::from_qif(&format!(
        "!Type:Bank\nD1/1/24\nT{max}\nLSalary\n^\nD1/2/24\nT{max}\nLSalary\n^\n"
    ))
    .unwrap();
    assert_eq!(l.stats().malformed_records, 1);
    assert_eq!(l.views().overall.total_amount, Decimal::MAX);
    assert_eq!(l.views().categories[0].total_amount, Decimal::MAX);
}

#[test]
fn test_view_overflow_fails_the_build() {
    let max = "79228162514264337593543950335";
    let mut normalized = crate::import::ingest(
        &format!("!Type:Bank\nD1/1/24\nT{max}\n^\n"),
        &crate::import::IngestOptions::default(),
    )
    .unwrap();
    let mut second = normalized.transactions[0].clone();
    second.id = 2;
    normalized.transactions.push(second);

    let err = Ledger::build(normalized).err().unwrap();
    assert!(err.to_string().contains("overflows the ledger totals"));
}

#[test]
fn test_category_spellings_share_one_view_row() {
    let l = Ledger::from_qif("!Type:Bank\nD1/1/24\nT-5\nLGroceries\n^\nD1/2/24\nT-7\nLgroceries\n^\n")
        .unwrap();
    assert_eq!(l.views().categories.len(), 1);
    assert_eq!(l.views().categories[0].category, "Groceries");
    assert_eq!(l.views().categories[0].transaction_count, 2);
    let r = run(&l, "SELECT COUNT(*) FROM transactions_with_categories WHERE expense_category IS NOT NULL");
    assert_eq!(r.rows[0][0], json!(2));
}

#[test]
fn test_empty_ledger_builds() {
    let l = Ledger::build(Normalized::default()).unwrap();
    assert!(l.accounts().is_empty());
    assert_eq!(l.views().overall.total_transactions, 0);
    let r = run(&l, "SELECT COUNT(*) AS n FROM transactions");
    assert_eq!(r.rows, vec![vec![json!(0)]]);
}

#[test]
fn test_every_queryable_table_exists() {
    let l = ledger();
    for table in guard::ALLOWED_TABLES {
        let r = run(&l, &format!("SELECT * FROM {table} LIMIT 1"));
        assert!(!r.columns.is_empty(), "{table}");
    }
}

// ── Accounts & categories ─────────────────────────────────────

#[test]
fn test_accounts_ordered_with_balances() {
    let accounts = ledger().accounts();
    assert_eq!(accounts[0].name, "Checking");
    assert_eq!(accounts[0].account_type, AccountType::Bank);
    assert_eq!(accounts[0].description, "Everyday account");
    assert_eq!(accounts[0].balance, dec!(4147.60));
    assert_eq!(accounts[1].name, "Visa");
    assert_eq!(accounts[1].credit_limit, Some(dec!(5000.00)));
    assert_eq!(accounts[1].balance, dec!(434.76));
}

#[test]
fn test_balance_matches_transactions() {
    let l = ledger();
    let all = l.transactions(&TransactionFilter::default());
    for account in l.accounts() {
        let sum: Decimal = all
            .iter()
            .filter(|d| d.transaction.account_id == account.id)
            .map(|d| d.transaction.amount)
            .sum();
        assert_eq!(account.balance, sum);
    }
}

#[test]
fn test_categories_ordered_by_name() {
    let names: Vec<String> = ledger().categories().into_iter().map(|c| c.name).collect();
    assert_eq!(
        names,
        vec!["Entertainment", "Food", "Food:Groceries", "Household", "Salary", "Utilities"]
    );
}

#[test]
fn test_category_flags_survive() {
    let cats = ledger().categories();
    let salary = cats.iter().find(|c| c.name == "Salary").unwrap();
    assert!(salary.is_income);
    assert!(salary.is_tax_related);
    assert_eq!(salary.tax_schedule.as_deref(), Some("W-2"));
    let groceries = cats.iter().find(|c| c.name == "Food:Groceries").unwrap();
    assert_eq!(groceries.parent.as_deref(), Some("Food"));
}

// ── Transactions ──────────────────────────────────────────────

#[test]
fn test_default_order_is_newest_first() {
    let all = ledger().transactions(&TransactionFilter::default());
    assert_eq!(all[0].transaction.payee, "StreamCo");
    assert_eq!(all.last().unwrap().transaction.payee, "Acme Corp");
    // Same date: higher id first.
    let same_day: Vec<&str> = all
        .iter()
        .filter(|d| d.transaction.date == ymd(2024, 1, 20))
        .map(|d| d.transaction.payee.as_str())
        .collect();
    assert_eq!(same_day, vec!["Payment", "Transfer to card"]);
}

#[test]
fn test_oldest_first_order() {
    let all = ledger().transactions(&TransactionFilter {
        order: SortOrder::OldestFirst,
        ..TransactionFilter::default()
    });
    assert_eq!(all[0].transaction.date, ymd(2024, 1, 1));
}

#[test]
fn test_filter_by_account_type_and_dates() {
    let l = ledger();
    let filter = TransactionFilter {
        account_type: Some(AccountType::CreditCard),
        date_from: Some(ymd(2024, 1, 15)),
        date_to: Some(ymd(2024, 1, 31)),
        ..TransactionFilter::default()
    };
    let found = l.transactions(&filter);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].transaction.payee, "Payment");
    assert_eq!(found[0].transaction.transfer_account.as_deref(), Some("Checking"));
}

#[test]
fn test_filter_by_category_and_payee_substring() {
    let l = ledger();
    let food = l.transactions(&TransactionFilter {
        category: Some("food".into()),
        ..TransactionFilter::default()
    });
    assert_eq!(food.len(), 2);

    let acme = l.transactions(&TransactionFilter {
        payee: Some("ACME".into()),
        ..TransactionFilter::default()
    });
    assert_eq!(acme.len(), 2);
}

#[test]
fn test_text_search_and_limit() {
    let l = ledger();
    let hits = l.transactions(&TransactionFilter {
        text: Some("january".into()),
        ..TransactionFilter::default()
    });
    let payees: Vec<&str> = hits.iter().map(|d| d.transaction.payee.as_str()).collect();
    assert_eq!(payees, vec!["City Power & Light", "Acme Corp"]);

    let limited = l.transactions(&TransactionFilter {
        limit: Some(3),
        ..TransactionFilter::default()
    });
    assert_eq!(limited.len(), 3);
}

#[test]
fn test_transactions_carry_their_splits() {
    let l = ledger();
    let found = l.transactions(&TransactionFilter {
        payee: Some("MegaMart".into()),
        ..TransactionFilter::default()
    });
    let detail = &found[0];
    assert_eq!(detail.splits.len(), 2);
    assert_eq!(detail.splits[0].category.as_deref(), Some("Food:Groceries"));
    assert_eq!(detail.splits[0].memo, "Weekly shop");
    assert_eq!(detail.splits[1].amount, dec!(-30.00));
    assert!(detail.splits.iter().all(|s| s.transaction_id == detail.transaction.id));

    let plain = l.transactions(&TransactionFilter {
        payee: Some("StreamCo".into()),
        ..TransactionFilter::default()
    });
    assert!(plain[0].splits.is_empty());
}

#[test]
fn test_transaction_detail_serializes_flat() {
    let l = ledger();
    let found = l.transactions(&TransactionFilter {
        payee: Some("Corner".into()),
        ..TransactionFilter::default()
    });
    let json = serde_json::to_value(&found[0]).unwrap();
    assert_eq!(json["payee"], "Corner Grocer");
    assert_eq!(json["amount"], "-82.40");
    assert_eq!(json["date"], "2024-01-03");
    assert_eq!(json["account_type"], "bank");
    assert_eq!(json["splits"], json!([]));
}

// ── Views ─────────────────────────────────────────────────────

#[test]
fn test_category_view() {
    let l = ledger();
    let cats = &l.views().categories;
    let order: Vec<&str> = cats.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(
        order,
        vec!["Salary", "Entertainment", "Food", "Food:Groceries", "Utilities"]
    );
    assert_eq!(cats[0].transaction_count, 2);
    assert_eq!(cats[0].total_amount, dec!(5000.00));
    assert_eq!(cats[0].avg_amount, dec!(2500.00));
    assert_eq!(cats[0].first_transaction, ymd(2024, 1, 1));
    assert_eq!(cats[0].last_transaction, ymd(2024, 2, 1));
}

#[test]
fn test_monthly_view() {
    let l = ledger();
    let monthly = &l.views().monthly;
    assert_eq!(monthly[0].month, "2024-02");
    assert_eq!(monthly[0].category.as_deref(), Some("Salary"));
    let transfers = monthly
        .iter()
        .find(|m| m.month == "2024-01" && m.category.is_none())
        .unwrap();
    assert_eq!(transfers.transaction_count, 2);
    assert_eq!(transfers.total_amount, dec!(0));
    assert_eq!(transfers.min_amount, dec!(-500.00));
    assert_eq!(transfers.max_amount, dec!(500.00));
}

#[test]
fn test_account_type_view_rounds_average() {
    let l = ledger();
    let types = &l.views().account_types;
    assert_eq!(types[0].account_type, AccountType::Bank);
    assert_eq!(types[0].transaction_count, 6);
    assert_eq!(types[0].total_amount, dec!(4147.60));
    assert_eq!(types[0].avg_amount, dec!(691.27));
    assert_eq!(types[1].avg_amount, dec!(144.92));
}

#[test]
fn test_overall_statistics() {
    let overall = ledger().views().overall.clone();
    assert_eq!(overall.total_transactions, 9);
    assert_eq!(overall.unique_categories, 5);
    assert_eq!(overall.unique_account_types, 2);
    assert_eq!(overall.unique_payees, 8);
    assert_eq!(overall.earliest_date, Some(ymd(2024, 1, 1)));
    assert_eq!(overall.latest_date, Some(ymd(2024, 2, 12)));
    assert_eq!(overall.total_amount, dec!(4582.36));
    assert_eq!(overall.total_income, dec!(5500.00));
    assert_eq!(overall.total_expenses, dec!(-917.64));
    assert_eq!(overall.transfer_count, 2);
}

#[test]
fn test_summaries_by_period() {
    let l = ledger();
    let month = l.summaries(Period::Month, 50);
    assert!(month.monthly.is_some());
    assert!(month.categories.is_none());
    assert!(month.account_types.is_none());

    let all = l.summaries(Period::All, 2);
    assert_eq!(all.monthly.unwrap().len(), 2);
    assert_eq!(all.categories.unwrap().len(), 2);
    assert_eq!(all.account_types.unwrap().len(), 2);
    assert_eq!(all.statistics.total_transactions, 9);

    let account = l.summaries(Period::Account, 50);
    let json = serde_json::to_value(&account).unwrap();
    assert_eq!(json["period"], "account");
    assert!(json.get("monthly").is_none());
    assert_eq!(json["account_types"][1]["account_type"], "credit-card");
}

#[test]
fn test_views_are_deterministic() {
    assert_eq!(ledger().views(), ledger().views());
}

// ── Guarded SQL ───────────────────────────────────────────────

#[test]
fn test_execute_group_by() {
    let l = ledger();
    let r = run(
        &l,
        "SELECT category, COUNT(*) AS n FROM transactions WHERE category IS NOT NULL GROUP BY category ORDER BY n DESC, category LIMIT 2",
    );
    assert_eq!(r.columns, vec!["category", "n"]);
    assert_eq!(r.count, 2);
    assert_eq!(r.rows[0], vec![json!("Salary"), json!(2)]);
    assert_eq!(r.limit, LimitAction::Kept);
}

#[test]
fn test_execute_injects_limit() {
    let l = ledger();
    let r = run(&l, "SELECT tx_id FROM transactions");
    assert_eq!(r.count, 9);
    assert!(r.query.ends_with("\nLIMIT 1000"));
    assert_eq!(r.limit, LimitAction::Injected);
}

#[test]
fn test_execute_clamped_limit_bounds_rows() {
    let l = ledger();
    let query = guard::check("SELECT tx_id FROM transactions LIMIT 500", 3).unwrap();
    let r = l.execute(&query).unwrap();
    assert_eq!(r.count, 3);
}

#[test]
fn test_numeric_amounts_aggregate() {
    let l = ledger();
    let r = run(&l, "SELECT SUM(amount) AS total FROM transactions WHERE account_type = 'credit-card'");
    assert_eq!(r.rows[0][0], json!(434.76));
}

#[test]
fn test_sum_does_not_drift() {
    let l = Ledger::from_qif(
        "!Type:Bank\nD01/01/2024\nT0.10\n^\nD01/02/2024\nT0.20\n^\nD01/03/2024\nT-0.30\n^\n",
    )
    .unwrap();
    let r = run(
        &l,
        "SELECT SUM(amount), TOTAL(amount), AVG(amount), SUM(amount) = 0 FROM transactions",
    );
    assert_eq!(r.rows[0], vec![json!(0), json!(0.0), json!(0.0), json!(1)]);

    let r = run(&l, "SELECT SUM(amount) FROM transactions WHERE amount > 0");
    assert_eq!(r.rows[0][0], json!(0.3));
    let r = run(&l, "SELECT balance FROM accounts");
    assert_eq!(r.rows[0][0], json!(0));
}

#[test]
fn test_decimal_aggregates_on_empty_input() {
    let l = ledger();
    let r = run(
        &l,
        "SELECT SUM(amount), TOTAL(amount), AVG(amount) FROM transactions WHERE amount > 1000000",
    );
    assert_eq!(r.rows[0], vec![json!(null), json!(0.0), json!(null)]);
}

#[test]
fn test_avg_is_exact() {
    let l = ledger();
    let r = run(&l, "SELECT AVG(amount) FROM transactions WHERE category = 'Salary'");
    assert_eq!(r.rows[0][0], json!(2500.0));
}

#[test]
fn test_view_with_categories_joins() {
    let l = ledger();
    let r = run(
        &l,
        "SELECT payee, income_category FROM transactions_with_categories WHERE category = 'Salary' ORDER BY tx_id",
    );
    assert_eq!(r.rows.len(), 2);
    assert_eq!(r.rows[0], vec![json!("Acme Corp"), json!(1)]);
}

#[test]
fn test_summary_tables_match_views() {
    let l = ledger();
    let r = run(&l, "SELECT COUNT(*) FROM category_summaries");
    assert_eq!(r.rows[0][0], json!(l.views().categories.len()));
    let r = run(&l, "SELECT first_transaction FROM category_summaries WHERE category = 'Salary'");
    assert_eq!(r.rows[0][0], json!("2024-01-01"));
}

#[test]
fn test_engine_error_is_reported() {
    let l = ledger();
    let query = guard::check("SELECT no_such_column FROM transactions", 10).unwrap();
    let err = l.execute(&query).unwrap_err();
    assert_eq!(err.kind(), crate::error::ErrorKind::QueryExecutionFailed);
}

#[test]
fn test_engine_refuses_writes() {
    // The guard would never pass this; the connection refuses it anyway.
    let l = ledger();
    let query = GuardedQuery {
        sql: "DELETE FROM transactions".into(),
        limit: 10,
        limit_action: LimitAction::Kept,
    };
    assert!(l.execute(&query).is_err());
    assert_eq!(run(&l, "SELECT COUNT(*) FROM transactions").rows[0][0], json!(9));
}

#[test]
#[allow(clippy::panic)]
fn test_poisoned_lock_does_not_disable_queries() {
    let l = std::sync::Arc::new(ledger());
    let held = std::sync::Arc::clone(&l);
    let outcome = std::thread::spawn(move || {
        let _conn = held.conn.lock().unwrap();
        panic!("worker died holding the connection");
    })
    .join();
    assert!(outcome.is_err());
    assert!(l.conn.is_poisoned());
    assert_eq!(run(&l, "SELECT COUNT(*) FROM transactions").rows[0][0], json!(9));
}
