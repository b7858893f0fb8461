#![allow(clippy::unwrap_used)]

use super::*;

const SAMPLE: &str = include_str!("../testdata/sample.qif");

fn ledger() -> Ledger {
    Ledger::from_qif(SAMPLE).unwrap()
}

#[test]
fn test_resource_uris() {
    assert_eq!(
        Resource::from_uri("quicken://transactions_export"),
        Some(Resource::Transactions)
    );
    assert_eq!(
        Resource::from_uri("quicken://ledger_summary"),
        Some(Resource::Summary)
    );
    assert_eq!(Resource::from_uri("quicken://nope"), None);
    for r in Resource::ALL {
        assert_eq!(r.definition().mime_type, "text/csv");
        assert_eq!(r.definition().uri, r.uri());
    }
}

#[test]
fn test_summary_csv() {
    let csv = Resource::Summary.render(&ledger()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Category,Transaction Count,Total Amount,Average Amount,First Transaction,Last Transaction",
            "Salary,2,5000.00,2500.00,2024-01-01,2024-02-01",
            "Entertainment,1,-19.99,-19.99,2024-02-12,2024-02-12",
            "Food,1,-45.25,-45.25,2024-01-10,2024-01-10",
            "Food:Groceries,1,-82.40,-82.40,2024-01-03,2024-01-03",
            "Utilities,1,-150.00,-150.00,2024-01-15,2024-01-15",
        ]
    );
}

#[test]
fn test_transactions_csv_has_every_transaction() {
    let csv = Resource::Transactions.render(&ledger()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "Date,Account Type,Payee,Amount,Category,Memo");
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[1], "2024-02-12,credit-card,StreamCo,-19.99,Entertainment,");
}

#[test]
fn test_transactions_csv_escapes_text() {
    let csv = Resource::Transactions.render(&ledger()).unwrap();
    assert!(csv.contains("2024-01-15,bank,City Power & Light,-150.00,Utilities,\"Electric, January\"\n"));
    assert!(csv.contains("\"Bistro \"\"Le Coin\"\"\""));

    // Parses back into the same number of fields on every row.
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    for record in reader.records() {
        assert_eq!(record.unwrap().len(), 6);
    }
}

#[test]
fn test_transfers_shown_in_brackets() {
    let csv = Resource::Transactions.render(&ledger()).unwrap();
    assert!(csv.contains("2024-01-20,bank,Transfer to card,-500.00,[Visa],\n"));
}

#[test]
fn test_write_to_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    Resource::Summary
        .write(&ledger(), file.as_file())
        .unwrap();
    let written = std::fs::read_to_string(file.path()).unwrap();
    assert!(written.starts_with("Category,"));
}
