use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use crate::db::Ledger;
use crate::export::Resource;
use crate::tools::{Dispatcher, Tool};

pub(crate) fn call(dispatcher: &Dispatcher, tool: &str, arguments: Option<&str>) -> Result<()> {
    let arguments = match arguments {
        Some(text) => serde_json::from_str(text)
            .with_context(|| format!("Tool arguments are not valid JSON: {text}"))?,
        None => serde_json::Value::Null,
    };

    let envelope = dispatcher.call(tool, arguments);
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if !envelope.success {
        anyhow::bail!("Tool '{tool}' failed");
    }
    Ok(())
}

pub(crate) fn print_tools() -> Result<()> {
    for tool in Tool::ALL {
        let def = tool.definition();
        println!("{}", def.name);
        println!("  {}", def.description);
        println!(
            "  {}",
            serde_json::to_string(&def.input_schema).context("Failed to render schema")?
        );
    }
    Ok(())
}

pub(crate) fn print_stats(ledger: &Ledger) -> Result<()> {
    let stats = ledger.stats();
    let overall = &ledger.views().overall;

    println!("Ingestion");
    println!("{}", "─".repeat(40));
    println!("  Accounts:          {}", stats.accounts);
    println!("  Categories:        {}", stats.categories);
    println!("  Transactions:      {}", stats.transactions);
    println!("  Splits:            {}", stats.splits);
    println!("  Records:           {}", stats.records);
    println!("  Malformed records: {}", stats.malformed_records);
    println!("  Skipped lines:     {}", stats.skipped_lines);
    println!("  Ignored records:   {}", stats.ignored_records);

    if !stats.malformed.is_empty() {
        println!();
        println!("Malformed:");
        for m in &stats.malformed {
            println!("  line {:<6} {}", m.line, m.reason);
        }
    }
    if !stats.split_mismatches.is_empty() {
        println!();
        println!("Split mismatches:");
        for m in &stats.split_mismatches {
            println!(
                "  txn {:<6} amount {:>12} splits {:>12}",
                m.transaction_id, m.amount, m.split_total
            );
        }
    }
    if !stats.category_conflicts.is_empty() {
        println!();
        println!("Category conflicts:");
        for c in &stats.category_conflicts {
            println!(
                "  line {:<6} {:<24} {} -> {}",
                c.line, c.category, c.previous, c.current
            );
        }
    }

    println!();
    println!("Ledger");
    println!("{}", "─".repeat(40));
    if let (Some(first), Some(last)) = (overall.earliest_date, overall.latest_date) {
        println!("  Period:    {first} to {last}");
    }
    println!("  Income:    {:.2}", overall.total_income);
    println!("  Expenses:  {:.2}", overall.total_expenses.abs());
    println!("  Net:       {:.2}", overall.total_amount);
    println!("  Payees:    {}", overall.unique_payees);
    println!("  Transfers: {}", overall.transfer_count);

    let accounts = ledger.accounts();
    if !accounts.is_empty() {
        println!();
        println!("{:<24} {:<16} {:>14}", "Account", "Type", "Balance");
        println!("{}", "─".repeat(56));
        for acct in &accounts {
            println!(
                "{:<24} {:<16} {:>14}",
                acct.name,
                acct.account_type.as_str(),
                format!("{:.2}", acct.balance)
            );
        }
    }
    Ok(())
}

pub(crate) fn export(ledger: &Ledger, resource: Resource, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            resource.write(ledger, BufWriter::new(file))?;
            eprintln!("Exported {} to {}", resource.uri(), path.display());
        }
        None => resource.write(ledger, io::stdout().lock())?,
    }
    Ok(())
}
