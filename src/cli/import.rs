use std::path::PathBuf;

use colored::Colorize;

use crate::cli::open_db;
use crate::error::Result;
use crate::fmt::amount_with_currency;
use crate::importer::{import_source, SourceFile};
use crate::reconciler::ImportReport;

pub fn run(db: Option<&str>, file: &str) -> Result<()> {
    // Read the export before opening the store so a bad path never touches it.
    let source = SourceFile::open(&PathBuf::from(file))?;
    let conn = open_db(db)?;
    let report = import_source(&conn, &source)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!("Using delimiter: '{}'", report.delimiter);
    println!("CSV headers found: {:?}", report.headers);

    println!("\n{}", "Import complete!".green().bold());
    println!("Initial rows:     {}", report.initial_count);
    println!("Rows read:        {}", report.rows_read);
    println!("Rows inserted:    {}", report.inserted);
    println!("Rows skipped:     {} (no mappable fields)", report.skipped);
    println!("Rows failed:      {}", report.failed());
    println!("Final row count:  {}", report.final_count);
    if !report.is_consistent() {
        println!(
            "{}",
            "Row counts do not add up; was the database written to during the import?".yellow()
        );
    }

    if !report.warnings.is_empty() {
        println!("\n{} ({})", "Warnings".yellow().bold(), report.warnings.len());
        for w in &report.warnings {
            println!("  line {}: {}: {}", w.row, w.field.column(), w.message);
        }
    }

    if !report.errors.is_empty() {
        println!("\n{} ({})", "Rows not imported".red().bold(), report.errors.len());
        for e in &report.errors {
            println!("  line {} [{}]: {}", e.row, e.kind.label(), e.message);
            if !e.data.is_empty() {
                println!("    data: {}", e.data);
            }
        }
    }

    if !report.sample.is_empty() {
        println!("\nSample of imported data:");
        for m in &report.sample {
            println!("{}", "-".repeat(50));
            println!("id: {}", m.id);
            println!("operation_date: {}", m.operation_date.as_deref().unwrap_or(""));
            println!("value_date: {}", m.value_date.as_deref().unwrap_or(""));
            println!("description: {}", m.description.as_deref().unwrap_or(""));
            println!("amount: {}", amount_with_currency(m.amount, m.currency.as_deref()));
            println!("balance: {}", amount_with_currency(m.balance, m.balance_currency.as_deref()));
            println!("transaction_number: {}", m.transaction_number.as_deref().unwrap_or(""));
            println!("branch_office: {}", m.branch_office.as_deref().unwrap_or(""));
        }
    }
}
