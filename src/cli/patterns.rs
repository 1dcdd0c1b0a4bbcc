use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_db, print_json};
use crate::error::Result;
use crate::fmt::amount;
use crate::reports::{get_spending_patterns, DescriptionTotal};

fn totals_table(rows: &[DescriptionTotal]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Description", "Count", "Total", "Average", "First", "Last"]);
    for r in rows {
        table.add_row(vec![
            Cell::new(&r.description),
            Cell::new(r.frequency),
            Cell::new(amount(r.total_amount)).set_alignment(CellAlignment::Right),
            Cell::new(amount(r.average_amount)).set_alignment(CellAlignment::Right),
            Cell::new(r.first_date.as_deref().unwrap_or("")),
            Cell::new(r.last_date.as_deref().unwrap_or("")),
        ]);
    }
    table
}

pub fn run(db: Option<&str>, json: bool) -> Result<()> {
    let conn = open_db(db)?;
    let patterns = get_spending_patterns(&conn)?;

    if json {
        return print_json(&serde_json::json!({ "spending_patterns": patterns }));
    }

    println!("Top Expenses\n{}", totals_table(&patterns.expense_categories));
    println!("\nTop Income Sources\n{}", totals_table(&patterns.income_sources));

    let mut table = Table::new();
    table.set_header(vec!["Description", "Average", "Months", "Consistency", "Total"]);
    for r in &patterns.recurring_transactions {
        table.add_row(vec![
            Cell::new(&r.description),
            Cell::new(amount(r.average_amount)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}/{}", r.months_present, r.total_months)),
            Cell::new(format!("{:.0}%", r.consistency * 100.0)),
            Cell::new(amount(r.total_amount)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("\nRecurring\n{table}");
    Ok(())
}
