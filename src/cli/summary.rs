use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_db, print_json};
use crate::error::Result;
use crate::fmt::amount;
use crate::reports::get_monthly_summary;

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub fn run(db: Option<&str>, from_date: Option<&str>, to_date: Option<&str>, json: bool) -> Result<()> {
    let conn = open_db(db)?;
    let summary = get_monthly_summary(&conn, from_date, to_date)?;

    if json {
        return print_json(&serde_json::json!({ "monthly_summary": summary }));
    }

    let mut table = Table::new();
    table.set_header(vec!["Month", "Income", "Expenses", "Net", "Count"]);
    for m in &summary.monthly_data {
        table.add_row(vec![
            Cell::new(&m.month),
            right(amount(m.income)),
            right(amount(m.expenses)),
            right(amount(m.net)),
            Cell::new(m.transaction_count),
        ]);
    }
    let t = &summary.totals;
    let net = if t.total_net >= 0.0 {
        amount(t.total_net).green().bold()
    } else {
        amount(t.total_net).red().bold()
    };
    table.add_row(vec![
        Cell::new("Total".bold()),
        right(amount(t.total_income)),
        right(amount(t.total_expenses)),
        Cell::new(net).set_alignment(CellAlignment::Right),
        Cell::new(t.total_transactions),
    ]);
    println!("Monthly Summary\n{table}");
    Ok(())
}
