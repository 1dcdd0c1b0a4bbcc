use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_db, print_json};
use crate::error::Result;
use crate::fmt::amount_with_currency;
use crate::models::StoredMovement;
use crate::reports::movements_between;

pub(crate) fn movements_table(rows: &[StoredMovement]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Value Date", "Description", "Amount", "Balance", "No."]);
    for m in rows {
        table.add_row(vec![
            Cell::new(m.id),
            Cell::new(m.operation_date.as_deref().unwrap_or("")),
            Cell::new(m.value_date.as_deref().unwrap_or("")),
            Cell::new(m.description.as_deref().unwrap_or("")),
            Cell::new(amount_with_currency(m.amount, m.currency.as_deref())).set_alignment(CellAlignment::Right),
            Cell::new(amount_with_currency(m.balance, m.balance_currency.as_deref()))
                .set_alignment(CellAlignment::Right),
            Cell::new(m.transaction_number.as_deref().unwrap_or("")),
        ]);
    }
    table
}

pub fn run(db: Option<&str>, from_date: &str, to_date: &str, json: bool) -> Result<()> {
    let conn = open_db(db)?;
    let rows = movements_between(&conn, from_date, to_date)?;

    if json {
        return print_json(&serde_json::json!({ "movements": rows }));
    }

    println!("Movements\n{}", movements_table(&rows));
    println!("{} movement(s)", rows.len());
    Ok(())
}
