use comfy_table::{Cell, Table};

use crate::cli::{open_db, print_json};
use crate::error::Result;
use crate::query::{display_value, run_query};

pub fn run(db: Option<&str>, sql: &str, json: bool) -> Result<()> {
    let conn = open_db(db)?;
    let result = run_query(&conn, sql)?;

    if json {
        return print_json(&result.to_json());
    }

    let mut table = Table::new();
    table.set_header(result.columns.clone());
    for row in &result.rows {
        table.add_row(row.iter().map(|v| Cell::new(display_value(v))));
    }
    println!("{table}");
    println!("{} row(s)", result.rows.len());
    Ok(())
}
