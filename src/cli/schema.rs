use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{open_db, print_json};
use crate::cli::movements::movements_table;
use crate::error::Result;
use crate::query::get_schema;

pub fn run(db: Option<&str>, json: bool) -> Result<()> {
    let conn = open_db(db)?;
    let schema = get_schema(&conn)?;

    if json {
        return print_json(&schema.to_json());
    }

    for t in &schema.tables {
        let mut table = Table::new();
        table.set_header(vec!["Column", "Type", "Not Null", "Default", "PK"]);
        for c in &t.columns {
            table.add_row(vec![
                Cell::new(&c.name),
                Cell::new(&c.col_type),
                Cell::new(if c.not_null { "yes" } else { "" }),
                Cell::new(c.default_value.as_deref().unwrap_or("")),
                Cell::new(if c.primary_key { "yes" } else { "" }),
            ]);
        }
        println!("{}\n{table}\n", t.name.bold());
    }

    if !schema.sample.is_empty() {
        println!("{}\n{}", "Sample data".bold(), movements_table(&schema.sample));
    }
    Ok(())
}
