use crate::db::{count_movements, date_range, get_connection};
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::resolve_db_path;

pub fn run(db: Option<&str>) -> Result<()> {
    let db_path = resolve_db_path(db)?;
    println!("Database:   {}", db_path.display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `bankbook init --db <path>` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let conn = get_connection(&db_path)?;
    let movements = count_movements(&conn)?;
    let (earliest, latest) = date_range(&conn)?;

    println!();
    println!("Movements:  {movements}");
    println!("Earliest:   {}", earliest.as_deref().unwrap_or("-"));
    println!("Latest:     {}", latest.as_deref().unwrap_or("-"));
    Ok(())
}
