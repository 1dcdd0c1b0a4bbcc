use crate::db::{get_connection, init_db, table_info};
use crate::error::Result;
use crate::settings::{load_settings, resolve_db_path, save_settings};

pub fn run(db: Option<&str>) -> Result<()> {
    let db_path = resolve_db_path(db)?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let conn = get_connection(&db_path)?;
    init_db(&conn)?;

    let resolved = std::fs::canonicalize(&db_path).unwrap_or(db_path);
    let mut settings = load_settings();
    settings.db_path = Some(resolved.to_string_lossy().to_string());
    save_settings(&settings)?;

    println!("Initialized database at {}", resolved.display());
    println!("\nTable structure:");
    for col in table_info(&conn, "movements")? {
        println!("  {} ({})", col.name, col.col_type);
    }
    Ok(())
}
