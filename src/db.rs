use std::path::Path;

use rusqlite::Connection;

use crate::error::{BankError, Result};
use crate::models::StoredMovement;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS movements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation_date TEXT,
    value_date TEXT,
    description TEXT,
    amount REAL,
    currency TEXT,
    balance REAL,
    balance_currency TEXT,
    transaction_number TEXT,
    branch_office TEXT
);
";

pub const INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_operation_date ON movements(operation_date);
CREATE INDEX IF NOT EXISTS idx_value_date ON movements(value_date);
CREATE INDEX IF NOT EXISTS idx_amount ON movements(amount);
CREATE INDEX IF NOT EXISTS idx_description ON movements(description);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let store_err = |source| BankError::StoreConnection {
        path: db_path.display().to_string(),
        source,
    };
    let conn = Connection::open(db_path).map_err(store_err)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(store_err)?;
    Ok(conn)
}

/// Open a database that must already exist, without creating an empty file.
pub fn open_existing(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(BankError::Settings(format!(
            "No database found at {}\nRun `bankbook init --db {}` to create one.",
            db_path.display(),
            db_path.display()
        )));
    }
    get_connection(db_path)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    ensure_indexes(conn)
}

pub fn ensure_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(INDEXES)?;
    Ok(())
}

pub fn count_movements(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT count(*) FROM movements", [], |r| r.get(0))?)
}

/// Most recent movements by operation date.
pub fn sample_movements(conn: &Connection, limit: usize) -> Result<Vec<StoredMovement>> {
    let sql = format!("{} ORDER BY operation_date DESC, id DESC LIMIT ?1", StoredMovement::SELECT);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([limit as i64], StoredMovement::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ColumnInfo {
    pub name: String,
    pub col_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

pub fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

pub fn table_info(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare("SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1)")?;
    let cols = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                col_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                default_value: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? != 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(cols)
}

pub fn date_range(conn: &Connection) -> Result<(Option<String>, Option<String>)> {
    Ok(conn.query_row(
        "SELECT MIN(operation_date), MAX(operation_date) FROM movements",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_init_db_creates_movements() {
        let (_dir, conn) = test_db();
        let tables = table_names(&conn).unwrap();
        assert!(tables.contains(&"movements".to_string()));
        let cols: Vec<String> = table_info(&conn, "movements").unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(
            cols,
            vec![
                "id", "operation_date", "value_date", "description", "amount", "currency",
                "balance", "balance_currency", "transaction_number", "branch_office",
            ]
        );
    }

    #[test]
    fn test_init_db_is_idempotent_and_keeps_rows() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO movements (description) VALUES ('kept')", []).unwrap();
        init_db(&conn).unwrap();
        assert_eq!(count_movements(&conn).unwrap(), 1);
    }

    #[test]
    fn test_init_db_creates_indexes() {
        let (_dir, conn) = test_db();
        let n: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'movements' AND name LIKE 'idx_%'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn test_sample_orders_newest_first() {
        let (_dir, conn) = test_db();
        for d in ["2024-01-01", "2024-03-01", "2024-02-01"] {
            conn.execute("INSERT INTO movements (operation_date) VALUES (?1)", [d]).unwrap();
        }
        let sample = sample_movements(&conn, 2).unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample[0].operation_date.as_deref(), Some("2024-03-01"));
        assert_eq!(sample[1].operation_date.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn test_date_range() {
        let (_dir, conn) = test_db();
        assert_eq!(date_range(&conn).unwrap(), (None, None));
        for d in ["2024-05-01", "2023-11-30"] {
            conn.execute("INSERT INTO movements (operation_date) VALUES (?1)", [d]).unwrap();
        }
        assert_eq!(
            date_range(&conn).unwrap(),
            (Some("2023-11-30".to_string()), Some("2024-05-01".to_string()))
        );
    }

    #[test]
    fn test_open_existing_requires_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.db");
        assert!(matches!(open_existing(&missing), Err(BankError::Settings(_))));
        assert!(!missing.exists());
    }
}
