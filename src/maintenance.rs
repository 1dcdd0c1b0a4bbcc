use rusqlite::Connection;
use tracing::info;

use crate::db::{count_movements, date_range, ensure_indexes};
use crate::error::Result;

pub const FIX_BACKUP_TABLE: &str = "movements_backup";
pub const CLEAR_BACKUP_TABLE: &str = "movements_backup_old";

pub struct FixDatesResult {
    pub operation_dates_fixed: usize,
    pub value_dates_fixed: usize,
    pub total_positive: f64,
    pub total_negative: f64,
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

/// Rewrite `DD/MM/YYYY` dates left by older imports as `YYYY-MM-DD`.
///
/// A copy of the table is kept in `movements_backup` the first time this runs.
pub fn fix_dates(conn: &Connection) -> Result<FixDatesResult> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {FIX_BACKUP_TABLE} AS SELECT * FROM movements"
    ))?;

    let mut fixed = [0usize; 2];
    for (slot, column) in fixed.iter_mut().zip(["operation_date", "value_date"]) {
        *slot = tx.execute(
            &format!(
                "UPDATE movements
                 SET {column} = substr({column}, 7, 4) || '-' || substr({column}, 4, 2) || '-' || substr({column}, 1, 2)
                 WHERE {column} LIKE '__/__/____'"
            ),
            [],
        )?;
    }
    tx.commit()?;
    info!(operation_dates = fixed[0], value_dates = fixed[1], "dates rewritten");

    let (total_positive, total_negative) = conn.query_row(
        "SELECT COALESCE(SUM(CASE WHEN amount > 0 THEN amount END), 0),
                COALESCE(SUM(CASE WHEN amount < 0 THEN amount END), 0)
         FROM movements",
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    ensure_indexes(conn)?;
    let (earliest, latest) = date_range(conn)?;

    Ok(FixDatesResult {
        operation_dates_fixed: fixed[0],
        value_dates_fixed: fixed[1],
        total_positive,
        total_negative,
        earliest,
        latest,
    })
}

pub struct ClearResult {
    pub count_before: i64,
    pub count_after: i64,
}

/// Delete every movement after copying the table to `movements_backup_old`.
///
/// The autoincrement counter is reset so the next import starts at id 1.
pub fn clear_movements(conn: &Connection) -> Result<ClearResult> {
    let count_before = count_movements(conn)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(&format!(
        "DROP TABLE IF EXISTS {CLEAR_BACKUP_TABLE};
         CREATE TABLE {CLEAR_BACKUP_TABLE} AS SELECT * FROM movements;
         DELETE FROM movements;"
    ))?;
    let has_sequence: bool = tx
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'")?
        .exists([])?;
    if has_sequence {
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'movements'", [])?;
    }
    tx.commit()?;
    info!(count_before, backup = CLEAR_BACKUP_TABLE, "movements cleared");

    Ok(ClearResult {
        count_before,
        count_after: count_movements(conn)?,
    })
}
