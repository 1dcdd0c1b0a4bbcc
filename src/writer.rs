use rusqlite::{Connection, ErrorCode, Transaction};
use tracing::{debug, info};

use crate::error::{BankError, Result};
use crate::models::Movement;

/// Inserts movements inside bounded transactions.
///
/// A transaction is open from [`MovementWriter::begin`] until
/// [`MovementWriter::finish`]; every `batch_size` successful inserts it is
/// committed and a new one is started. Dropping the writer without finishing
/// rolls back the open batch, the same outcome as the process dying mid-run.
pub struct MovementWriter<'conn> {
    conn: &'conn Connection,
    tx: Option<Transaction<'conn>>,
    batch_size: usize,
    inserted: usize,
    pending: usize,
}

impl<'conn> MovementWriter<'conn> {
    pub fn begin(conn: &'conn Connection, batch_size: usize) -> Result<Self> {
        let tx = conn.unchecked_transaction().map_err(|source| store_error(conn, source))?;
        Ok(Self {
            conn,
            tx: Some(tx),
            batch_size: batch_size.max(1),
            inserted: 0,
            pending: 0,
        })
    }

    /// Insert one row. A row the store rejects is returned as
    /// [`BankError::RowInsert`] and leaves the open batch intact; any other
    /// failure is a [`BankError::StoreConnection`] and ends the import.
    pub fn insert(&mut self, movement: &Movement) -> Result<()> {
        let conn = self.conn;
        let classify = |e| insert_error(conn, e);
        {
            let values = movement.columns().into_iter().map(|(_, v)| v);
            let mut stmt = conn.prepare_cached(&movement.insert_sql()).map_err(classify)?;
            stmt.execute(rusqlite::params_from_iter(values)).map_err(classify)?;
        }
        self.inserted += 1;
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.commit()?;
            info!("Imported {} rows so far...", self.inserted);
            self.tx = Some(conn.unchecked_transaction().map_err(|source| store_error(conn, source))?);
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().map_err(|source| store_error(self.conn, source))?;
            debug!(rows = self.pending, "batch committed");
            self.pending = 0;
        }
        Ok(())
    }

    /// Commit the last batch and return the number of rows inserted.
    pub fn finish(mut self) -> Result<usize> {
        self.commit()?;
        Ok(self.inserted)
    }

    #[cfg(test)]
    pub fn inserted(&self) -> usize {
        self.inserted
    }
}

fn store_error(conn: &Connection, source: rusqlite::Error) -> BankError {
    BankError::StoreConnection {
        path: conn.path().unwrap_or("").to_string(),
        source,
    }
}

/// Constraint, type and size failures belong to the row. Busy, locked, I/O,
/// full-disk and similar codes mean the store itself is unusable.
fn insert_error(conn: &Connection, e: rusqlite::Error) -> BankError {
    match e.sqlite_error_code() {
        None
        | Some(ErrorCode::ConstraintViolation)
        | Some(ErrorCode::TypeMismatch)
        | Some(ErrorCode::TooBig)
        | Some(ErrorCode::ParameterOutOfRange) => BankError::RowInsert(e),
        Some(_) => store_error(conn, e),
    }
}
