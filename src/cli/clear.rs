use crate::cli::open_db;
use crate::error::{BankError, Result};
use crate::maintenance::{clear_movements, CLEAR_BACKUP_TABLE};

pub fn run(db: Option<&str>, yes: bool) -> Result<()> {
    if !yes {
        return Err(BankError::Other(
            "Refusing to delete movements without --yes".to_string(),
        ));
    }
    let conn = open_db(db)?;
    let result = clear_movements(&conn)?;
    println!("Records before: {}", result.count_before);
    println!("Records after:  {}", result.count_after);
    println!("Previous data kept in '{CLEAR_BACKUP_TABLE}'.");
    Ok(())
}
