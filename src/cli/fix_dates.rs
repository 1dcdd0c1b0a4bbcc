use crate::cli::open_db;
use crate::error::Result;
use crate::fmt::amount;
use crate::maintenance::{fix_dates, FIX_BACKUP_TABLE};
use crate::reports::get_monthly_summary;

pub fn run(db: Option<&str>) -> Result<()> {
    let conn = open_db(db)?;
    let result = fix_dates(&conn)?;

    println!("Backup table: {FIX_BACKUP_TABLE}");
    println!("Operation dates fixed: {}", result.operation_dates_fixed);
    println!("Value dates fixed:     {}", result.value_dates_fixed);
    println!("Total positive amount (income):   {}", amount(result.total_positive));
    println!("Total negative amount (expenses): {}", amount(result.total_negative));
    println!(
        "Date range after fix: {} to {}",
        result.earliest.as_deref().unwrap_or("-"),
        result.latest.as_deref().unwrap_or("-")
    );

    let summary = get_monthly_summary(&conn, None, None)?;
    if !summary.monthly_data.is_empty() {
        println!("\nSample of monthly data after fix:");
        println!("Month      | Expenses     | Income       | Net          | Count");
        println!("{}", "-".repeat(68));
        for m in summary.monthly_data.iter().take(5) {
            println!(
                "{:<10} | {:>12} | {:>12} | {:>12} | {}",
                m.month,
                amount(m.expenses),
                amount(m.income),
                amount(m.net),
                m.transaction_count
            );
        }
    }
    Ok(())
}
