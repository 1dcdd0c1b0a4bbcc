use std::sync::OnceLock;

use regex::Regex;
use rusqlite::Connection;
use serde::Serialize;

use crate::error::{BankError, Result};
use crate::models::StoredMovement;

// ---------------------------------------------------------------------------
// Date filter helper
// ---------------------------------------------------------------------------

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"))
}

fn dmy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/.-](\d{1,2})[/.-](\d{4})$").expect("valid regex"))
}

/// Accept `YYYY-MM-DD` as is and convert day-first dates (`/`, `.` or `-`).
pub fn standardize_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if iso_re().is_match(raw) {
        return Ok(raw.to_string());
    }
    if let Some(caps) = dmy_re().captures(raw) {
        return Ok(format!("{}-{:0>2}-{:0>2}", &caps[3], &caps[2], &caps[1]));
    }
    Err(BankError::InvalidDate(raw.to_string()))
}

fn date_filter(from_date: Option<&str>, to_date: Option<&str>) -> Result<(String, Vec<String>)> {
    let from = from_date.map(standardize_date).transpose()?;
    let to = to_date.map(standardize_date).transpose()?;
    Ok(match (from, to) {
        (Some(from), Some(to)) => (
            "WHERE operation_date >= ?1 AND operation_date <= ?2".to_string(),
            vec![from, to],
        ),
        (Some(from), None) => ("WHERE operation_date >= ?1".to_string(), vec![from]),
        (None, Some(to)) => ("WHERE operation_date <= ?1".to_string(), vec![to]),
        (None, None) => (String::new(), Vec::new()),
    })
}

// ---------------------------------------------------------------------------
// Movements in a date range
// ---------------------------------------------------------------------------

pub fn movements_between(conn: &Connection, from_date: &str, to_date: &str) -> Result<Vec<StoredMovement>> {
    let (clause, params) = date_filter(Some(from_date), Some(to_date))?;
    let sql = format!("{} {clause} ORDER BY operation_date DESC, id DESC", StoredMovement::SELECT);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), StoredMovement::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Monthly summary
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub transaction_count: i64,
}

#[derive(Debug, Serialize)]
pub struct SummaryTotals {
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_net: f64,
    pub total_transactions: i64,
}

#[derive(Debug, Serialize)]
pub struct MonthlySummary {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub totals: SummaryTotals,
    pub monthly_data: Vec<MonthSummary>,
}

pub fn get_monthly_summary(
    conn: &Connection,
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Result<MonthlySummary> {
    let (clause, params) = date_filter(from_date, to_date)?;

    let sql = format!(
        "SELECT substr(operation_date, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN amount < 0 THEN amount ELSE 0 END), 0),
                COALESCE(SUM(amount), 0),
                COUNT(*)
         FROM movements {clause}
         GROUP BY month
         ORDER BY month"
    );
    let mut stmt = conn.prepare(&sql)?;
    let monthly_data = stmt
        .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(MonthSummary {
                month: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                income: row.get(1)?,
                expenses: row.get(2)?,
                net: row.get(3)?,
                transaction_count: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let totals_sql = format!(
        "SELECT COALESCE(SUM(CASE WHEN amount > 0 THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN amount < 0 THEN amount ELSE 0 END), 0),
                COALESCE(SUM(amount), 0),
                COUNT(*)
         FROM movements {clause}"
    );
    let totals = conn.query_row(&totals_sql, rusqlite::params_from_iter(params.iter()), |row| {
        Ok(SummaryTotals {
            total_income: row.get(0)?,
            total_expenses: row.get(1)?,
            total_net: row.get(2)?,
            total_transactions: row.get(3)?,
        })
    })?;

    Ok(MonthlySummary {
        start_date: from_date.map(standardize_date).transpose()?,
        end_date: to_date.map(standardize_date).transpose()?,
        totals,
        monthly_data,
    })
}

// ---------------------------------------------------------------------------
// Spending patterns
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DescriptionTotal {
    pub description: String,
    pub frequency: i64,
    pub total_amount: f64,
    pub average_amount: f64,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Recurring {
    pub description: String,
    pub average_amount: f64,
    pub months_present: i64,
    pub total_months: i64,
    pub total_amount: f64,
    pub consistency: f64,
}

#[derive(Debug, Serialize)]
pub struct SpendingPatterns {
    pub expense_categories: Vec<DescriptionTotal>,
    pub income_sources: Vec<DescriptionTotal>,
    pub recurring_transactions: Vec<Recurring>,
}

fn query_description_totals(conn: &Connection, sign: &str, order: &str, limit: i64) -> Result<Vec<DescriptionTotal>> {
    let sql = format!(
        "SELECT COALESCE(description, ''), COUNT(*), SUM(amount), AVG(amount),
                MIN(operation_date), MAX(operation_date)
         FROM movements
         WHERE amount {sign} 0
         GROUP BY description
         ORDER BY {order}
         LIMIT ?1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([limit], |row| {
            Ok(DescriptionTotal {
                description: row.get(0)?,
                frequency: row.get(1)?,
                total_amount: row.get(2)?,
                average_amount: row.get(3)?,
                first_date: row.get(4)?,
                last_date: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_spending_patterns(conn: &Connection) -> Result<SpendingPatterns> {
    let expense_categories = query_description_totals(conn, "<", "ABS(SUM(amount)) DESC", 30)?;
    let income_sources = query_description_totals(conn, ">", "SUM(amount) DESC", 20)?;

    let mut stmt = conn.prepare(
        "SELECT COALESCE(description, ''),
                AVG(amount) AS average_amount,
                COUNT(DISTINCT substr(operation_date, 1, 7)) AS months_present,
                (SELECT COUNT(DISTINCT substr(operation_date, 1, 7)) FROM movements),
                SUM(amount)
         FROM movements
         GROUP BY description
         HAVING months_present >= 3 AND ABS(average_amount) > 5
         ORDER BY months_present DESC, ABS(average_amount) DESC
         LIMIT 30",
    )?;
    let recurring_transactions = stmt
        .query_map([], |row| {
            let months_present: i64 = row.get(2)?;
            let total_months: i64 = row.get(3)?;
            Ok(Recurring {
                description: row.get(0)?,
                average_amount: row.get(1)?,
                months_present,
                total_months,
                total_amount: row.get(4)?,
                consistency: if total_months > 0 {
                    months_present as f64 / total_months as f64
                } else {
                    0.0
                },
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(SpendingPatterns {
        expense_categories,
        income_sources,
        recurring_transactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_db;

    fn insert(conn: &Connection, date: &str, desc: &str, amount: f64) {
        conn.execute(
            "INSERT INTO movements (operation_date, description, amount) VALUES (?1, ?2, ?3)",
            rusqlite::params![date, desc, amount],
        )
        .unwrap();
    }

    fn seed(conn: &Connection) {
        insert(conn, "2024-01-05", "Nómina", 2000.0);
        insert(conn, "2024-01-10", "Alquiler", -800.0);
        insert(conn, "2024-01-20", "Supermercado", -120.0);
        insert(conn, "2024-02-05", "Nómina", 2000.0);
        insert(conn, "2024-02-10", "Alquiler", -800.0);
        insert(conn, "2024-03-05", "Nómina", 2100.0);
        insert(conn, "2024-03-10", "Alquiler", -800.0);
        insert(conn, "2024-03-11", "Café", -2.0);
    }

    #[test]
    fn test_standardize_date() {
        assert_eq!(standardize_date("2024-03-05").unwrap(), "2024-03-05");
        assert_eq!(standardize_date("5/3/2024").unwrap(), "2024-03-05");
        assert_eq!(standardize_date("05.03.2024").unwrap(), "2024-03-05");
        assert_eq!(standardize_date("05-03-2024").unwrap(), "2024-03-05");
        assert!(matches!(standardize_date("March 5"), Err(BankError::InvalidDate(_))));
    }

    #[test]
    fn test_movements_between_inclusive_newest_first() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let rows = movements_between(&conn, "10/01/2024", "2024-02-05").unwrap();
        let dates: Vec<_> = rows.iter().filter_map(|m| m.operation_date.as_deref()).collect();
        assert_eq!(dates, vec!["2024-02-05", "2024-01-20", "2024-01-10"]);
    }

    #[test]
    fn test_monthly_summary() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let summary = get_monthly_summary(&conn, None, None).unwrap();
        assert_eq!(summary.monthly_data.len(), 3);
        let jan = &summary.monthly_data[0];
        assert_eq!(jan.month, "2024-01");
        assert_eq!(jan.income, 2000.0);
        assert_eq!(jan.expenses, -920.0);
        assert_eq!(jan.net, 1080.0);
        assert_eq!(jan.transaction_count, 3);
        assert_eq!(summary.totals.total_transactions, 8);
        assert_eq!(summary.totals.total_income, 6100.0);
    }

    #[test]
    fn test_monthly_summary_with_bounds() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let summary = get_monthly_summary(&conn, Some("01/02/2024"), None).unwrap();
        assert_eq!(summary.start_date.as_deref(), Some("2024-02-01"));
        assert_eq!(summary.monthly_data.len(), 2);
        assert_eq!(summary.totals.total_transactions, 5);
    }

    #[test]
    fn test_monthly_summary_empty_table() {
        let (_dir, conn) = test_db();
        let summary = get_monthly_summary(&conn, None, None).unwrap();
        assert!(summary.monthly_data.is_empty());
        assert_eq!(summary.totals.total_net, 0.0);
    }

    #[test]
    fn test_spending_patterns() {
        let (_dir, conn) = test_db();
        seed(&conn);
        let patterns = get_spending_patterns(&conn).unwrap();
        assert_eq!(patterns.expense_categories[0].description, "Alquiler");
        assert_eq!(patterns.expense_categories[0].total_amount, -2400.0);
        assert_eq!(patterns.income_sources.len(), 1);
        assert_eq!(patterns.income_sources[0].frequency, 3);

        let recurring: Vec<_> = patterns.recurring_transactions.iter().map(|r| r.description.as_str()).collect();
        assert!(recurring.contains(&"Alquiler"));
        assert!(recurring.contains(&"Nómina"));
        assert!(!recurring.contains(&"Café"));
        assert!(patterns.recurring_transactions.iter().all(|r| r.consistency == 1.0));
    }
}
