use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::db::{sample_movements, table_info, table_names, ColumnInfo};
use crate::error::{BankError, Result};
use crate::models::StoredMovement;

/// Result set of an ad-hoc query, column names first.
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn to_json(&self) -> Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self.columns.iter().cloned().zip(row.iter().cloned()).collect();
                Value::Object(obj)
            })
            .collect();
        serde_json::json!({ "results": Value::Array(rows) })
    }
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<{} bytes>", b.len())),
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reject anything but a single SELECT (or WITH ... SELECT) statement.
pub fn check_read_only(sql: &str) -> Result<&str> {
    let trimmed = sql.trim().trim_end_matches(';').trim_end();
    let lower = trimmed.to_lowercase();
    if !(lower.starts_with("select") || lower.starts_with("with")) {
        return Err(BankError::ReadOnly("statement must start with SELECT".to_string()));
    }
    if has_separator_outside_quotes(trimmed) {
        return Err(BankError::ReadOnly("only one statement is allowed".to_string()));
    }
    Ok(trimmed)
}

/// `;` that is not inside a `'...'`, `"..."` or `[...]` token.
fn has_separator_outside_quotes(sql: &str) -> bool {
    let mut closing: Option<char> = None;
    for c in sql.chars() {
        match closing {
            Some(end) if c == end => closing = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => closing = Some(c),
                '[' => closing = Some(']'),
                ';' => return true,
                _ => {}
            },
        }
    }
    false
}

pub fn run_query(conn: &Connection, sql: &str) -> Result<QueryResult> {
    let sql = check_read_only(sql)?;
    let mut stmt = conn.prepare(sql).map_err(|e| match e {
        rusqlite::Error::MultipleStatement => BankError::ReadOnly("only one statement is allowed".to_string()),
        other => BankError::Db(other),
    })?;
    if !stmt.readonly() {
        return Err(BankError::ReadOnly("statement would modify the database".to_string()));
    }
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();
    let mut rows = Vec::new();
    let mut result_rows = stmt.query([])?;
    while let Some(row) = result_rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(value_to_json(row.get_ref(i)?));
        }
        rows.push(values);
    }
    Ok(QueryResult { columns, rows })
}

pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

pub struct Schema {
    pub tables: Vec<TableSchema>,
    pub sample: Vec<StoredMovement>,
}

impl Schema {
    pub fn to_json(&self) -> Value {
        let mut schema = Map::new();
        for table in &self.tables {
            let cols: Vec<Value> = table
                .columns
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "name": c.name,
                        "type": c.col_type,
                        "notnull": c.not_null,
                        "default_value": c.default_value,
                        "is_primary_key": c.primary_key,
                    })
                })
                .collect();
            schema.insert(table.name.clone(), Value::Array(cols));
        }
        schema.insert(
            "_sample_data".to_string(),
            serde_json::to_value(&self.sample).unwrap_or(Value::Null),
        );
        serde_json::json!({ "schema": schema })
    }
}

pub fn get_schema(conn: &Connection) -> Result<Schema> {
    let mut tables = Vec::new();
    for name in table_names(conn)? {
        let columns = table_info(conn, &name)?;
        tables.push(TableSchema { name, columns });
    }
    let has_movements = tables.iter().any(|t| t.name == "movements");
    let sample = if has_movements {
        sample_movements(conn, 5)?
    } else {
        Vec::new()
    };
    Ok(Schema { tables, sample })
}
