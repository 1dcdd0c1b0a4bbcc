use rusqlite::types::Value;

/// A column of the `movements` table that an import can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    OperationDate,
    ValueDate,
    Description,
    Amount,
    Currency,
    Balance,
    BalanceCurrency,
    TransactionNumber,
    BranchOffice,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::OperationDate,
        Field::ValueDate,
        Field::Description,
        Field::Amount,
        Field::Currency,
        Field::Balance,
        Field::BalanceCurrency,
        Field::TransactionNumber,
        Field::BranchOffice,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::OperationDate => "operation_date",
            Self::ValueDate => "value_date",
            Self::Description => "description",
            Self::Amount => "amount",
            Self::Currency => "currency",
            Self::Balance => "balance",
            Self::BalanceCurrency => "balance_currency",
            Self::TransactionNumber => "transaction_number",
            Self::BranchOffice => "branch_office",
        }
    }

    /// Map a header label from a bank export to its target column.
    ///
    /// `Divisa` / `currency` always maps to [`Field::Currency`]; the header
    /// layout decides whether a second occurrence means the balance currency.
    pub fn from_label(label: &str) -> Option<Field> {
        let label = label.trim();
        let field = match label {
            "Fecha de operación" | "Fecha operación" | "F. operación" => Self::OperationDate,
            "Fecha valor" | "F. valor" => Self::ValueDate,
            "Concepto" => Self::Description,
            "Importe" => Self::Amount,
            "Divisa" => Self::Currency,
            "Saldo" => Self::Balance,
            "Nº mov" | "Nº Mov" | "Nº movimiento" => Self::TransactionNumber,
            "Oficina" => Self::BranchOffice,
            other => return Self::ALL.iter().find(|f| f.column() == other).copied(),
        };
        Some(field)
    }

    pub fn is_date(&self) -> bool {
        matches!(self, Self::OperationDate | Self::ValueDate)
    }

    pub fn is_amount(&self) -> bool {
        matches!(self, Self::Amount | Self::Balance)
    }
}

/// One bank movement as it will be written to the store.
///
/// Every field is optional: absent fields are left out of the INSERT
/// entirely, so short source rows still produce a valid statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Movement {
    pub operation_date: Option<String>,
    pub value_date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub balance: Option<f64>,
    pub balance_currency: Option<String>,
    pub transaction_number: Option<String>,
    pub branch_office: Option<String>,
}

impl Movement {
    pub fn set_text(&mut self, field: Field, value: String) {
        match field {
            Field::OperationDate => self.operation_date = Some(value),
            Field::ValueDate => self.value_date = Some(value),
            Field::Description => self.description = Some(value),
            Field::Currency => self.currency = Some(value),
            Field::BalanceCurrency => self.balance_currency = Some(value),
            Field::TransactionNumber => self.transaction_number = Some(value),
            Field::BranchOffice => self.branch_office = Some(value),
            Field::Amount => self.amount = value.parse().ok(),
            Field::Balance => self.balance = value.parse().ok(),
        }
    }

    pub fn set_number(&mut self, field: Field, value: f64) {
        match field {
            Field::Amount => self.amount = Some(value),
            Field::Balance => self.balance = Some(value),
            other => self.set_text(other, value.to_string()),
        }
    }

    /// Present fields in schema order, paired with the value to bind.
    pub fn columns(&self) -> Vec<(Field, Value)> {
        let text = |v: &Option<String>| v.clone().map(Value::Text);
        let real = |v: &Option<f64>| v.map(Value::Real);
        Field::ALL
            .iter()
            .filter_map(|&field| {
                let value = match field {
                    Field::OperationDate => text(&self.operation_date),
                    Field::ValueDate => text(&self.value_date),
                    Field::Description => text(&self.description),
                    Field::Amount => real(&self.amount),
                    Field::Currency => text(&self.currency),
                    Field::Balance => real(&self.balance),
                    Field::BalanceCurrency => text(&self.balance_currency),
                    Field::TransactionNumber => text(&self.transaction_number),
                    Field::BranchOffice => text(&self.branch_office),
                };
                value.map(|v| (field, v))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }

    /// INSERT statement covering only the present columns, with numbered
    /// placeholders in the same order as [`Movement::columns`].
    pub fn insert_sql(&self) -> String {
        let columns = self.columns();
        let names: Vec<&str> = columns.iter().map(|(f, _)| f.column()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO movements ({}) VALUES ({})",
            names.join(", "),
            placeholders.join(", ")
        )
    }

    /// `column=value` pairs for log lines and error reports.
    pub fn describe(&self) -> String {
        self.columns()
            .iter()
            .map(|(field, value)| {
                let shown = match value {
                    Value::Text(s) => format!("{s:?}"),
                    Value::Real(r) => r.to_string(),
                    Value::Integer(i) => i.to_string(),
                    Value::Null => "NULL".to_string(),
                    Value::Blob(b) => format!("<{} bytes>", b.len()),
                };
                format!("{}={shown}", field.column())
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A stored movement read back from the database.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredMovement {
    pub id: i64,
    pub operation_date: Option<String>,
    pub value_date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub balance: Option<f64>,
    pub balance_currency: Option<String>,
    pub transaction_number: Option<String>,
    pub branch_office: Option<String>,
}

impl StoredMovement {
    pub const SELECT: &'static str = "SELECT id, operation_date, value_date, description, amount, currency, \
         balance, balance_currency, transaction_number, branch_office FROM movements";

    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            operation_date: row.get(1)?,
            value_date: row.get(2)?,
            description: row.get(3)?,
            amount: row.get(4)?,
            currency: row.get(5)?,
            balance: row.get(6)?,
            balance_currency: row.get(7)?,
            transaction_number: row.get(8)?,
            branch_office: row.get(9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_label_spanish_and_english() {
        assert_eq!(Field::from_label("Fecha de operación"), Some(Field::OperationDate));
        assert_eq!(Field::from_label(" Fecha valor "), Some(Field::ValueDate));
        assert_eq!(Field::from_label("Divisa"), Some(Field::Currency));
        assert_eq!(Field::from_label("Nº mov"), Some(Field::TransactionNumber));
        assert_eq!(Field::from_label("branch_office"), Some(Field::BranchOffice));
        assert_eq!(Field::from_label("balance_currency"), Some(Field::BalanceCurrency));
        assert_eq!(Field::from_label("Referencia"), None);
    }

    #[test]
    fn test_insert_sql_only_present_columns() {
        let m = Movement {
            operation_date: Some("2024-03-05".to_string()),
            amount: Some(-12.5),
            currency: Some("EUR".to_string()),
            ..Default::default()
        };
        assert_eq!(
            m.insert_sql(),
            "INSERT INTO movements (operation_date, amount, currency) VALUES (?1, ?2, ?3)"
        );
        assert_eq!(m.columns().len(), 3);
    }

    #[test]
    fn test_empty_movement() {
        assert!(Movement::default().is_empty());
        let mut m = Movement::default();
        m.set_text(Field::Description, String::new());
        assert!(!m.is_empty());
    }

    #[test]
    fn test_describe() {
        let m = Movement {
            description: Some("Bizum".to_string()),
            balance: Some(10.0),
            ..Default::default()
        };
        assert_eq!(m.describe(), "description=\"Bizum\", balance=10");
    }
}
