use std::path::Path;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::count_movements;
use crate::error::{BankError, Result};
use crate::models::{Field, Movement};
use crate::reconciler::{build_report, ImportReport, RowError, RowErrorKind};
use crate::writer::MovementWriter;

const SAMPLE_BYTES: usize = 1024;
pub const BATCH_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `;` anywhere in the sample means a semicolon-separated export.
pub fn detect_delimiter(sample: &[u8]) -> u8 {
    if sample.contains(&b';') {
        b';'
    } else {
        b','
    }
}

/// `DD/MM/YYYY` or `DD-MM-YYYY` to `YYYY-MM-DD`.
pub fn parse_date_dmy(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let sep = if raw.contains('/') { '/' } else { '-' };
    let parts: Vec<&str> = raw.split(sep).collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return None;
    }
    if parts[..2].iter().any(|p| p.is_empty() || p.len() > 2) {
        return None;
    }
    let d: u32 = parts[0].parse().ok()?;
    let m: u32 = parts[1].parse().ok()?;
    let y: i32 = parts[2].parse().ok()?;
    chrono::NaiveDate::from_ymd_opt(y, m, d).map(|dt| dt.format("%Y-%m-%d").to_string())
}

/// Parse an amount written as `1.234,56`, `1.234.567` or `1234.56`.
///
/// Empty input is `Some(0.0)`; `None` means the text is not a finite number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .replace(['€', '$'], "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // 1,234.56
        (Some(comma), Some(dot)) if dot > comma => cleaned.replace(',', ""),
        // 1.234,56 or 12,50
        (Some(_), _) => cleaned.replace('.', "").replace(',', "."),
        // 1.234.567
        (None, Some(_)) if dot_grouped(&cleaned) => cleaned.replace('.', ""),
        _ => cleaned.clone(),
    };
    normalized
        .parse()
        .ok()
        .or_else(|| cleaned.parse().ok())
        .filter(|v: &f64| v.is_finite())
}

/// Two or more `.` separators, each followed by exactly three digits.
fn dot_grouped(s: &str) -> bool {
    let groups: Vec<&str> = s.split('.').skip(1).collect();
    groups.len() > 1 && groups.iter().all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

// ---------------------------------------------------------------------------
// Source file
// ---------------------------------------------------------------------------

/// Lifecycle of one import run, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    DetectingFormat,
    StreamingRows,
    Committed,
    Reporting,
    Done,
    Failed,
}

/// A delimited export read into memory, with its header already parsed.
pub struct SourceFile {
    pub delimiter: u8,
    pub layout: HeaderLayout,
    body: String,
    header_lines: usize,
    /// Byte offsets of every `\n` in `body`.
    newlines: Vec<usize>,
}

impl SourceFile {
    /// Read and inspect the file. Nothing touches the store until this succeeds.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(stage = ?Stage::Idle, file = %path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            debug!(stage = ?Stage::Failed, error = %e);
            e
        })?;
        Self::from_text(&content)
    }

    pub fn from_text(content: &str) -> Result<Self> {
        debug!(stage = ?Stage::DetectingFormat);
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let sample = &content.as_bytes()[..content.len().min(SAMPLE_BYTES)];
        let delimiter = detect_delimiter(sample);

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(content.as_bytes());
        let mut header = csv::StringRecord::new();
        if !rdr.read_record(&mut header)? {
            return Err(BankError::MalformedInput("file has no header line".to_string()));
        }
        let labels: Vec<String> = header.iter().map(|l| l.trim().to_string()).collect();
        if labels.iter().all(|l| l.is_empty()) {
            return Err(BankError::MalformedInput("header line is blank".to_string()));
        }
        let layout = HeaderLayout::from_labels(labels)?;

        let body_start = rdr.position().byte() as usize;
        let body = content[body_start..].to_string();
        let newlines = body.match_indices('\n').map(|(i, _)| i).collect();
        Ok(Self {
            delimiter,
            layout,
            header_lines: content[..body_start].matches('\n').count(),
            newlines,
            body,
        })
    }

    pub fn delimiter_char(&self) -> char {
        self.delimiter as char
    }

    /// 1-based line of the source file where a record read by
    /// [`SourceFile::records`] starts. Blank lines before it are not counted
    /// as its start.
    pub fn line_of(&self, position: &csv::Position) -> Option<usize> {
        let start = position.byte() as usize;
        let blank = self
            .body
            .as_bytes()
            .get(start..)?
            .iter()
            .take_while(|b| matches!(b, b'\r' | b'\n'))
            .count();
        let at = start + blank;
        Some(self.header_lines + self.newlines.partition_point(|&nl| nl < at) + 1)
    }

    /// Data rows after the header, blank lines skipped.
    pub fn records(&self) -> impl Iterator<Item = std::result::Result<csv::StringRecord, csv::Error>> + '_ {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(self.body.as_bytes())
            .into_records()
    }
}

// ---------------------------------------------------------------------------
// Header layout and row mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLayout {
    pub labels: Vec<String>,
    /// (column index, target field) in header order; unmapped labels are absent.
    pub columns: Vec<(usize, Field)>,
    pub currency_count: usize,
}

impl HeaderLayout {
    pub fn from_labels(labels: Vec<String>) -> Result<Self> {
        let currency_count = labels
            .iter()
            .filter(|l| Field::from_label(l) == Some(Field::Currency))
            .count();
        if currency_count > 2 {
            return Err(BankError::MalformedInput(format!(
                "currency column appears {currency_count} times; at most 2 are supported"
            )));
        }

        let mut seen_currency = false;
        let columns = labels
            .iter()
            .enumerate()
            .filter_map(|(i, label)| {
                let field = Field::from_label(label)?;
                if field == Field::Currency {
                    if seen_currency {
                        return Some((i, Field::BalanceCurrency));
                    }
                    seen_currency = true;
                }
                Some((i, field))
            })
            .collect();

        Ok(Self {
            labels,
            columns,
            currency_count,
        })
    }

    pub fn has_dual_currency(&self) -> bool {
        self.currency_count == 2
    }
}

/// A date or amount that could not be normalized. The row is still written.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldWarning {
    pub row: usize,
    pub field: Field,
    pub raw: String,
    pub message: String,
}

pub struct Mapped {
    pub movement: Movement,
    pub warnings: Vec<FieldWarning>,
}

/// Turn one source row into a [`Movement`].
///
/// `row` is the source line number used in warnings.
pub fn map_record(
    layout: &HeaderLayout,
    record: &csv::StringRecord,
    row: usize,
) -> std::result::Result<Mapped, String> {
    let mut movement = Movement::default();
    let mut warnings = Vec::new();
    let mut currency: Option<String> = None;
    let mut balance_currency: Option<String> = None;

    for &(idx, field) in &layout.columns {
        let Some(raw) = record.get(idx) else {
            if field == Field::BalanceCurrency && layout.has_dual_currency() {
                return Err(format!(
                    "row has {} fields but the balance currency is column {}",
                    record.len(),
                    idx + 1
                ));
            }
            continue;
        };
        let value = raw.trim();

        if field.is_date() {
            let date = parse_date_dmy(value).unwrap_or_else(|| {
                warnings.push(FieldWarning {
                    row,
                    field,
                    raw: value.to_string(),
                    message: format!("could not parse date '{value}', kept as-is"),
                });
                value.to_string()
            });
            movement.set_text(field, date);
        } else if field.is_amount() {
            let amount = parse_amount(value).unwrap_or_else(|| {
                warnings.push(FieldWarning {
                    row,
                    field,
                    raw: value.to_string(),
                    message: format!("could not parse amount '{value}', using 0.0"),
                });
                0.0
            });
            movement.set_number(field, amount);
        } else if field == Field::Currency {
            currency = Some(value.to_string()).filter(|v| !v.is_empty());
        } else if field == Field::BalanceCurrency {
            balance_currency = Some(value.to_string()).filter(|v| !v.is_empty());
        } else {
            movement.set_text(field, value.to_string());
        }
    }

    movement.balance_currency = balance_currency.or_else(|| currency.clone());
    movement.currency = currency;

    Ok(Mapped { movement, warnings })
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Stream every data row of `source` into the `movements` table.
pub fn import_source(conn: &Connection, source: &SourceFile) -> Result<ImportReport> {
    import_source_batched(conn, source, BATCH_SIZE)
}

pub fn import_source_batched(conn: &Connection, source: &SourceFile, batch_size: usize) -> Result<ImportReport> {
    info!(
        delimiter = %source.delimiter_char(),
        headers = ?source.layout.labels,
        "reading export"
    );
    let initial_count = count_movements(conn)?;

    debug!(stage = ?Stage::StreamingRows);
    let mut writer = MovementWriter::begin(conn, batch_size)?;
    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    let mut rows_read = 0usize;
    let mut skipped = 0usize;

    for (i, result) in source.records().enumerate() {
        let position = match &result {
            Ok(r) => r.position(),
            Err(e) => e.position(),
        };
        let row = position
            .and_then(|p| source.line_of(p))
            .unwrap_or(source.header_lines + i + 1);
        rows_read += 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row, error = %e, "unreadable row");
                errors.push(RowError {
                    row,
                    kind: RowErrorKind::Unreadable,
                    message: e.to_string(),
                    data: String::new(),
                });
                continue;
            }
        };

        let mapped = match map_record(&source.layout, &record, row) {
            Ok(m) => m,
            Err(message) => {
                let data = record.iter().collect::<Vec<_>>().join(" | ");
                warn!(row, %message, %data, "row does not fit the header");
                errors.push(RowError {
                    row,
                    kind: RowErrorKind::Mapping,
                    message,
                    data,
                });
                continue;
            }
        };
        for w in &mapped.warnings {
            warn!(row, field = w.field.column(), raw = %w.raw, "{}", w.message);
        }
        warnings.extend(mapped.warnings);

        if mapped.movement.is_empty() {
            debug!(row, "no mappable fields, skipping");
            skipped += 1;
            continue;
        }

        match writer.insert(&mapped.movement) {
            Ok(()) => {}
            Err(BankError::RowInsert(e)) => {
                let data = mapped.movement.describe();
                warn!(row, error = %e, %data, "error inserting row");
                errors.push(RowError {
                    row,
                    kind: RowErrorKind::Insert,
                    message: e.to_string(),
                    data,
                });
            }
            Err(e) => return Err(e),
        }
    }

    let inserted = writer.finish()?;
    debug!(stage = ?Stage::Committed, inserted);

    debug!(stage = ?Stage::Reporting);
    let report = build_report(
        conn,
        source,
        initial_count,
        rows_read,
        inserted,
        skipped,
        warnings,
        errors,
    )?;
    debug!(stage = ?Stage::Done);
    Ok(report)
}

#[cfg(test)]
pub fn import_file(conn: &Connection, file_path: &Path) -> Result<ImportReport> {
    let source = SourceFile::open(file_path)?;
    import_source(conn, &source)
}
