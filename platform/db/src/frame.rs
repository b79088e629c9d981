use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use entity::HrTable;
use sea_orm::Value;
use serde::{Serialize, Serializer};

use crate::{StoreError, StoreResult};

/// Token that stands for an absent value in source files.
const NULL_TOKEN: &str = "NULL";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];
/// Timestamps are accepted for date columns; the time of day is dropped.
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Storage class a column's values are parsed into, derived from its
/// declared SQL type the same way SQLite derives affinity.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Date,
    Text,
}

impl ColumnKind {
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            ColumnKind::Integer
        } else if upper.contains("DATE") {
            ColumnKind::Date
        } else if ["REAL", "FLOA", "DOUB", "NUMERIC", "DECIMAL"]
            .iter()
            .any(|needle| upper.contains(needle))
        {
            ColumnKind::Real
        } else {
            ColumnKind::Text
        }
    }

    /// Parse one raw source field. `None` means the text does not fit.
    pub fn parse(self, raw: &str) -> Option<Cell> {
        let raw = raw.trim();
        if raw.is_empty() || raw == NULL_TOKEN {
            return Some(Cell::Null);
        }
        match self {
            ColumnKind::Integer => raw.parse::<i64>().ok().map(Cell::Integer).or_else(|| {
                parse_real(raw)
                    .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
                    .map(|v| Cell::Integer(v as i64))
            }),
            ColumnKind::Real => parse_real(raw).map(Cell::real),
            ColumnKind::Date => DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .or_else(|| {
                    DATETIME_FORMATS
                        .iter()
                        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                        .map(|stamp| stamp.date())
                })
                .map(|date| Cell::Text(date.format("%Y-%m-%d").to_string())),
            ColumnKind::Text => Some(Cell::Text(raw.to_string())),
        }
    }
}

/// Accepts both `1234.5` and the decimal-comma `1234,5`.
fn parse_real(raw: &str) -> Option<f64> {
    let value = if raw.contains(',') && !raw.contains('.') {
        raw.replace(',', ".").parse::<f64>().ok()?
    } else {
        raw.parse::<f64>().ok()?
    };
    value.is_finite().then_some(value)
}

/// A single stored value. Dates are kept as canonical `YYYY-MM-DD` text.
#[derive(Clone, Debug)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    pub fn real(value: f64) -> Self {
        // -0.0 and 0.0 must land on the same row key
        Cell::Real(if value == 0.0 { 0.0 } else { value })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            Cell::Null => Option::<String>::None.into(),
            Cell::Integer(v) => (*v).into(),
            Cell::Real(v) => (*v).into(),
            Cell::Text(v) => v.clone().into(),
        }
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Integer(a), Cell::Integer(b)) => a == b,
            (Cell::Real(a), Cell::Real(b)) => a.to_bits() == b.to_bits(),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Cell::Null => {}
            Cell::Integer(v) => v.hash(state),
            Cell::Real(v) => v.to_bits().hash(state),
            Cell::Text(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => f.write_str("NULL"),
            Cell::Integer(v) => write!(f, "{v}"),
            Cell::Real(v) => write!(f, "{v}"),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Null => serializer.serialize_none(),
            Cell::Integer(v) => serializer.serialize_i64(*v),
            Cell::Real(v) => serializer.serialize_f64(*v),
            Cell::Text(v) => serializer.serialize_str(v),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub kind: ColumnKind,
    pub primary_key: bool,
}

/// Column-named rows in a fixed column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// Rows of `self` followed by rows of `incoming`, keeping only the first
    /// occurrence of every full-row value. Both frames share column order.
    pub fn merge_distinct(self, incoming: Frame) -> Frame {
        debug_assert_eq!(self.columns, incoming.columns);
        let mut seen = HashSet::with_capacity(self.rows.len() + incoming.rows.len());
        let mut merged = Frame::new(self.columns);
        for row in self.rows.into_iter().chain(incoming.rows) {
            if seen.insert(row.clone()) {
                merged.rows.push(row);
            }
        }
        merged
    }

    /// First key value, over the columns at `key_positions`, that more than
    /// one row carries. Rows with an absent key part are not compared.
    pub fn first_duplicate_key(&self, key_positions: &[usize]) -> Option<Vec<Cell>> {
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            let key = key_positions
                .iter()
                .map(|&idx| row[idx].clone())
                .collect::<Vec<_>>();
            if key.iter().any(Cell::is_null) {
                continue;
            }
            if !seen.insert(key.clone()) {
                return Some(key);
            }
        }
        None
    }
}

/// Read a semicolon-delimited source file into a frame ordered like
/// `columns`. The header must name exactly the table's columns.
pub(crate) fn read_source(
    path: &Path,
    table: HrTable,
    columns: &[TableColumn],
) -> StoreResult<Frame> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_error = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect::<Vec<_>>();
    let positions = columns
        .iter()
        .map(|col| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(&col.name))
        })
        .collect::<Option<Vec<_>>>();
    let positions = match positions {
        Some(found) if headers.len() == columns.len() => found,
        _ => {
            return Err(StoreError::SchemaMismatch {
                table,
                expected: columns
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                found: headers.join(", "),
            });
        }
    };

    let mut frame = Frame::new(columns.iter().map(|c| c.name.clone()).collect());
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let mut row = Vec::with_capacity(columns.len());
        for (col, &idx) in columns.iter().zip(&positions) {
            let raw = record.get(idx).unwrap_or_default();
            let cell = col.kind.parse(raw).ok_or_else(|| StoreError::InvalidValue {
                path: path.to_path_buf(),
                line,
                column: col.name.clone(),
                value: raw.to_string(),
            })?;
            row.push(cell);
        }
        frame.push_row(row);
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn column(name: &str, kind: ColumnKind) -> TableColumn {
        TableColumn {
            name: name.to_string(),
            kind,
            primary_key: false,
        }
    }

    fn text(value: &str) -> Cell {
        Cell::Text(value.to_string())
    }

    #[test]
    fn declared_types_map_like_sqlite_affinity() {
        assert_eq!(ColumnKind::from_declared("INT"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_declared("INTEGER"), ColumnKind::Integer);
        assert_eq!(ColumnKind::from_declared("REAL"), ColumnKind::Real);
        assert_eq!(ColumnKind::from_declared("DATE"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_declared("VARCHAR(100)"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_declared("TEXT"), ColumnKind::Text);
    }

    #[test]
    fn null_token_and_blank_fields_are_absent() {
        assert_eq!(ColumnKind::Integer.parse("NULL"), Some(Cell::Null));
        assert_eq!(ColumnKind::Text.parse("  "), Some(Cell::Null));
        assert_eq!(ColumnKind::Text.parse("Null"), Some(text("Null")));
    }

    #[test]
    fn parses_values_per_kind() {
        assert_eq!(ColumnKind::Integer.parse("42"), Some(Cell::Integer(42)));
        assert_eq!(ColumnKind::Integer.parse("42.0"), Some(Cell::Integer(42)));
        assert_eq!(ColumnKind::Integer.parse("4.5"), None);
        assert_eq!(ColumnKind::Real.parse("5000,50"), Some(Cell::Real(5000.5)));
        assert_eq!(ColumnKind::Real.parse("NaN"), None);
        assert_eq!(ColumnKind::Date.parse("15/03/2023"), Some(text("2023-03-15")));
        assert_eq!(ColumnKind::Date.parse("2023-03-15"), Some(text("2023-03-15")));
        assert_eq!(ColumnKind::Date.parse("March"), None);
        assert_eq!(ColumnKind::Date.parse("2023-01"), None);
    }

    #[test]
    fn timestamps_in_date_columns_keep_the_day() {
        assert_eq!(
            ColumnKind::Date.parse("2023-01-15 00:00:00"),
            Some(text("2023-01-15"))
        );
        assert_eq!(
            ColumnKind::Date.parse("2023-01-15T18:30:00"),
            Some(text("2023-01-15"))
        );
        assert_eq!(
            ColumnKind::Date.parse("15/01/2023 08:00:00"),
            Some(text("2023-01-15"))
        );
    }

    #[test]
    fn merge_keeps_existing_rows_first_and_drops_exact_duplicates() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let mut existing = Frame::new(columns.clone());
        existing.push_row(vec![Cell::Integer(1), text("Ana")]);
        existing.push_row(vec![Cell::Integer(2), text("Bruno")]);
        let mut incoming = Frame::new(columns);
        incoming.push_row(vec![Cell::Integer(3), text("Carla")]);
        incoming.push_row(vec![Cell::Integer(1), text("Ana")]);
        incoming.push_row(vec![Cell::Integer(3), text("Carla")]);

        let merged = existing.merge_distinct(incoming);
        let ids = merged
            .rows()
            .iter()
            .map(|row| row[0].clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Cell::Integer(1), Cell::Integer(2), Cell::Integer(3)]);
    }

    #[test]
    fn negative_zero_is_the_same_row() {
        let mut a = Frame::new(vec!["v".into()]);
        a.push_row(vec![Cell::real(-0.0)]);
        let mut b = Frame::new(vec!["v".into()]);
        b.push_row(vec![Cell::real(0.0)]);
        assert_eq!(a.merge_distinct(b).len(), 1);
    }

    #[test]
    fn source_columns_are_reordered_to_the_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "\u{feff}Name;ROLE_ID").unwrap();
        writeln!(file, "Intern;7").unwrap();
        writeln!(file, "NULL;8").unwrap();
        let columns = [
            column("role_id", ColumnKind::Integer),
            column("name", ColumnKind::Text),
        ];

        let frame = read_source(file.path(), HrTable::Roles, &columns).unwrap();
        assert_eq!(frame.columns(), ["role_id", "name"]);
        assert_eq!(frame.rows()[0], vec![Cell::Integer(7), text("Intern")]);
        assert_eq!(frame.rows()[1], vec![Cell::Integer(8), Cell::Null]);
    }

    #[test]
    fn unknown_headers_are_a_schema_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "role_id;title").unwrap();
        let columns = [
            column("role_id", ColumnKind::Integer),
            column("name", ColumnKind::Text),
        ];
        let err = read_source(file.path(), HrTable::Roles, &columns).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch { .. }), "{err}");
    }

    #[test]
    fn bad_values_report_line_and_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "role_id").unwrap();
        writeln!(file, "1").unwrap();
        writeln!(file, "two").unwrap();
        let columns = [column("role_id", ColumnKind::Integer)];
        match read_source(file.path(), HrTable::Roles, &columns) {
            Err(StoreError::InvalidValue { line, column, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(column, "role_id");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duplicate_keys_ignore_absent_key_parts() {
        let mut frame = Frame::new(vec!["id".to_string(), "name".to_string()]);
        frame.push_row(vec![Cell::Null, text("Ana")]);
        frame.push_row(vec![Cell::Null, text("Bruno")]);
        frame.push_row(vec![Cell::Integer(1), text("Carla")]);
        assert_eq!(frame.first_duplicate_key(&[0]), None);

        frame.push_row(vec![Cell::Integer(1), text("Carla Dias")]);
        assert_eq!(frame.first_duplicate_key(&[0]), Some(vec![Cell::Integer(1)]));
        assert_eq!(Cell::Integer(1).to_string(), "1");
    }
}
