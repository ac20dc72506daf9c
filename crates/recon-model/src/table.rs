use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Date formats accepted by [`Record::date`], tried in order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%Y-%m-%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y%m%d",
];

/// Normalize a column name: trim, strip BOM, collapse inner whitespace,
/// upper-case. All column lookups go through this so that datasets loaded
/// from differently-cased sources line up.
pub fn normalize_column(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}');
    let mut normalized = String::with_capacity(trimmed.len());
    let mut parts = trimmed.split_whitespace();
    if let Some(first) = parts.next() {
        normalized.push_str(first);
        for part in parts {
            normalized.push(' ');
            normalized.push_str(part);
        }
    }
    normalized.to_uppercase()
}

/// One row of a dataset. Cells are stored by normalized column name;
/// a missing cell and an empty cell are equivalent.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    cells: BTreeMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from (column, value) pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (column, value) in pairs {
            record.set(column.as_ref(), value);
        }
        record
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(&normalize_column(column)).map(String::as_str)
    }

    /// Trimmed cell value, empty string when the cell is absent.
    pub fn trimmed(&self, column: &str) -> &str {
        self.get(column).map(str::trim).unwrap_or("")
    }

    pub fn is_blank(&self, column: &str) -> bool {
        self.trimmed(column).is_empty()
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.cells.insert(normalize_column(column), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<String> {
        self.cells.remove(&normalize_column(column))
    }

    /// Parse the cell as a date, trying the supported formats in order.
    /// Datetime formats keep only the date part.
    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        let value = self.trimmed(column);
        if value.is_empty() {
            return None;
        }
        for format in DATE_FORMATS {
            if format.contains("%H") {
                if let Ok(parsed) = chrono::NaiveDateTime::parse_from_str(value, format) {
                    return Some(parsed.date());
                }
            } else if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
                return Some(parsed);
            }
        }
        None
    }

    /// Parse the cell as a number. Accepts both `1234.56` and the Brazilian
    /// `1.234,56` convention (comma decimal, dot thousands).
    pub fn number(&self, column: &str) -> Option<f64> {
        let value = self.trimmed(column);
        if value.is_empty() {
            return None;
        }
        if value.contains(',') {
            let cleaned: String = value.chars().filter(|ch| *ch != '.').collect();
            cleaned.replace(',', ".").parse().ok()
        } else {
            value.parse().ok()
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

/// An in-memory tabular dataset with a dynamic column set.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Dataset {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dataset = Self::default();
        for column in columns {
            dataset.add_column(column.as_ref());
        }
        dataset
    }

    /// Declared columns, normalized, in declaration order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        let normalized = normalize_column(column);
        self.columns.iter().any(|name| *name == normalized)
    }

    /// Declare a column if not already present. Existing rows keep their
    /// cells untouched; absent cells read as empty.
    pub fn add_column(&mut self, column: &str) {
        let normalized = normalize_column(column);
        if normalized.is_empty() {
            return;
        }
        if !self.columns.contains(&normalized) {
            self.columns.push(normalized);
        }
    }

    /// Push a row, declaring any columns the row introduces.
    pub fn push_row(&mut self, row: Record) {
        let extra: Vec<String> = row
            .columns()
            .filter(|name| !self.has_column(name))
            .map(str::to_string)
            .collect();
        for column in extra {
            self.add_column(&column);
        }
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Record] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split rows into (matching, rest) by a predicate, preserving order.
    /// The two halves carry the same column set and partition the input
    /// exactly: every row lands in exactly one side.
    pub fn partition<F>(&self, mut predicate: F) -> (Dataset, Dataset)
    where
        F: FnMut(&Record) -> bool,
    {
        let mut matching = self.empty_like();
        let mut rest = self.empty_like();
        for row in &self.rows {
            if predicate(row) {
                matching.rows.push(row.clone());
            } else {
                rest.rows.push(row.clone());
            }
        }
        (matching, rest)
    }

    /// A dataset with the same column set and no rows.
    pub fn empty_like(&self) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }

    /// Append all rows of `other`, merging its column set into this one.
    pub fn append(&mut self, other: Dataset) {
        for column in &other.columns {
            self.add_column(column);
        }
        self.rows.extend(other.rows);
    }

    /// Apply a function to every row in place.
    pub fn map_rows<F>(&mut self, mut apply: F)
    where
        F: FnMut(&mut Record),
    {
        for row in &mut self.rows {
            apply(row);
        }
    }

    /// Stable sort of the rows by a comparator.
    pub fn sort_rows_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Record, &Record) -> std::cmp::Ordering,
    {
        self.rows.sort_by(compare);
    }

    pub fn take_rows(self) -> Vec<Record> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_normalized() {
        let mut dataset = Dataset::new(["contrato", "  Valor  Total "]);
        assert!(dataset.has_column("CONTRATO"));
        assert!(dataset.has_column("valor total"));
        dataset.add_column("contrato");
        assert_eq!(dataset.columns().len(), 2);
    }

    #[test]
    fn record_typed_accessors() {
        let record = Record::from_pairs([
            ("vencimento", "15/03/2024"),
            ("valor", "1.234,56"),
            ("saldo", "99.5"),
            ("vazio", "   "),
        ]);
        assert_eq!(
            record.date("VENCIMENTO"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(record.number("VALOR"), Some(1234.56));
        assert_eq!(record.number("SALDO"), Some(99.5));
        assert!(record.is_blank("VAZIO"));
        assert!(record.is_blank("INEXISTENTE"));
    }

    #[test]
    fn date_accessor_handles_datetime_and_compact_forms() {
        let record = Record::from_pairs([
            ("a", "2024-01-02 10:30:00"),
            ("b", "20240102"),
            ("c", "not a date"),
        ]);
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2);
        assert_eq!(record.date("A"), expected);
        assert_eq!(record.date("B"), expected);
        assert_eq!(record.date("C"), None);
    }

    #[test]
    fn partition_is_exact() {
        let mut dataset = Dataset::new(["N"]);
        for n in 0..10 {
            dataset.push_row(Record::from_pairs([("N", n.to_string())]));
        }
        let (even, odd) = dataset.partition(|row| {
            row.number("N").map(|n| (n as i64) % 2 == 0).unwrap_or(false)
        });
        assert_eq!(even.len() + odd.len(), dataset.len());
        assert_eq!(even.len(), 5);
        assert_eq!(odd.len(), 5);
    }

    #[test]
    fn push_row_declares_new_columns() {
        let mut dataset = Dataset::new(["A"]);
        dataset.push_row(Record::from_pairs([("A", "1"), ("B", "2")]));
        assert!(dataset.has_column("B"));
    }
}
