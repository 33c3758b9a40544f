use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PrepError, PrepResult};

/// Header names of the car metadata table, as produced by the table extractor.
pub const CAR_INFO_COLUMNS: [&str; 6] = ["Run", "Name", "Date", "Specs", "AFR", "Car"];

/// Header names of the per-reading table, as produced by the table extractor.
pub const DYNO_RUN_COLUMNS: [&str; 6] = ["Run", "RPM", "HP", "Torque", "AFR", "Boost"];

// ---------------------------------------------------------------------------
// RawTable – a loaded file before any typing
// ---------------------------------------------------------------------------

/// A loaded table with its header and text cells.
/// Empty cells are `None` so that "missing" survives until cleaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Name used in error messages (usually the file stem).
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Position of a column by exact (case-sensitive) header name.
    pub fn column_index(&self, column: &str) -> PrepResult<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| PrepError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Fail with a schema error unless every `required` header is present.
    pub fn require_columns(&self, required: &[&str]) -> PrepResult<()> {
        for column in required {
            self.column_index(column)?;
        }
        Ok(())
    }

    pub fn text(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .and_then(|c| c.as_deref())
    }

    pub fn int(&self, row: usize, col: usize) -> PrepResult<Option<i64>> {
        self.parse_cell(row, col, |s| {
            // pandas writes integer columns holding nulls as floats ("91.0")
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            })
        })
    }

    pub fn float(&self, row: usize, col: usize) -> PrepResult<Option<f64>> {
        self.parse_cell(row, col, |s| s.parse::<f64>().ok())
    }

    fn parse_cell<T>(
        &self,
        row: usize,
        col: usize,
        parse: impl Fn(&str) -> Option<T>,
    ) -> PrepResult<Option<T>> {
        match self.text(row, col).map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("nan") => Ok(None),
            Some(s) => parse(s).map(Some).ok_or_else(|| PrepError::MalformedCell {
                table: self.name.clone(),
                row,
                column: self.columns.get(col).cloned().unwrap_or_default(),
                value: s.to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Raw rows – typed but uncleaned
// ---------------------------------------------------------------------------

/// One row of the car metadata table before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCarRow {
    pub run: i64,
    pub name: Option<String>,
    pub date: Option<String>,
    pub specs: Option<String>,
    pub afr: Option<String>,
    /// Combined "year make model" text.
    pub car: Option<String>,
}

/// One row of the reading table before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDynoRow {
    pub run: Option<i64>,
    pub rpm: Option<f64>,
    pub hp: Option<f64>,
    pub torque: Option<f64>,
    pub afr: Option<f64>,
    pub boost: Option<f64>,
}

// ---------------------------------------------------------------------------
// Cleaned records
// ---------------------------------------------------------------------------

/// One dyno run's car metadata after cleaning (and optionally feature mining).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarRecord {
    pub run: i64,
    pub name: String,
    pub specs: String,
    pub car_year: Option<i32>,
    pub car_make: Option<String>,
    pub car_model: Option<String>,
    /// True once any spec extractor matched this row.
    #[serde(default)]
    pub has_keyword: bool,
    #[serde(default)]
    pub psi: Option<f64>,
    #[serde(default)]
    pub octane: Option<i32>,
}

/// One RPM sample of a dyno run. Many readings share a run id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DynoReading {
    pub run: i64,
    pub rpm: f64,
    pub hp: f64,
    pub torque: f64,
    pub boost: f64,
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Train,
    Validate,
    Test,
}

impl Partition {
    pub const ALL: [Partition; 3] = [Partition::Train, Partition::Validate, Partition::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Train => "train",
            Partition::Validate => "validate",
            Partition::Test => "test",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        let mut t = RawTable::new(
            "dyno_runs",
            vec!["Run".to_string(), "RPM".to_string(), "Boost".to_string()],
        );
        t.rows.push(vec![
            Some("12".to_string()),
            Some("3500".to_string()),
            None,
        ]);
        t.rows.push(vec![
            Some("13.0".to_string()),
            Some("abc".to_string()),
            Some("NaN".to_string()),
        ]);
        t
    }

    #[test]
    fn test_column_index_is_case_sensitive() {
        let t = table();
        assert_eq!(t.column_index("RPM").unwrap(), 1);
        assert!(matches!(
            t.column_index("rpm"),
            Err(PrepError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_require_columns() {
        let t = table();
        assert!(t.require_columns(&["Run", "Boost"]).is_ok());
        assert!(t.require_columns(&["Run", "HP"]).is_err());
    }

    #[test]
    fn test_empty_and_nan_cells_are_missing() {
        let t = table();
        assert_eq!(t.float(0, 2).unwrap(), None);
        assert_eq!(t.float(1, 2).unwrap(), None);
    }

    #[test]
    fn test_integer_written_as_float() {
        let t = table();
        assert_eq!(t.int(0, 0).unwrap(), Some(12));
        assert_eq!(t.int(1, 0).unwrap(), Some(13));
    }

    #[test]
    fn test_malformed_cell_is_an_error() {
        let t = table();
        match t.float(1, 1) {
            Err(PrepError::MalformedCell { row, column, value, .. }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "RPM");
                assert_eq!(value, "abc");
            }
            other => panic!("expected MalformedCell, got {other:?}"),
        }
    }

    #[test]
    fn test_partition_display() {
        assert_eq!(Partition::Validate.to_string(), "validate");
        assert_eq!(Partition::ALL.len(), 3);
    }
}
