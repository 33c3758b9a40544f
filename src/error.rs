use thiserror::Error;

/// Errors raised while preparing dyno data.
///
/// Schema errors and malformed cells are fatal for the whole run. Row-level
/// gaps (missing rpm/boost) and text-mining misses never show up here: they
/// are handled by row exclusion and `None` feature values respectively.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("table '{table}', row {row}, column '{column}': cannot parse '{value}'")]
    MalformedCell {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("run {0} appears more than once in the car table")]
    DuplicateRun(i64),

    #[error("split fraction must be strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),

    #[error("cannot split '{input}' into {expected} fixed-precision fields (found {found})")]
    Repair {
        input: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid pattern for rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type PrepResult<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_display() {
        let err = PrepError::MissingColumn {
            table: "car_info".to_string(),
            column: "Specs".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "table 'car_info' is missing required column 'Specs'"
        );
    }

    #[test]
    fn test_repair_display_mentions_counts() {
        let err = PrepError::Repair {
            input: "12.34".to_string(),
            expected: 4,
            found: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("12.34"));
        assert!(msg.contains("4 fixed-precision fields"));
    }
}
