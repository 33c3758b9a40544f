//! Repair of reading rows whose fields were glued into the RPM cell.
//!
//! When a PDF page has no header row the table extractor concatenates every
//! value of a row into the first column, e.g. `"4500245.67301.4411.8018.20"`.
//! RPM is always the first four characters and every later field has exactly
//! two decimal digits, which is enough to cut the rest back apart.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PrepError, PrepResult};

use super::model::RawTable;

/// RPM cells at least this long are treated as concatenated.
pub const CONCATENATED_MIN_LEN: usize = 6;

/// Width of the RPM prefix in a concatenated cell.
pub const RPM_WIDTH: usize = 4;

/// Fields following RPM, in the order they were glued together.
pub const TRAILING_FIELDS: [&str; 4] = ["HP", "Torque", "AFR", "Boost"];

static FIXED_PRECISION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*?\.\w\w").expect("valid fixed-precision pattern"));

/// Split `input` into `fields` pieces.
///
/// The first `fields - 1` pieces are the shortest prefixes ending in a dot
/// followed by two digits; the remainder is the last piece. Fewer boundaries
/// than required, or an empty remainder, is an error.
pub fn split_fixed_precision(input: &str, fields: usize) -> PrepResult<Vec<&str>> {
    let mut pieces = Vec::with_capacity(fields);
    let mut rest = input;

    while pieces.len() + 1 < fields {
        let Some(m) = FIXED_PRECISION_PREFIX.find(rest) else {
            break;
        };
        pieces.push(m.as_str());
        rest = &rest[m.end()..];
    }

    if !rest.is_empty() {
        pieces.push(rest);
    }

    if pieces.len() != fields {
        return Err(PrepError::Repair {
            input: input.to_string(),
            expected: fields,
            found: pieces.len(),
        });
    }
    Ok(pieces)
}

/// A concatenated RPM cell cut back into its five fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairedCells {
    pub rpm: String,
    /// HP, Torque, AFR, Boost.
    pub trailing: [String; 4],
}

pub fn is_concatenated(cell: &str) -> bool {
    cell.trim().chars().count() >= CONCATENATED_MIN_LEN
}

/// Cut a concatenated RPM cell into RPM plus the four trailing fields.
pub fn repair_cell(cell: &str) -> PrepResult<RepairedCells> {
    let cell = cell.trim();
    let split_at = cell
        .char_indices()
        .nth(RPM_WIDTH)
        .map(|(i, _)| i)
        .ok_or_else(|| PrepError::Repair {
            input: cell.to_string(),
            expected: TRAILING_FIELDS.len() + 1,
            found: 0,
        })?;
    let (rpm, rest) = cell.split_at(split_at);

    let pieces = split_fixed_precision(rest, TRAILING_FIELDS.len()).map_err(|e| match e {
        PrepError::Repair { found, .. } => PrepError::Repair {
            input: cell.to_string(),
            expected: TRAILING_FIELDS.len() + 1,
            found: found + 1,
        },
        other => other,
    })?;

    Ok(RepairedCells {
        rpm: rpm.to_string(),
        trailing: [
            pieces[0].to_string(),
            pieces[1].to_string(),
            pieces[2].to_string(),
            pieces[3].to_string(),
        ],
    })
}

/// Repair every concatenated row of a reading table in place.
///
/// Returns the number of rows rewritten. A concatenated cell that cannot be
/// split aborts the whole table.
pub fn repair_table(table: &mut RawTable) -> anyhow::Result<usize> {
    let rpm_col = table.column_index("RPM")?;
    let trailing_cols = TRAILING_FIELDS
        .iter()
        .map(|c| table.column_index(c))
        .collect::<PrepResult<Vec<_>>>()?;

    let mut repaired = 0;
    for (row_no, row) in table.rows.iter_mut().enumerate() {
        let Some(cell) = row.get(rpm_col).and_then(|c| c.as_deref()) else {
            continue;
        };
        if !is_concatenated(cell) {
            continue;
        }

        let cells = repair_cell(cell)
            .map_err(|e| anyhow::Error::new(e).context(format!("repairing row {row_no}")))?;

        row[rpm_col] = Some(cells.rpm);
        for (col, value) in trailing_cols.iter().zip(cells.trailing) {
            if let Some(slot) = row.get_mut(*col) {
                *slot = Some(value);
            }
        }
        repaired += 1;
    }

    log::debug!("repaired {repaired} concatenated rows in '{}'", table.name);
    Ok(repaired)
}
