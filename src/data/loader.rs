use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value as JsonValue;

use super::model::{CAR_INFO_COLUMNS, DYNO_RUN_COLUMNS, RawCarRow, RawDynoRow, RawTable};
use super::repair::repair_table;
use crate::error::PrepError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with column names, one record per line
/// * `.json` – `[{ "Run": 1, "Name": "...", ... }, ...]`
///   (the default `df.to_json(orient='records')`)
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table")
        .to_string();

    let table = match ext.as_str() {
        "csv" => load_csv(path, name),
        "json" => load_json(path, name),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Load and type the car metadata table.
pub fn load_car_info(path: &Path) -> Result<Vec<RawCarRow>> {
    let table = load_table(path)?;
    car_rows(&table).with_context(|| format!("reading car rows from {}", path.display()))
}

/// Load and type the reading table, optionally repairing concatenated rows first.
pub fn load_dyno_runs(path: &Path, repair: bool) -> Result<Vec<RawDynoRow>> {
    let mut table = load_table(path)?;
    if repair {
        let repaired = repair_table(&mut table)?;
        if repaired > 0 {
            log::info!("repaired {repaired} concatenated reading rows");
        }
    }
    dyno_rows(&table).with_context(|| format!("reading dyno rows from {}", path.display()))
}

// ---------------------------------------------------------------------------
// Typing
// ---------------------------------------------------------------------------

/// Type the car metadata table. Every header in [`CAR_INFO_COLUMNS`] must be
/// present; a row without a run id is malformed.
pub fn car_rows(table: &RawTable) -> Result<Vec<RawCarRow>> {
    table.require_columns(&CAR_INFO_COLUMNS)?;
    let run = table.column_index("Run")?;
    let name = table.column_index("Name")?;
    let date = table.column_index("Date")?;
    let specs = table.column_index("Specs")?;
    let afr = table.column_index("AFR")?;
    let car = table.column_index("Car")?;

    let text = |row: usize, col: usize| table.text(row, col).map(str::to_string);

    (0..table.len())
        .map(|row| -> Result<RawCarRow> {
            let run_id = table.int(row, run)?.ok_or_else(|| PrepError::MalformedCell {
                table: table.name.clone(),
                row,
                column: "Run".to_string(),
                value: String::new(),
            })?;
            Ok(RawCarRow {
                run: run_id,
                name: text(row, name),
                date: text(row, date),
                specs: text(row, specs),
                afr: text(row, afr),
                car: text(row, car),
            })
        })
        .collect()
}

/// Type the reading table. Every header in [`DYNO_RUN_COLUMNS`] must be
/// present; extra columns (such as a leading index) are ignored.
pub fn dyno_rows(table: &RawTable) -> Result<Vec<RawDynoRow>> {
    table.require_columns(&DYNO_RUN_COLUMNS)?;
    let run = table.column_index("Run")?;
    let rpm = table.column_index("RPM")?;
    let hp = table.column_index("HP")?;
    let torque = table.column_index("Torque")?;
    let afr = table.column_index("AFR")?;
    let boost = table.column_index("Boost")?;

    (0..table.len())
        .map(|row| -> Result<RawDynoRow> {
            Ok(RawDynoRow {
                run: table.int(row, run)?,
                rpm: table.float(row, rpm)?,
                hp: table.float(row, hp)?,
                torque: table.float(row, torque)?,
                afr: table.float(row, afr)?,
                boost: table.float(row, boost)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, name: String) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = RawTable::new(name, columns);

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let row = (0..table.columns.len())
            .map(|i| record.get(i).filter(|v| !v.is_empty()).map(str::to_string))
            .collect();
        table.rows.push(row);
    }

    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path, name: String) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    // Column order follows first appearance across records.
    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let mut table = RawTable::new(name, columns);
    for rec in records {
        // every record was checked to be an object above
        let Some(obj) = rec.as_object() else { continue };
        let row = table
            .columns
            .iter()
            .map(|col| obj.get(col).and_then(json_to_cell))
            .collect();
        table.rows.push(row);
    }

    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> Option<String> {
    match val {
        JsonValue::Null => None,
        JsonValue::String(s) if s.is_empty() => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_car_info_csv() {
        let file = write_temp(
            ".csv",
            "Run,Name,Date,Specs,AFR,Car\n\
             12,Stage 2,2019-01-01,Tuned on E85,11.5,2015 Subaru WRX\n\
             13,,2019-01-02,,,\n",
        );
        let rows = load_car_info(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].run, 12);
        assert_eq!(rows[0].specs.as_deref(), Some("Tuned on E85"));
        assert_eq!(rows[0].car.as_deref(), Some("2015 Subaru WRX"));
        assert_eq!(rows[1].name, None);
        assert_eq!(rows[1].car, None);
    }

    #[test]
    fn test_missing_column_is_a_schema_error() {
        let file = write_temp(".csv", "Run,Name,Date,AFR,Car\n1,a,b,c,d\n");
        let err = load_car_info(file.path()).unwrap_err();
        let schema = err.downcast_ref::<PrepError>().expect("typed error");
        assert!(matches!(schema, PrepError::MissingColumn { column, .. } if column == "Specs"));
    }

    #[test]
    fn test_load_dyno_runs_ignores_index_column() {
        let file = write_temp(
            ".csv",
            ",Run,RPM,HP,Torque,AFR,Boost\n\
             0,12,3000,150.25,260.10,12.10,8.50\n\
             1,12,,151.00,261.00,12.00,\n",
        );
        let rows = load_dyno_runs(file.path(), false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].run, Some(12));
        assert_eq!(rows[0].rpm, Some(3000.0));
        assert_eq!(rows[1].rpm, None);
        assert_eq!(rows[1].boost, None);
    }

    #[test]
    fn test_load_dyno_runs_with_repair() {
        let file = write_temp(
            ".csv",
            "Run,RPM,HP,Torque,AFR,Boost\n\
             12,4500245.67301.4411.8018.20,,,,\n",
        );
        let rows = load_dyno_runs(file.path(), true).unwrap();
        assert_eq!(rows[0].rpm, Some(4500.0));
        assert_eq!(rows[0].hp, Some(245.67));
        assert_eq!(rows[0].boost, Some(18.2));
    }

    #[test]
    fn test_load_json_records() {
        let file = write_temp(
            ".json",
            r#"[
                {"Run": 5, "RPM": 3500.0, "HP": 200.5, "Torque": 300.0, "AFR": 11.9, "Boost": 17.0},
                {"Run": 5, "RPM": null, "HP": 201.0, "Torque": 301.0, "AFR": 11.8, "Boost": 17.2}
            ]"#,
        );
        let rows = load_dyno_runs(file.path(), false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].hp, Some(200.5));
        assert_eq!(rows[1].rpm, None);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".xlsx", "whatever");
        assert!(load_table(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        assert!(load_table(Path::new("/definitely/not/here.csv")).is_err());
    }
}
