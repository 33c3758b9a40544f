use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use crate::data::model::{CarRecord, DynoReading, Partition, RawTable};
use crate::split::Splits;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

// ---------------------------------------------------------------------------
// Arrow record batches
// ---------------------------------------------------------------------------

pub fn cars_to_batch(cars: &[CarRecord]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("specs", DataType::Utf8, false),
        Field::new("car_year", DataType::Int32, true),
        Field::new("car_make", DataType::Utf8, true),
        Field::new("car_model", DataType::Utf8, true),
        Field::new("has_keyword", DataType::Boolean, false),
        Field::new("psi", DataType::Float64, true),
        Field::new("octane", DataType::Int32, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(cars.iter().map(|c| c.run))),
        Arc::new(StringArray::from_iter_values(cars.iter().map(|c| c.name.as_str()))),
        Arc::new(StringArray::from_iter_values(cars.iter().map(|c| c.specs.as_str()))),
        Arc::new(cars.iter().map(|c| c.car_year).collect::<Int32Array>()),
        Arc::new(cars.iter().map(|c| c.car_make.as_deref()).collect::<StringArray>()),
        Arc::new(cars.iter().map(|c| c.car_model.as_deref()).collect::<StringArray>()),
        Arc::new(cars.iter().map(|c| Some(c.has_keyword)).collect::<BooleanArray>()),
        Arc::new(cars.iter().map(|c| c.psi).collect::<Float64Array>()),
        Arc::new(cars.iter().map(|c| c.octane).collect::<Int32Array>()),
    ];

    RecordBatch::try_new(schema, columns).context("building car record batch")
}

pub fn readings_to_batch(readings: &[DynoReading]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("run", DataType::Int64, false),
        Field::new("rpm", DataType::Float64, false),
        Field::new("hp", DataType::Float64, false),
        Field::new("torque", DataType::Float64, false),
        Field::new("boost", DataType::Float64, false),
    ]));

    let column = |f: fn(&DynoReading) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(readings.iter().map(f)))
    };
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(readings.iter().map(|r| r.run))),
        column(|r| r.rpm),
        column(|r| r.hp),
        column(|r| r.torque),
        column(|r| r.boost),
    ];

    RecordBatch::try_new(schema, columns).context("building reading record batch")
}

/// Render the first `limit` car records as a text table.
pub fn preview_cars(cars: &[CarRecord], limit: usize) -> Result<String> {
    let batch = cars_to_batch(&cars[..limit.min(cars.len())])?;
    Ok(pretty_format_batches(&[batch])?.to_string())
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Write a raw table back out as CSV, empty cells for missing values.
pub fn write_raw_table(table: &RawTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every partition as `<partition>_cars.<ext>` and
/// `<partition>_readings.<ext>` in `dir`. Returns the files written.
pub fn write_splits(splits: &Splits, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut written = Vec::new();
    for partition in Partition::ALL {
        let pair = splits.get(partition);
        let cars_path = dir.join(format!("{partition}_cars.{}", format.extension()));
        let readings_path = dir.join(format!("{partition}_readings.{}", format.extension()));

        match format {
            ExportFormat::Csv => {
                write_csv(&cars_path, &pair.cars)?;
                write_csv(&readings_path, &pair.readings)?;
            }
            ExportFormat::Parquet => {
                write_parquet(&cars_path, &cars_to_batch(&pair.cars)?)?;
                write_parquet(&readings_path, &readings_to_batch(&pair.readings)?)?;
            }
        }
        log::debug!("wrote {} and {}", cars_path.display(), readings_path.display());
        written.push(cars_path);
        written.push(readings_path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::SplitPair;
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    fn car(run: i64, psi: Option<f64>) -> CarRecord {
        CarRecord {
            run,
            name: format!("car {run}"),
            specs: "22 psi".to_string(),
            car_year: Some(2013),
            car_make: Some("Ford".to_string()),
            car_model: None,
            has_keyword: psi.is_some(),
            psi,
            octane: None,
        }
    }

    fn reading(run: i64) -> DynoReading {
        DynoReading {
            run,
            rpm: 5000.0,
            hp: 250.5,
            torque: 270.25,
            boost: 21.0,
        }
    }

    fn splits() -> Splits {
        Splits {
            train: SplitPair {
                cars: vec![car(1, Some(22.0)), car(2, None)],
                readings: vec![reading(1), reading(1), reading(2)],
            },
            validate: SplitPair {
                cars: vec![car(3, None)],
                readings: vec![reading(3)],
            },
            test: SplitPair::default(),
        }
    }

    #[test]
    fn test_cars_to_batch_keeps_nulls() {
        let batch = cars_to_batch(&[car(1, Some(22.0)), car(2, None)]).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 9);
        let psi = batch.column(7);
        assert!(!psi.is_null(0));
        assert!(psi.is_null(1));
        assert_eq!(batch.column(5).null_count(), 2);
    }

    #[test]
    fn test_preview_limits_rows() {
        let cars: Vec<CarRecord> = (0..10).map(|run| car(run, None)).collect();
        let text = preview_cars(&cars, 3).unwrap();
        assert!(text.contains("car 2"));
        assert!(!text.contains("car 3"));
    }

    #[test]
    fn test_write_csv_splits() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_splits(&splits(), dir.path(), ExportFormat::Csv).unwrap();
        assert_eq!(written.len(), 6);

        let mut reader = csv::Reader::from_path(dir.path().join("train_cars.csv")).unwrap();
        let rows: Vec<CarRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, splits().train.cars);

        let mut reader = csv::Reader::from_path(dir.path().join("train_readings.csv")).unwrap();
        let rows: Vec<DynoReading> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_write_raw_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixed.csv");
        let mut table = RawTable::new("t", vec!["Run".to_string(), "Boost".to_string()]);
        table.rows.push(vec![Some("4".to_string()), None]);
        write_raw_table(&table, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Run,Boost\n4,\n");
    }

    #[test]
    fn test_write_parquet_splits() {
        let dir = tempfile::tempdir().unwrap();
        write_splits(&splits(), dir.path(), ExportFormat::Parquet).unwrap();

        let file = std::fs::File::open(dir.path().join("validate_readings.parquet")).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
        assert_eq!(rows, 1);
        assert!(dir.path().join("test_cars.parquet").exists());
    }
}
