use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use super::filter::{RunFilter, retained_indices};
use super::model::{CarRecord, DynoReading, RawCarRow, RawDynoRow};
use crate::error::{PrepError, PrepResult};

// ---------------------------------------------------------------------------
// "Car" field decomposition
// ---------------------------------------------------------------------------

/// Year, make, then everything else as the model.
static YEAR_MAKE_MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\W(.*?)\W(.*)$").expect("valid car pattern"));

/// The pieces of a combined "year make model" string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarParts {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
}

/// Split `"2015 Subaru WRX STI"` into year 2015, make `Subaru`, model `WRX STI`.
///
/// Text that does not have three parts yields all `None` rather than an error.
pub fn split_car_field(car: &str) -> CarParts {
    let Some(caps) = YEAR_MAKE_MODEL.captures(car.trim()) else {
        return CarParts::default();
    };
    let part = |i: usize| {
        caps.get(i)
            .map(|m| m.as_str().trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    CarParts {
        year: part(1).and_then(|y| y.parse().ok()),
        make: part(2),
        model: part(3),
    }
}

// ---------------------------------------------------------------------------
// CarInfoCleaner
// ---------------------------------------------------------------------------

/// Turns raw car metadata rows into [`CarRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct CarInfoCleaner<'a> {
    filter: &'a RunFilter,
}

impl<'a> CarInfoCleaner<'a> {
    pub fn new(filter: &'a RunFilter) -> Self {
        Self { filter }
    }

    /// Drop excluded runs, decompose the "Car" field and discard the Date and
    /// AFR text. Fails if a run id appears twice, excluded or not.
    pub fn clean(&self, rows: Vec<RawCarRow>) -> PrepResult<Vec<CarRecord>> {
        let mut seen = BTreeSet::new();
        if let Some(row) = rows.iter().find(|row| !seen.insert(row.run)) {
            return Err(PrepError::DuplicateRun(row.run));
        }

        let total = rows.len();
        let keep = retained_indices(&rows, &self.filter.runs, |r| r.run);
        log::info!(
            "car_info: dropping {} of {total} rows listed in exclusion table {}",
            total - keep.len(),
            self.filter.runs.version()
        );

        let mut rows: Vec<Option<RawCarRow>> = rows.into_iter().map(Some).collect();
        let records = keep
            .into_iter()
            .filter_map(|i| rows[i].take())
            .map(|row| {
                let parts = row.car.as_deref().map(split_car_field).unwrap_or_default();
                CarRecord {
                    run: row.run,
                    name: row.name.unwrap_or_default(),
                    specs: row.specs.unwrap_or_default(),
                    car_year: parts.year,
                    car_make: parts.make,
                    car_model: parts.model,
                    has_keyword: false,
                    psi: None,
                    octane: None,
                }
            })
            .collect();

        self.retain_valid(records)
    }

    /// Re-apply the row-level checks to already cleaned records.
    /// Running this on the output of [`Self::clean`] changes nothing.
    pub fn retain_valid(&self, records: Vec<CarRecord>) -> PrepResult<Vec<CarRecord>> {
        let mut seen = BTreeSet::new();
        let mut kept = Vec::with_capacity(records.len());
        for record in records {
            if self.filter.runs.contains(record.run) {
                continue;
            }
            if !seen.insert(record.run) {
                return Err(PrepError::DuplicateRun(record.run));
            }
            kept.push(record);
        }
        Ok(kept)
    }
}

// ---------------------------------------------------------------------------
// DynoRunCleaner
// ---------------------------------------------------------------------------

/// Turns raw reading rows into [`DynoReading`]s.
#[derive(Debug, Clone, Copy)]
pub struct DynoRunCleaner<'a> {
    filter: &'a RunFilter,
}

impl<'a> DynoRunCleaner<'a> {
    pub fn new(filter: &'a RunFilter) -> Self {
        Self { filter }
    }

    /// Drop the AFR value, rows with any missing value, excluded runs and runs
    /// known to carry wrong readings. Never fails.
    pub fn clean(&self, rows: Vec<RawDynoRow>) -> Vec<DynoReading> {
        let total = rows.len();
        let mut incomplete = 0;
        let mut excluded = 0;

        let readings: Vec<DynoReading> = rows
            .into_iter()
            .filter_map(|row| {
                let reading = match (row.run, row.rpm, row.hp, row.torque, row.boost) {
                    (Some(run), Some(rpm), Some(hp), Some(torque), Some(boost)) => DynoReading {
                        run,
                        rpm,
                        hp,
                        torque,
                        boost,
                    },
                    _ => {
                        incomplete += 1;
                        return None;
                    }
                };
                if self.filter.runs.contains(reading.run)
                    || self.filter.reading_runs.contains(reading.run)
                {
                    excluded += 1;
                    return None;
                }
                Some(reading)
            })
            .collect();

        log::info!(
            "dyno_runs: kept {} of {total} rows ({incomplete} incomplete, {excluded} in bad runs)",
            readings.len()
        );
        readings
    }
}
