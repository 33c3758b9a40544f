//! Single entry point: clean both tables, mine spec features, split.

use std::collections::BTreeSet;

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::data::clean::{CarInfoCleaner, DynoRunCleaner};
use crate::data::filter::RunFilter;
use crate::data::loader::{load_car_info, load_dyno_runs};
use crate::data::model::{CarRecord, DynoReading, RawCarRow, RawDynoRow};
use crate::features::SpecFeatureExtractor;
use crate::split::Splits;

/// Cleaned (and optionally feature-augmented) tables, before splitting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTables {
    pub cars: Vec<CarRecord>,
    pub readings: Vec<DynoReading>,
}

pub struct Pipeline {
    config: PipelineConfig,
    filter: RunFilter,
    extractor: SpecFeatureExtractor,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            filter: RunFilter::default(),
            extractor: SpecFeatureExtractor::default(),
        }
    }

    /// Replace the exclusion tables used by both cleaners.
    pub fn with_filter(mut self, filter: RunFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load both source files and prepare them.
    pub fn load(&self) -> Result<CleanTables> {
        let input = &self.config.input;
        let raw_cars = load_car_info(&input.car_info)?;
        let raw_readings = load_dyno_runs(&input.dyno_runs, input.repair_concatenated)?;
        self.prepare(raw_cars, raw_readings)
    }

    /// Clean both tables then, if enabled, mine the spec features.
    pub fn prepare(&self, raw_cars: Vec<RawCarRow>, raw_readings: Vec<RawDynoRow>) -> Result<CleanTables> {
        let cars = CarInfoCleaner::new(&self.filter)
            .clean(raw_cars)
            .context("cleaning car info")?;
        let readings = DynoRunCleaner::new(&self.filter).clean(raw_readings);

        let cars = if self.config.features.enabled {
            self.extractor.apply(cars)
        } else {
            cars
        };

        Ok(CleanTables { cars, readings })
    }

    /// Partition prepared tables by run.
    pub fn split(&self, tables: CleanTables) -> Result<Splits> {
        let CleanTables { mut cars, readings } = tables;

        if self.config.policy.drop_runs_without_readings {
            let with_readings: BTreeSet<i64> = readings.iter().map(|r| r.run).collect();
            let before = cars.len();
            cars.retain(|c| with_readings.contains(&c.run));
            log::info!(
                "dropped {} runs without readings before splitting",
                before - cars.len()
            );
        }

        let splits = self
            .config
            .split
            .splitter()
            .split(&cars, &readings)
            .context("splitting runs")?;
        Ok(splits)
    }

    /// Load, prepare and split.
    pub fn run(&self) -> Result<Splits> {
        let tables = self.load()?;
        self.split(tables)
    }
}

/// Run the whole pipeline and return only the train pair.
pub fn prep_explore(config: PipelineConfig) -> Result<(Vec<CarRecord>, Vec<DynoReading>)> {
    Ok(Pipeline::new(config).run()?.into_train())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Partition;

    fn raw_car(run: i64, specs: &str) -> RawCarRow {
        RawCarRow {
            run,
            name: Some(format!("run {run}")),
            date: None,
            specs: Some(specs.to_string()),
            afr: None,
            car: Some("2014 Subaru WRX STI".to_string()),
        }
    }

    fn raw_reading(run: i64) -> RawDynoRow {
        RawDynoRow {
            run: Some(run),
            rpm: Some(4000.0),
            hp: Some(280.0),
            torque: Some(300.0),
            afr: Some(11.5),
            boost: Some(18.0),
        }
    }

    #[test]
    fn test_prepare_extracts_features_when_enabled() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let tables = pipeline
            .prepare(
                vec![raw_car(1, "Tuned on E85"), raw_car(2, "Stock tune, no mods")],
                vec![raw_reading(1)],
            )
            .unwrap();
        assert_eq!(tables.cars[0].octane, Some(105));
        assert!(tables.cars[0].has_keyword);
        assert!(!tables.cars[1].has_keyword);
    }

    #[test]
    fn test_prepare_skips_features_when_disabled() {
        let mut config = PipelineConfig::default();
        config.features.enabled = false;
        let tables = Pipeline::new(config)
            .prepare(vec![raw_car(1, "Tuned on E85")], vec![])
            .unwrap();
        assert_eq!(tables.cars[0].octane, None);
        assert!(!tables.cars[0].has_keyword);
    }

    #[test]
    fn test_both_cleaners_share_the_filter() {
        let pipeline = Pipeline::new(PipelineConfig::default());
        let tables = pipeline
            .prepare(
                vec![raw_car(91, ""), raw_car(5, "")],
                vec![raw_reading(91), raw_reading(5)],
            )
            .unwrap();
        assert_eq!(tables.cars.len(), 1);
        assert!(tables.readings.iter().all(|r| r.run == 5));
    }

    #[test]
    fn test_orphan_policy() {
        let cars: Vec<RawCarRow> = (1..=20).map(|run| raw_car(run, "")).collect();
        let readings: Vec<RawDynoRow> = (1..=10).map(raw_reading).collect();

        let keep = Pipeline::new(PipelineConfig::default());
        let tables = keep.prepare(cars.clone(), readings.clone()).unwrap();
        assert_eq!(keep.split(tables).unwrap().assignment().len(), 20);

        let mut config = PipelineConfig::default();
        config.policy.drop_runs_without_readings = true;
        let drop = Pipeline::new(config);
        let tables = drop.prepare(cars, readings).unwrap();
        let assignment = drop.split(tables).unwrap().assignment();
        assert_eq!(assignment.len(), 10);
        assert!(assignment.keys().all(|run| *run <= 10));
    }

    #[test]
    fn test_split_uses_configured_fractions() {
        let mut config = PipelineConfig::default();
        config.split.test_fraction = 0.5;
        config.split.validate_fraction = 0.5;
        let pipeline = Pipeline::new(config).with_filter(RunFilter::none());
        let cars: Vec<RawCarRow> = (0..8).map(|run| raw_car(run, "")).collect();
        let tables = pipeline.prepare(cars, vec![]).unwrap();
        let splits = pipeline.split(tables).unwrap();
        assert_eq!(splits.get(Partition::Test).cars.len(), 4);
        assert_eq!(splits.get(Partition::Validate).cars.len(), 2);
        assert_eq!(splits.get(Partition::Train).cars.len(), 2);
    }
}
