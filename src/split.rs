//! Seeded train / validate / test partitioning keyed by run.
//!
//! Car records are split; readings follow their run's partition and are never
//! split on their own.

use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::data::filter::select_runs;
use crate::data::model::{CarRecord, DynoReading, Partition};
use crate::error::{PrepError, PrepResult};

/// Shuffle `rows` with `seed` and cut off `ceil(test_fraction * n)` of them.
///
/// Returns `(rest, held_out)`. The same input and seed always give the same
/// two subsets in the same order.
pub fn train_test_split<T: Clone>(
    rows: &[T],
    test_fraction: f64,
    seed: u64,
) -> PrepResult<(Vec<T>, Vec<T>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PrepError::InvalidFraction(test_fraction));
    }

    let n_test = (test_fraction * rows.len() as f64).ceil() as usize;
    let mut order: Vec<usize> = (0..rows.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let (test_idx, train_idx) = order.split_at(n_test.min(rows.len()));
    let pick = |idx: &[usize]| idx.iter().map(|&i| rows[i].clone()).collect::<Vec<T>>();
    Ok((pick(train_idx), pick(test_idx)))
}

/// Car records of one partition with the readings of those runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitPair {
    pub cars: Vec<CarRecord>,
    pub readings: Vec<DynoReading>,
}

impl SplitPair {
    fn from_cars(cars: Vec<CarRecord>, readings: &[DynoReading]) -> Self {
        let runs: BTreeSet<i64> = cars.iter().map(|c| c.run).collect();
        let readings = select_runs(readings, &runs, |r| r.run);
        Self { cars, readings }
    }

    pub fn runs(&self) -> BTreeSet<i64> {
        self.cars.iter().map(|c| c.run).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Splits {
    pub train: SplitPair,
    pub validate: SplitPair,
    pub test: SplitPair,
}

impl Splits {
    pub fn get(&self, partition: Partition) -> &SplitPair {
        match partition {
            Partition::Train => &self.train,
            Partition::Validate => &self.validate,
            Partition::Test => &self.test,
        }
    }

    /// Which partition each run landed in.
    pub fn assignment(&self) -> BTreeMap<i64, Partition> {
        Partition::ALL
            .iter()
            .flat_map(|&p| self.get(p).cars.iter().map(move |c| (c.run, p)))
            .collect()
    }

    pub fn into_train(self) -> (Vec<CarRecord>, Vec<DynoReading>) {
        (self.train.cars, self.train.readings)
    }
}

/// Two-stage split: `test_fraction` of all runs is held out as test, then
/// `validate_fraction` of the remainder becomes validate.
///
/// The defaults give 50% train, 30% validate and 20% test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSplitter {
    pub seed: u64,
    pub test_fraction: f64,
    pub validate_fraction: f64,
}

impl Default for DatasetSplitter {
    fn default() -> Self {
        Self {
            seed: 1,
            test_fraction: 0.2,
            validate_fraction: 0.375,
        }
    }
}

impl DatasetSplitter {
    pub fn split(&self, cars: &[CarRecord], readings: &[DynoReading]) -> PrepResult<Splits> {
        let (train_validate, test) = train_test_split(cars, self.test_fraction, self.seed)?;
        let (train, validate) =
            train_test_split(&train_validate, self.validate_fraction, self.seed)?;

        let splits = Splits {
            train: SplitPair::from_cars(train, readings),
            validate: SplitPair::from_cars(validate, readings),
            test: SplitPair::from_cars(test, readings),
        };

        for partition in Partition::ALL {
            let pair = splits.get(partition);
            log::info!(
                "{partition}: {} runs, {} readings",
                pair.cars.len(),
                pair.readings.len()
            );
        }
        Ok(splits)
    }
}
