//! Dyno run preparation.
//!
//! Cleans a car metadata table and a per-RPM reading table so that both agree
//! on which runs exist, mines boost PSI and fuel octane out of the free-text
//! specs, and splits runs into train / validate / test.
//!
//! ```no_run
//! use dyno_prep::config::PipelineConfig;
//! use dyno_prep::pipeline::prep_explore;
//!
//! let (cars, readings) = prep_explore(PipelineConfig::default()).unwrap();
//! println!("{} train runs, {} readings", cars.len(), readings.len());
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod features;
pub mod pipeline;
pub mod split;

pub use data::filter::{ExclusionSet, RunFilter};
pub use data::model::{CarRecord, DynoReading, Partition};
pub use error::PrepError;
pub use features::SpecFeatureExtractor;
pub use pipeline::{Pipeline, prep_explore};
pub use split::{DatasetSplitter, SplitPair, Splits};
