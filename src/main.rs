use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use dyno_prep::config::PipelineConfig;
use dyno_prep::data::loader::load_table;
use dyno_prep::data::repair::repair_table;
use dyno_prep::export::{ExportFormat, preview_cars, write_raw_table, write_splits};
use dyno_prep::features::unmatched_word_counts;
use dyno_prep::pipeline::Pipeline;
use dyno_prep::Partition;

#[derive(Parser)]
#[command(name = "dyno-prep")]
#[command(author, version, about = "Clean, feature-mine and split dyno run data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Car metadata table (overrides the config file)
    #[arg(long)]
    car_info: Option<PathBuf>,

    /// Per-RPM reading table (overrides the config file)
    #[arg(long)]
    dyno_runs: Option<PathBuf>,

    /// Split concatenated reading rows while loading
    #[arg(long)]
    repair: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and report the partitions
    Prep {
        /// Directory to export all partitions into
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Export format
        #[arg(long, value_enum, default_value = "csv")]
        format: Format,

        /// Seed for the partitioning (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Skip spec feature mining
        #[arg(long)]
        no_features: bool,

        /// Train rows to preview
        #[arg(long, default_value = "10")]
        preview: usize,
    },

    /// List the most frequent words in specs no rule has matched
    Keywords {
        /// Number of words to show (overrides the config file)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Split concatenated rows of a raw reading table
    Repair {
        /// Raw reading table
        input: PathBuf,

        /// Repaired CSV to write
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

impl From<Format> for ExportFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Csv => ExportFormat::Csv,
            Format::Parquet => ExportFormat::Parquet,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = cli.car_info {
        config.input.car_info = path;
    }
    if let Some(path) = cli.dyno_runs {
        config.input.dyno_runs = path;
    }
    config.input.repair_concatenated |= cli.repair;

    match cli.command {
        Commands::Prep {
            out,
            format,
            seed,
            no_features,
            preview,
        } => {
            if let Some(seed) = seed {
                config.split.seed = seed;
            }
            if no_features {
                config.features.enabled = false;
            }

            let splits = Pipeline::new(config).run()?;
            for partition in Partition::ALL {
                let pair = splits.get(partition);
                println!(
                    "{:>8}: {:>5} runs {:>7} readings",
                    partition.as_str(),
                    pair.cars.len(),
                    pair.readings.len()
                );
            }

            if preview > 0 {
                println!("{}", preview_cars(&splits.train.cars, preview)?);
            }

            if let Some(dir) = out {
                let written = write_splits(&splits, &dir, format.into())?;
                log::info!("wrote {} files to {}", written.len(), dir.display());
            }
        }

        Commands::Keywords { top } => {
            let top = top.unwrap_or(config.features.top_words);
            config.features.enabled = true;
            let tables = Pipeline::new(config).load()?;
            for (word, count) in unmatched_word_counts(&tables.cars, top) {
                println!("{count:>6}  {word}");
            }
        }

        Commands::Repair { input, output } => {
            let mut table = load_table(&input)?;
            let repaired = repair_table(&mut table)?;
            write_raw_table(&table, &output)?;
            println!("repaired {repaired} of {} rows -> {}", table.len(), output.display());
        }
    }

    Ok(())
}
