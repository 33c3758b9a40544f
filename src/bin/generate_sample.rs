use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Write a synthetic car_info.csv / dyno_runs.csv pair for local runs.
#[derive(Parser)]
#[command(name = "generate_sample")]
struct Args {
    /// Output directory
    #[arg(default_value = ".")]
    out: PathBuf,

    /// Number of runs
    #[arg(long, default_value = "300")]
    runs: i64,

    #[arg(long, default_value = "42")]
    seed: u64,
}

const CARS: [&str; 8] = [
    "2015 Subaru WRX STI",
    "2008 Mitsubishi EVO X",
    "2012 Nissan GT-R",
    "2013 Mazda Mazdaspeed3",
    "2014 Ford Focus ST",
    "2009 BMW 335i",
    "2016 Volkswagen Golf R",
    "Macan",
];

const SPECS: [&str; 10] = [
    "Stage 2, 22 psi, 93 oct",
    "Tuned on E85",
    "Stock tune, no mods",
    "ACN91 map, 17.5 Peak PSI",
    "100 oct with MS109 splash",
    "Sunoco 104 race gas 28psi",
    "Intake and downpipe 18 psi",
    "91 CA pump, stock turbo",
    "Big turbo 35.5 psi E-85",
    "Exhaust only",
];

/// Torque-ish curve peaking mid-range.
fn power_at(rpm: f64, peak_hp: f64) -> (f64, f64) {
    let x = (rpm - 2500.0) / 4500.0;
    let hp = peak_hp * (1.0 - (x - 0.75).powi(2)).max(0.1);
    let torque = hp * 5252.0 / rpm;
    (hp, torque)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = StdRng::seed_from_u64(args.seed);

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    let car_path = args.out.join("car_info.csv");
    let runs_path = args.out.join("dyno_runs.csv");

    let mut cars = csv::Writer::from_path(&car_path).context("creating car_info.csv")?;
    cars.write_record(["Run", "Name", "Date", "Specs", "AFR", "Car"])?;

    let mut runs = csv::Writer::from_path(&runs_path).context("creating dyno_runs.csv")?;
    runs.write_record(["", "Run", "RPM", "HP", "Torque", "AFR", "Boost"])?;

    let mut index = 0_u64;
    for run in 1..=args.runs {
        let car = CARS.choose(&mut rng).copied().unwrap_or(CARS[0]);
        let specs = SPECS.choose(&mut rng).copied().unwrap_or(SPECS[0]);
        let day = rng.gen_range(1..=28);
        cars.write_record([
            run.to_string(),
            format!("Customer {run}"),
            format!("2019-03-{day:02}"),
            specs.to_string(),
            format!("{:.1}", rng.gen_range(10.5..12.5)),
            car.to_string(),
        ])?;

        let peak_hp = rng.gen_range(180.0..650.0);
        let peak_boost = rng.gen_range(8.0..35.0);
        let mut rpm = 2500.0;
        while rpm <= 7000.0 {
            let (hp, torque) = power_at(rpm, peak_hp);
            let boost = peak_boost * ((rpm - 2500.0) / 1500.0).min(1.0);
            // a few gaps the cleaner has to drop
            let rpm_cell = if rng.gen_bool(0.02) { String::new() } else { format!("{rpm:.0}") };
            let boost_cell = if rng.gen_bool(0.03) { String::new() } else { format!("{boost:.2}") };
            runs.write_record([
                index.to_string(),
                run.to_string(),
                rpm_cell,
                format!("{hp:.2}"),
                format!("{torque:.2}"),
                format!("{:.2}", rng.gen_range(10.8..12.2)),
                boost_cell,
            ])?;
            index += 1;
            rpm += 250.0;
        }
    }

    cars.flush()?;
    runs.flush()?;

    println!(
        "Wrote {} runs to {} and {index} readings to {}",
        args.runs,
        car_path.display(),
        runs_path.display()
    );
    Ok(())
}
