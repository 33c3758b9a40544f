/// Data layer: core types, loading, repair, and cleaning.
///
/// Architecture:
/// ```text
///  car_info.csv / dyno_runs.csv (.json)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable → raw rows
///   └──────────┘      (repair: split glued RPM cells)
///        │
///        ▼
///   ┌──────────┐
///   │  clean    │  drop runs in the RunFilter tables, fix schema
///   └──────────┘
///        │
///        ▼
///   Vec<CarRecord>, Vec<DynoReading>
/// ```

pub mod clean;
pub mod filter;
pub mod loader;
pub mod model;
pub mod repair;
