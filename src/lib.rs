pub mod adapter;
pub mod batch;
pub mod cli;
pub mod commands;
pub mod errors;
pub mod host;
pub mod job;
pub mod region;
pub mod settings;
pub mod table;
pub mod utils;
pub mod volume;

pub use crate::batch::{BatchController, BatchInputs, BatchSummary};
pub use crate::errors::{RadiomicsError, RadiomicsResult};
pub use crate::job::{JobRunner, ProcessLauncher, RunMode};
pub use crate::region::{Region, RegionEnumerator};
pub use crate::table::{OutputTable, ResultAccumulator, TableLayout};
