pub mod config;
pub mod runner;

pub use config::{dump_config, load_config};
pub use runner::{run, Adjustment, AdjustmentError, RunOptions, RunSummary};
