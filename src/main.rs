use anyhow::Result;
use clap::Parser;
use murmur_lib::app::{self, Adjustment, RunOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "murmur.toml")]
    config: PathBuf,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 300)]
    ticks: u64,

    /// Seed for the swarm RNG (overrides the config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Initial entity count (overrides the config)
    #[arg(short, long)]
    entities: Option<usize>,

    /// Tuning step applied before the first tick, e.g. `separation=+1.5` or `max_speed=-0.1`
    #[arg(short, long)]
    adjust: Vec<Adjustment>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    murmur_core::init_logging();
    let args = Args::parse();

    let config = app::load_config(&args.config)?;
    if args.dump_config {
        print!("{}", app::dump_config(&config)?);
        return Ok(());
    }

    let options = RunOptions {
        ticks: args.ticks,
        seed: args.seed,
        entities: args.entities,
        adjustments: args.adjust,
    };
    let summary = app::run(config, &options)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{json}");
    Ok(())
}
