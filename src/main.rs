use anyhow::Result;
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use std::process;

use riot_match_harvest::champions::ChampionRoster;
use riot_match_harvest::config::ApiConfig;
use riot_match_harvest::harvest::{self, HarvestArgs};
use riot_match_harvest::riot_api::RiotClient;

#[derive(Parser, Debug)]
#[command(
    name = "riot-match-harvest",
    about = "Harvests ranked solo queue match records from the Riot API into a CSV file",
    version
)]
struct Cli {
    /// File the harvested rows are written to; must not already exist
    output: PathBuf,

    /// Match id to start searching from (ids are probed downwards)
    start_id: i64,

    /// Number of accepted matches to retrieve
    max_records: u64,

    /// Seconds to wait between fetch attempts
    #[arg(long = "sleep-secs", default_value_t = 3)]
    sleep_secs: u64,

    /// Abort after this many fetch attempts instead of searching forever
    #[arg(long = "max-attempts")]
    max_attempts: Option<u64>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let config = ApiConfig::from_env()?;

    harvest::create_output_file(&args.output)?;
    println!("Creating {} in the current directory.", args.output.display());

    let client = RiotClient::new(config)?;
    let roster = ChampionRoster::fetch_latest()?;

    let harvest_args = HarvestArgs {
        out_file: args.output.clone(),
        start_id: args.start_id,
        max_records: args.max_records,
        sleep_secs: args.sleep_secs,
        max_attempts: args.max_attempts,
    };

    println!(
        "[{}] Harvesting from match id {} downwards ({} champions known).",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        args.start_id,
        roster.len()
    );

    let summary = harvest::run_harvest(&harvest_args, &client, &roster)?;

    println!(
        "[{}] Successfully retrieved {} records in {} attempts and saved to {}.",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        summary.records_written,
        summary.attempts,
        args.output.display()
    );
    Ok(())
}
