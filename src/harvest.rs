use anyhow::{Context, Result, bail};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use crate::champions::ChampionRoster;
use crate::match_data::{MatchRecord, TeamSide};
use crate::stats::{self, team_row};

/// Source of match records by numeric id. `RiotClient` is the production
/// implementation; tests drive the loop with scripted sources.
pub trait MatchSource {
    /// `Ok(None)` means the id exists nowhere on the service.
    fn fetch_match(&self, match_id: i64) -> Result<Option<MatchRecord>>;
}

#[derive(Debug, Clone)]
pub struct HarvestArgs {
    pub out_file: PathBuf,
    pub start_id: i64,
    pub max_records: u64,
    /// Fixed pause before every fetch attempt.
    pub sleep_secs: u64,
    /// Optional cap on total fetch attempts; `None` searches without bound.
    pub max_attempts: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestSummary {
    pub records_written: u64,
    pub attempts: u64,
}

/// Creates the output file, refusing to touch a path that already exists.
/// `create_new` makes the existence check and the creation one atomic step.
pub fn create_output_file(path: &Path) -> Result<()> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            bail!(
                "{} already exists; refusing to overwrite previously harvested data",
                path.display()
            )
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed to create {}", path.display()))
        }
    }
}

/// Walks match ids downwards from `start_id` until `max_records` matches have
/// passed the classic/ranked-solo filter, appending a blue and a red row per
/// accepted match. The id advances after every attempt whatever the outcome;
/// only acceptance advances the record count.
pub fn run_harvest(
    args: &HarvestArgs,
    source: &impl MatchSource,
    roster: &ChampionRoster,
) -> Result<HarvestSummary> {
    let mut records_written: u64 = 0;
    let mut attempts: u64 = 0;
    let mut current_id = args.start_id;

    while records_written < args.max_records {
        if let Some(limit) = args.max_attempts {
            if attempts >= limit {
                bail!(
                    "gave up after {} attempts with {} of {} records retrieved",
                    attempts,
                    records_written,
                    args.max_records
                );
            }
        }

        sleep(Duration::from_secs(args.sleep_secs));
        attempts += 1;

        match source.fetch_match(current_id)? {
            None => println!("Match ID {current_id} does not exist."),
            Some(record) if !record.is_classic_ranked_solo() => {
                println!(
                    "Match ID {} does not match criteria of '5v5 ranked solo queue'.",
                    record.game_id
                );
            }
            Some(record) => {
                append_match(&args.out_file, &record, roster, records_written == 0)?;
                records_written += 1;
                println!(
                    "Match ID {} added. ({} matches out of {} saved to disk)",
                    record.game_id, records_written, args.max_records
                );
            }
        }

        current_id -= 1;
    }

    Ok(HarvestSummary {
        records_written,
        attempts,
    })
}

/// Scoped open-append-close cycle for one accepted match: header first when
/// this is the run's first record, then the blue row, then the red row.
fn append_match(
    out_file: &Path,
    record: &MatchRecord,
    roster: &ChampionRoster,
    first_record: bool,
) -> Result<()> {
    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(out_file)
        .with_context(|| format!("failed to open {} for append", out_file.display()))?;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

    if first_record {
        writer
            .write_record(stats::HEADER)
            .context("failed to write csv header")?;
    }

    for side in [TeamSide::Blue, TeamSide::Red] {
        let row = team_row(record, side, roster)?;
        writer.serialize(&row).with_context(|| {
            format!("failed to write {} row for match {}", side, record.game_id)
        })?;
    }

    writer.flush().context("failed to flush csv output")?;
    Ok(())
}
