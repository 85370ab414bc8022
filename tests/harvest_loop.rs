use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use riot_match_harvest::champions::ChampionRoster;
use riot_match_harvest::harvest::{HarvestArgs, MatchSource, create_output_file, run_harvest};
use riot_match_harvest::match_data::MatchRecord;
use riot_match_harvest::stats::HEADER;

/// Serves a fixed set of matches by id and records every id it was asked
/// for, so tests can pin the exact probe sequence.
struct ScriptedSource {
    matches: HashMap<i64, MatchRecord>,
    requested: RefCell<Vec<i64>>,
}

impl ScriptedSource {
    fn new(matches: Vec<MatchRecord>) -> Self {
        Self {
            matches: matches.into_iter().map(|m| (m.game_id, m)).collect(),
            requested: RefCell::new(Vec::new()),
        }
    }

    fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn requested(&self) -> Vec<i64> {
        self.requested.borrow().clone()
    }
}

impl MatchSource for ScriptedSource {
    fn fetch_match(&self, match_id: i64) -> Result<Option<MatchRecord>> {
        self.requested.borrow_mut().push(match_id);
        Ok(self.matches.get(&match_id).cloned())
    }
}

fn game(id: i64, game_mode: &str, queue_id: i64) -> MatchRecord {
    serde_json::from_value(serde_json::json!({
        "gameId": id,
        "gameVersion": "9.3.264.5271",
        "gameMode": game_mode,
        "queueId": queue_id,
        "teams": [
            {
                "teamId": 100,
                "win": "Win",
                "bans": [{"championId": 157, "pickTurn": 1}],
                "towerKills": 8,
                "firstTower": true
            },
            {
                "teamId": 200,
                "win": "Fail",
                "bans": [{"championId": -1, "pickTurn": 6}],
                "dragonKills": 2,
                "firstDragon": true
            }
        ],
        "participants": [
            {"teamId": 100, "championId": 266},
            {"teamId": 200, "championId": 86}
        ]
    }))
    .expect("scripted match should deserialize")
}

fn ranked(id: i64) -> MatchRecord {
    game(id, "CLASSIC", 420)
}

fn roster() -> ChampionRoster {
    ChampionRoster::from_names(HashMap::from([
        (157, "Yasuo".to_string()),
        (266, "Aatrox".to_string()),
        (86, "Garen".to_string()),
    ]))
}

fn args(out_file: &Path, start_id: i64, max_records: u64) -> HarvestArgs {
    HarvestArgs {
        out_file: out_file.to_path_buf(),
        start_id,
        max_records,
        sleep_secs: 0,
        max_attempts: None,
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("output file should be readable")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn probes_down_until_first_ranked_match() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    // 1000 through 998 do not exist; 997 is the first ranked classic match.
    let source = ScriptedSource::new(vec![ranked(997)]);
    let summary = run_harvest(&args(&out, 1000, 1), &source, &roster()).expect("harvest");

    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.attempts, 4);
    assert_eq!(source.requested(), vec![1000, 999, 998, 997]);

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], HEADER.join(","));
    assert!(lines[1].starts_with("997,9.3.264.5271,blue,true,"));
    assert!(lines[2].starts_with("997,9.3.264.5271,red,false,"));
}

#[test]
fn header_appears_once_across_accepted_matches() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    let source = ScriptedSource::new(vec![ranked(500), ranked(499), ranked(498)]);
    let summary = run_harvest(&args(&out, 500, 3), &source, &roster()).expect("harvest");

    assert_eq!(summary.records_written, 3);
    let lines = read_lines(&out);
    assert_eq!(lines.len(), 1 + 2 * 3);
    assert_eq!(
        lines.iter().filter(|line| line.starts_with("id,")).count(),
        1
    );
}

#[test]
fn blue_row_immediately_precedes_red_row() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    let source = ScriptedSource::new(vec![ranked(500), ranked(499)]);
    run_harvest(&args(&out, 500, 2), &source, &roster()).expect("harvest");

    let lines = read_lines(&out);
    for pair in lines[1..].chunks(2) {
        let blue_id = pair[0].split(',').next().expect("id column").to_string();
        assert!(pair[0].contains(",blue,"));
        assert!(pair[1].contains(",red,"));
        assert!(pair[1].starts_with(&format!("{blue_id},")));
    }
}

#[test]
fn off_criteria_matches_are_rejected() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    // 300 is ARAM, 299 is flex queue, 298 qualifies.
    let source = ScriptedSource::new(vec![
        game(300, "ARAM", 450),
        game(299, "CLASSIC", 440),
        ranked(298),
    ]);
    let summary = run_harvest(&args(&out, 300, 1), &source, &roster()).expect("harvest");

    assert_eq!(summary.records_written, 1);
    assert_eq!(summary.attempts, 3);
    let lines = read_lines(&out);
    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("298,"));
}

#[test]
fn id_decrements_every_attempt_and_count_moves_only_on_accept() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    // 10 missing, 9 off-criteria, 8 accepted, 7 missing, 6 accepted.
    let source = ScriptedSource::new(vec![game(9, "CLASSIC", 440), ranked(8), ranked(6)]);
    let summary = run_harvest(&args(&out, 10, 2), &source, &roster()).expect("harvest");

    assert_eq!(source.requested(), vec![10, 9, 8, 7, 6]);
    assert_eq!(summary.records_written, 2);
    assert_eq!(summary.attempts, 5);

    let lines = read_lines(&out);
    assert_eq!(lines.len(), 1 + 2 * 2);
    assert!(lines[1].starts_with("8,"));
    assert!(lines[3].starts_with("6,"));
}

#[test]
fn empty_ban_slots_serialize_as_empty_fields() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    let source = ScriptedSource::new(vec![ranked(42)]);
    run_harvest(&args(&out, 42, 1), &source, &roster()).expect("harvest");

    let lines = read_lines(&out);
    // Red team's only ban slot was cleared and the rest are absent: all five
    // ban columns are empty.
    let red: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(&red[4..9], &["", "", "", "", ""]);
    // Blue banned one champion; the remaining four slots are empty.
    let blue: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(blue[4], "Yasuo");
    assert_eq!(&blue[5..9], &["", "", "", ""]);
}

#[test]
fn zero_records_requested_makes_no_attempts() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    let source = ScriptedSource::new(vec![ranked(100)]);
    let summary = run_harvest(&args(&out, 100, 0), &source, &roster()).expect("harvest");

    assert_eq!(summary.records_written, 0);
    assert_eq!(summary.attempts, 0);
    assert!(source.requested().is_empty());
    // The file was created at precondition time but no header or rows were
    // ever appended.
    assert_eq!(fs::read_to_string(&out).expect("readable"), "");
}

#[test]
fn existing_output_file_is_refused() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    fs::write(&out, "previously harvested data\n").expect("seed file");

    let err = create_output_file(&out).expect_err("existing file must be refused");
    assert!(err.to_string().contains("already exists"));
    assert_eq!(
        fs::read_to_string(&out).expect("readable"),
        "previously harvested data\n"
    );
}

#[test]
fn attempt_limit_stops_an_endless_search() {
    let dir = TempDir::new().expect("temp dir");
    let out = dir.path().join("records.csv");
    create_output_file(&out).expect("fresh file");

    let source = ScriptedSource::empty();
    let mut harvest_args = args(&out, 1000, 1);
    harvest_args.max_attempts = Some(5);

    let err = run_harvest(&harvest_args, &source, &roster()).expect_err("limit must trip");
    assert!(err.to_string().contains("gave up after 5 attempts"));
    assert_eq!(source.requested(), vec![1000, 999, 998, 997, 996]);
}
