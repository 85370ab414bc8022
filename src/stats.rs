use anyhow::{Context, Result};
use serde::Serialize;

use crate::champions::ChampionRoster;
use crate::match_data::{MatchRecord, TeamSide};

pub const BAN_SLOTS: usize = 5;
pub const CHAMPION_SLOTS: usize = 5;

/// Champion id Riot uses for a cleared ban slot.
const NO_BAN_CHAMPION_ID: i64 = -1;

/// Column order of the output file. `TeamRow` fields must stay in sync.
pub const HEADER: [&str; 24] = [
    "id",
    "version",
    "side",
    "win",
    "ban1",
    "ban2",
    "ban3",
    "ban4",
    "ban5",
    "champion1",
    "champion2",
    "champion3",
    "champion4",
    "champion5",
    "tower_kills",
    "inhibitor_kills",
    "dragon_kills",
    "rift_herald_kills",
    "baron_kills",
    "first_tower",
    "first_inhibitor",
    "first_dragon",
    "first_rift_herald",
    "first_baron",
];

/// One team of one match, flattened to the fixed 24-column record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRow {
    pub id: i64,
    pub version: String,
    pub side: String,
    pub win: bool,
    pub ban1: String,
    pub ban2: String,
    pub ban3: String,
    pub ban4: String,
    pub ban5: String,
    pub champion1: String,
    pub champion2: String,
    pub champion3: String,
    pub champion4: String,
    pub champion5: String,
    pub tower_kills: i64,
    pub inhibitor_kills: i64,
    pub dragon_kills: i64,
    pub rift_herald_kills: i64,
    pub baron_kills: i64,
    pub first_tower: bool,
    pub first_inhibitor: bool,
    pub first_dragon: bool,
    pub first_rift_herald: bool,
    pub first_baron: bool,
}

/// Flattens the requested side of a match. Ban slots keep pick-turn order;
/// cleared or missing slots become empty strings, as do missing trailing
/// participants.
pub fn team_row(record: &MatchRecord, side: TeamSide, roster: &ChampionRoster) -> Result<TeamRow> {
    let team = record
        .team(side)
        .with_context(|| format!("match {} has no {} team in payload", record.game_id, side))?;

    let mut slots: Vec<_> = team.bans.iter().collect();
    slots.sort_by_key(|ban| ban.pick_turn);

    let mut bans: Vec<String> = slots
        .into_iter()
        .take(BAN_SLOTS)
        .map(|ban| {
            if ban.champion_id == NO_BAN_CHAMPION_ID {
                String::new()
            } else {
                roster.display_name(ban.champion_id)
            }
        })
        .collect();
    bans.resize(BAN_SLOTS, String::new());

    let mut champions: Vec<String> = record
        .participants_for(side)
        .take(CHAMPION_SLOTS)
        .map(|participant| roster.display_name(participant.champion_id))
        .collect();
    champions.resize(CHAMPION_SLOTS, String::new());

    let mut bans = bans.into_iter();
    let mut champions = champions.into_iter();

    Ok(TeamRow {
        id: record.game_id,
        version: record.game_version.clone(),
        side: side.label().to_string(),
        win: team.won(),
        ban1: bans.next().unwrap_or_default(),
        ban2: bans.next().unwrap_or_default(),
        ban3: bans.next().unwrap_or_default(),
        ban4: bans.next().unwrap_or_default(),
        ban5: bans.next().unwrap_or_default(),
        champion1: champions.next().unwrap_or_default(),
        champion2: champions.next().unwrap_or_default(),
        champion3: champions.next().unwrap_or_default(),
        champion4: champions.next().unwrap_or_default(),
        champion5: champions.next().unwrap_or_default(),
        tower_kills: team.tower_kills,
        inhibitor_kills: team.inhibitor_kills,
        dragon_kills: team.dragon_kills,
        rift_herald_kills: team.rift_herald_kills,
        baron_kills: team.baron_kills,
        first_tower: team.first_tower,
        first_inhibitor: team.first_inhibitor,
        first_dragon: team.first_dragon,
        first_rift_herald: team.first_rift_herald,
        first_baron: team.first_baron,
    })
}
