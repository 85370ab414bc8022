use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;

pub const QUEUE_RANKED_SOLO: i64 = 420;
pub const GAME_MODE_CLASSIC: &str = "CLASSIC";

const BLUE_TEAM_ID: i64 = 100;
const RED_TEAM_ID: i64 = 200;

/// The slice of a match-v4 payload this tool consumes. Unknown fields in the
/// response are ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub game_id: i64,
    pub game_version: String,
    pub game_mode: String,
    pub queue_id: i64,
    #[serde(default)]
    pub teams: Vec<TeamStats>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub team_id: i64,
    /// "Win" or "Fail" on the wire.
    #[serde(default)]
    pub win: String,
    #[serde(default)]
    pub bans: Vec<TeamBan>,
    #[serde(default)]
    pub tower_kills: i64,
    #[serde(default)]
    pub inhibitor_kills: i64,
    #[serde(default)]
    pub dragon_kills: i64,
    #[serde(default)]
    pub rift_herald_kills: i64,
    #[serde(default)]
    pub baron_kills: i64,
    #[serde(default)]
    pub first_tower: bool,
    #[serde(default)]
    pub first_inhibitor: bool,
    #[serde(default)]
    pub first_dragon: bool,
    #[serde(default)]
    pub first_rift_herald: bool,
    #[serde(default)]
    pub first_baron: bool,
}

impl TeamStats {
    pub fn won(&self) -> bool {
        self.win == "Win"
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamBan {
    /// -1 marks a cleared ban slot.
    pub champion_id: i64,
    #[serde(default)]
    pub pick_turn: i64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub team_id: i64,
    pub champion_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamSide {
    Blue,
    Red,
}

impl TeamSide {
    pub fn team_id(self) -> i64 {
        match self {
            TeamSide::Blue => BLUE_TEAM_ID,
            TeamSide::Red => RED_TEAM_ID,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TeamSide::Blue => "blue",
            TeamSide::Red => "red",
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TeamSide {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blue" => Ok(TeamSide::Blue),
            "red" => Ok(TeamSide::Red),
            other => bail!("unknown team color '{other}' (must pick 'red' or 'blue')"),
        }
    }
}

impl MatchRecord {
    pub fn team(&self, side: TeamSide) -> Option<&TeamStats> {
        self.teams.iter().find(|team| team.team_id == side.team_id())
    }

    pub fn participants_for(&self, side: TeamSide) -> impl Iterator<Item = &Participant> {
        self.participants
            .iter()
            .filter(move |participant| participant.team_id == side.team_id())
    }

    /// Acceptance filter: classic 5v5 on the ranked solo queue.
    pub fn is_classic_ranked_solo(&self) -> bool {
        self.game_mode == GAME_MODE_CLASSIC && self.queue_id == QUEUE_RANKED_SOLO
    }
}
