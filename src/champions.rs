use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const VERSIONS_URL: &str = "https://ddragon.leagueoflegends.com/api/versions.json";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Champion id -> display name, from Data Dragon static data. Fetched once
/// per run; ban and pick ids in match payloads resolve through this map.
#[derive(Debug, Clone, Default)]
pub struct ChampionRoster {
    names: HashMap<i64, String>,
}

#[derive(Deserialize)]
struct ChampionList {
    data: HashMap<String, ChampionEntry>,
}

#[derive(Deserialize)]
struct ChampionEntry {
    /// Numeric champion id, as a string on the wire.
    key: String,
    name: String,
}

impl ChampionRoster {
    pub fn from_names(names: HashMap<i64, String>) -> Self {
        Self { names }
    }

    /// Downloads the champion list for the newest Data Dragon version.
    /// Champion keys are stable across versions, so the newest list resolves
    /// ids from older match payloads too.
    pub fn fetch_latest() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")?;

        let versions: Vec<String> = client
            .get(VERSIONS_URL)
            .send()
            .context("request for Data Dragon versions failed")?
            .error_for_status()
            .context("Data Dragon versions request rejected")?
            .json()
            .context("malformed Data Dragon versions payload")?;

        let version = versions
            .first()
            .context("Data Dragon returned an empty version list")?;

        let url = format!(
            "https://ddragon.leagueoflegends.com/cdn/{version}/data/en_US/champion.json"
        );
        let raw = client
            .get(&url)
            .send()
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .context("Data Dragon champion request rejected")?
            .text()
            .context("failed to read Data Dragon champion payload")?;

        let names = parse_champion_json(&raw)?;
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, champion_id: i64) -> Option<&str> {
        self.names.get(&champion_id).map(String::as_str)
    }

    /// Display form used in output rows: the known name, or the raw id in
    /// decimal when the roster predates the champion.
    pub fn display_name(&self, champion_id: i64) -> String {
        match self.name(champion_id) {
            Some(name) => name.to_string(),
            None => champion_id.to_string(),
        }
    }
}

pub fn parse_champion_json(raw: &str) -> Result<HashMap<i64, String>> {
    let list: ChampionList =
        serde_json::from_str(raw).context("malformed Data Dragon champion payload")?;

    Ok(list
        .data
        .into_values()
        .filter_map(|entry| entry.key.parse::<i64>().ok().map(|id| (id, entry.name)))
        .collect())
}
