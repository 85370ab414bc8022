use anyhow::{Context, Result};
use std::env;

const DEFAULT_PLATFORM: &str = "na1";

/// Credential and routing for the Riot API, resolved once at startup and
/// passed explicitly to the client instead of living in process-global state.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub platform: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("RIOT_API_KEY")
            .context("RIOT_API_KEY is not set (put it in the environment or a .env file)")?;

        let platform = env::var("RIOT_PLATFORM")
            .ok()
            .map(|value| value.trim().to_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string());

        Ok(Self { api_key, platform })
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.api.riotgames.com", self.platform)
    }
}
