use anyhow::{Context, Result, bail};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread::sleep;
use std::time::{Duration, Instant};

use crate::config::ApiConfig;
use crate::harvest::MatchSource;
use crate::match_data::MatchRecord;

const DEFAULT_MAX_REQS_PER_2MIN: usize = 80;
const DEFAULT_MAX_REQS_PER_SEC: usize = 20;
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Blocking client for the Riot match API. Rate limiting and 429 retries are
/// handled internally; callers only see found / not-found / error.
pub struct RiotClient {
    client: Client,
    headers: HeaderMap,
    base_url: String,
    limiter: Mutex<RateLimiter>,
}

impl RiotClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Riot-Token",
            HeaderValue::from_str(&config.api_key)
                .context("RIOT_API_KEY contains characters not valid in a header")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            headers,
            base_url: config.base_url(),
            limiter: Mutex::new(RateLimiter::new(
                DEFAULT_MAX_REQS_PER_2MIN,
                DEFAULT_MAX_REQS_PER_SEC,
            )),
        })
    }

    /// Looks up a match by numeric id. A 404 from the service means the id
    /// was never assigned and maps to `Ok(None)`.
    pub fn fetch_match_by_id(&self, match_id: i64) -> Result<Option<MatchRecord>> {
        let url = format!("{}/lol/match/v4/matches/{}", self.base_url, match_id);

        let Some(response) = self.request_with_retry(&url)? else {
            return Ok(None);
        };

        let record = response
            .json()
            .with_context(|| format!("malformed match payload for id {match_id}"))?;
        Ok(Some(record))
    }

    fn request_with_retry(&self, url: &str) -> Result<Option<reqwest::blocking::Response>> {
        const MAX_ATTEMPTS: usize = 2;
        let mut attempt = 0;

        loop {
            attempt += 1;

            self.wait_rate_limit();

            let response = self
                .client
                .get(url)
                .headers(self.headers.clone())
                .send()
                .with_context(|| format!("request to {url} failed"))?;

            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if attempt >= MAX_ATTEMPTS {
                    bail!("too many requests for URL {url}");
                }

                if let Some(retry_after) = parse_retry_after(&response) {
                    sleep(retry_after);
                } else {
                    sleep(Duration::from_secs(10));
                }

                continue;
            }

            if !response.status().is_success() {
                bail!(
                    "request to {} failed with status {}",
                    url,
                    response.status()
                );
            }

            return Ok(Some(response));
        }
    }

    fn wait_rate_limit(&self) {
        let mut limiter = self
            .limiter
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        limiter.wait();
    }
}

impl MatchSource for RiotClient {
    fn fetch_match(&self, match_id: i64) -> Result<Option<MatchRecord>> {
        self.fetch_match_by_id(match_id)
    }
}

/// Sliding-window limiter over the two windows Riot enforces for development
/// keys: per-second and per-2-minutes.
struct RateLimiter {
    max_reqs_per_2min: usize,
    max_reqs_per_sec: usize,
    timestamps_2min: VecDeque<Instant>,
    timestamps_1s: VecDeque<Instant>,
}

impl RateLimiter {
    fn new(max_reqs_per_2min: usize, max_reqs_per_sec: usize) -> Self {
        Self {
            max_reqs_per_2min,
            max_reqs_per_sec,
            timestamps_2min: VecDeque::new(),
            timestamps_1s: VecDeque::new(),
        }
    }

    fn wait(&mut self) {
        loop {
            let now = Instant::now();
            self.prune(now);

            let mut sleep_duration: Option<Duration> = None;

            if self.timestamps_1s.len() >= self.max_reqs_per_sec {
                if let Some(oldest) = self.timestamps_1s.front() {
                    let elapsed = now.duration_since(*oldest);
                    if elapsed < Duration::from_secs(1) {
                        sleep_duration = Some(Duration::from_secs(1) - elapsed);
                    }
                }
            }

            if sleep_duration.is_none() && self.timestamps_2min.len() >= self.max_reqs_per_2min {
                if let Some(oldest) = self.timestamps_2min.front() {
                    let elapsed = now.duration_since(*oldest);
                    if elapsed < Duration::from_secs(120) {
                        sleep_duration = Some(Duration::from_secs(120) - elapsed);
                    }
                }
            }

            if let Some(duration) = sleep_duration {
                sleep(duration);
                continue;
            }

            let timestamp = Instant::now();
            self.timestamps_1s.push_back(timestamp);
            self.timestamps_2min.push_back(timestamp);
            break;
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.timestamps_1s.front() {
            if now.duration_since(*front) > Duration::from_secs(1) {
                self.timestamps_1s.pop_front();
            } else {
                break;
            }
        }

        while let Some(front) = self.timestamps_2min.front() {
            if now.duration_since(*front) > Duration::from_secs(120) {
                self.timestamps_2min.pop_front();
            } else {
                break;
            }
        }
    }
}

fn parse_retry_after(response: &reqwest::blocking::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
