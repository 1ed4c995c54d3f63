use anyhow::{anyhow, Result};
use std::env;
use std::time::Duration;

const DEFAULT_TMDB_API_BASE: &str = "https://api.themoviedb.org/3";
const DEFAULT_TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

const DEFAULT_RESULT_CAP: usize = 5;
const DEFAULT_MIN_SCORE: f32 = 0.25;
const DEFAULT_BATCH_SIZE: usize = 50;
const DEFAULT_MIN_OVERVIEW_CHARS: usize = 20;
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub tmdb: TmdbConfig,
    pub suggestions: SuggestionSettings,
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    pub api_base: String,
    pub access_token: String,
    pub image_base: String,
}

/// Tuning knobs for the suggestion engine.
///
/// These shape throughput and result quality, not correctness: the threshold
/// only decides which results count as "qualified" before backfill tops the
/// list up, and the batch size trades peak memory against embedding calls.
#[derive(Debug, Clone)]
pub struct SuggestionSettings {
    /// Maximum number of movies returned per request
    pub result_cap: usize,
    /// Cosine similarity a candidate must exceed to qualify outright
    pub min_score: f32,
    /// Overviews embedded per model call
    pub batch_size: usize,
    /// Overviews shorter than this are not worth embedding
    pub min_overview_chars: usize,
    /// Soft deadline; scoring stops here and ranks whatever is done
    pub request_timeout: Duration,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            result_cap: DEFAULT_RESULT_CAP,
            min_score: DEFAULT_MIN_SCORE,
            batch_size: DEFAULT_BATCH_SIZE,
            min_overview_chars: DEFAULT_MIN_OVERVIEW_CHARS,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let access_token =
            env::var("TMDB_ACCESS_TOKEN").map_err(|_| anyhow!("TMDB_ACCESS_TOKEN must be set"))?;
        if access_token.trim().is_empty() {
            return Err(anyhow!("TMDB_ACCESS_TOKEN is empty"));
        }

        Ok(Config {
            host,
            port,
            tmdb: TmdbConfig {
                api_base: env::var("TMDB_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_TMDB_API_BASE.to_string()),
                access_token,
                image_base: env::var("TMDB_IMAGE_BASE")
                    .unwrap_or_else(|_| DEFAULT_TMDB_IMAGE_BASE.to_string()),
            },
            suggestions: SuggestionSettings {
                result_cap: env_or("APP_SUGGESTION_RESULT_CAP", DEFAULT_RESULT_CAP),
                min_score: env_or("APP_SUGGESTION_MIN_SCORE", DEFAULT_MIN_SCORE),
                batch_size: env_or("APP_SUGGESTION_BATCH_SIZE", DEFAULT_BATCH_SIZE),
                min_overview_chars: env_or(
                    "APP_SUGGESTION_MIN_OVERVIEW_CHARS",
                    DEFAULT_MIN_OVERVIEW_CHARS,
                ),
                request_timeout: Duration::from_secs(env_or(
                    "APP_SUGGESTION_TIMEOUT_SECONDS",
                    DEFAULT_TIMEOUT_SECONDS,
                )),
            },
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
