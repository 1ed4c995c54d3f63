use crate::config::TmdbConfig;
use crate::error::{ApiError, Result};
use crate::models::MovieCandidate;
use crate::services::catalog::{DiscoverFilters, MovieCatalog};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECONDS: u64 = 15;
const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w1280";

/// TMDB implementation of the `MovieCatalog` collaborator.
#[derive(Debug, Clone)]
pub struct TmdbCatalog {
    client: Client,
    api_base: String,
    image_base: String,
}

/// One page of a TMDB list/discover response. Fields other than `results`
/// (total_pages etc.) are not needed here.
#[derive(Debug, Deserialize)]
struct TmdbPage {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

/// Raw catalog record; loosely typed on purpose so one malformed field does
/// not sink a whole page. Normalization into `MovieCandidate` happens in
/// `into_candidate`.
#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: Option<u64>,
    title: Option<String>,
    #[serde(default)]
    overview: String,
    release_date: Option<String>,
    #[serde(default)]
    genre_ids: Vec<u16>,
    #[serde(default)]
    popularity: f32,
    #[serde(default)]
    vote_average: f32,
    #[serde(default)]
    vote_count: u32,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    #[serde(default)]
    original_language: String,
    #[serde(default)]
    adult: bool,
}

impl TmdbCatalog {
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .map_err(|e| ApiError::InternalError(format!("Invalid TMDB access token: {}", e)))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=utf-8"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InternalError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            image_base: config.image_base.trim_end_matches('/').to_string(),
        })
    }

    fn image_url(&self, path: Option<&str>, size: &str) -> Option<String> {
        let path = path?;
        if path.is_empty() {
            return None;
        }
        Some(format!("{}/{}{}", self.image_base, size, path))
    }

    /// Drops records without an id or title so downstream code never sees a
    /// half-formed candidate.
    fn into_candidate(&self, movie: TmdbMovie) -> Option<MovieCandidate> {
        let tmdb_id = movie.id?;
        let title = movie.title?.trim().to_string();
        if title.is_empty() {
            return None;
        }

        // TMDB sends "" rather than omitting unknown release dates
        let release_date = movie
            .release_date
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());

        Some(MovieCandidate {
            tmdb_id,
            title,
            overview: movie.overview,
            release_date,
            genre_ids: movie.genre_ids,
            popularity: movie.popularity,
            vote_average: movie.vote_average,
            vote_count: movie.vote_count,
            poster_url: self.image_url(movie.poster_path.as_deref(), POSTER_SIZE),
            backdrop_url: self.image_url(movie.backdrop_path.as_deref(), BACKDROP_SIZE),
            original_language: movie.original_language,
            adult: movie.adult,
        })
    }

    async fn fetch_page(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<MovieCandidate>> {
        let url = format!("{}{}", self.api_base, path);
        let response = self.client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::ExternalServiceError(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let page: TmdbPage = response.json().await.map_err(|e| {
            ApiError::SerializationError(format!("Failed to parse TMDB response: {}", e))
        })?;

        let candidates: Vec<MovieCandidate> = page
            .results
            .into_iter()
            .filter_map(|movie| self.into_candidate(movie))
            .collect();

        debug!(path = %path, results = candidates.len(), "TMDB page fetched");
        Ok(candidates)
    }
}

#[async_trait]
impl MovieCatalog for TmdbCatalog {
    async fn popular(&self, page: u32) -> Result<Vec<MovieCandidate>> {
        self.fetch_page(
            "/movie/popular",
            &[
                ("page", page.to_string()),
                ("language", "en-US".to_string()),
            ],
        )
        .await
    }

    async fn now_playing(&self, page: u32) -> Result<Vec<MovieCandidate>> {
        self.fetch_page(
            "/movie/now_playing",
            &[
                ("page", page.to_string()),
                ("language", "en-US".to_string()),
            ],
        )
        .await
    }

    async fn discover(&self, filters: &DiscoverFilters, page: u32) -> Result<Vec<MovieCandidate>> {
        let mut query = vec![
            ("page", page.to_string()),
            ("language", "en-US".to_string()),
            ("include_adult", "false".to_string()),
            (
                "sort_by",
                filters
                    .sort_by
                    .clone()
                    .unwrap_or_else(|| "popularity.desc".to_string()),
            ),
        ];
        if let Some(genre) = filters.genre {
            query.push(("with_genres", genre.to_string()));
        }
        if let Some(year) = filters.year {
            query.push(("primary_release_year", year.to_string()));
        }
        if let Some(min_vote_average) = filters.min_vote_average {
            query.push(("vote_average.gte", min_vote_average.to_string()));
        }
        if let Some(min_vote_count) = filters.min_vote_count {
            query.push(("vote_count.gte", min_vote_count.to_string()));
        }

        self.fetch_page("/discover/movie", &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> TmdbCatalog {
        TmdbCatalog::new(&TmdbConfig {
            api_base: "http://tmdb.local/3".to_string(),
            access_token: "test-token".to_string(),
            image_base: "https://image.tmdb.org/t/p".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn builds_image_urls_per_size() {
        let catalog = test_catalog();
        assert_eq!(
            catalog.image_url(Some("/abc.jpg"), POSTER_SIZE),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg".to_string())
        );
        assert_eq!(
            catalog.image_url(Some("/abc.jpg"), BACKDROP_SIZE),
            Some("https://image.tmdb.org/t/p/w1280/abc.jpg".to_string())
        );
        assert_eq!(catalog.image_url(None, POSTER_SIZE), None);
        assert_eq!(catalog.image_url(Some(""), POSTER_SIZE), None);
    }

    #[test]
    fn normalizes_a_raw_record() {
        let catalog = test_catalog();
        let movie: TmdbMovie = serde_json::from_str(
            r#"{
                "id": 105,
                "title": "Back to the Future",
                "overview": "Eighties teenager Marty McFly is accidentally sent back in time.",
                "release_date": "1985-07-03",
                "genre_ids": [12, 878],
                "popularity": 45.2,
                "vote_average": 8.3,
                "vote_count": 20000,
                "poster_path": "/poster.jpg",
                "backdrop_path": "/backdrop.jpg",
                "original_language": "en",
                "adult": false
            }"#,
        )
        .unwrap();

        let candidate = catalog.into_candidate(movie).unwrap();
        assert_eq!(candidate.tmdb_id, 105);
        assert_eq!(candidate.title, "Back to the Future");
        assert_eq!(
            candidate.release_date,
            NaiveDate::from_ymd_opt(1985, 7, 3)
        );
        assert_eq!(candidate.genre_ids, vec![12, 878]);
        assert_eq!(
            candidate.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster.jpg")
        );
        assert_eq!(
            candidate.backdrop_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w1280/backdrop.jpg")
        );
    }

    #[test]
    fn drops_records_missing_id_or_title() {
        let catalog = test_catalog();

        let no_id: TmdbMovie =
            serde_json::from_str(r#"{"title": "Orphan Record"}"#).unwrap();
        assert!(catalog.into_candidate(no_id).is_none());

        let no_title: TmdbMovie = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert!(catalog.into_candidate(no_title).is_none());

        let blank_title: TmdbMovie =
            serde_json::from_str(r#"{"id": 42, "title": "   "}"#).unwrap();
        assert!(catalog.into_candidate(blank_title).is_none());
    }

    #[test]
    fn empty_release_date_becomes_none() {
        let catalog = test_catalog();
        let movie: TmdbMovie =
            serde_json::from_str(r#"{"id": 7, "title": "Unreleased", "release_date": ""}"#)
                .unwrap();
        let candidate = catalog.into_candidate(movie).unwrap();
        assert_eq!(candidate.release_date, None);
    }

    #[test]
    fn page_parse_tolerates_missing_results() {
        let page: TmdbPage = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(page.results.is_empty());
    }
}
