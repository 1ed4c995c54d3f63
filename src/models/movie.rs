use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A movie record normalized at the catalog boundary.
///
/// Candidates are constructed only by the catalog client, which drops raw
/// records missing an id or title, so downstream scoring never has to reason
/// about absent fields. The serialized shape matches the public API contract
/// (`tmdbId`, `posterUrl`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieCandidate {
    pub tmdb_id: u64,
    pub title: String,
    /// May be empty; the suggestion engine filters short overviews out before
    /// embedding.
    #[serde(default)]
    pub overview: String,
    pub release_date: Option<NaiveDate>,
    #[serde(rename = "genres", default)]
    pub genre_ids: Vec<u16>,
    #[serde(default)]
    pub popularity: f32,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    #[serde(rename = "language", default)]
    pub original_language: String,
    #[serde(default)]
    pub adult: bool,
}
