use crate::error::Result;
use crate::models::MovieCandidate;
use async_trait::async_trait;

/// Parameters for a catalog discovery query. Unset fields are omitted from
/// the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverFilters {
    pub genre: Option<u16>,
    pub year: Option<i32>,
    pub min_vote_average: Option<f32>,
    pub min_vote_count: Option<u32>,
    pub sort_by: Option<String>,
}

/// The external movie catalog the pool builder draws from.
///
/// Each call is one paginated query and may fail independently (network,
/// timeout, rate limit); the pool builder treats such failures as non-fatal.
/// Implementations must return records already normalized into
/// `MovieCandidate`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Movies currently popular with catalog users
    async fn popular(&self, page: u32) -> Result<Vec<MovieCandidate>>;

    /// Recently released movies
    async fn now_playing(&self, page: u32) -> Result<Vec<MovieCandidate>>;

    /// Filtered discovery query across genre/year/rating facets
    async fn discover(&self, filters: &DiscoverFilters, page: u32) -> Result<Vec<MovieCandidate>>;
}
