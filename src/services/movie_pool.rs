use crate::error::{ApiError, Result};
use crate::models::MovieCandidate;
use crate::services::catalog::{DiscoverFilters, MovieCatalog};
use futures::future::join_all;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// One paginated catalog query contributing candidates to the pool.
#[derive(Debug, Clone)]
pub enum Facet {
    Popular { page: u32 },
    NowPlaying { page: u32 },
    Discover { filters: DiscoverFilters, page: u32 },
}

/// TMDB genre ids spread across the pool: action, adventure, animation,
/// comedy, crime, drama, horror, romance, science fiction, thriller.
const FACET_GENRES: [u16; 10] = [28, 12, 16, 35, 80, 18, 27, 10749, 878, 53];

const FACET_YEARS: [i32; 8] = [2024, 2022, 2020, 2017, 2014, 2010, 2004, 1999];

const POPULAR_PAGES: u32 = 3;
const NOW_PLAYING_PAGES: u32 = 2;
const TOP_RATED_PAGES: u32 = 2;

/// The fixed fan-out issued by a full pool build. The exact facet mix is a
/// tuning knob for pool diversity, not a correctness parameter.
static DEFAULT_FACETS: Lazy<Vec<Facet>> = Lazy::new(|| {
    let mut facets = Vec::new();

    for page in 1..=POPULAR_PAGES {
        facets.push(Facet::Popular { page });
    }
    for page in 1..=NOW_PLAYING_PAGES {
        facets.push(Facet::NowPlaying { page });
    }
    for genre in FACET_GENRES {
        facets.push(Facet::Discover {
            filters: DiscoverFilters {
                genre: Some(genre),
                ..DiscoverFilters::default()
            },
            page: 1,
        });
    }
    for page in 1..=TOP_RATED_PAGES {
        facets.push(Facet::Discover {
            filters: DiscoverFilters {
                min_vote_average: Some(7.5),
                min_vote_count: Some(1000),
                sort_by: Some("vote_average.desc".to_string()),
                ..DiscoverFilters::default()
            },
            page,
        });
    }
    for year in FACET_YEARS {
        facets.push(Facet::Discover {
            filters: DiscoverFilters {
                year: Some(year),
                ..DiscoverFilters::default()
            },
            page: 1,
        });
    }

    facets
});

/// Process-wide candidate pool, built lazily from the catalog.
///
/// The pool is built at most once per process lifetime and never invalidated;
/// refreshing stale catalog data is a deliberate non-feature (a rebuild means
/// a restart). At most one build is ever in flight: a caller arriving while a
/// build is running waits on the build gate and then reuses the finished
/// pool instead of fanning out a second set of catalog queries.
pub struct MoviePool {
    catalog: Arc<dyn MovieCatalog>,
    facets: Vec<Facet>,
    pool: RwLock<Option<Arc<Vec<MovieCandidate>>>>,
    build_gate: Mutex<()>,
}

impl MoviePool {
    pub fn new(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self::with_facets(catalog, DEFAULT_FACETS.clone())
    }

    pub fn with_facets(catalog: Arc<dyn MovieCatalog>, facets: Vec<Facet>) -> Self {
        Self {
            catalog,
            facets,
            pool: RwLock::new(None),
            build_gate: Mutex::new(()),
        }
    }

    /// Returns the cached pool, building it first if this is the first call.
    pub async fn get_or_build(&self) -> Result<Arc<Vec<MovieCandidate>>> {
        if let Some(pool) = self.pool.read().await.as_ref() {
            return Ok(Arc::clone(pool));
        }

        let _build = self.build_gate.lock().await;

        // A build that finished while this task waited on the gate
        if let Some(pool) = self.pool.read().await.as_ref() {
            return Ok(Arc::clone(pool));
        }

        let movies = self.build().await?;
        let pool = Arc::new(movies);
        *self.pool.write().await = Some(Arc::clone(&pool));
        Ok(pool)
    }

    async fn build(&self) -> Result<Vec<MovieCandidate>> {
        info!(facets = self.facets.len(), "Building movie candidate pool");

        let queries = self.facets.iter().map(|facet| self.run_facet(facet));
        let results = join_all(queries).await;

        let mut seen: HashSet<u64> = HashSet::new();
        let mut merged: Vec<MovieCandidate> = Vec::new();
        let mut failed_facets = 0usize;

        for (facet, result) in self.facets.iter().zip(results) {
            match result {
                Ok(batch) => {
                    for movie in batch {
                        if seen.insert(movie.tmdb_id) {
                            merged.push(movie);
                        }
                    }
                }
                Err(e) => {
                    failed_facets += 1;
                    warn!(facet = ?facet, error = %e, "Facet query failed, contributing no candidates");
                }
            }
        }

        if merged.is_empty() {
            warn!("Every facet query came back empty, falling back to a single popular page");
            let fallback = self.catalog.popular(1).await.map_err(|e| {
                ApiError::PoolUnavailable(format!("catalog unreachable: {}", e))
            })?;
            if fallback.is_empty() {
                return Err(ApiError::PoolUnavailable(
                    "catalog returned no movies".to_string(),
                ));
            }
            info!(pool_size = fallback.len(), "Built degraded pool from popular fallback");
            return Ok(fallback);
        }

        info!(
            pool_size = merged.len(),
            failed_facets, "Movie candidate pool built"
        );
        Ok(merged)
    }

    async fn run_facet(&self, facet: &Facet) -> Result<Vec<MovieCandidate>> {
        match facet {
            Facet::Popular { page } => self.catalog.popular(*page).await,
            Facet::NowPlaying { page } => self.catalog.now_playing(*page).await,
            Facet::Discover { filters, page } => self.catalog.discover(filters, *page).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::MockMovieCatalog;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn movie(tmdb_id: u64, title: &str) -> MovieCandidate {
        MovieCandidate {
            tmdb_id,
            title: title.to_string(),
            overview: format!("Overview for {}", title),
            release_date: None,
            genre_ids: vec![],
            popularity: 1.0,
            vote_average: 7.0,
            vote_count: 100,
            poster_url: None,
            backdrop_url: None,
            original_language: "en".to_string(),
            adult: false,
        }
    }

    fn ids(movies: &[MovieCandidate]) -> Vec<u64> {
        movies.iter().map(|m| m.tmdb_id).collect()
    }

    #[tokio::test]
    async fn deduplicates_overlapping_facets_first_seen_wins() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_popular()
            .returning(|_| Ok(vec![movie(1, "First"), movie(2, "Second")]));
        catalog
            .expect_now_playing()
            .returning(|_| Ok(vec![movie(2, "Second Again"), movie(3, "Third")]));

        let pool = MoviePool::with_facets(
            Arc::new(catalog),
            vec![
                Facet::Popular { page: 1 },
                Facet::NowPlaying { page: 1 },
            ],
        );

        let movies = pool.get_or_build().await.unwrap();
        assert_eq!(ids(&movies), vec![1, 2, 3]);
        // First-seen record wins over the duplicate
        assert_eq!(movies[1].title, "Second");
    }

    #[tokio::test]
    async fn tolerates_individual_facet_failures() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_popular()
            .times(1)
            .returning(|_| Err(ApiError::ExternalServiceError("timeout".to_string())));
        catalog
            .expect_now_playing()
            .returning(|_| Ok(vec![movie(5, "Survivor")]));

        let pool = MoviePool::with_facets(
            Arc::new(catalog),
            vec![
                Facet::Popular { page: 1 },
                Facet::NowPlaying { page: 1 },
            ],
        );

        let movies = pool.get_or_build().await.unwrap();
        assert_eq!(ids(&movies), vec![5]);
    }

    #[tokio::test]
    async fn falls_back_to_single_popular_page_when_all_facets_fail() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_now_playing()
            .returning(|_| Err(ApiError::ExternalServiceError("down".to_string())));
        catalog
            .expect_discover()
            .returning(|_, _| Err(ApiError::ExternalServiceError("down".to_string())));
        // Only the degraded fallback should hit popular
        catalog
            .expect_popular()
            .times(1)
            .returning(|_| Ok(vec![movie(9, "Degraded")]));

        let pool = MoviePool::with_facets(
            Arc::new(catalog),
            vec![
                Facet::NowPlaying { page: 1 },
                Facet::Discover {
                    filters: DiscoverFilters::default(),
                    page: 1,
                },
            ],
        );

        let movies = pool.get_or_build().await.unwrap();
        assert_eq!(ids(&movies), vec![9]);
    }

    #[tokio::test]
    async fn pool_unavailable_when_even_the_fallback_fails() {
        let mut catalog = MockMovieCatalog::new();
        catalog
            .expect_now_playing()
            .returning(|_| Err(ApiError::ExternalServiceError("down".to_string())));
        catalog
            .expect_popular()
            .returning(|_| Err(ApiError::ExternalServiceError("down".to_string())));

        let pool = MoviePool::with_facets(
            Arc::new(catalog),
            vec![Facet::NowPlaying { page: 1 }],
        );

        let result = pool.get_or_build().await;
        assert!(matches!(result, Err(ApiError::PoolUnavailable(_))));
    }

    /// Catalog that counts calls and is slow enough for callers to overlap.
    struct CountingCatalog {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MovieCatalog for CountingCatalog {
        async fn popular(&self, _page: u32) -> Result<Vec<MovieCandidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(25)).await;
            Ok(vec![movie(1, "Only")])
        }

        async fn now_playing(&self, _page: u32) -> Result<Vec<MovieCandidate>> {
            unreachable!("not part of the test facet set")
        }

        async fn discover(
            &self,
            _filters: &DiscoverFilters,
            _page: u32,
        ) -> Result<Vec<MovieCandidate>> {
            unreachable!("not part of the test facet set")
        }
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_build() {
        let calls = Arc::new(AtomicUsize::new(0));
        let catalog = CountingCatalog {
            calls: Arc::clone(&calls),
        };
        let pool = MoviePool::with_facets(Arc::new(catalog), vec![Facet::Popular { page: 1 }]);

        let (a, b) = tokio::join!(pool.get_or_build(), pool.get_or_build());
        assert_eq!(ids(&a.unwrap()), vec![1]);
        assert_eq!(ids(&b.unwrap()), vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Later callers reuse the cached pool outright
        let c = pool.get_or_build().await.unwrap();
        assert_eq!(ids(&c), vec![1]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
