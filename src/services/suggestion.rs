use crate::config::SuggestionSettings;
use crate::error::{ApiError, Result};
use crate::ml::{cosine_similarity, TextEmbedder};
use crate::models::MovieCandidate;
use crate::services::catalog::MovieCatalog;
use crate::services::movie_pool::MoviePool;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Prompt-based movie suggestion engine.
///
/// Given free-text intent, embeds the prompt and the candidate pool's
/// overviews, ranks candidates by cosine similarity and returns the top
/// matches. Recoverable failures (a facet query, a scoring batch) degrade the
/// result instead of failing the request; only a missing model or a fully
/// unreachable catalog surface as errors.
pub struct SuggestionService {
    embedder: Arc<dyn TextEmbedder>,
    pool: Arc<MoviePool>,
    catalog: Arc<dyn MovieCatalog>,
    settings: SuggestionSettings,
}

impl SuggestionService {
    pub fn new(
        embedder: Arc<dyn TextEmbedder>,
        pool: Arc<MoviePool>,
        catalog: Arc<dyn MovieCatalog>,
        settings: SuggestionSettings,
    ) -> Self {
        Self {
            embedder,
            pool,
            catalog,
            settings,
        }
    }

    /// Rank pool candidates against the prompt and return at most
    /// `result_cap` movies, best match first. Scores are internal and never
    /// exposed to callers.
    pub async fn get_suggestions(&self, prompt: &str) -> Result<Vec<MovieCandidate>> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ApiError::InvalidInput("Prompt cannot be empty".to_string()));
        }

        let started = Instant::now();
        info!(prompt = %prompt, "Processing suggestion request");

        let pool = match self.pool.get_or_build().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Movie pool unavailable, serving popular movies instead");
                return self.popular_fallback().await;
            }
        };

        // Near-empty overviews produce degenerate embeddings; skip them.
        let eligible: Vec<&MovieCandidate> = pool
            .iter()
            .filter(|movie| movie.overview.trim().len() >= self.settings.min_overview_chars)
            .collect();

        if eligible.is_empty() {
            warn!("No candidates with usable overviews, returning pool head");
            return Ok(self.pool_head(&pool));
        }
        debug!(
            eligible = eligible.len(),
            pool = pool.len(),
            "Scoring candidates with usable overviews"
        );

        let prompt_embedding = self
            .embedder
            .embed(&[prompt.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                ApiError::ModelInferenceError("no embedding returned for prompt".to_string())
            })?;

        // Overviews are embedded in fixed-size sequential batches to bound
        // peak memory. A failed batch drops out of the ranking; it does not
        // abort the request.
        let mut scored: Vec<(&MovieCandidate, f32)> = Vec::with_capacity(eligible.len());
        for (batch_index, batch) in eligible.chunks(self.settings.batch_size).enumerate() {
            if started.elapsed() >= self.settings.request_timeout {
                warn!(
                    scored = scored.len(),
                    "Request deadline reached mid-scoring, ranking what is done so far"
                );
                break;
            }

            let overviews: Vec<String> = batch.iter().map(|m| m.overview.clone()).collect();
            let embeddings = match self.embedder.embed(&overviews).await {
                Ok(embeddings) => embeddings,
                Err(e) => {
                    warn!(batch = batch_index, error = %e, "Batch embedding failed, skipping its candidates");
                    continue;
                }
            };

            for (movie, embedding) in batch.iter().zip(embeddings.iter()) {
                match cosine_similarity(&prompt_embedding, embedding) {
                    Ok(score) => scored.push((*movie, score)),
                    Err(e) => {
                        warn!(tmdb_id = movie.tmdb_id, error = %e, "Skipping candidate with malformed embedding");
                    }
                }
            }
        }

        if scored.is_empty() {
            warn!("No candidate could be scored, returning pool head");
            return Ok(self.pool_head(&pool));
        }

        // Stable sort: equal scores keep pool order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        if tracing::enabled!(tracing::Level::DEBUG) {
            for (rank, (movie, score)) in scored.iter().take(5).enumerate() {
                debug!("  {}. {} ({:.4})", rank + 1, movie.title, score);
            }
        }

        let suggestions = self.select(&scored);
        info!(
            count = suggestions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Returning suggestions"
        );
        Ok(suggestions)
    }

    /// Eagerly initialize the embedding model and the candidate pool.
    /// Returns the pool size.
    pub async fn prewarm(&self) -> Result<usize> {
        self.embedder
            .embed(&["warming up the suggestion pipeline".to_string()])
            .await?;
        let pool = self.pool.get_or_build().await?;
        Ok(pool.len())
    }

    /// Candidates strictly above the score threshold qualify outright, capped
    /// at the result cap; when too few qualify, the next-highest scorers
    /// backfill the list regardless of threshold. A request that scored
    /// anything at all therefore never returns empty.
    fn select(&self, scored: &[(&MovieCandidate, f32)]) -> Vec<MovieCandidate> {
        let cap = self.settings.result_cap;

        let mut selected: Vec<MovieCandidate> = scored
            .iter()
            .filter(|(_, score)| *score > self.settings.min_score)
            .take(cap)
            .map(|(movie, _)| (*movie).clone())
            .collect();

        if selected.len() < cap {
            let backfill = scored
                .iter()
                .filter(|(_, score)| *score <= self.settings.min_score)
                .take(cap - selected.len())
                .map(|(movie, _)| (*movie).clone());
            selected.extend(backfill);
        }

        selected
    }

    fn pool_head(&self, pool: &[MovieCandidate]) -> Vec<MovieCandidate> {
        pool.iter()
            .take(self.settings.result_cap)
            .cloned()
            .collect()
    }

    /// Last resort when the pool cannot be built at all: one plain popular
    /// query, bypassing the pool. If even that fails the request fails.
    async fn popular_fallback(&self) -> Result<Vec<MovieCandidate>> {
        let movies = self.catalog.popular(1).await.map_err(|e| {
            ApiError::PoolUnavailable(format!("popular fallback failed: {}", e))
        })?;
        if movies.is_empty() {
            return Err(ApiError::PoolUnavailable(
                "catalog returned no movies".to_string(),
            ));
        }
        Ok(movies
            .into_iter()
            .take(self.settings.result_cap)
            .collect())
    }
}
