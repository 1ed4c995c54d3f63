//! Deploy-time warm-up: builds the candidate pool, downloads/loads the
//! embedding model and embeds every eligible overview once, so the first real
//! request does not pay for any of it. Also doubles as a smoke test for the
//! TMDB token.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use reelprompt_api::config::Config;
use reelprompt_api::ml::{LazySentenceEmbedder, TextEmbedder};
use reelprompt_api::services::{MovieCatalog, MoviePool, TmdbCatalog};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warm_pool=info,reelprompt_api=info".into()),
        )
        .init();

    let config = Config::load()?;

    println!("{}", style("Warming the suggestion pipeline").bold());

    let catalog: Arc<dyn MovieCatalog> = Arc::new(TmdbCatalog::new(&config.tmdb)?);
    let pool = MoviePool::new(Arc::clone(&catalog));
    let movies = pool.get_or_build().await?;
    println!("Pool built: {} candidates", style(movies.len()).green());

    let embedder = LazySentenceEmbedder::new();

    let overviews: Vec<String> = movies
        .iter()
        .filter(|movie| movie.overview.trim().len() >= config.suggestions.min_overview_chars)
        .map(|movie| movie.overview.clone())
        .collect();

    let bar = ProgressBar::new(overviews.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} overviews ({eta})")
            .progress_chars("#>-"),
    );

    for batch in overviews.chunks(config.suggestions.batch_size) {
        embedder.embed(batch).await?;
        bar.inc(batch.len() as u64);
    }
    bar.finish_with_message("embeddings warmed");

    println!("{}", style("Model loaded and pipeline primed").green());
    Ok(())
}
