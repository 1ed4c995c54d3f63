use crate::{
    config::Config,
    error::Result,
    ml::{LazySentenceEmbedder, TextEmbedder},
    routes::api_routes,
    services::{MovieCatalog, MoviePool, SuggestionService, TmdbCatalog},
};
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::info;
use std::net::TcpListener;
use std::sync::Arc;

pub struct Application {
    port: u16,
    host: String,
    config: Config,
}

impl Application {
    /// Create a new application instance
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.port,
            host: config.host.clone(),
            config: config.clone(),
        }
    }

    /// Build and run the server
    pub async fn run(&self) -> Result<()> {
        // Always bind to 0.0.0.0 for Docker/Render compatibility
        let bind_address = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&bind_address)?;
        info!("Starting server at http://{}:{}", self.host, self.port);

        self.run_with_listener(listener).await
    }

    /// Run the server with a specific TCP listener
    /// This is useful for testing where we want to use a random port
    pub async fn run_with_listener(&self, listener: TcpListener) -> Result<()> {
        // The catalog is shared by the pool builder (facet fan-out) and the
        // suggestion engine (direct popular fallback). The embedder stays
        // lazy: the model loads on the first suggestion or prewarm call.
        let catalog: Arc<dyn MovieCatalog> = Arc::new(TmdbCatalog::new(&self.config.tmdb)?);
        let pool = Arc::new(MoviePool::new(Arc::clone(&catalog)));
        let embedder: Arc<dyn TextEmbedder> = Arc::new(LazySentenceEmbedder::new());

        let suggestion_service = web::Data::new(SuggestionService::new(
            embedder,
            pool,
            catalog,
            self.config.suggestions.clone(),
        ));

        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header();

            App::new()
                .wrap(cors)
                .wrap(Logger::default())
                .app_data(suggestion_service.clone())
                .service(api_routes())
        })
        .listen(listener)?
        .run()
        .await?;

        Ok(())
    }
}
