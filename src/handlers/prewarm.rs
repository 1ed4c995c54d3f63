//! Prewarm endpoint to absorb cold starts
//!
//! The embedding model load and the first pool build together take long
//! enough that the first real suggestion request would eat both. Hitting this
//! endpoint after a deploy moves that cost off the request path.

use crate::services::SuggestionService;
use actix_web::{get, web, HttpResponse};
use log::info;
use serde_json::json;

#[get("/prewarm")]
pub async fn prewarm(suggestion_service: web::Data<SuggestionService>) -> HttpResponse {
    info!("Prewarming suggestion services...");

    match suggestion_service.prewarm().await {
        Ok(pool_size) => {
            info!("Prewarm complete, pool holds {} candidates", pool_size);
            HttpResponse::Ok().json(json!({
                "status": "ok",
                "pool_size": pool_size,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        }
        Err(e) => {
            // Report rather than fail; the service may still come up for
            // later requests.
            info!("Prewarm partially completed with warning: {}", e);
            HttpResponse::Ok().json(json!({
                "status": "partial",
                "warning": e.to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        }
    }
}
