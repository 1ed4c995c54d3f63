use actix_web::{web, Scope};

use crate::handlers::prewarm::prewarm;
use crate::handlers::{health_check, suggestions_config};

/// Configure all routes for the API
pub fn api_routes() -> Scope {
    web::scope("/api")
        .service(health_check)
        .service(prewarm)
        .configure(suggestions_config)
}
