use crate::{
    error::ApiError,
    models::{SuggestionRequest, SuggestionResponse},
    services::SuggestionService,
};
use actix_web::{
    web::{self, Json},
    HttpResponse,
};

pub fn suggestions_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/suggestions").route(web::post().to(get_suggestions)));
}

/// Get movie suggestions for a free-text prompt
pub async fn get_suggestions(
    request: Json<SuggestionRequest>,
    suggestion_service: web::Data<SuggestionService>,
) -> Result<HttpResponse, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::InvalidInput("Prompt is required".to_string()));
    }

    let movies = suggestion_service.get_suggestions(&request.prompt).await?;

    Ok(HttpResponse::Ok().json(SuggestionResponse {
        success: true,
        data: movies,
    }))
}
