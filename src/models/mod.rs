use serde::{Deserialize, Serialize};

pub use movie::MovieCandidate;

mod movie;

/// Request body for prompt-based movie suggestions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRequest {
    /// Free-text description of what kind of movie the user wants
    pub prompt: String,
}

/// Response envelope for movie suggestions
#[derive(Debug, Clone, Serialize)]
pub struct SuggestionResponse {
    pub success: bool,
    pub data: Vec<MovieCandidate>,
}
