pub mod catalog;
pub mod movie_pool;
pub mod suggestion;
pub mod tmdb;

// Re-export public types
pub use catalog::{DiscoverFilters, MovieCatalog};
pub use movie_pool::MoviePool;
pub use suggestion::SuggestionService;
pub use tmdb::TmdbCatalog;
