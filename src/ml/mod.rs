pub mod sentence_embedder;
pub mod similarity;

pub use sentence_embedder::{LazySentenceEmbedder, SentenceEmbedder, TextEmbedder, EMBEDDING_SIZE};
pub use similarity::cosine_similarity;
