use crate::error::{ApiError, Result};
use async_trait::async_trait;
use rust_bert::pipelines::sentence_embeddings::{
    SentenceEmbeddingsBuilder, SentenceEmbeddingsModelType,
};
use tokio::sync::{mpsc, oneshot, OnceCell};
use tracing::info;

/// Output dimensionality of all-MiniLM-L6-v2
pub const EMBEDDING_SIZE: usize = 384;

const JOB_QUEUE_DEPTH: usize = 32;

/// Turns text into fixed-length unit-norm vectors, one per input, preserving
/// input order. The suggestion engine depends on this trait so tests can
/// substitute deterministic embedders.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

struct EncodeJob {
    texts: Vec<String>,
    respond: oneshot::Sender<Result<Vec<Vec<f32>>>>,
}

/// Handle to a sentence-embeddings model running on its own worker thread.
///
/// The model (all-MiniLM-L6-v2, mean pooling + normalization) is loaded once
/// when the worker starts; tch modules are not `Sync`, so every encode request
/// is serialized through a channel to that single thread. Outputs are
/// re-normalized to unit length so cosine scores stay within [-1, 1] whatever
/// the bundled model config says.
pub struct SentenceEmbedder {
    jobs: mpsc::Sender<EncodeJob>,
}

impl SentenceEmbedder {
    /// Spawn the worker thread and block until the model has loaded.
    ///
    /// Loading downloads weights on first run and takes seconds even warm;
    /// a load failure is reported as `ModelUnavailable`.
    pub async fn spawn() -> Result<Self> {
        let (jobs, mut job_rx) = mpsc::channel::<EncodeJob>(JOB_QUEUE_DEPTH);
        let (ready_tx, ready_rx) = oneshot::channel::<Result<()>>();

        std::thread::Builder::new()
            .name("sentence-embedder".to_string())
            .spawn(move || {
                info!("Loading sentence embedding model...");
                let model = match SentenceEmbeddingsBuilder::remote(
                    SentenceEmbeddingsModelType::AllMiniLmL6V2,
                )
                .with_device(tch::Device::cuda_if_available())
                .create_model()
                {
                    Ok(model) => {
                        info!("Sentence embedding model loaded");
                        let _ = ready_tx.send(Ok(()));
                        model
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(ApiError::ModelUnavailable(e.to_string())));
                        return;
                    }
                };

                while let Some(job) = job_rx.blocking_recv() {
                    let result = model
                        .encode(&job.texts)
                        .map_err(|e| ApiError::ModelInferenceError(e.to_string()))
                        .and_then(|embeddings| {
                            if embeddings.iter().any(|e| e.len() != EMBEDDING_SIZE) {
                                return Err(ApiError::ModelInferenceError(format!(
                                    "model produced embeddings of unexpected dimensionality (expected {})",
                                    EMBEDDING_SIZE
                                )));
                            }
                            Ok(embeddings.into_iter().map(l2_normalize).collect())
                        });
                    let _ = job.respond.send(result);
                }
            })?;

        ready_rx.await.map_err(|_| {
            ApiError::ModelUnavailable("embedding worker exited during load".to_string())
        })??;

        Ok(Self { jobs })
    }

    pub async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let (respond, response) = oneshot::channel();
        self.jobs
            .send(EncodeJob {
                texts: texts.to_vec(),
                respond,
            })
            .await
            .map_err(|_| ApiError::ModelUnavailable("embedding worker terminated".to_string()))?;

        response.await.map_err(|_| {
            ApiError::ModelUnavailable("embedding worker dropped the request".to_string())
        })?
    }
}

#[async_trait]
impl TextEmbedder for SentenceEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.encode(texts).await
    }
}

/// Lazily-initialized, process-wide embedder.
///
/// The first embed call pays the model load; concurrent first callers share a
/// single load through the `OnceCell` instead of racing to initialize twice.
/// A failed load surfaces as `ModelUnavailable` and is retried on the next
/// call.
pub struct LazySentenceEmbedder {
    cell: OnceCell<SentenceEmbedder>,
}

impl LazySentenceEmbedder {
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Result<&SentenceEmbedder> {
        self.cell.get_or_try_init(SentenceEmbedder::spawn).await
    }
}

impl Default for LazySentenceEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextEmbedder for LazySentenceEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.get().await?.encode(texts).await
    }
}

fn l2_normalize(vector: Vec<f32>) -> Vec<f32> {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude == 0.0 {
        return vector;
    }
    vector.iter().map(|x| x / magnitude).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_unit_length() {
        let normalized = l2_normalize(vec![3.0, 4.0]);
        let magnitude: f32 = normalized.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-6);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_stays_zero() {
        assert_eq!(l2_normalize(vec![0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }
}
