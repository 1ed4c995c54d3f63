use crate::error::ApiError;
use ndarray::ArrayView1;

/// Cosine similarity between two embedding vectors, in [-1, 1].
///
/// Embeddings produced by the sentence encoder are already unit-norm, but the
/// full formula is computed anyway rather than trusting callers to have
/// normalized. A zero-magnitude input scores 0 against everything; unequal
/// dimensionality is an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, ApiError> {
    if a.len() != b.len() {
        return Err(ApiError::DimensionMismatch {
            expected: a.len(),
            got: b.len(),
        });
    }

    let a = ArrayView1::from(a);
    let b = ArrayView1::from(b);

    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot / (norm_a * norm_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.6, 0.8, 0.0];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let score = cosine_similarity(&a, &b).unwrap();
        assert!(score.abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_negative_one() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let score = cosine_similarity(&a, &b).unwrap();
        assert!((score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn unnormalized_inputs_are_handled() {
        // Same direction, wildly different magnitudes
        let a = vec![2.0, 4.0, 6.0];
        let b = vec![1.0, 2.0, 3.0];
        let score = cosine_similarity(&a, &b).unwrap();
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let result = cosine_similarity(&a, &b);
        assert!(matches!(
            result,
            Err(ApiError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
    }
}
