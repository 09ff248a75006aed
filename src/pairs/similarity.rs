//! Embedding similarity functions.

use crate::error::{Error, Result};

/// Cosine similarity in `[-1, 1]`.
///
/// A zero-norm embedding has no direction; its similarity resolves to `0.0`.
///
/// # Example
///
/// ```
/// use fair_eval::pairs::cosine_similarity;
///
/// let s = cosine_similarity(&[1.0, 0.0], &[0.0, 2.0]).unwrap();
/// assert!(s.abs() < 1e-12);
/// assert!(cosine_similarity(&[1.0], &[1.0, 2.0]).is_err());
/// ```
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}
