//! Similarity metrics for semantic pointer comparison.
//!
//! When compiled with the `simd` feature, dot products go through simsimd.

use crate::error::{CleanupError, Result};
use crate::kernel::vector::Vector;

/// Similarity computation for vectors.
pub struct Similarity;

impl Similarity {
    /// Dot product, failing on length disagreement.
    pub fn dot(a: &Vector, b: &Vector) -> Result<f64> {
        Self::dot_slices(a.data(), b.data())
    }

    /// Dot product over raw slices.
    pub fn dot_slices(a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(CleanupError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(Self::dot_unchecked(a, b))
    }

    /// Dot product of equal-length slices.
    #[cfg(feature = "simd")]
    pub(crate) fn dot_unchecked(a: &[f64], b: &[f64]) -> f64 {
        use simsimd::SpatialSimilarity;
        f64::dot(a, b).unwrap_or(0.0)
    }

    #[cfg(not(feature = "simd"))]
    pub(crate) fn dot_unchecked(a: &[f64], b: &[f64]) -> f64 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }

    /// Cosine similarity: dot(a, b) / (||a|| * ||b||)
    ///
    /// Returns a value in [-1, 1]; zero when either side is (near) zero.
    pub fn cosine(a: &Vector, b: &Vector) -> Result<f64> {
        let dot = Self::dot(a, b)?;
        let norm_product = a.norm() * b.norm();
        if norm_product < 1e-10 {
            return Ok(0.0);
        }
        Ok(dot / norm_product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot() {
        let a = Vector::from_data(vec![1.0, 2.0, 3.0]);
        let b = Vector::from_data(vec![4.0, -5.0, 6.0]);
        let d = Similarity::dot(&a, &b).unwrap();
        assert!((d - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_dot_mismatch() {
        let a = Vector::zeros(3);
        let b = Vector::zeros(4);
        let err = Similarity::dot(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            CleanupError::DimensionMismatch {
                expected: 3,
                got: 4
            }
        ));
    }

    #[test]
    fn test_cosine_scale_invariant() {
        let a = Vector::from_data(vec![1.0, 1.0]);
        let b = Vector::from_data(vec![10.0, 10.0]);
        let sim = Similarity::cosine(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let a = Vector::zeros(2);
        let b = Vector::from_data(vec![1.0, 0.0]);
        assert_eq!(Similarity::cosine(&a, &b).unwrap(), 0.0);
    }
}
