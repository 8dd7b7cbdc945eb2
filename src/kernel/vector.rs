//! Vector type for spa-cleanup.
//!
//! Semantic pointers are dense real vectors. Symbols in a vocabulary are
//! unit-normalized so that a dot product approximates cosine similarity.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

/// A dense real-valued semantic pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    /// Create a new zero vector of given dimensionality.
    pub fn zeros(dimensions: usize) -> Self {
        Self {
            data: vec![0.0; dimensions],
        }
    }

    /// Create a vector from raw data.
    pub fn from_data(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Get the dimensionality.
    pub fn dimensions(&self) -> usize {
        self.data.len()
    }

    /// Get the raw data as a slice.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable access to the raw data.
    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the vector and return its components.
    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    /// Compute the L2 norm.
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Return a unit-normalized copy. Near-zero vectors come back as zeros.
    pub fn normalized(&self) -> Vector {
        let norm = self.norm();
        if norm < 1e-10 {
            return Vector::zeros(self.dimensions());
        }
        Vector::from_data(self.data.iter().map(|v| v / norm).collect())
    }

    /// Multiply every component by `factor`.
    pub fn scaled(&self, factor: f64) -> Vector {
        Vector::from_data(self.data.iter().map(|v| v * factor).collect())
    }

    /// Whether the norm is within `tolerance` of 1.
    pub fn is_unit(&self, tolerance: f64) -> bool {
        (self.norm() - 1.0).abs() <= tolerance
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<usize> for Vector {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Self::from_data(data)
    }
}

impl AsRef<[f64]> for Vector {
    fn as_ref(&self) -> &[f64] {
        &self.data
    }
}

// Element-wise operators panic on length mismatch; fallible callers check
// dimensions first.

impl Add for &Vector {
    type Output = Vector;

    fn add(self, rhs: &Vector) -> Vector {
        assert_eq!(
            self.dimensions(),
            rhs.dimensions(),
            "Dimension mismatch in vector add"
        );
        Vector::from_data(
            self.data
                .iter()
                .zip(rhs.data.iter())
                .map(|(a, b)| a + b)
                .collect(),
        )
    }
}

impl Sub for &Vector {
    type Output = Vector;

    fn sub(self, rhs: &Vector) -> Vector {
        assert_eq!(
            self.dimensions(),
            rhs.dimensions(),
            "Dimension mismatch in vector sub"
        );
        Vector::from_data(
            self.data
                .iter()
                .zip(rhs.data.iter())
                .map(|(a, b)| a - b)
                .collect(),
        )
    }
}

impl Mul<f64> for &Vector {
    type Output = Vector;

    fn mul(self, rhs: f64) -> Vector {
        self.scaled(rhs)
    }
}

impl Neg for &Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        self.scaled(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let v = Vector::zeros(100);
        assert_eq!(v.dimensions(), 100);
        assert!(v.data().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_norm() {
        let v = Vector::from_data(vec![3.0, 4.0]);
        assert!((v.norm() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_normalized() {
        let v = Vector::from_data(vec![3.0, 4.0]).normalized();
        assert!(v.is_unit(1e-12));
        assert!((v[0] - 0.6).abs() < 1e-12);

        let z = Vector::zeros(3).normalized();
        assert_eq!(z, Vector::zeros(3));
    }

    #[test]
    fn test_arithmetic() {
        let a = Vector::from_data(vec![1.0, 0.0]);
        let b = Vector::from_data(vec![0.0, 1.0]);
        let c = &(&a * 0.8) + &b;
        assert_eq!(c.data(), &[0.8, 1.0]);
        assert_eq!((&c - &b).data(), &[0.8, 0.0]);
        assert_eq!((-&a).data(), &[-1.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch")]
    fn test_add_mismatch_panics() {
        let _ = &Vector::zeros(2) + &Vector::zeros(3);
    }
}
