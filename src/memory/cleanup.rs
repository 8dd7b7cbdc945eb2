//! Clean-up memory: similarity read-out against known semantic pointers.
//!
//! A [`ReferenceSet`] is an ordered, immutable selection of vocabulary
//! vectors. Evaluating it against an input yields one dot product per
//! reference, which is the signal a clean-up population would carry.
//!
//! # Example
//!
//! ```rust
//! use spa_cleanup::kernel::{Vector, Vocabulary};
//! use spa_cleanup::memory::ReferenceSet;
//!
//! let mut vocab = Vocabulary::new(2);
//! vocab.insert("A", Vector::from_data(vec![1.0, 0.0])).unwrap();
//! vocab.insert("B", Vector::from_data(vec![0.0, 1.0])).unwrap();
//!
//! let refs = ReferenceSet::build(&vocab, &["A"]).unwrap();
//! let out = refs.evaluate(&[0.8, 0.1]).unwrap();
//! assert_eq!(out, vec![0.8]);
//! ```

use crate::error::{CleanupError, Result};
use crate::kernel::{Similarity, SymbolLookup, Vector};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// How the input is treated before comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Raw dot product; no range clamping.
    #[default]
    Raw,
    /// True cosine similarity: input and reference are both normalized.
    Cosine,
}

/// Ordered, immutable reference directions for a clean-up memory.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceSet {
    names: Vec<String>,
    vectors: Vec<Vector>,
    dimensions: usize,
}

impl ReferenceSet {
    /// Select `symbol_names` from `vocabulary`, preserving their order.
    ///
    /// Fails with [`CleanupError::EmptyInput`] for an empty name list,
    /// [`CleanupError::DimensionMismatch`] if the vocabulary mixes vector
    /// lengths and [`CleanupError::UnknownSymbol`] for a missing name.
    pub fn build<L, S>(vocabulary: &L, symbol_names: &[S]) -> Result<Self>
    where
        L: SymbolLookup + ?Sized,
        S: AsRef<str>,
    {
        if symbol_names.is_empty() {
            return Err(CleanupError::EmptyInput(
                "reference set needs at least one symbol".to_string(),
            ));
        }

        let mut vocab_dims: Option<usize> = None;
        for (_, v) in vocabulary.entries() {
            match vocab_dims {
                None => vocab_dims = Some(v.dimensions()),
                Some(d) if d != v.dimensions() => {
                    return Err(CleanupError::DimensionMismatch {
                        expected: d,
                        got: v.dimensions(),
                    });
                }
                Some(_) => {}
            }
        }

        let mut names = Vec::with_capacity(symbol_names.len());
        let mut vectors = Vec::with_capacity(symbol_names.len());
        for name in symbol_names {
            let name = name.as_ref();
            let v = vocabulary
                .lookup(name)
                .ok_or_else(|| CleanupError::UnknownSymbol {
                    name: name.to_string(),
                })?;
            names.push(name.to_string());
            vectors.push(v.clone());
        }

        // A lookup that resolves names outside its own entries still has to agree.
        let dimensions = vocab_dims.unwrap_or_else(|| vectors[0].dimensions());
        if let Some(bad) = vectors.iter().find(|v| v.dimensions() != dimensions) {
            return Err(CleanupError::DimensionMismatch {
                expected: dimensions,
                got: bad.dimensions(),
            });
        }

        debug!(symbols = ?names, dimensions, "built reference set");

        Ok(Self {
            names,
            vectors,
            dimensions,
        })
    }

    /// `out[i] = dot(input, r_i)`. Pure; safe to call from any thread.
    pub fn evaluate(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;
        Ok(self
            .vectors
            .iter()
            .map(|r| Similarity::dot_unchecked(input, r.data()))
            .collect())
    }

    /// Evaluate with an explicit input treatment.
    pub fn evaluate_with(&self, input: &[f64], normalization: Normalization) -> Result<Vec<f64>> {
        match normalization {
            Normalization::Raw => self.evaluate(input),
            Normalization::Cosine => {
                self.check_input(input)?;
                let input = Vector::from_data(input.to_vec());
                self.vectors
                    .iter()
                    .map(|r| Similarity::cosine(&input, r))
                    .collect()
            }
        }
    }

    /// Symbol names in reference order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always false for a built set; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.dimensions {
            return Err(CleanupError::DimensionMismatch {
                expected: self.dimensions,
                got: input.len(),
            });
        }
        Ok(())
    }
}

/// Select reference vectors by name. See [`ReferenceSet::build`].
pub fn build<L, S>(vocabulary: &L, symbol_names: &[S]) -> Result<ReferenceSet>
where
    L: SymbolLookup + ?Sized,
    S: AsRef<str>,
{
    ReferenceSet::build(vocabulary, symbol_names)
}

/// Dot product of `input` with every reference. See [`ReferenceSet::evaluate`].
pub fn evaluate(reference_set: &ReferenceSet, input: &[f64]) -> Result<Vec<f64>> {
    reference_set.evaluate(input)
}

/// Best-matching symbol for an input.
#[derive(Clone, Debug, PartialEq)]
pub struct Recall {
    pub index: usize,
    pub name: String,
    pub score: f64,
}

/// A named clean-up memory: a shared reference set plus an input treatment.
///
/// Cloning is cheap; clones share the same reference vectors.
#[derive(Clone, Debug)]
pub struct CleanupMemory {
    name: String,
    references: Arc<ReferenceSet>,
    normalization: Normalization,
}

impl CleanupMemory {
    pub fn new(name: &str, references: ReferenceSet) -> Self {
        Self {
            name: name.to_string(),
            references: Arc::new(references),
            normalization: Normalization::Raw,
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn references(&self) -> &Arc<ReferenceSet> {
        &self.references
    }

    /// Similarity of `input` to every reference.
    pub fn evaluate(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.references.evaluate_with(input, self.normalization)
    }

    /// The reference with the highest score. Ties go to the earliest entry.
    pub fn recall(&self, input: &[f64]) -> Result<Recall> {
        let scores = self.evaluate(input)?;
        let mut best = 0;
        for (i, s) in scores.iter().enumerate().skip(1) {
            if *s > scores[best] {
                best = i;
            }
        }
        Ok(Recall {
            index: best,
            name: self.references.names()[best].clone(),
            score: scores[best],
        })
    }

    /// Replace a noisy input with the canonical vector it most resembles,
    /// or `None` when no reference reaches `threshold`.
    pub fn clean(&self, input: &[f64], threshold: f64) -> Result<Option<Vector>> {
        let recall = self.recall(input)?;
        // NaN scores never reach a threshold.
        if !(recall.score >= threshold) {
            return Ok(None);
        }
        Ok(Some(self.references.vectors()[recall.index].clone()))
    }
}
