//! Vocabulary: deterministic symbol → semantic pointer mapping.
//!
//! Every symbol gets a unit-norm random vector derived from a hash of
//! (global seed, symbol name, attempt). The same seed and insertion order
//! always reproduce the same vocabulary.

use crate::error::{CleanupError, Result};
use crate::kernel::expression;
use crate::kernel::similarity::Similarity;
use crate::kernel::vector::Vector;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Default bound on |dot| between a new pointer and existing ones.
pub const DEFAULT_MAX_SIMILARITY: f64 = 0.1;

/// Default number of regeneration attempts per symbol.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Read-only name → vector lookup.
///
/// Implemented by [`Vocabulary`] and by plain maps, so a clean-up memory can
/// be built over a vocabulary owned by some other component.
pub trait SymbolLookup {
    /// Look up the vector for `name`.
    fn lookup(&self, name: &str) -> Option<&Vector>;

    /// Iterate over every (name, vector) entry.
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Vector)> + '_>;
}

impl SymbolLookup for HashMap<String, Vector> {
    fn lookup(&self, name: &str) -> Option<&Vector> {
        self.get(name)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Vector)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

impl SymbolLookup for BTreeMap<String, Vector> {
    fn lookup(&self, name: &str) -> Option<&Vector> {
        self.get(name)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Vector)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v)))
    }
}

/// A named set of semantic pointers sharing one dimensionality.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    dimensions: usize,
    global_seed: u64,
    max_similarity: f64,
    max_attempts: u32,
    /// Insertion order of symbol names
    keys: Vec<String>,
    vectors: HashMap<String, Vector>,
}

impl Vocabulary {
    /// Create an empty vocabulary with default seed.
    pub fn new(dimensions: usize) -> Self {
        Self::with_seed(dimensions, 0)
    }

    /// Create an empty vocabulary with a specific global seed.
    pub fn with_seed(dimensions: usize, global_seed: u64) -> Self {
        Self {
            dimensions,
            global_seed,
            max_similarity: DEFAULT_MAX_SIMILARITY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            keys: Vec::new(),
            vectors: HashMap::new(),
        }
    }

    /// Set the similarity bound used when generating new pointers.
    pub fn with_max_similarity(mut self, max_similarity: f64) -> Self {
        self.max_similarity = max_similarity;
        self
    }

    /// Set how many candidates are tried before settling for the best one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Build a vocabulary holding `symbols`, generated in order.
    pub fn with_symbols<S: AsRef<str>>(
        dimensions: usize,
        global_seed: u64,
        symbols: &[S],
    ) -> Result<Self> {
        let mut vocab = Self::with_seed(dimensions, global_seed);
        vocab.add_all(symbols)?;
        Ok(vocab)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn max_similarity(&self) -> f64 {
        self.max_similarity
    }

    /// Symbol names in insertion order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vectors.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Vector> {
        self.vectors.get(name)
    }

    /// Generate and store a pointer for `name`.
    pub fn add(&mut self, name: &str) -> Result<&Vector> {
        self.check_new_name(name)?;
        let vec = self.generate(name);
        Ok(self.store(name, vec))
    }

    /// Generate pointers for every name in `names`, in order.
    pub fn add_all<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            self.add(name.as_ref())?;
        }
        Ok(())
    }

    /// Store an explicit vector under `name`. The vector is kept as given.
    pub fn insert(&mut self, name: &str, vector: Vector) -> Result<()> {
        self.check_new_name(name)?;
        if vector.dimensions() != self.dimensions {
            return Err(CleanupError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.dimensions(),
            });
        }
        self.store(name, vector);
        Ok(())
    }

    /// Similarity of `vector` against every symbol, in insertion order.
    pub fn dot_all(&self, vector: &Vector) -> Result<Vec<(String, f64)>> {
        self.keys
            .iter()
            .map(|k| {
                let sim = Similarity::dot(&self.vectors[k], vector)?;
                Ok((k.clone(), sim))
            })
            .collect()
    }

    /// Evaluate a symbol expression such as `0.8*LETTER+D`.
    pub fn parse(&self, expr: &str) -> Result<Vector> {
        expression::evaluate(expr, self, self.dimensions)
    }

    /// Render the symbols `vector` resembles, strongest first.
    ///
    /// Only symbols with similarity above `threshold` are listed, e.g.
    /// `0.80A;0.12D`.
    pub fn text(&self, vector: &Vector, threshold: f64) -> Result<String> {
        let mut sims: Vec<(String, f64)> = self
            .dot_all(vector)?
            .into_iter()
            .filter(|(_, s)| *s > threshold)
            .collect();
        sims.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(sims
            .iter()
            .map(|(k, s)| format!("{:.2}{}", s, k))
            .collect::<Vec<_>>()
            .join(";"))
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(CleanupError::EmptyInput("symbol name".to_string()));
        }
        if !expression::is_identifier(name) {
            return Err(CleanupError::InvalidConfig(format!(
                "symbol name {:?} is not an identifier",
                name
            )));
        }
        if self.vectors.contains_key(name) {
            return Err(CleanupError::DuplicateSymbol(name.to_string()));
        }
        Ok(())
    }

    fn store(&mut self, name: &str, vec: Vector) -> &Vector {
        self.keys.push(name.to_string());
        self.vectors.entry(name.to_string()).or_insert(vec)
    }

    /// Draw candidates until one stays under `max_similarity` against every
    /// existing symbol; otherwise keep the least similar candidate.
    fn generate(&self, name: &str) -> Vector {
        let mut best: Option<(f64, Vector)> = None;

        for attempt in 0..self.max_attempts {
            let candidate = self.candidate(name, attempt);
            let worst = self
                .vectors
                .values()
                .map(|v| Similarity::dot_unchecked(v.data(), candidate.data()).abs())
                .fold(0.0_f64, f64::max);

            if worst <= self.max_similarity {
                debug!(symbol = name, attempt, worst, "generated semantic pointer");
                return candidate;
            }
            if best.as_ref().map_or(true, |(b, _)| worst < *b) {
                best = Some((worst, candidate));
            }
        }

        match best {
            Some((worst, vec)) => {
                warn!(
                    symbol = name,
                    max_similarity = self.max_similarity,
                    achieved = worst,
                    attempts = self.max_attempts,
                    "could not satisfy max_similarity, keeping closest candidate"
                );
                vec
            }
            None => self.candidate(name, 0),
        }
    }

    /// Uses SHA-256 of (global_seed || name || attempt) to seed a ChaCha8 RNG,
    /// then draws uniform components in [-1, 1] and normalizes.
    fn candidate(&self, name: &str, attempt: u32) -> Vector {
        let mut hasher = Sha256::new();
        hasher.update(self.global_seed.to_le_bytes());
        hasher.update(name.as_bytes());
        hasher.update(attempt.to_le_bytes());
        let hash = hasher.finalize();

        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&hash[0..8]);
        let mut rng = ChaCha8Rng::seed_from_u64(u64::from_le_bytes(seed_bytes));

        let data: Vec<f64> = (0..self.dimensions)
            .map(|_| rng.gen_range(-1.0..=1.0))
            .collect();

        Vector::from_data(data).normalized()
    }
}

impl SymbolLookup for Vocabulary {
    fn lookup(&self, name: &str) -> Option<&Vector> {
        self.get(name)
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Vector)> + '_> {
        Box::new(
            self.keys
                .iter()
                .filter_map(|k| self.vectors.get(k).map(|v| (k.as_str(), v))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let v1 = Vocabulary::with_symbols(64, 42, &["A", "B"]).unwrap();
        let v2 = Vocabulary::with_symbols(64, 42, &["A", "B"]).unwrap();
        assert_eq!(v1.get("A"), v2.get("A"));
        assert_eq!(v1.get("B"), v2.get("B"));
    }

    #[test]
    fn test_different_seeds() {
        let v1 = Vocabulary::with_symbols(64, 42, &["A"]).unwrap();
        let v2 = Vocabulary::with_symbols(64, 43, &["A"]).unwrap();
        assert_ne!(v1.get("A"), v2.get("A"));
    }

    #[test]
    fn test_generated_vectors_are_unit_norm() {
        let vocab = Vocabulary::with_symbols(16, 0, &["A", "B", "C", "D", "E"]).unwrap();
        for (_, v) in vocab.entries() {
            assert_eq!(v.dimensions(), 16);
            assert!(v.is_unit(1e-9));
        }
    }

    #[test]
    fn test_max_similarity_respected_in_high_dimensions() {
        let vocab = Vocabulary::with_symbols(512, 7, &["A", "B", "C", "D", "E"]).unwrap();
        for (i, a) in vocab.keys().iter().enumerate() {
            for b in &vocab.keys()[i + 1..] {
                let sim = Similarity::dot(vocab.get(a).unwrap(), vocab.get(b).unwrap()).unwrap();
                assert!(sim.abs() <= DEFAULT_MAX_SIMILARITY, "{a}/{b}: {sim}");
            }
        }
    }

    #[test]
    fn test_keys_keep_insertion_order() {
        let vocab = Vocabulary::with_symbols(16, 0, &["E", "A", "C"]).unwrap();
        assert_eq!(vocab.keys(), &["E", "A", "C"]);
        let names: Vec<&str> = vocab.entries().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["E", "A", "C"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut vocab = Vocabulary::new(8);
        vocab.add("A").unwrap();
        assert!(matches!(
            vocab.add("A"),
            Err(CleanupError::DuplicateSymbol(_))
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut vocab = Vocabulary::new(8);
        assert!(matches!(vocab.add(""), Err(CleanupError::EmptyInput(_))));
        assert!(matches!(
            vocab.add("0.8*A"),
            Err(CleanupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_insert_checks_dimensions() {
        let mut vocab = Vocabulary::new(2);
        vocab
            .insert("A", Vector::from_data(vec![1.0, 0.0]))
            .unwrap();
        let err = vocab
            .insert("B", Vector::from_data(vec![0.0, 1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            CleanupError::DimensionMismatch {
                expected: 2,
                got: 3
            }
        ));
    }

    #[test]
    fn test_dot_all_and_text() {
        let mut vocab = Vocabulary::new(2);
        vocab.insert("A", Vector::from_data(vec![1.0, 0.0])).unwrap();
        vocab.insert("B", Vector::from_data(vec![0.0, 1.0])).unwrap();

        let probe = Vector::from_data(vec![0.8, 0.1]);
        let sims = vocab.dot_all(&probe).unwrap();
        assert_eq!(sims[0].0, "A");
        assert!((sims[0].1 - 0.8).abs() < 1e-12);
        assert!((sims[1].1 - 0.1).abs() < 1e-12);

        assert_eq!(vocab.text(&probe, 0.05).unwrap(), "0.80A;0.10B");
        assert_eq!(vocab.text(&probe, 0.5).unwrap(), "0.80A");
    }

    #[test]
    fn test_map_lookup() {
        let mut map = HashMap::new();
        map.insert("A".to_string(), Vector::from_data(vec![1.0, 0.0]));
        assert!(map.lookup("A").is_some());
        assert!(map.lookup("B").is_none());
        assert_eq!(map.entries().count(), 1);
    }
}
