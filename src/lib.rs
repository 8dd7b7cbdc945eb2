//! # spa-cleanup: semantic pointer clean-up memory
//!
//! A vocabulary of named unit vectors, a clean-up memory that reads out how
//! strongly a noisy vector resembles chosen symbols, and a small explicit
//! dataflow graph to run it against time-varying inputs.
//!
//! ## Quick Start
//!
//! ```rust
//! use spa_cleanup::{ReferenceSet, Vocabulary};
//!
//! let vocab = Vocabulary::with_symbols(16, 0, &["A", "B", "C", "D", "E", "LETTER"])?;
//!
//! // Reference set aligned with A
//! let cleanup_a = ReferenceSet::build(&vocab, &["A"])?;
//!
//! // A noisy A still reads close to 1
//! let noisy = vocab.parse("A + 0.2*E")?;
//! let out = cleanup_a.evaluate(noisy.data())?;
//! assert!(out[0] > 0.6);
//! # Ok::<(), spa_cleanup::CleanupError>(())
//! ```
//!
//! ## Layers
//!
//! - [`kernel`]: vectors, vocabulary, similarity, symbol expressions
//! - [`memory`]: reference sets and clean-up memories
//! - [`rules`]: explicit state-transition tables
//! - [`network`]: signals, connections, probes
//! - [`highlevel`]: [`Model`](highlevel::Model) assembled from [`config::ModelConfig`]

pub mod config;
pub mod error;
pub mod highlevel;
pub mod kernel;
pub mod memory;
pub mod network;
pub mod rules;

// Re-exports for convenience
pub use config::ModelConfig;
pub use error::{CleanupError, Result};
pub use highlevel::Model;
pub use kernel::{Similarity, SymbolLookup, Vector, Vocabulary};
pub use memory::{CleanupMemory, Normalization, Recall, ReferenceSet};
pub use network::{connect, ConnectionHandle, Network, NodeId, Signal};
pub use rules::{Action, Buffers, Condition, Rule, RuleTable};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_then_evaluate_self() {
        let vocab = Vocabulary::with_symbols(16, 0, &["A", "B", "C", "D", "E"]).unwrap();
        let refs = memory::build(&vocab, &["A"]).unwrap();
        let out = memory::evaluate(&refs, vocab.get("A").unwrap().data()).unwrap();
        assert!((out[0] - 1.0).abs() < 1e-9);

        assert!(matches!(
            memory::build(&vocab, &["LETTER"]),
            Err(CleanupError::UnknownSymbol { .. })
        ));
    }

    #[test]
    fn test_input_of_wrong_length() {
        let vocab = Vocabulary::with_symbols(16, 0, &["A"]).unwrap();
        let refs = memory::build(&vocab, &["A"]).unwrap();
        let input = vec![0.0; 17];
        assert!(matches!(
            memory::evaluate(&refs, &input),
            Err(CleanupError::DimensionMismatch {
                expected: 16,
                got: 17
            })
        ));
    }

    #[test]
    fn test_noisy_pointer_cleans_up() {
        let vocab = Vocabulary::with_symbols(256, 9, &["A", "B", "C", "D", "E"]).unwrap();
        let memory = CleanupMemory::new("cleanup", ReferenceSet::build(&vocab, vocab.keys()).unwrap());

        let noisy = vocab.parse("0.7*C + 0.3*A - 0.2*E").unwrap();
        let cleaned = memory.clean(noisy.data(), 0.5).unwrap().unwrap();
        assert_eq!(&cleaned, vocab.get("C").unwrap());
    }
}
