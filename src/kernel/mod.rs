//! Kernel layer: semantic pointers and the vocabulary they come from.
//!
//! - [`Vector`]: dense real-valued semantic pointer
//! - [`Vocabulary`]: deterministic symbol → unit vector mapping
//! - [`Similarity`]: dot / cosine read-outs
//! - [`expression`]: `0.8*LETTER+D` style linear combinations
//!
//! This layer has no dependencies on [`memory`](crate::memory) or
//! [`network`](crate::network).
//!
//! # Example
//!
//! ```rust
//! use spa_cleanup::kernel::{Similarity, Vocabulary};
//!
//! let vocab = Vocabulary::with_symbols(64, 0, &["A", "B", "LETTER"]).unwrap();
//! let noisy = vocab.parse("0.8*A+0.2*B").unwrap();
//! let sim = Similarity::dot(vocab.get("A").unwrap(), &noisy).unwrap();
//! assert!(sim > 0.5);
//! ```

pub mod expression;
pub mod similarity;
pub mod vector;
pub mod vocabulary;

pub use similarity::Similarity;
pub use vector::Vector;
pub use vocabulary::{SymbolLookup, Vocabulary};
