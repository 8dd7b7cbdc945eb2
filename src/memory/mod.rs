//! Memory layer: clean-up memories over a vocabulary.
//!
//! - [`ReferenceSet`]: ordered reference directions selected by name
//! - [`CleanupMemory`]: a named reference set with an input treatment,
//!   able to recall the closest symbol and snap inputs to it
//!
//! # Usage
//!
//! ```rust
//! use spa_cleanup::kernel::Vocabulary;
//! use spa_cleanup::memory::{CleanupMemory, ReferenceSet};
//!
//! let vocab = Vocabulary::with_symbols(16, 0, &["A", "B", "C", "D", "E"]).unwrap();
//! let refs = ReferenceSet::build(&vocab, &["A", "B"]).unwrap();
//! let memory = CleanupMemory::new("cleanup AB", refs);
//!
//! let noisy = vocab.parse("0.9*B+0.3*E").unwrap();
//! assert_eq!(memory.recall(noisy.data()).unwrap().name, "B");
//! ```

pub mod cleanup;

pub use cleanup::{build, evaluate, CleanupMemory, Normalization, Recall, ReferenceSet};
