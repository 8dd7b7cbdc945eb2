//! Network layer: a small, explicit dataflow graph for clean-up memories.
//!
//! - [`Signal`] sources ([`Constant`], [`Timed`], [`FnSignal`], [`Sequencer`])
//! - [`Network`] sampling sources and evaluating connected memories per step
//! - [`connect`] wiring a [`ReferenceSet`](crate::memory::ReferenceSet) onto a source
//!
//! # Example
//!
//! ```rust
//! use spa_cleanup::kernel::{Vector, Vocabulary};
//! use spa_cleanup::memory::ReferenceSet;
//! use spa_cleanup::network::{connect, Constant, Network};
//!
//! let mut vocab = Vocabulary::new(2);
//! vocab.insert("A", Vector::from_data(vec![1.0, 0.0])).unwrap();
//!
//! let mut net = Network::new("demo");
//! let state = net
//!     .add_source("state", Box::new(Constant::new(Vector::from_data(vec![0.8, 0.1]))))
//!     .unwrap();
//! let port = connect(&mut net, state, ReferenceSet::build(&vocab, &["A"]).unwrap()).unwrap();
//!
//! net.step(0.001).unwrap();
//! assert_eq!(net.output(port), Some(&[0.8][..]));
//! ```

pub mod graph;
pub mod signal;

pub use graph::{connect, ConnectionHandle, Network, NodeId, ProbeSample, ProbeView};
pub use signal::{Constant, FnSignal, Sequencer, Signal, Timed};
