//! High-level convenience API.
//!
//! This layer provides [`Model`], an ergonomic wrapper that assembles a
//! [`Vocabulary`](crate::kernel::Vocabulary), a rule-driven state buffer and
//! a probed [`CleanupMemory`](crate::memory::CleanupMemory) from a
//! [`ModelConfig`](crate::config::ModelConfig).
//!
//! For library code, prefer importing from [`kernel`](crate::kernel),
//! [`memory`](crate::memory) and [`network`](crate::network) directly.

pub mod model;

pub use model::Model;
