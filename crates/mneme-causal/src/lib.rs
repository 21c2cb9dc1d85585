//! # mneme-causal
//!
//! Directed causal hyperedges between memory entries: creation with optional
//! time-to-live, lookup by entry and direction, expiry sweeps, and a set of
//! best-effort detection strategies that propose relations after each store.

pub mod detection;
pub mod graph;

pub use detection::{DetectionEngine, DetectionReport, DetectionStrategy};
pub use graph::CausalGraph;
