//! # mneme-patterns
//!
//! Structured extraction through a library of `{slot}` templates. Templates
//! compile to case-insensitive regular expressions with typed capture rules,
//! compiled matchers are cached until the template changes, and usage
//! counters drive pruning of templates that keep failing.

pub mod cache;
pub mod compiler;
pub mod engine;
pub mod normalize;
pub mod scoring;

pub use compiler::CompiledTemplate;
pub use engine::PatternMatcher;
