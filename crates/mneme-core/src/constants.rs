/// Mneme engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current schema version written by the migration runner.
pub const SCHEMA_VERSION: u32 = 6;

/// Hard ceiling for lineage traversal depth, regardless of caller input.
pub const MAX_LINEAGE_DEPTH: u32 = 64;

/// Maximum number of bound parameters per `IN (...)` chunk.
/// SQLite's default variable limit is 999; stay well below it.
pub const MAX_SQL_IN_CHUNK: usize = 500;

/// Q-value assigned to every entry on creation.
pub const Q_VALUE_INITIAL: f64 = 0.5;

/// Lower clamp for Q-values.
pub const Q_VALUE_MIN: f64 = 0.1;

/// Upper clamp for Q-values.
pub const Q_VALUE_MAX: f64 = 1.0;

/// Inclusive bounds for feedback scores.
pub const FEEDBACK_SCORE_MIN: u8 = 1;
pub const FEEDBACK_SCORE_MAX: u8 = 10;

/// Version stamped into every serialization envelope written today.
pub const ENVELOPE_VERSION: u32 = 1;

/// System metadata keys.
pub const META_LAST_EXPIRY_SWEEP: &str = "causal.last_expiry_sweep";
pub const META_LAST_TIER_UPDATE: &str = "vectors.last_tier_update";
pub const META_ENGINE_VERSION: &str = "engine.version";
