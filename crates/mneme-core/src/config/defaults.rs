// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "mneme.db";
pub const DEFAULT_READ_POOL_SIZE: usize = 4;
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_LABEL_RETRY_LIMIT: u32 = 3;

// --- Provenance ---
pub const DEFAULT_DEPTH_DECAY: f64 = 0.9;
pub const DEFAULT_MIN_L_SCORE: f64 = 0.01;
pub const DEFAULT_L_SCORE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_ENFORCE_THRESHOLD: bool = false;
pub const DEFAULT_LINEAGE_MAX_DEPTH: u32 = 10;
pub const DEFAULT_CONFIDENCE: f64 = 1.0;
pub const DEFAULT_RELEVANCE: f64 = 1.0;

// --- Causal detection ---
pub const DEFAULT_DETECTION_ENABLED: bool = true;
pub const DEFAULT_DETECTION_SEARCH_LIMIT: usize = 10;
pub const DEFAULT_BUG_FIX_MIN_SIMILARITY: f64 = 0.55;
pub const DEFAULT_BUG_FIX_STRENGTH_MIN: f64 = 0.70;
pub const DEFAULT_BUG_FIX_STRENGTH_MAX: f64 = 0.95;
pub const DEFAULT_ERROR_RESOLUTION_MIN_SIMILARITY: f64 = 0.6;
pub const DEFAULT_ERROR_RESOLUTION_STRENGTH_MIN: f64 = 0.65;
pub const DEFAULT_ERROR_RESOLUTION_STRENGTH_MAX: f64 = 0.90;
pub const DEFAULT_ARCH_MIN_SIMILARITY: f64 = 0.6;
pub const DEFAULT_ARCH_STRONG_SIMILARITY: f64 = 0.7;
pub const DEFAULT_ARCH_SHARED_TAG_STRENGTH: f64 = 0.8;
pub const DEFAULT_ARCH_SIMILARITY_STRENGTH: f64 = 0.75;
pub const DEFAULT_CROSS_INSTANCE_MIN_SIMILARITY: f64 = 0.6;
pub const DEFAULT_CROSS_INSTANCE_STRENGTH: f64 = 0.8;
pub const DEFAULT_SESSION_BASE_STRENGTH: f64 = 0.5;
pub const DEFAULT_SESSION_OVERLAP_STEP: f64 = 0.1;
pub const DEFAULT_SESSION_MAX_STRENGTH: f64 = 0.9;
pub const DEFAULT_SESSION_LOOKBACK: usize = 50;

// --- Patterns ---
pub const DEFAULT_PATTERN_MIN_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_SPAN_WEIGHT: f64 = 0.8;
pub const DEFAULT_BASE_CONFIDENCE: f64 = 0.2;
pub const DEFAULT_PRIORITY_BONUS_PER_POINT: f64 = 0.02;
pub const DEFAULT_MAX_PRIORITY_BONUS: f64 = 0.2;
pub const DEFAULT_SHORT_MATCH_CHARS: usize = 10;
pub const DEFAULT_SHORT_MATCH_PENALTY: f64 = 0.1;
pub const DEFAULT_PRUNE_MIN_USES: u64 = 100;
pub const DEFAULT_PRUNE_MAX_SUCCESS_RATE: f64 = 0.4;
pub const DEFAULT_COMPILED_CACHE_CAPACITY: u64 = 1_024;

// --- MemRL ---
pub const DEFAULT_ALPHA: f64 = 0.1;
pub const DEFAULT_DELTA: f64 = 0.3;
pub const DEFAULT_LAMBDA: f64 = 0.5;
/// Any differing auto and human score is a disagreement.
pub const DEFAULT_DISAGREEMENT_THRESHOLD: u8 = 1;
pub const DEFAULT_Q_LOW_BELOW: f64 = 0.4;
pub const DEFAULT_Q_HIGH_FROM: f64 = 0.7;

// --- Retrieval ---
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_MIN_SCORE: f64 = 0.0;
pub const DEFAULT_OVERSAMPLE_FACTOR: usize = 4;

// --- Tiering ---
pub const DEFAULT_HOT_MIN_ACCESS: u64 = 10;
pub const DEFAULT_WARM_AFTER_DAYS: u32 = 7;
pub const DEFAULT_COLD_AFTER_DAYS: u32 = 30;

// --- Embedding ---
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 256;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
