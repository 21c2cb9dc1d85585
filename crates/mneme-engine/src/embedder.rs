//! Hashed-term embedding provider.
//!
//! Feature hashing over lowercase terms: each term lands in a bucket chosen
//! by FNV-1a and adds a signed, log-damped frequency weight. Deterministic and
//! dependency-free, so it works offline and in tests. Similarity reflects
//! shared vocabulary, not meaning.

use std::collections::HashMap;

use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::traits::IEmbeddingProvider;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub struct HashedTermEmbedder {
    dimensions: usize,
}

impl HashedTermEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn fnv1a(term: &str) -> u64 {
        term.bytes().fold(FNV_OFFSET, |h, b| {
            (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
        })
    }

    /// Lowercase alphanumeric runs of two or more characters.
    fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| t.chars().count() >= 2)
            .map(str::to_lowercase)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut counts: HashMap<String, u32> = HashMap::new();
        for term in Self::terms(text) {
            *counts.entry(term).or_default() += 1;
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for (term, count) in &counts {
            let h = Self::fnv1a(term);
            let bucket = (h % self.dimensions as u64) as usize;
            // High bit picks the sign so collisions tend to cancel.
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign * (1.0 + (*count as f32).ln());
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

impl IEmbeddingProvider for HashedTermEmbedder {
    fn embed(&self, text: &str) -> MnemeResult<Vec<f32>> {
        if self.dimensions == 0 {
            return Err(MnemeError::EmbeddingError(
                "embedding dimensions must be positive".to_string(),
            ));
        }
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashed-term"
    }
}
