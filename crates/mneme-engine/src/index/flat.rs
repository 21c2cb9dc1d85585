//! Brute-force cosine index over a concurrent map. Exact, linear per search;
//! suited to small stores and tests.

use dashmap::DashMap;

use mneme_core::errors::{MnemeError, MnemeResult};
use mneme_core::traits::{IVectorIndex, VectorHit};

use super::cosine_similarity;

pub struct FlatIndex {
    dimensions: usize,
    vectors: DashMap<u64, Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: DashMap::new(),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn contains(&self, label: u64) -> bool {
        self.vectors.contains_key(&label)
    }
}

impl IVectorIndex for FlatIndex {
    fn insert(&self, label: u64, vector: &[f32]) -> MnemeResult<()> {
        if vector.len() != self.dimensions {
            return Err(MnemeError::IndexError(format!(
                "vector for label {label} has {} dimensions, index expects {}",
                vector.len(),
                self.dimensions
            )));
        }
        self.vectors.insert(label, vector.to_vec());
        Ok(())
    }

    fn remove(&self, label: u64) -> MnemeResult<bool> {
        Ok(self.vectors.remove(&label).is_some())
    }

    fn search(&self, query: &[f32], k: usize) -> MnemeResult<Vec<VectorHit>> {
        if k == 0 || query.len() != self.dimensions {
            return Ok(Vec::new());
        }
        // Zero-norm queries match nothing.
        if query.iter().all(|x| *x == 0.0) {
            return Ok(Vec::new());
        }

        let mut hits: Vec<VectorHit> = self
            .vectors
            .iter()
            .map(|item| VectorHit {
                label: *item.key(),
                score: cosine_similarity(query, item.value()),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.label.cmp(&b.label))
        });
        hits.truncate(k);
        Ok(hits)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn clear(&self) -> MnemeResult<()> {
        self.vectors.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_orders_by_cosine() {
        let index = FlatIndex::new(2);
        index.insert(1, &[1.0, 0.0]).unwrap();
        index.insert(2, &[0.0, 1.0]).unwrap();
        index.insert(3, &[1.0, 1.0]).unwrap();

        let hits = index.search(&[1.0, 0.1], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].label, 1);
        assert_eq!(hits[1].label, 3);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn wrong_dimensions_rejected_on_insert() {
        let index = FlatIndex::new(3);
        assert!(index.insert(1, &[1.0, 0.0]).is_err());
        assert!(index.is_empty());
    }

    #[test]
    fn zero_query_matches_nothing() {
        let index = FlatIndex::new(2);
        index.insert(1, &[1.0, 0.0]).unwrap();
        assert!(index.search(&[0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn insert_replaces_and_remove_reports() {
        let index = FlatIndex::new(2);
        index.insert(7, &[1.0, 0.0]).unwrap();
        index.insert(7, &[0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 1);
        let hits = index.search(&[0.0, 1.0], 1).unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-9);

        assert!(index.remove(7).unwrap());
        assert!(!index.remove(7).unwrap());
        assert!(!index.contains(7));
    }
}
