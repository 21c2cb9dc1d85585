use proptest::prelude::*;

use mneme_core::traits::{IEmbeddingProvider, IVectorIndex};
use mneme_engine::index::cosine_similarity;
use mneme_engine::{FlatIndex, HashedTermEmbedder};

proptest! {
    #[test]
    fn cosine_stays_in_range(
        a in prop::collection::vec(-100.0f32..100.0, 8),
        b in prop::collection::vec(-100.0f32..100.0, 8),
    ) {
        let s = cosine_similarity(&a, &b);
        prop_assert!((-1.0..=1.0).contains(&s));
    }

    #[test]
    fn search_is_sorted_and_bounded(
        vectors in prop::collection::vec(prop::collection::vec(-1.0f32..1.0, 4), 0..30),
        k in 0usize..40,
    ) {
        let index = FlatIndex::new(4);
        for (label, v) in vectors.iter().enumerate() {
            index.insert(label as u64, v).unwrap();
        }
        let hits = index.search(&[0.5, -0.25, 1.0, 0.1], k).unwrap();
        prop_assert!(hits.len() <= k.min(vectors.len()));
        prop_assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn embedding_has_declared_dimensions(text in ".{0,200}", dims in 1usize..512) {
        let embedder = HashedTermEmbedder::new(dims);
        let v = embedder.embed(&text).unwrap();
        prop_assert_eq!(v.len(), dims);
        prop_assert!(v.iter().all(|x| x.is_finite()));
    }
}
