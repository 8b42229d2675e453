//! The flat index module
//! Exact brute-force k-NN over dimension-locked vector storage

use crate::error::StoreError;
use crate::vector::squared_distance;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: i64,
    pub text: String,
    pub distance: f32,
}

/// In-memory flat index over documents.
///
/// Vectors are stored contiguously as `[v1_d1, v1_d2, ..., v2_d1, v2_d2, ...]`
/// with parallel `ids` and `texts` sequences. The three sequences always
/// describe the same number of documents.
#[derive(Debug, Default, PartialEq)]
pub struct FlatIndex {
    ids: Vec<i64>,
    texts: Vec<String>,
    vectors: Vec<f32>,
    dimension: Option<usize>,
}

impl FlatIndex {
    /// Creates a new empty index.
    ///
    /// The index starts with no dimension constraint. The dimension is fixed
    /// by the first insert and never changes afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use semdb::FlatIndex;
    ///
    /// let index = FlatIndex::new();
    /// assert_eq!(index.count(), 0);
    /// ```
    pub fn new() -> FlatIndex {
        FlatIndex { ids: Vec::new(), texts: Vec::new(), vectors: Vec::new(), dimension: None }
    }

    /// Appends a document to the index.
    ///
    /// The first insert fixes the index dimension. Later inserts with a
    /// different dimension are rejected and leave the index unchanged, so
    /// distance semantics can never be corrupted by mixed-width storage.
    /// Documents are immutable once inserted; there is no update or delete.
    ///
    /// # Arguments
    ///
    /// * `vector` - Embedding vector for the document
    /// * `id` - Document identifier
    /// * `text` - Original document text
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Document appended
    /// * `Err(StoreError::DimensionMismatch)` - Vector width differs from the
    ///   index dimension
    ///
    /// # Examples
    ///
    /// ```
    /// use semdb::FlatIndex;
    ///
    /// let mut index = FlatIndex::new();
    /// index.insert(&[1.0, 0.0, 0.0], 1, "cat".to_string()).unwrap();
    ///
    /// // Dimension is now locked to 3
    /// let result = index.insert(&[1.0, 0.0], 2, "dog".to_string());
    /// assert!(result.is_err());
    /// assert_eq!(index.count(), 1);
    /// ```
    pub fn insert(&mut self, vector: &[f32], id: i64, text: String) -> Result<(), StoreError> {
        match self.dimension {
            None => {
                self.dimension = Some(vector.len());
            }
            Some(expected) => {
                if vector.len() != expected {
                    return Err(StoreError::DimensionMismatch { expected, actual: vector.len() });
                }
            }
        }

        self.vectors.extend_from_slice(vector);
        self.ids.push(id);
        self.texts.push(text);

        Ok(())
    }

    /// Searches for the `top_k` documents nearest to the query vector.
    ///
    /// Every stored vector is compared against the query using squared
    /// Euclidean distance (brute force, O(n·d)). Results are ordered by
    /// ascending distance with ties broken by lower insertion index, so the
    /// ordering is reproducible. At most `min(top_k, count)` hits are
    /// returned; an uninitialized index yields no hits.
    ///
    /// A query whose dimension differs from the index dimension is still
    /// answered, but a warning is logged since the distances are computed
    /// over the overlapping components only.
    ///
    /// # Examples
    ///
    /// ```
    /// use semdb::FlatIndex;
    ///
    /// let mut index = FlatIndex::new();
    /// index.insert(&[1.0, 0.0, 0.0], 1, "cat".to_string()).unwrap();
    /// index.insert(&[0.0, 1.0, 0.0], 2, "dog".to_string()).unwrap();
    /// index.insert(&[0.7, 0.7, 0.0], 3, "car".to_string()).unwrap();
    ///
    /// let hits = index.search(&[0.9, 0.1, 0.0], 2);
    /// assert_eq!(hits.len(), 2);
    /// assert_eq!(hits[0].id, 1); // nearest
    /// assert!(hits[0].distance <= hits[1].distance);
    /// ```
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<SearchHit> {
        let Some(dimension) = self.dimension else {
            return Vec::new();
        };

        if query.len() != dimension {
            warn!(
                query_dimension = query.len(),
                index_dimension = dimension,
                "query vector dimension does not match index dimension"
            );
        }

        let mut scored: Vec<(usize, f32)> = (0..self.ids.len())
            .map(|i| (i, squared_distance(query, self.vector_at(i))))
            .collect();

        // Ascending distance, equal distances resolved by insertion order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        scored.into_iter()
            .map(|(i, distance)| SearchHit {
                id: self.ids[i],
                text: self.texts[i].clone(),
                distance,
            })
            .collect()
    }

    /// Returns the number of stored documents.
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// Returns the locked dimension, or `None` before the first insert.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub(crate) fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub(crate) fn texts(&self) -> &[String] {
        &self.texts
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }

    /// Reassembles an index from decoded artifacts.
    ///
    /// The parts must satisfy the parallel-sequence invariant; anything else
    /// is reported as corrupt data.
    pub(crate) fn from_parts(
        dimension: Option<usize>,
        ids: Vec<i64>,
        texts: Vec<String>,
        vectors: Vec<f32>,
    ) -> Result<FlatIndex, StoreError> {
        if ids.len() != texts.len() {
            return Err(StoreError::Corrupt(format!(
                "{} ids but {} texts", ids.len(), texts.len()
            )));
        }

        match dimension {
            None => {
                if !ids.is_empty() || !vectors.is_empty() {
                    return Err(StoreError::Corrupt(
                        "document data present without a dimension".to_string(),
                    ));
                }
            }
            Some(d) => {
                if ids.len() * d != vectors.len() {
                    return Err(StoreError::Corrupt(format!(
                        "{} vector components do not match {} documents of dimension {}",
                        vectors.len(), ids.len(), d
                    )));
                }
            }
        }

        Ok(FlatIndex { ids, texts, vectors, dimension })
    }

    /// Retrieves a vector slice from the flat array by index.
    ///
    /// # Panics
    ///
    /// Panics if the dimension is `None` or the index is out of bounds.
    fn vector_at(&self, index: usize) -> &[f32] {
        let dim = self.dimension.unwrap();
        &self.vectors[index * dim..(index + 1) * dim]
    }
}

#[cfg(test)]
mod index_test {
    use super::*;

    #[test]
    fn test_insert_single_document() {
        let mut index = FlatIndex::new();
        let result = index.insert(&[1.0, 2.0, 3.0], 1, "first".to_string());

        assert!(result.is_ok());
        assert_eq!(index.count(), 1);
        assert_eq!(index.dimension(), Some(3));
        assert_eq!(index.vectors.len(), 3);
        assert_eq!(index.texts[0], "first");
    }

    #[test]
    fn test_insert_multiple_documents() {
        let mut index = FlatIndex::new();

        index.insert(&[1.0, 0.0, 0.0], 1, "a".to_string()).unwrap();
        index.insert(&[0.0, 1.0, 0.0], 2, "b".to_string()).unwrap();
        index.insert(&[0.0, 0.0, 1.0], 3, "c".to_string()).unwrap();

        assert_eq!(index.count(), 3);
        assert_eq!(index.vectors.len(), 9); // 3 vectors × 3 dimensions
    }

    #[test]
    fn test_insert_dimension_mismatch_leaves_index_unchanged() {
        let mut index = FlatIndex::new();
        index.insert(&[1.0, 2.0, 3.0, 4.0], 1, "a".to_string()).unwrap();

        let result = index.insert(&[1.0, 2.0, 3.0], 2, "b".to_string());

        match result {
            Err(StoreError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("expected DimensionMismatch, got {:?}", other),
        }
        assert_eq!(index.count(), 1);
        assert_eq!(index.vectors.len(), 4);
        assert_eq!(index.texts.len(), 1);
    }

    #[test]
    fn test_count_is_monotonic() {
        let mut index = FlatIndex::new();

        for i in 0..10 {
            index.insert(&[i as f32, 0.0], i, format!("doc {}", i)).unwrap();
            assert_eq!(index.count(), (i + 1) as usize);
        }

        // A failed insert does not decrease the count
        assert!(index.insert(&[1.0], 99, "bad".to_string()).is_err());
        assert_eq!(index.count(), 10);
    }

    #[test]
    fn test_search_exact_nearest_neighbor() {
        let mut index = FlatIndex::new();
        index.insert(&[1.0, 0.0, 0.0], 1, "cat".to_string()).unwrap();
        index.insert(&[0.0, 1.0, 0.0], 2, "dog".to_string()).unwrap();
        index.insert(&[0.7, 0.7, 0.0], 3, "car".to_string()).unwrap();

        let query = [0.9, 0.05, 0.0];
        let hits = index.search(&query, 1);

        // Independently computed reference: distance to each stored vector
        let reference = [
            (1, 0.01f32 + 0.0025),
            (2, 0.81 + 0.9025),
            (3, 0.04 + 0.4225),
        ];
        let expected = reference.iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, expected.0);
        assert!((hits[0].distance - expected.1).abs() < 1e-6);
    }

    #[test]
    fn test_search_orders_by_ascending_distance() {
        let mut index = FlatIndex::new();
        index.insert(&[0.0, 0.0], 1, "origin".to_string()).unwrap();
        index.insert(&[3.0, 0.0], 2, "far".to_string()).unwrap();
        index.insert(&[1.0, 0.0], 3, "near".to_string()).unwrap();

        let hits = index.search(&[0.0, 0.0], 3);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].id, 1);
        assert_eq!(hits[1].id, 3);
        assert_eq!(hits[2].id, 2);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_search_ties_broken_by_insertion_order() {
        let mut index = FlatIndex::new();
        // Two documents at the same distance from the query
        index.insert(&[1.0, 0.0], 7, "east".to_string()).unwrap();
        index.insert(&[-1.0, 0.0], 3, "west".to_string()).unwrap();
        index.insert(&[0.0, 1.0], 9, "north".to_string()).unwrap();

        let hits = index.search(&[0.0, 0.0], 3);

        // All three are tied at distance 1.0; insertion order decides
        assert_eq!(hits[0].id, 7);
        assert_eq!(hits[1].id, 3);
        assert_eq!(hits[2].id, 9);
    }

    #[test]
    fn test_search_returns_at_most_count() {
        let mut index = FlatIndex::new();
        index.insert(&[1.0, 0.0], 1, "a".to_string()).unwrap();
        index.insert(&[0.0, 1.0], 2, "b".to_string()).unwrap();

        let hits = index.search(&[1.0, 1.0], 10);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_uninitialized_index_is_empty() {
        let index = FlatIndex::new();

        let hits = index.search(&[1.0, 2.0], 5);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_search_mismatched_query_dimension_still_answers() {
        let mut index = FlatIndex::new();
        index.insert(&[1.0, 2.0, 3.0], 1, "a".to_string()).unwrap();

        // Lenient: warns and computes over the overlapping components
        let hits = index.search(&[1.0, 2.0], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn test_search_includes_text_and_distance() {
        let mut index = FlatIndex::new();
        index.insert(&[2.0, 0.0], 42, "the answer".to_string()).unwrap();

        let hits = index.search(&[0.0, 0.0], 1);

        assert_eq!(hits[0].text, "the answer");
        assert!((hits[0].distance - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let mut index = FlatIndex::new();
        index.insert(&[1.0, 2.0], 1, "a".to_string()).unwrap();
        index.insert(&[3.0, 4.0], 2, "b".to_string()).unwrap();

        let rebuilt = FlatIndex::from_parts(
            index.dimension(),
            index.ids().to_vec(),
            index.texts().to_vec(),
            index.raw_vectors().to_vec(),
        )
        .unwrap();

        assert_eq!(rebuilt, index);
    }

    #[test]
    fn test_from_parts_rejects_length_mismatch() {
        let result = FlatIndex::from_parts(
            Some(2),
            vec![1, 2],
            vec!["a".to_string(), "b".to_string()],
            vec![1.0, 2.0, 3.0], // 3 components for 2 documents of dim 2
        );

        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_from_parts_rejects_data_without_dimension() {
        let result = FlatIndex::from_parts(
            None,
            vec![1],
            vec!["a".to_string()],
            vec![],
        );

        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
