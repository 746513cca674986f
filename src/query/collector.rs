//! Score lists for gathering evaluation results.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::index::posting::DocId;

/// A document and the score its query gave it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// Internal document ID.
    pub doc_id: DocId,
    /// Score of the document.
    pub score: f64,
}

impl ScoredDocument {
    /// Create a new scored document.
    pub fn new(doc_id: DocId, score: f64) -> Self {
        ScoredDocument { doc_id, score }
    }

    /// Ranking order: higher scores first, lower document IDs break ties.
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// The documents matched by one query with their scores.
///
/// Entries are kept in the order they were added until [`sort`](Self::sort)
/// ranks them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreList {
    entries: Vec<ScoredDocument>,
}

impl ScoreList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document and its score.
    pub fn add(&mut self, doc_id: DocId, score: f64) {
        self.entries.push(ScoredDocument::new(doc_id, score));
    }

    /// Sort by descending score, ties by ascending document ID.
    pub fn sort(&mut self) {
        self.entries.sort_by(ScoredDocument::rank_cmp);
    }

    /// Keep only the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Get the entry at a rank.
    pub fn get(&self, index: usize) -> Option<&ScoredDocument> {
        self.entries.get(index)
    }

    /// Get the document ID at a rank.
    pub fn doc_id(&self, index: usize) -> Option<DocId> {
        self.get(index).map(|entry| entry.doc_id)
    }

    /// Get the score at a rank.
    pub fn score(&self, index: usize) -> Option<f64> {
        self.get(index).map(|entry| entry.score)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in their current order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredDocument> {
        self.entries.iter()
    }

    /// Get the entries as a slice.
    pub fn as_slice(&self) -> &[ScoredDocument] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a ScoreList {
    type Item = &'a ScoredDocument;
    type IntoIter = std::slice::Iter<'a, ScoredDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for ScoreList {
    type Item = ScoredDocument;
    type IntoIter = std::vec::IntoIter<ScoredDocument>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(DocId, f64)> for ScoreList {
    fn from_iter<I: IntoIterator<Item = (DocId, f64)>>(iter: I) -> Self {
        ScoreList {
            entries: iter
                .into_iter()
                .map(|(doc_id, score)| ScoredDocument::new(doc_id, score))
                .collect(),
        }
    }
}
