//! The read-only index boundary used by query evaluation.

use std::fmt::Debug;

use crate::error::Result;
use crate::index::posting::{DocId, InvertedList};

/// Read access to postings and corpus statistics.
///
/// Evaluation only reads from the store. Implementations must be safe for
/// concurrent readers when independent queries are evaluated in parallel.
pub trait PostingStore: Send + Sync + Debug {
    /// Get the inverted list for a term in a field.
    ///
    /// Returns `Ok(None)` when the term is not in the field's vocabulary.
    fn postings(&self, field: &str, term: &str) -> Result<Option<InvertedList>>;

    /// Get the length in tokens of a field of a document.
    fn field_length(&self, field: &str, doc_id: DocId) -> Result<u64>;

    /// Get the total number of tokens in a field across the corpus.
    fn total_field_length(&self, field: &str) -> Result<u64>;

    /// Get the number of documents that have the field.
    fn field_doc_count(&self, field: &str) -> Result<u64>;

    /// Get the number of documents in the corpus.
    fn doc_count(&self) -> Result<u64>;

    /// Translate an internal document ID to the external identifier.
    fn external_id(&self, doc_id: DocId) -> Result<String>;

    /// Translate an external identifier to the internal document ID.
    fn internal_id(&self, external_id: &str) -> Result<Option<DocId>>;

    /// Get the number of documents in a field containing a term.
    fn doc_freq(&self, field: &str, term: &str) -> Result<u64> {
        match self.postings(field, term)? {
            Some(list) => Ok(list.doc_freq),
            None => Ok(0),
        }
    }

    /// Get the number of occurrences of a term in a field across the corpus.
    fn corpus_term_freq(&self, field: &str, term: &str) -> Result<u64> {
        match self.postings(field, term)? {
            Some(list) => Ok(list.corpus_term_freq),
            None => Ok(0),
        }
    }

    /// Get the average length of a field over documents that have it.
    fn avg_field_length(&self, field: &str) -> Result<f64> {
        let doc_count = self.field_doc_count(field)?;
        if doc_count == 0 {
            return Ok(0.0);
        }
        Ok(self.total_field_length(field)? as f64 / doc_count as f64)
    }
}
