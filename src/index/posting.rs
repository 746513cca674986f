//! Postings and inverted lists.
//!
//! An [`InvertedList`] is either read from a posting store for one
//! (term, field) pair or synthesized by a proximity operator. Both kinds are
//! read-only once built.

use serde::{Deserialize, Serialize};

use crate::error::{Result, XiphosError};

/// Internal document identifier assigned by the posting store.
pub type DocId = u64;

/// Token position within one field of one document.
pub type Position = u32;

/// Occurrences of one term (or proximity match) in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// The document ID.
    pub doc_id: DocId,
    /// Ascending, duplicate-free positions.
    pub positions: Vec<Position>,
}

impl Posting {
    /// Create a posting, rejecting positions that are not strictly increasing.
    pub fn new(doc_id: DocId, positions: Vec<Position>) -> Result<Self> {
        if positions.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(XiphosError::index(format!(
                "positions of document {doc_id} are not strictly increasing: {positions:?}"
            )));
        }
        Ok(Posting { doc_id, positions })
    }

    /// Number of occurrences in the document.
    pub fn term_freq(&self) -> u64 {
        self.positions.len() as u64
    }
}

/// Ordered-by-docid postings for a term, a field and its corpus statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedList {
    /// Term text, or an operator label for synthesized lists.
    pub term: String,
    /// The field the postings belong to.
    pub field: String,
    /// Number of documents containing the term.
    pub doc_freq: u64,
    /// Total number of occurrences across the corpus.
    pub corpus_term_freq: u64,
    /// Postings in strictly ascending document order.
    pub postings: Vec<Posting>,
}

impl InvertedList {
    /// Create an empty list.
    pub fn new<T: Into<String>, F: Into<String>>(term: T, field: F) -> Self {
        InvertedList {
            term: term.into(),
            field: field.into(),
            doc_freq: 0,
            corpus_term_freq: 0,
            postings: Vec::new(),
        }
    }

    /// Append a posting for a document after every document already present.
    ///
    /// Document frequency and corpus term frequency are updated from the
    /// appended posting.
    pub fn append_posting(&mut self, doc_id: DocId, positions: Vec<Position>) -> Result<()> {
        if let Some(last) = self.postings.last()
            && last.doc_id >= doc_id
        {
            return Err(XiphosError::index(format!(
                "posting for document {doc_id} appended after document {} in {}.{}",
                last.doc_id, self.term, self.field
            )));
        }

        let posting = Posting::new(doc_id, positions)?;
        self.doc_freq += 1;
        self.corpus_term_freq += posting.term_freq();
        self.postings.push(posting);
        Ok(())
    }

    /// Number of postings.
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Check if the list has no postings.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Get the posting at an index.
    pub fn get(&self, index: usize) -> Option<&Posting> {
        self.postings.get(index)
    }

    /// Check the ordering invariants of a list received from elsewhere.
    pub fn validate(&self) -> Result<()> {
        if self
            .postings
            .windows(2)
            .any(|pair| pair[0].doc_id >= pair[1].doc_id)
        {
            return Err(XiphosError::index(format!(
                "postings of {}.{} are not in ascending document order",
                self.term, self.field
            )));
        }
        for posting in &self.postings {
            Posting::new(posting.doc_id, posting.positions.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posting_rejects_unordered_positions() {
        assert!(Posting::new(1, vec![1, 4, 9]).is_ok());
        assert!(Posting::new(1, vec![4, 4]).is_err());
        assert!(Posting::new(1, vec![5, 2]).is_err());
    }

    #[test]
    fn test_append_updates_statistics() {
        let mut list = InvertedList::new("#NEAR/1", "body");
        list.append_posting(3, vec![1, 7]).unwrap();
        list.append_posting(8, vec![2]).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.doc_freq, 2);
        assert_eq!(list.corpus_term_freq, 3);
        assert_eq!(list.get(0).unwrap().term_freq(), 2);
    }

    #[test]
    fn test_append_rejects_out_of_order_documents() {
        let mut list = InvertedList::new("apple", "body");
        list.append_posting(5, vec![0]).unwrap();

        assert!(list.append_posting(5, vec![1]).is_err());
        assert!(list.append_posting(2, vec![1]).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_validate() {
        let mut list = InvertedList::new("apple", "body");
        list.postings.push(Posting {
            doc_id: 4,
            positions: vec![1],
        });
        list.postings.push(Posting {
            doc_id: 2,
            positions: vec![1],
        });
        assert!(list.validate().is_err());

        list.postings.swap(0, 1);
        assert!(list.validate().is_ok());
    }
}
