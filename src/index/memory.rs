//! In-memory posting store.
//!
//! Holds pre-tokenized documents as positional inverted lists. The store can
//! be written to and read from a JSON snapshot so the command line driver can
//! evaluate queries against a corpus prepared elsewhere.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use ahash::AHashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, XiphosError};
use crate::index::posting::{DocId, InvertedList, Position};
use crate::index::store::PostingStore;

/// Per-document data kept by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredDocument {
    external_id: String,
    field_lengths: AHashMap<String, u64>,
}

/// Per-field vocabulary and length statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FieldIndex {
    total_length: u64,
    doc_count: u64,
    terms: AHashMap<String, InvertedList>,
}

/// A posting store that keeps every inverted list in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryPostingStore {
    documents: Vec<StoredDocument>,
    fields: AHashMap<String, FieldIndex>,
    external_ids: AHashMap<String, DocId>,
}

impl InMemoryPostingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document whose fields are whitespace-separated token strings.
    ///
    /// Returns the internal ID assigned to the document. IDs are assigned in
    /// insertion order starting at 0.
    pub fn add_document<S: AsRef<str>>(
        &mut self,
        external_id: &str,
        fields: &[(&str, S)],
    ) -> Result<DocId> {
        let fields: Vec<(String, Vec<String>)> = fields
            .iter()
            .map(|(field, text)| {
                let tokens: Vec<String> = text
                    .as_ref()
                    .split_whitespace()
                    .map(str::to_string)
                    .collect();
                (field.to_string(), tokens)
            })
            .collect();
        self.add_tokens(external_id, fields)
    }

    /// Add a document whose fields are already tokenized.
    pub fn add_tokens(
        &mut self,
        external_id: &str,
        fields: Vec<(String, Vec<String>)>,
    ) -> Result<DocId> {
        if self.external_ids.contains_key(external_id) {
            return Err(XiphosError::index(format!(
                "document {external_id} was already added"
            )));
        }

        let doc_id = self.documents.len() as DocId;
        let mut document = StoredDocument {
            external_id: external_id.to_string(),
            field_lengths: AHashMap::new(),
        };

        for (field, tokens) in fields {
            if document.field_lengths.contains_key(&field) {
                return Err(XiphosError::index(format!(
                    "field {field} given twice for document {external_id}"
                )));
            }
            if tokens.is_empty() {
                continue;
            }

            // BTreeMap keeps snapshot output stable across runs.
            let mut occurrences: BTreeMap<&str, Vec<Position>> = BTreeMap::new();
            for (position, token) in tokens.iter().enumerate() {
                occurrences
                    .entry(token.as_str())
                    .or_default()
                    .push(position as Position);
            }

            let field_index = self.fields.entry(field.clone()).or_default();
            for (term, positions) in occurrences {
                field_index
                    .terms
                    .entry(term.to_string())
                    .or_insert_with(|| InvertedList::new(term, field.as_str()))
                    .append_posting(doc_id, positions)?;
            }
            field_index.total_length += tokens.len() as u64;
            field_index.doc_count += 1;
            document.field_lengths.insert(field, tokens.len() as u64);
        }

        self.external_ids.insert(external_id.to_string(), doc_id);
        self.documents.push(document);
        Ok(doc_id)
    }

    /// Number of distinct terms in a field.
    pub fn vocabulary_size(&self, field: &str) -> usize {
        self.fields.get(field).map_or(0, |index| index.terms.len())
    }

    /// Load a store from a JSON snapshot, checking posting order on the way in.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let store: InMemoryPostingStore = serde_json::from_reader(reader)?;

        for field_index in store.fields.values() {
            for list in field_index.terms.values() {
                list.validate()?;
            }
        }
        debug!(
            "loaded {} documents and {} fields from {}",
            store.documents.len(),
            store.fields.len(),
            path.display()
        );
        Ok(store)
    }

    /// Write the store as a JSON snapshot.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    fn document(&self, doc_id: DocId) -> Result<&StoredDocument> {
        usize::try_from(doc_id)
            .ok()
            .and_then(|index| self.documents.get(index))
            .ok_or_else(|| XiphosError::index(format!("unknown document {doc_id}")))
    }
}

impl PostingStore for InMemoryPostingStore {
    fn postings(&self, field: &str, term: &str) -> Result<Option<InvertedList>> {
        Ok(self
            .fields
            .get(field)
            .and_then(|index| index.terms.get(term))
            .cloned())
    }

    fn field_length(&self, field: &str, doc_id: DocId) -> Result<u64> {
        Ok(self
            .document(doc_id)?
            .field_lengths
            .get(field)
            .copied()
            .unwrap_or(0))
    }

    fn total_field_length(&self, field: &str) -> Result<u64> {
        Ok(self.fields.get(field).map_or(0, |index| index.total_length))
    }

    fn field_doc_count(&self, field: &str) -> Result<u64> {
        Ok(self.fields.get(field).map_or(0, |index| index.doc_count))
    }

    fn doc_count(&self) -> Result<u64> {
        Ok(self.documents.len() as u64)
    }

    fn external_id(&self, doc_id: DocId) -> Result<String> {
        Ok(self.document(doc_id)?.external_id.clone())
    }

    fn internal_id(&self, external_id: &str) -> Result<Option<DocId>> {
        Ok(self.external_ids.get(external_id).copied())
    }

    fn doc_freq(&self, field: &str, term: &str) -> Result<u64> {
        Ok(self
            .fields
            .get(field)
            .and_then(|index| index.terms.get(term))
            .map_or(0, |list| list.doc_freq))
    }

    fn corpus_term_freq(&self, field: &str, term: &str) -> Result<u64> {
        Ok(self
            .fields
            .get(field)
            .and_then(|index| index.terms.get(term))
            .map_or(0, |list| list.corpus_term_freq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_store() -> InMemoryPostingStore {
        let mut store = InMemoryPostingStore::new();
        store
            .add_document("d1", &[("body", "a b a c"), ("title", "a")])
            .unwrap();
        store.add_document("d2", &[("body", "b c")]).unwrap();
        store
    }

    #[test]
    fn test_postings_and_positions() {
        let store = sample_store();
        let list = store.postings("body", "a").unwrap().unwrap();

        assert_eq!(list.doc_freq, 1);
        assert_eq!(list.corpus_term_freq, 2);
        assert_eq!(list.postings[0].doc_id, 0);
        assert_eq!(list.postings[0].positions, vec![0, 2]);

        let list = store.postings("body", "c").unwrap().unwrap();
        let docs: Vec<DocId> = list.postings.iter().map(|p| p.doc_id).collect();
        assert_eq!(docs, vec![0, 1]);
    }

    #[test]
    fn test_missing_term_is_not_an_error() {
        let store = sample_store();
        assert!(store.postings("body", "zebra").unwrap().is_none());
        assert!(store.postings("url", "a").unwrap().is_none());
        assert_eq!(store.doc_freq("body", "zebra").unwrap(), 0);
    }

    #[test]
    fn test_statistics() {
        let store = sample_store();

        assert_eq!(store.doc_count().unwrap(), 2);
        assert_eq!(store.field_doc_count("body").unwrap(), 2);
        assert_eq!(store.field_doc_count("title").unwrap(), 1);
        assert_eq!(store.total_field_length("body").unwrap(), 6);
        assert_eq!(store.field_length("body", 0).unwrap(), 4);
        assert_eq!(store.field_length("title", 1).unwrap(), 0);
        assert_eq!(store.avg_field_length("body").unwrap(), 3.0);
        assert_eq!(store.vocabulary_size("body"), 3);
        assert!(store.field_length("body", 7).is_err());
    }

    #[test]
    fn test_id_mapping() {
        let store = sample_store();

        assert_eq!(store.external_id(1).unwrap(), "d2");
        assert_eq!(store.internal_id("d1").unwrap(), Some(0));
        assert_eq!(store.internal_id("d9").unwrap(), None);
        assert!(store.external_id(5).is_err());
    }

    #[test]
    fn test_duplicate_documents_rejected() {
        let mut store = sample_store();
        assert!(store.add_document("d1", &[("body", "x")]).is_err());
        assert!(
            store
                .add_document("d3", &[("body", "x"), ("body", "y")])
                .is_err()
        );
    }

    #[test]
    fn test_snapshot_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");

        let store = sample_store();
        store.save(&path).unwrap();
        let loaded = InMemoryPostingStore::load(&path).unwrap();

        assert_eq!(loaded.doc_count().unwrap(), 2);
        assert_eq!(
            loaded.postings("body", "b").unwrap(),
            store.postings("body", "b").unwrap()
        );
        assert_eq!(loaded.external_id(0).unwrap(), "d1");
    }
}
