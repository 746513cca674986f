//! # Xiphos
//!
//! Structured query evaluation over an inverted index.
//!
//! ## Features
//!
//! - Query trees of term, proximity, Boolean and belief operators
//! - Document-at-a-time evaluation over sorted posting lists
//! - Unranked Boolean, Ranked Boolean, BM25 and Indri retrieval models
//! - A structured query language (`#AND`, `#NEAR/n`, `#WSUM`, ...)
//! - Parallel evaluation of query batches and TREC run output
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use xiphos::index::InMemoryPostingStore;
//! use xiphos::model::RetrievalModel;
//! use xiphos::search::QueryEvaluator;
//!
//! let mut store = InMemoryPostingStore::new();
//! store.add_document("d1", &[("body", "apple pie")]).unwrap();
//! store.add_document("d2", &[("body", "apple tart")]).unwrap();
//!
//! let evaluator = QueryEvaluator::new(Arc::new(store), RetrievalModel::UnrankedBoolean);
//! let results = evaluator.process_query("#AND(apple pie)").unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results.doc_id(0), Some(0));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
pub mod query;
pub mod search;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
