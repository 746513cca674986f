//! Query evaluation driver.
//!
//! [`evaluate`] runs one prepared [`QueryTree`] over a posting store and
//! returns its ranked [`ScoreList`]. [`QueryEvaluator`] adds query string
//! handling on top and evaluates independent queries in parallel.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::{Result, XiphosError};
use crate::index::store::PostingStore;
use crate::model::RetrievalModel;
use crate::query::{QueryParser, QueryTree, ScoreList};

/// Evaluate a query tree and rank the documents it matches.
///
/// A tree without a root, or whose root has no arguments, matches nothing.
/// Otherwise the root must be a scoring operator; every document it matches
/// is scored once, in ascending document order, and the list is sorted by
/// descending score with ties in ascending document order.
pub fn evaluate(
    tree: &mut QueryTree,
    model: &RetrievalModel,
    store: &dyn PostingStore,
) -> Result<ScoreList> {
    let mut results = ScoreList::new();
    let Some(root) = tree.root() else {
        return Ok(results);
    };
    if tree.children(root).is_empty() {
        return Ok(results);
    }
    if !tree.operator(root).is_scoring() {
        return Err(XiphosError::query(format!(
            "{} cannot be the root of a query, it produces no scores",
            tree.operator(root).name()
        )));
    }

    tree.initialize(model, store)?;
    while tree.has_match(root, model)? {
        let doc_id = tree
            .current_match(root)
            .ok_or_else(|| XiphosError::internal("matched root has no current document"))?;
        let score = tree.get_score(root, model, store)?;
        results.add(doc_id, score);
        tree.advance_past(root, doc_id);
    }

    results.sort();
    Ok(results)
}

/// Evaluates query strings against one posting store with one retrieval model.
#[derive(Debug, Clone)]
pub struct QueryEvaluator {
    /// The index queries are evaluated against.
    store: Arc<dyn PostingStore>,
    /// Retrieval model used for matching and scoring.
    model: RetrievalModel,
    /// Parser for query strings.
    parser: QueryParser,
    /// Pool for batch evaluation; the global rayon pool when absent.
    thread_pool: Option<Arc<ThreadPool>>,
}

impl QueryEvaluator {
    /// Create a new evaluator.
    pub fn new(store: Arc<dyn PostingStore>, model: RetrievalModel) -> Self {
        QueryEvaluator {
            store,
            model,
            parser: QueryParser::new(),
            thread_pool: None,
        }
    }

    /// Use a dedicated pool of `threads` workers for batch evaluation.
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("xiphos-eval-{i}"))
            .build()
            .map_err(|e| XiphosError::internal(format!("Failed to create thread pool: {e}")))?;
        self.thread_pool = Some(Arc::new(thread_pool));
        Ok(self)
    }

    /// Use a different query parser.
    pub fn with_parser(mut self, parser: QueryParser) -> Self {
        self.parser = parser;
        self
    }

    /// Get the retrieval model.
    pub fn model(&self) -> &RetrievalModel {
        &self.model
    }

    /// Get the posting store.
    pub fn store(&self) -> &dyn PostingStore {
        self.store.as_ref()
    }

    /// Parse a query string after wrapping it in the model's default operator.
    pub fn parse(&self, query: &str) -> Result<QueryTree> {
        self.parser.parse(&self.model.wrap_query(query))
    }

    /// Parse and evaluate one query string.
    pub fn process_query(&self, query: &str) -> Result<ScoreList> {
        let start = Instant::now();
        let mut tree = self.parse(query)?;
        debug!("evaluating {tree} with {}", self.model.name());

        let results = self.evaluate(&mut tree)?;
        info!(
            "{} documents matched {query:?} in {:?}",
            results.len(),
            start.elapsed()
        );
        Ok(results)
    }

    /// Evaluate a prepared query tree.
    pub fn evaluate(&self, tree: &mut QueryTree) -> Result<ScoreList> {
        evaluate(tree, &self.model, self.store.as_ref())
    }

    /// Evaluate independent query strings in parallel.
    ///
    /// Results come back in input order; a failing query does not affect the
    /// others.
    pub fn evaluate_batch<Q>(&self, queries: &[Q]) -> Vec<Result<ScoreList>>
    where
        Q: AsRef<str> + Sync,
    {
        let run = || -> Vec<Result<ScoreList>> {
            queries
                .par_iter()
                .map(|query| self.process_query(query.as_ref()))
                .collect()
        };
        match &self.thread_pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
