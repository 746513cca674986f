//! Scoring of term and proximity matches.
//!
//! A `#SCORE` node turns the matches of the inverted list below it into
//! numbers. Which number depends on the retrieval model: the Boolean models
//! use constant or frequency scores, BM25 and Indri use the statistics of the
//! list and the store through [`Bm25Scorer`] and [`IndriScorer`].
//!
//! The per-operator dispatch for every scoring node lives here too; the
//! combinators themselves are implemented in `boolean` and `belief`.

use std::fmt::Debug;

use crate::error::{Result, XiphosError};
use crate::index::posting::DocId;
use crate::index::store::PostingStore;
use crate::model::RetrievalModel;
use crate::query::node::{NodeId, Operator, QueryTree};

/// Trait for per-document term scorers.
pub trait Scorer: Send + Debug {
    /// Calculate the score of a document containing the term `term_freq`
    /// times in a field of `doc_length` tokens.
    fn score(&self, term_freq: u64, doc_length: u64) -> f64;

    /// Get the name of this scorer.
    fn name(&self) -> &'static str;
}

/// BM25 scorer for one inverted list.
#[derive(Debug, Clone)]
pub struct Bm25Scorer {
    /// Document frequency of the term.
    doc_freq: u64,
    /// Number of documents in the corpus.
    total_docs: u64,
    /// Average length of the field.
    avg_field_length: f64,
    k1: f64,
    b: f64,
    k3: f64,
}

impl Bm25Scorer {
    /// Create a new BM25 scorer.
    pub fn new(
        doc_freq: u64,
        total_docs: u64,
        avg_field_length: f64,
        k1: f64,
        b: f64,
        k3: f64,
    ) -> Self {
        Bm25Scorer {
            doc_freq,
            total_docs,
            avg_field_length,
            k1,
            b,
            k3,
        }
    }

    /// Robertson-Sparck Jones weight of the term.
    ///
    /// Negative for terms in more than half of the corpus.
    pub fn idf(&self) -> f64 {
        let n = self.total_docs as f64;
        let df = self.doc_freq as f64;

        // RSJ = log((N - df + 0.5) / (df + 0.5))
        ((n - df + 0.5) / (df + 0.5)).ln()
    }

    /// Saturated, length-normalized term frequency.
    pub fn tf(&self, term_freq: u64, doc_length: u64) -> f64 {
        let tf = term_freq as f64;
        let length_ratio = if self.avg_field_length > 0.0 {
            doc_length as f64 / self.avg_field_length
        } else {
            0.0
        };
        let norm = self.k1 * (1.0 - self.b + self.b * length_ratio);
        if tf + norm == 0.0 {
            return 0.0;
        }
        tf / (tf + norm)
    }

    /// Query term weight. Query terms are never repeated, so qtf is 1.
    pub fn user_weight(&self) -> f64 {
        let qtf = 1.0;
        (self.k3 + 1.0) * qtf / (self.k3 + qtf)
    }
}

impl Scorer for Bm25Scorer {
    fn score(&self, term_freq: u64, doc_length: u64) -> f64 {
        self.idf() * self.tf(term_freq, doc_length) * self.user_weight()
    }

    fn name(&self) -> &'static str {
        "BM25"
    }
}

/// Indri scorer for one inverted list.
///
/// Mixes a Dirichlet-smoothed document model with the collection model using
/// Jelinek-Mercer interpolation.
#[derive(Debug, Clone)]
pub struct IndriScorer {
    /// Maximum likelihood estimate of the term in the collection.
    collection_prob: f64,
    mu: f64,
    lambda: f64,
}

impl IndriScorer {
    /// Create a new Indri scorer from the list's corpus term frequency and
    /// the number of tokens in the field.
    pub fn new(corpus_term_freq: u64, field_tokens: u64, mu: f64, lambda: f64) -> Self {
        let collection_prob = if field_tokens == 0 {
            0.0
        } else {
            corpus_term_freq as f64 / field_tokens as f64
        };
        IndriScorer {
            collection_prob,
            mu,
            lambda,
        }
    }

    /// Get the collection probability of the term.
    pub fn collection_prob(&self) -> f64 {
        self.collection_prob
    }
}

impl Scorer for IndriScorer {
    fn score(&self, term_freq: u64, doc_length: u64) -> f64 {
        let smoothing = doc_length as f64 + self.mu;
        let document = if smoothing == 0.0 {
            0.0
        } else {
            (term_freq as f64 + self.mu * self.collection_prob) / smoothing
        };
        (1.0 - self.lambda) * document + self.lambda * self.collection_prob
    }

    fn name(&self) -> &'static str {
        "Indri"
    }
}

impl QueryTree {
    /// Score the current match of a scoring node.
    ///
    /// The node must have a match, i.e. the last [`has_match`](Self::has_match)
    /// returned true and it has not been advanced since.
    pub fn get_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
    ) -> Result<f64> {
        let doc_id = self.current_match(id).ok_or_else(|| {
            XiphosError::query(format!("node {id} has no current match to score"))
        })?;

        match self.nodes[id].operator {
            Operator::Score => self.score_term(id, model, store, doc_id),
            Operator::And => self.and_score(id, model, store, doc_id),
            Operator::Or => self.or_score(id, model, store, doc_id),
            Operator::Sum => self.sum_score(id, model, store, doc_id),
            Operator::Wand => self.wand_score(id, model, store, doc_id),
            Operator::Wsum => self.wsum_score(id, model, store, doc_id),
            ref operator => Err(XiphosError::query(format!(
                "{} produces an inverted list, not scores",
                operator.name()
            ))),
        }
    }

    /// Score a document the node does not match.
    ///
    /// Only the Indri model gives non-matching documents a belief; the other
    /// operators that tolerate partial matches contribute nothing.
    pub fn default_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        match self.nodes[id].operator {
            Operator::Score => self.default_term_score(id, model, store, doc_id),
            Operator::And => self.and_default_score(id, model, store, doc_id),
            Operator::Or | Operator::Sum => Ok(0.0),
            Operator::Wand => self.wand_default_score(id, model, store, doc_id),
            Operator::Wsum => self.wsum_default_score(id, model, store, doc_id),
            ref operator => Err(XiphosError::query(format!(
                "{} produces an inverted list, not scores",
                operator.name()
            ))),
        }
    }

    /// Score of a child: its own score when it matches `doc_id`, its default
    /// score otherwise.
    pub(crate) fn belief(
        &self,
        child: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if self.matches_doc(child, doc_id) {
            self.get_score(child, model, store)
        } else {
            self.default_score(child, model, store, doc_id)
        }
    }

    fn score_term(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        let child = self.score_child(id)?;
        let term_freq = self.current_posting(child).map_or(0, |posting| posting.term_freq());

        match *model {
            RetrievalModel::UnrankedBoolean => Ok(1.0),
            RetrievalModel::RankedBoolean => Ok(term_freq as f64),
            RetrievalModel::Bm25 { .. } | RetrievalModel::Indri { .. } => {
                let scorer = self.term_scorer(child, model, store)?;
                let field = self.field(child).unwrap_or_default();
                Ok(scorer.score(term_freq, store.field_length(field, doc_id)?))
            }
        }
    }

    fn default_term_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if !matches!(model, RetrievalModel::Indri { .. }) {
            return Err(XiphosError::unsupported("#SCORE", model.name()));
        }
        let child = self.score_child(id)?;
        let scorer = self.term_scorer(child, model, store)?;
        let field = self.field(child).unwrap_or_default();
        Ok(scorer.score(0, store.field_length(field, doc_id)?))
    }

    /// Build the model's scorer for a term or proximity node.
    fn term_scorer(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
    ) -> Result<Box<dyn Scorer>> {
        let list = self.nodes[id]
            .list
            .as_ref()
            .ok_or_else(|| XiphosError::query(format!("node {id} was not initialized")))?;
        let field = list.field.as_str();

        match *model {
            RetrievalModel::Bm25 { k1, b, k3 } => Ok(Box::new(Bm25Scorer::new(
                list.doc_freq,
                store.doc_count()?,
                store.avg_field_length(field)?,
                k1,
                b,
                k3,
            ))),
            RetrievalModel::Indri { mu, lambda } => Ok(Box::new(IndriScorer::new(
                list.corpus_term_freq,
                store.total_field_length(field)?,
                mu,
                lambda,
            ))),
            _ => Err(XiphosError::unsupported("#SCORE", model.name())),
        }
    }

    fn score_child(&self, id: NodeId) -> Result<NodeId> {
        self.nodes[id]
            .children
            .first()
            .copied()
            .ok_or_else(|| XiphosError::query("#SCORE has no argument"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::InMemoryPostingStore;

    const EPSILON: f64 = 1e-9;

    fn store() -> InMemoryPostingStore {
        let mut store = InMemoryPostingStore::new();
        store.add_document("d0", &[("body", "apple pie apple")]).unwrap();
        store.add_document("d1", &[("body", "banana")]).unwrap();
        store.add_document("d2", &[("body", "apple tart")]).unwrap();
        store.add_document("d3", &[("body", "cherry pie")]).unwrap();
        store
    }

    fn score_tree(term: &str) -> (QueryTree, NodeId) {
        let mut tree = QueryTree::new();
        let leaf = tree.add_term(term, "body");
        let score = tree.add_operator(Operator::Score, vec![leaf]).unwrap();
        tree.set_root(score).unwrap();
        (tree, score)
    }

    #[test]
    fn test_bm25_scorer() {
        let scorer = Bm25Scorer::new(2, 4, 2.0, 1.2, 0.75, 0.0);

        let expected_idf = (2.5f64 / 2.5).ln();
        assert!((scorer.idf() - expected_idf).abs() < EPSILON);
        assert!((scorer.user_weight() - 1.0).abs() < EPSILON);
        assert!(scorer.tf(2, 2) > scorer.tf(1, 2));
        assert!(scorer.tf(1, 1) > scorer.tf(1, 4));
        assert_eq!(scorer.tf(0, 3), 0.0);
        assert_eq!(scorer.name(), "BM25");

        let rare = Bm25Scorer::new(1, 100, 10.0, 1.2, 0.75, 0.0);
        let common = Bm25Scorer::new(90, 100, 10.0, 1.2, 0.75, 0.0);
        assert!(rare.idf() > 0.0);
        assert!(common.idf() < 0.0);
    }

    #[test]
    fn test_indri_scorer() {
        let scorer = IndriScorer::new(3, 8, 2500.0, 0.4);
        let p = 3.0 / 8.0;
        assert!((scorer.collection_prob() - p).abs() < EPSILON);

        let expected = 0.6 * (2.0 + 2500.0 * p) / (3.0 + 2500.0) + 0.4 * p;
        assert!((scorer.score(2, 3) - expected).abs() < EPSILON);
        assert!(scorer.score(2, 3) > scorer.score(0, 3));

        let empty = IndriScorer::new(0, 0, 0.0, 0.5);
        assert_eq!(empty.score(0, 0), 0.0);
    }

    #[test]
    fn test_boolean_term_scores() {
        let store = store();

        let (mut tree, score) = score_tree("apple");
        let model = RetrievalModel::UnrankedBoolean;
        tree.initialize(&model, &store).unwrap();
        assert!(tree.has_match(score, &model).unwrap());
        assert_eq!(tree.get_score(score, &model, &store).unwrap(), 1.0);

        let model = RetrievalModel::RankedBoolean;
        tree.initialize(&model, &store).unwrap();
        assert!(tree.has_match(score, &model).unwrap());
        assert_eq!(tree.get_score(score, &model, &store).unwrap(), 2.0);
        assert!(tree.default_score(score, &model, &store, 1).is_err());
    }

    #[test]
    fn test_bm25_term_score() {
        let store = store();
        let (mut tree, score) = score_tree("banana");
        let model = RetrievalModel::bm25(1.2, 0.75, 0.0).unwrap();
        tree.initialize(&model, &store).unwrap();
        assert!(tree.has_match(score, &model).unwrap());

        // N = 4, df = 1, doc length 1, average length 2
        let idf = (3.5f64 / 1.5).ln();
        let tf = 1.0 / (1.0 + 1.2 * (0.25 + 0.75 * 0.5));
        let expected = idf * tf;
        assert!((tree.get_score(score, &model, &store).unwrap() - expected).abs() < EPSILON);

        // A term in half of the corpus carries no weight.
        let (mut tree, score) = score_tree("pie");
        tree.initialize(&model, &store).unwrap();
        assert!(tree.has_match(score, &model).unwrap());
        assert!(tree.get_score(score, &model, &store).unwrap().abs() < EPSILON);
        assert!(tree.default_score(score, &model, &store, 1).is_err());
    }

    #[test]
    fn test_indri_term_scores() {
        let store = store();
        let (mut tree, score) = score_tree("banana");
        let model = RetrievalModel::indri(2.0, 0.2).unwrap();
        tree.initialize(&model, &store).unwrap();
        assert!(tree.has_match(score, &model).unwrap());

        let p = 1.0 / 8.0;
        let matched = 0.8 * (1.0 + 2.0 * p) / (1.0 + 2.0) + 0.2 * p;
        assert!((tree.get_score(score, &model, &store).unwrap() - matched).abs() < EPSILON);

        let unmatched = 0.8 * (2.0 * p) / (3.0 + 2.0) + 0.2 * p;
        let default = tree.default_score(score, &model, &store, 0).unwrap();
        assert!((default - unmatched).abs() < EPSILON);
    }

    #[test]
    fn test_inverted_lists_have_no_score() {
        let store = store();
        let mut tree = QueryTree::new();
        let leaf = tree.add_term("apple", "body");
        tree.set_root(leaf).unwrap();
        let model = RetrievalModel::RankedBoolean;
        tree.initialize(&model, &store).unwrap();
        assert!(tree.has_match(leaf, &model).unwrap());
        assert!(tree.get_score(leaf, &model, &store).is_err());
    }
}
