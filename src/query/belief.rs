//! Belief combinators: `#SUM`, `#WAND` and `#WSUM`.
//!
//! `#SUM` adds the BM25 scores of the arguments that match a document.
//! `#WAND` and `#WSUM` combine Indri beliefs as weighted geometric and
//! arithmetic means. An argument that does not match the document contributes
//! its default score, so every document matched by any argument gets a
//! belief from all of them.

use crate::error::{Result, XiphosError};
use crate::index::posting::DocId;
use crate::index::store::PostingStore;
use crate::model::RetrievalModel;
use crate::query::node::{NodeId, QueryTree};

impl QueryTree {
    /// Weights of a node's arguments divided by their sum.
    ///
    /// Fails when the weights sum to zero.
    pub fn normalized_weights(&self, id: NodeId) -> Result<Vec<f64>> {
        let weights: Vec<f64> = self.nodes[id]
            .children
            .iter()
            .map(|&child| self.effective_weight(child))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(XiphosError::invalid_weight(format!(
                "weights of {} sum to {total}",
                self.nodes[id].operator.name()
            )));
        }
        Ok(weights.into_iter().map(|weight| weight / total).collect())
    }

    pub(crate) fn sum_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if !matches!(model, RetrievalModel::Bm25 { .. }) {
            return Err(XiphosError::unsupported("#SUM", model.name()));
        }

        let mut score = 0.0;
        for &child in &self.nodes[id].children {
            if self.matches_doc(child, doc_id) {
                score += self.get_score(child, model, store)?;
            }
        }
        Ok(score)
    }

    pub(crate) fn wand_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if !matches!(model, RetrievalModel::Indri { .. }) {
            return Err(XiphosError::unsupported("#WAND", model.name()));
        }
        self.weighted_product(id, model, store, doc_id)
    }

    pub(crate) fn wand_default_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if !matches!(model, RetrievalModel::Indri { .. }) {
            return Err(XiphosError::unsupported("#WAND", model.name()));
        }
        self.weighted_default_product(id, model, store, doc_id)
    }

    pub(crate) fn wsum_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if !matches!(model, RetrievalModel::Indri { .. }) {
            return Err(XiphosError::unsupported("#WSUM", model.name()));
        }

        let weights = self.normalized_weights(id)?;
        let mut score = 0.0;
        for (&child, weight) in self.nodes[id].children.iter().zip(weights) {
            score += weight * self.belief(child, model, store, doc_id)?;
        }
        Ok(score)
    }

    pub(crate) fn wsum_default_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if !matches!(model, RetrievalModel::Indri { .. }) {
            return Err(XiphosError::unsupported("#WSUM", model.name()));
        }

        let weights = self.normalized_weights(id)?;
        let mut score = 0.0;
        for (&child, weight) in self.nodes[id].children.iter().zip(weights) {
            score += weight * self.default_score(child, model, store, doc_id)?;
        }
        Ok(score)
    }

    /// Weighted geometric mean of the arguments' beliefs in `doc_id`.
    pub(crate) fn weighted_product(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        let weights = self.normalized_weights(id)?;
        let mut score = 1.0;
        for (&child, weight) in self.nodes[id].children.iter().zip(weights) {
            score *= self.belief(child, model, store, doc_id)?.powf(weight);
        }
        Ok(score)
    }

    /// Weighted geometric mean of the arguments' default scores in `doc_id`.
    pub(crate) fn weighted_default_product(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        let weights = self.normalized_weights(id)?;
        let mut score = 1.0;
        for (&child, weight) in self.nodes[id].children.iter().zip(weights) {
            score *= self.default_score(child, model, store, doc_id)?.powf(weight);
        }
        Ok(score)
    }
}
