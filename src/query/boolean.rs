//! `#AND` and `#OR` scoring.
//!
//! Under the Boolean models `#AND` and `#OR` score exact set matches: 1.0
//! when unranked, the weakest (`#AND`) or strongest (`#OR`) argument when
//! ranked. Under Indri `#AND` is the probabilistic conjunction of its
//! arguments' beliefs, each weighted by its share of the total weight.

use crate::error::{Result, XiphosError};
use crate::index::posting::DocId;
use crate::index::store::PostingStore;
use crate::model::RetrievalModel;
use crate::query::node::{NodeId, QueryTree};

impl QueryTree {
    pub(crate) fn and_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        match model {
            RetrievalModel::UnrankedBoolean => Ok(1.0),
            RetrievalModel::RankedBoolean => {
                // Every argument matches the document, so each has a score.
                let mut lowest = f64::INFINITY;
                for &child in &self.nodes[id].children {
                    lowest = lowest.min(self.get_score(child, model, store)?);
                }
                Ok(if lowest.is_finite() { lowest } else { 0.0 })
            }
            RetrievalModel::Indri { .. } => self.weighted_product(id, model, store, doc_id),
            RetrievalModel::Bm25 { .. } => Err(XiphosError::unsupported("#AND", model.name())),
        }
    }

    pub(crate) fn and_default_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        if !matches!(model, RetrievalModel::Indri { .. }) {
            return Err(XiphosError::unsupported("#AND", model.name()));
        }

        self.weighted_default_product(id, model, store, doc_id)
    }

    pub(crate) fn or_score(
        &self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
        doc_id: DocId,
    ) -> Result<f64> {
        match model {
            RetrievalModel::UnrankedBoolean => Ok(1.0),
            RetrievalModel::RankedBoolean => {
                let mut highest = 0.0f64;
                for &child in &self.nodes[id].children {
                    if self.matches_doc(child, doc_id) {
                        highest = highest.max(self.get_score(child, model, store)?);
                    }
                }
                Ok(highest)
            }
            _ => Err(XiphosError::unsupported("#OR", model.name())),
        }
    }
}
