//! Document and position iteration over query trees.
//!
//! Every node walks candidate documents in ascending order:
//! [`has_match`](QueryTree::has_match) finds the current candidate,
//! [`current_match`](QueryTree::current_match) reports it and
//! [`advance_past`](QueryTree::advance_past) moves beyond it. Term and
//! proximity nodes iterate their own postings; scoring operators derive their
//! candidate from their children with one of the shared rules
//! [`match_all`](QueryTree::match_all), [`match_min`](QueryTree::match_min)
//! or [`match_first`](QueryTree::match_first).
//!
//! Within a matched document, term and proximity nodes also expose the
//! positions of the current posting. Cursors only move forward.

use crate::error::{Result, XiphosError};
use crate::index::posting::{DocId, Position, Posting};
use crate::model::RetrievalModel;
use crate::query::node::{NodeId, Operator, QueryTree};

impl QueryTree {
    /// Check whether a node has a candidate document.
    ///
    /// Repeated calls without advancing return the same answer. Fails only
    /// when the node's matching rule is undefined under `model`.
    pub fn has_match(&mut self, id: NodeId, model: &RetrievalModel) -> Result<bool> {
        if self.nodes[id].operator.is_inverted_list() {
            return Ok(self.current_posting(id).is_some());
        }
        if self.nodes[id].match_cache.is_some() {
            return Ok(true);
        }

        let candidate = match self.nodes[id].operator {
            Operator::Score => self.match_first(id, model)?,
            Operator::And if model.is_boolean() => self.match_all(id, model)?,
            Operator::And => match model {
                RetrievalModel::Indri { .. } => self.match_min(id, model)?,
                _ => return Err(XiphosError::unsupported("#AND", model.name())),
            },
            Operator::Or | Operator::Sum | Operator::Wand | Operator::Wsum => {
                self.match_min(id, model)?
            }
            Operator::Term { .. } | Operator::Near { .. } | Operator::Window { .. } => {
                unreachable!("inverted list nodes are handled above")
            }
        };

        self.nodes[id].match_cache = candidate;
        Ok(candidate.is_some())
    }

    /// Get the candidate found by the last successful [`has_match`](Self::has_match).
    pub fn current_match(&self, id: NodeId) -> Option<DocId> {
        if self.nodes[id].operator.is_inverted_list() {
            self.current_posting(id).map(|posting| posting.doc_id)
        } else {
            self.nodes[id].match_cache
        }
    }

    /// Check if a node's current candidate is exactly `doc_id`.
    pub fn matches_doc(&self, id: NodeId, doc_id: DocId) -> bool {
        self.current_match(id) == Some(doc_id)
    }

    /// Move a node past `doc_id`: afterwards every candidate is greater.
    pub fn advance_past(&mut self, id: NodeId, doc_id: DocId) {
        if self.nodes[id].operator.is_inverted_list() {
            self.advance_cursor(id, |candidate| candidate <= doc_id);
            return;
        }
        for index in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[index];
            self.advance_past(child, doc_id);
        }
        self.nodes[id].match_cache = None;
    }

    /// Move a node to `doc_id`: afterwards every candidate is at least `doc_id`.
    pub fn advance_to(&mut self, id: NodeId, doc_id: DocId) {
        if self.nodes[id].operator.is_inverted_list() {
            self.advance_cursor(id, |candidate| candidate < doc_id);
            return;
        }
        for index in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[index];
            self.advance_to(child, doc_id);
        }
        self.nodes[id].match_cache = None;
    }

    /// Find a document every child matches.
    ///
    /// Children behind the largest candidate are moved up to it until all of
    /// them agree or one runs out.
    pub fn match_all(&mut self, id: NodeId, model: &RetrievalModel) -> Result<Option<DocId>> {
        let count = self.nodes[id].children.len();
        if count == 0 {
            return Ok(None);
        }

        loop {
            let mut lowest = DocId::MAX;
            let mut highest = DocId::MIN;
            for index in 0..count {
                let child = self.nodes[id].children[index];
                if !self.has_match(child, model)? {
                    return Ok(None);
                }
                let candidate = self.current_match(child).unwrap_or(DocId::MAX);
                lowest = lowest.min(candidate);
                highest = highest.max(candidate);
            }
            if lowest == highest {
                return Ok(Some(highest));
            }

            for index in 0..count {
                let child = self.nodes[id].children[index];
                if self.current_match(child).is_some_and(|candidate| candidate < highest) {
                    self.advance_to(child, highest);
                }
            }
        }
    }

    /// Find the smallest candidate among children that have one.
    pub fn match_min(&mut self, id: NodeId, model: &RetrievalModel) -> Result<Option<DocId>> {
        let mut lowest: Option<DocId> = None;
        for index in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[index];
            if self.has_match(child, model)?
                && let Some(candidate) = self.current_match(child)
            {
                lowest = Some(lowest.map_or(candidate, |doc_id| doc_id.min(candidate)));
            }
        }
        Ok(lowest)
    }

    /// Take the candidate of the first (only) child.
    pub fn match_first(&mut self, id: NodeId, model: &RetrievalModel) -> Result<Option<DocId>> {
        let Some(&child) = self.nodes[id].children.first() else {
            return Ok(None);
        };
        if self.has_match(child, model)? {
            Ok(self.current_match(child))
        } else {
            Ok(None)
        }
    }

    /// Get the posting under the document cursor of a term or proximity node.
    pub fn current_posting(&self, id: NodeId) -> Option<&Posting> {
        let node = &self.nodes[id];
        node.list.as_ref()?.get(node.doc_cursor)
    }

    /// Check if the current posting has positions left.
    pub fn position_has_match(&self, id: NodeId) -> bool {
        self.position_current(id).is_some()
    }

    /// Get the position under the position cursor.
    pub fn position_current(&self, id: NodeId) -> Option<Position> {
        let cursor = self.nodes[id].pos_cursor;
        self.current_posting(id)?.positions.get(cursor).copied()
    }

    /// Move the position cursor to the next position of the current posting.
    pub fn position_advance(&mut self, id: NodeId) {
        if self.position_has_match(id) {
            self.nodes[id].pos_cursor += 1;
        }
    }

    fn advance_cursor<F>(&mut self, id: NodeId, mut skip: F)
    where
        F: FnMut(DocId) -> bool,
    {
        let node = &mut self.nodes[id];
        let Some(list) = &node.list else {
            return;
        };
        let start = node.doc_cursor;
        while list
            .get(node.doc_cursor)
            .is_some_and(|posting| skip(posting.doc_id))
        {
            node.doc_cursor += 1;
        }
        if node.doc_cursor != start {
            node.pos_cursor = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::InMemoryPostingStore;

    fn store() -> InMemoryPostingStore {
        let mut store = InMemoryPostingStore::new();
        store.add_document("d0", &[("body", "a b")]).unwrap();
        store.add_document("d1", &[("body", "a")]).unwrap();
        store.add_document("d2", &[("body", "b c")]).unwrap();
        store.add_document("d3", &[("body", "a b a")]).unwrap();
        store.add_document("d4", &[("body", "c")]).unwrap();
        store
    }

    fn sweep(tree: &mut QueryTree, id: NodeId, model: &RetrievalModel) -> Vec<DocId> {
        let mut docs = Vec::new();
        while tree.has_match(id, model).unwrap() {
            let doc_id = tree.current_match(id).unwrap();
            docs.push(doc_id);
            tree.advance_past(id, doc_id);
        }
        docs
    }

    fn build(operator: Operator, terms: &[&str]) -> (QueryTree, NodeId) {
        let mut tree = QueryTree::new();
        let children = terms.iter().map(|term| tree.add_term(*term, "body")).collect();
        let root = tree.add_operator(operator, children).unwrap();
        tree.set_root(root).unwrap();
        (tree, root)
    }

    #[test]
    fn test_term_iteration() {
        let mut tree = QueryTree::new();
        let a = tree.add_term("a", "body");
        tree.set_root(a).unwrap();
        let model = RetrievalModel::UnrankedBoolean;
        tree.initialize(&model, &store()).unwrap();

        assert!(tree.has_match(a, &model).unwrap());
        assert!(tree.has_match(a, &model).unwrap());
        assert_eq!(tree.current_match(a), Some(0));

        tree.advance_to(a, 2);
        assert_eq!(tree.current_match(a), Some(3));
        tree.advance_past(a, 3);
        assert!(!tree.has_match(a, &model).unwrap());
        assert!(!tree.has_match(a, &model).unwrap());
    }

    #[test]
    fn test_missing_term_is_exhausted() {
        let mut tree = QueryTree::new();
        let zebra = tree.add_term("zebra", "body");
        tree.set_root(zebra).unwrap();
        let model = RetrievalModel::UnrankedBoolean;
        tree.initialize(&model, &store()).unwrap();

        assert!(!tree.has_match(zebra, &model).unwrap());
        assert!(!tree.position_has_match(zebra));
    }

    #[test]
    fn test_match_all_is_intersection() {
        let (mut tree, root) = build(Operator::And, &["a", "b"]);
        let model = RetrievalModel::UnrankedBoolean;
        tree.initialize(&model, &store()).unwrap();

        assert_eq!(sweep(&mut tree, root, &model), vec![0, 3]);
    }

    #[test]
    fn test_match_min_is_union() {
        let (mut tree, root) = build(Operator::Or, &["a", "c"]);
        let model = RetrievalModel::UnrankedBoolean;
        tree.initialize(&model, &store()).unwrap();

        assert_eq!(sweep(&mut tree, root, &model), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_and_follows_model() {
        let (mut tree, root) = build(Operator::And, &["a", "c"]);
        let model = RetrievalModel::indri(2500.0, 0.4).unwrap();
        tree.initialize(&model, &store()).unwrap();
        assert_eq!(sweep(&mut tree, root, &model), vec![0, 1, 2, 3, 4]);

        let (mut tree, root) = build(Operator::And, &["a", "c"]);
        let model = RetrievalModel::RankedBoolean;
        tree.initialize(&model, &store()).unwrap();
        assert!(sweep(&mut tree, root, &model).is_empty());

        let (mut tree, root) = build(Operator::And, &["a", "c"]);
        let model = RetrievalModel::bm25(1.2, 0.75, 0.0).unwrap();
        tree.initialize(&model, &store()).unwrap();
        assert!(matches!(
            tree.has_match(root, &model),
            Err(XiphosError::UnsupportedOperator { operator: "#AND", .. })
        ));
    }

    #[test]
    fn test_positions_reset_per_document() {
        let mut tree = QueryTree::new();
        let a = tree.add_term("a", "body");
        tree.set_root(a).unwrap();
        let model = RetrievalModel::UnrankedBoolean;
        tree.initialize(&model, &store()).unwrap();

        assert_eq!(tree.position_current(a), Some(0));
        tree.position_advance(a);
        assert!(!tree.position_has_match(a));

        tree.advance_to(a, 3);
        assert_eq!(tree.position_current(a), Some(0));
        tree.position_advance(a);
        assert_eq!(tree.position_current(a), Some(2));
        tree.position_advance(a);
        tree.position_advance(a);
        assert_eq!(tree.position_current(a), None);
    }
}
