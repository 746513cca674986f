//! Proximity operators.
//!
//! `#NEAR/n` and `#WINDOW/n` do not iterate their arguments lazily. When the
//! tree is initialized they sweep the documents all arguments share, walk the
//! positions of each such document and build an [`InvertedList`] of their own.
//! From then on a proximity node behaves exactly like a term node.

use crate::error::Result;
use crate::index::posting::{DocId, InvertedList, Position};
use crate::model::RetrievalModel;
use crate::query::node::{NodeId, Operator, QueryTree};

impl QueryTree {
    /// Build the inverted list of a proximity node from its initialized
    /// arguments.
    pub(crate) fn evaluate_proximity(&mut self, id: NodeId, model: &RetrievalModel) -> Result<()> {
        let field = self.field(id).unwrap_or_default().to_string();
        let mut list = InvertedList::new(self.describe(id), field);

        while let Some(doc_id) = self.match_all(id, model)? {
            let positions = match self.nodes[id].operator {
                Operator::Near { distance } => self.near_positions(id, distance),
                Operator::Window { distance } => self.window_positions(id, distance),
                _ => Vec::new(),
            };
            if !positions.is_empty() {
                list.append_posting(doc_id, positions)?;
            }
            self.skip_document(id, doc_id);
        }

        self.nodes[id].list = Some(list);
        Ok(())
    }

    /// Match arguments in order, each at most `distance` after the previous.
    ///
    /// A match is recorded at the position of the last argument and consumes
    /// one position of every argument.
    fn near_positions(&mut self, id: NodeId, distance: u32) -> Vec<Position> {
        let children = self.nodes[id].children.clone();
        let Some(&last) = children.last() else {
            return Vec::new();
        };

        let mut positions = Vec::new();
        'scan: while let Some(current) = self.argument_positions(&children) {
            for index in 1..children.len() {
                let (previous, next) = (current[index - 1], current[index]);
                if next <= previous {
                    self.position_advance(children[index]);
                    continue 'scan;
                }
                if next - previous > distance {
                    self.position_advance(children[index - 1]);
                    continue 'scan;
                }
            }

            if let Some(position) = self.position_current(last) {
                positions.push(position);
            }
            for &child in &children {
                self.position_advance(child);
            }
        }
        positions
    }

    /// Match arguments in any order inside a span shorter than `distance`.
    ///
    /// A match is recorded at its largest position and consumes one position
    /// of every argument.
    fn window_positions(&mut self, id: NodeId, distance: u32) -> Vec<Position> {
        let children = self.nodes[id].children.clone();

        let mut positions = Vec::new();
        while let Some(current) = self.argument_positions(&children) {
            let Some((earliest, &min)) = current
                .iter()
                .enumerate()
                .min_by_key(|&(_, position)| *position)
            else {
                break;
            };
            let max = current.iter().copied().max().unwrap_or(min);

            if max - min >= distance {
                self.position_advance(children[earliest]);
            } else {
                positions.push(max);
                for &child in &children {
                    self.position_advance(child);
                }
            }
        }
        positions
    }

    /// Current positions of every argument, or `None` once any runs out.
    fn argument_positions(&self, children: &[NodeId]) -> Option<Vec<Position>> {
        children
            .iter()
            .map(|&child| self.position_current(child))
            .collect()
    }

    /// Move past a document after its positions were consumed.
    ///
    /// Moving the first argument is enough; the next document sweep brings
    /// the other arguments forward.
    fn skip_document(&mut self, id: NodeId, doc_id: DocId) {
        if let Some(&first) = self.nodes[id].children.first() {
            self.advance_past(first, doc_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::memory::InMemoryPostingStore;
    use crate::index::posting::Posting;

    /// Build a document whose body holds `words` at the given positions.
    fn document(store: &mut InMemoryPostingStore, id: &str, words: &[(&str, &[usize])]) {
        let length = words
            .iter()
            .flat_map(|(_, positions)| positions.iter())
            .max()
            .map_or(0, |max| max + 1);
        let mut tokens = vec!["_".to_string(); length];
        for (word, positions) in words {
            for &position in *positions {
                tokens[position] = word.to_string();
            }
        }
        store
            .add_tokens(id, vec![("body".to_string(), tokens)])
            .unwrap();
    }

    fn evaluate(store: &InMemoryPostingStore, operator: Operator, terms: &[&str]) -> InvertedList {
        let mut tree = QueryTree::new();
        let children = terms.iter().map(|term| tree.add_term(*term, "body")).collect();
        let root = tree.add_operator(operator, children).unwrap();
        tree.set_root(root).unwrap();
        tree.initialize(&RetrievalModel::UnrankedBoolean, store)
            .unwrap();
        tree.node(root).inverted_list().unwrap().clone()
    }

    #[test]
    fn test_near_matches_in_order() {
        let mut store = InMemoryPostingStore::new();
        document(&mut store, "d0", &[("a", &[5, 9]), ("b", &[6, 10])]);

        let list = evaluate(&store, Operator::Near { distance: 1 }, &["a", "b"]);
        assert_eq!(
            list.postings,
            vec![Posting {
                doc_id: 0,
                positions: vec![6, 10]
            }]
        );
        assert_eq!(list.doc_freq, 1);
        assert_eq!(list.corpus_term_freq, 2);
        assert_eq!(list.term, "#NEAR/1(a.body b.body)");
        assert_eq!(list.field, "body");
    }

    #[test]
    fn test_near_distance_and_order() {
        let mut store = InMemoryPostingStore::new();
        document(&mut store, "d0", &[("a", &[0]), ("b", &[2])]);
        document(&mut store, "d1", &[("a", &[0]), ("b", &[3])]);
        document(&mut store, "d2", &[("b", &[0]), ("a", &[1])]);
        document(&mut store, "d3", &[("a", &[0])]);

        let list = evaluate(&store, Operator::Near { distance: 2 }, &["a", "b"]);
        let docs: Vec<DocId> = list.postings.iter().map(|p| p.doc_id).collect();
        assert_eq!(docs, vec![0]);
        assert_eq!(list.postings[0].positions, vec![2]);
    }

    #[test]
    fn test_near_three_arguments() {
        let mut store = InMemoryPostingStore::new();
        document(&mut store, "d0", &[("a", &[0, 4]), ("b", &[1, 6]), ("c", &[2, 7])]);

        let list = evaluate(&store, Operator::Near { distance: 1 }, &["a", "b", "c"]);
        assert_eq!(list.postings[0].positions, vec![2]);
    }

    #[test]
    fn test_window_span_bound() {
        let mut store = InMemoryPostingStore::new();
        document(&mut store, "d0", &[("a", &[1]), ("b", &[2]), ("c", &[3])]);
        document(&mut store, "d1", &[("a", &[1]), ("b", &[2]), ("c", &[4])]);
        document(&mut store, "d2", &[("c", &[1]), ("a", &[2]), ("b", &[3])]);

        let list = evaluate(&store, Operator::Window { distance: 3 }, &["a", "b", "c"]);
        let docs: Vec<DocId> = list.postings.iter().map(|p| p.doc_id).collect();
        assert_eq!(docs, vec![0, 2]);
        assert_eq!(list.postings[0].positions, vec![3]);
        assert_eq!(list.postings[1].positions, vec![3]);
    }

    #[test]
    fn test_window_counts_each_match_once() {
        let mut store = InMemoryPostingStore::new();
        document(&mut store, "d0", &[("a", &[0, 5, 9]), ("b", &[1, 4, 20])]);

        let list = evaluate(&store, Operator::Window { distance: 2 }, &["a", "b"]);
        assert_eq!(list.postings[0].positions, vec![1, 5]);
        assert_eq!(list.corpus_term_freq, 2);
    }

    #[test]
    fn test_nested_proximity() {
        let mut store = InMemoryPostingStore::new();
        document(&mut store, "d0", &[("a", &[0]), ("b", &[1]), ("c", &[3])]);
        document(&mut store, "d1", &[("a", &[0]), ("b", &[1]), ("c", &[9])]);

        let mut tree = QueryTree::new();
        let a = tree.add_term("a", "body");
        let b = tree.add_term("b", "body");
        let near = tree
            .add_operator(Operator::Near { distance: 1 }, vec![a, b])
            .unwrap();
        let c = tree.add_term("c", "body");
        let window = tree
            .add_operator(Operator::Window { distance: 4 }, vec![near, c])
            .unwrap();
        tree.set_root(window).unwrap();
        tree.initialize(&RetrievalModel::UnrankedBoolean, &store)
            .unwrap();

        let list = tree.node(window).inverted_list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.postings[0].doc_id, 0);
    }

    #[test]
    fn test_missing_argument_gives_empty_list() {
        let mut store = InMemoryPostingStore::new();
        document(&mut store, "d0", &[("a", &[0]), ("b", &[1])]);

        let list = evaluate(&store, Operator::Near { distance: 3 }, &["a", "zebra"]);
        assert!(list.is_empty());
        assert_eq!(list.doc_freq, 0);
    }
}
