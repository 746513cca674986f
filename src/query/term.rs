//! Term leaves of a query tree.

use log::warn;

use crate::error::Result;
use crate::index::posting::InvertedList;
use crate::index::store::PostingStore;
use crate::query::node::{NodeId, Operator, QueryTree};

impl QueryTree {
    /// Fetch the postings of a term node from the store.
    ///
    /// A term the field has never seen gets an empty list, so it simply never
    /// matches.
    pub(crate) fn load_term(&mut self, id: NodeId, store: &dyn PostingStore) -> Result<()> {
        let Operator::Term { term, field } = &self.nodes[id].operator else {
            return Ok(());
        };

        let list = match store.postings(field, term)? {
            Some(list) => list,
            None => {
                warn!("term {term}.{field} is not in the index");
                InvertedList::new(term.as_str(), field.as_str())
            }
        };
        list.validate()?;
        self.nodes[id].list = Some(list);
        Ok(())
    }

    /// Get the (term, field) pair of a term node.
    pub fn term(&self, id: NodeId) -> Option<(&str, &str)> {
        match &self.nodes[id].operator {
            Operator::Term { term, field } => Some((term, field)),
            _ => None,
        }
    }
}
