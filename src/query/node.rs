//! Query operator trees.
//!
//! A query is an arena of [`QueryNode`]s addressed by [`NodeId`]. Every node
//! carries its operator, its ordered children and its weight. Term and
//! proximity nodes additionally own an inverted list plus a document cursor
//! and a position cursor; these are the only mutable evaluation state and are
//! reset when the tree is initialized.

use std::fmt;

use log::{Level, debug, log_enabled};

use crate::error::{Result, XiphosError};
use crate::index::posting::{DocId, InvertedList};
use crate::index::store::PostingStore;
use crate::model::RetrievalModel;

/// Index of a node inside its [`QueryTree`].
pub type NodeId = usize;

/// The operator kinds a query node can have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// A single term in a single field.
    Term {
        /// Term text.
        term: String,
        /// Field name.
        field: String,
    },
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Ordered proximity, each term at most `distance` after the previous.
    Near {
        /// Largest allowed gap between neighbouring terms.
        distance: u32,
    },
    /// Unordered proximity, all terms inside a span shorter than `distance`.
    Window {
        /// Exclusive upper bound on the span of a match.
        distance: u32,
    },
    /// BM25 sum.
    Sum,
    /// Weighted geometric mean of beliefs.
    Wand,
    /// Weighted arithmetic mean of beliefs.
    Wsum,
    /// Turns the matches of one term or proximity node into scores.
    Score,
}

impl Operator {
    /// Get the operator name used in query strings.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Term { .. } => "#TERM",
            Operator::And => "#AND",
            Operator::Or => "#OR",
            Operator::Near { .. } => "#NEAR",
            Operator::Window { .. } => "#WINDOW",
            Operator::Sum => "#SUM",
            Operator::Wand => "#WAND",
            Operator::Wsum => "#WSUM",
            Operator::Score => "#SCORE",
        }
    }

    /// Check if this operator produces an inverted list (term or proximity).
    pub fn is_inverted_list(&self) -> bool {
        matches!(
            self,
            Operator::Term { .. } | Operator::Near { .. } | Operator::Window { .. }
        )
    }

    /// Check if this operator produces scores.
    pub fn is_scoring(&self) -> bool {
        !self.is_inverted_list()
    }

    /// Check if the operator's arguments are `weight argument` pairs.
    pub fn is_weighted(&self) -> bool {
        matches!(self, Operator::Wand | Operator::Wsum)
    }
}

/// One node of a query tree.
#[derive(Debug, Clone)]
pub struct QueryNode {
    pub(crate) operator: Operator,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) weight: f64,
    /// Postings of a term or proximity node, present once initialized.
    pub(crate) list: Option<InvertedList>,
    pub(crate) doc_cursor: usize,
    pub(crate) pos_cursor: usize,
    /// Candidate found by the last `has_match` of a scoring node.
    pub(crate) match_cache: Option<DocId>,
}

impl QueryNode {
    fn new(operator: Operator, children: Vec<NodeId>) -> Self {
        QueryNode {
            operator,
            children,
            parent: None,
            weight: 1.0,
            list: None,
            doc_cursor: 0,
            pos_cursor: 0,
            match_cache: None,
        }
    }

    /// Get the operator.
    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// Get the children in argument order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Get the weight attached to this node.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Get the inverted list of an initialized term or proximity node.
    pub fn inverted_list(&self) -> Option<&InvertedList> {
        self.list.as_ref()
    }
}

/// A query operator tree stored as an arena.
#[derive(Debug, Clone, Default)]
pub struct QueryTree {
    pub(crate) nodes: Vec<QueryNode>,
    root: Option<NodeId>,
}

impl QueryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term node.
    pub fn add_term<T: Into<String>, F: Into<String>>(&mut self, term: T, field: F) -> NodeId {
        self.push(QueryNode::new(
            Operator::Term {
                term: term.into(),
                field: field.into(),
            },
            Vec::new(),
        ))
    }

    /// Add an operator node over existing nodes.
    ///
    /// Term and proximity arguments of scoring operators other than `#SCORE`
    /// are wrapped in a `#SCORE` node. Proximity operators accept only term
    /// and proximity arguments that share one field, and `#SCORE` takes
    /// exactly one term or proximity argument.
    pub fn add_operator(&mut self, operator: Operator, children: Vec<NodeId>) -> Result<NodeId> {
        for (index, &child) in children.iter().enumerate() {
            self.check_id(child)?;
            if self.nodes[child].parent.is_some() || children[..index].contains(&child) {
                return Err(XiphosError::query(format!(
                    "query node {child} already belongs to an operator"
                )));
            }
        }

        let children = match &operator {
            Operator::Term { .. } => {
                return Err(XiphosError::query("terms are added with add_term"));
            }
            Operator::Near { .. } | Operator::Window { .. } => {
                self.check_proximity_arguments(&operator, &children)?;
                children
            }
            Operator::Score => {
                if children.len() != 1 || !self.nodes[children[0]].operator.is_inverted_list() {
                    return Err(XiphosError::query(
                        "#SCORE takes exactly one term or proximity argument",
                    ));
                }
                children
            }
            _ => children
                .into_iter()
                .map(|child| {
                    if self.nodes[child].operator.is_inverted_list() {
                        let score = self.push(QueryNode::new(Operator::Score, vec![child]));
                        self.nodes[child].parent = Some(score);
                        score
                    } else {
                        child
                    }
                })
                .collect(),
        };

        let id = self.push(QueryNode::new(operator, children));
        for index in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[index];
            self.nodes[child].parent = Some(id);
        }
        Ok(id)
    }

    /// Attach a weight to a node. Weights must be finite and non-negative.
    ///
    /// A weight given to a `#SCORE` node lands on the argument it wraps.
    pub fn set_weight(&mut self, id: NodeId, weight: f64) -> Result<()> {
        self.check_id(id)?;
        if !weight.is_finite() || weight < 0.0 {
            return Err(XiphosError::invalid_weight(format!(
                "weight must be a non-negative number, got {weight}"
            )));
        }
        let node = &self.nodes[id];
        let target = match (&node.operator, node.children.first()) {
            (Operator::Score, Some(&child)) => child,
            _ => id,
        };
        self.nodes[target].weight = weight;
        Ok(())
    }

    /// Set the node evaluation starts from.
    pub fn set_root(&mut self, id: NodeId) -> Result<()> {
        self.check_id(id)?;
        self.root = Some(id);
        Ok(())
    }

    /// Get the root node, if any.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Get a node.
    pub fn node(&self, id: NodeId) -> &QueryNode {
        &self.nodes[id]
    }

    /// Get the operator of a node.
    pub fn operator(&self, id: NodeId) -> &Operator {
        &self.nodes[id].operator
    }

    /// Get the children of a node.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].children
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Weight a parent combinator uses for this node.
    ///
    /// `#SCORE` nodes carry no weight of their own; they report the weight of
    /// the term or proximity node they wrap.
    pub fn effective_weight(&self, id: NodeId) -> f64 {
        let node = &self.nodes[id];
        match (&node.operator, node.children.first()) {
            (Operator::Score, Some(&child)) => self.nodes[child].weight,
            _ => node.weight,
        }
    }

    /// Field of a term or proximity node.
    ///
    /// A proximity node reports the field of its first argument.
    pub fn field(&self, id: NodeId) -> Option<&str> {
        let node = &self.nodes[id];
        match &node.operator {
            Operator::Term { field, .. } => Some(field),
            Operator::Near { .. } | Operator::Window { .. } => {
                node.children.first().and_then(|&child| self.field(child))
            }
            _ => None,
        }
    }

    /// Prepare the tree for one document sweep.
    ///
    /// Term nodes fetch their postings, proximity nodes compute theirs, and
    /// every cursor and cached match is reset.
    pub fn initialize(&mut self, model: &RetrievalModel, store: &dyn PostingStore) -> Result<()> {
        if let Some(root) = self.root {
            self.initialize_node(root, model, store)?;
        }
        Ok(())
    }

    pub(crate) fn initialize_node(
        &mut self,
        id: NodeId,
        model: &RetrievalModel,
        store: &dyn PostingStore,
    ) -> Result<()> {
        for index in 0..self.nodes[id].children.len() {
            let child = self.nodes[id].children[index];
            self.initialize_node(child, model, store)?;
        }

        match self.nodes[id].operator {
            Operator::Term { .. } => self.load_term(id, store)?,
            Operator::Near { .. } | Operator::Window { .. } => self.evaluate_proximity(id, model)?,
            _ => {}
        }

        let node = &mut self.nodes[id];
        node.doc_cursor = 0;
        node.pos_cursor = 0;
        node.match_cache = None;
        if log_enabled!(Level::Debug)
            && let Some(list) = &self.nodes[id].list
        {
            debug!("{} holds {} postings", self.describe(id), list.len());
        }
        Ok(())
    }

    pub(crate) fn describe(&self, id: NodeId) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_node(&mut out, id);
        out
    }

    fn push(&mut self, node: QueryNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn check_id(&self, id: NodeId) -> Result<()> {
        if id >= self.nodes.len() {
            return Err(XiphosError::query(format!("unknown query node {id}")));
        }
        Ok(())
    }

    fn check_proximity_arguments(&self, operator: &Operator, children: &[NodeId]) -> Result<()> {
        let mut field = None;
        for &child in children {
            if !self.nodes[child].operator.is_inverted_list() {
                return Err(XiphosError::query(format!(
                    "{} accepts only term and proximity arguments",
                    operator.name()
                )));
            }
            let child_field = self.field(child);
            if field.is_some() && child_field != field {
                return Err(XiphosError::query(format!(
                    "arguments of {} must share one field",
                    operator.name()
                )));
            }
            field = child_field;
        }
        Ok(())
    }

    fn write_node<W: fmt::Write>(&self, out: &mut W, id: NodeId) -> fmt::Result {
        let node = &self.nodes[id];
        match &node.operator {
            Operator::Term { term, field } => return write!(out, "{term}.{field}"),
            Operator::Near { distance } => write!(out, "#NEAR/{distance}(")?,
            Operator::Window { distance } => write!(out, "#WINDOW/{distance}(")?,
            operator => write!(out, "{}(", operator.name())?,
        }
        for (index, &child) in node.children.iter().enumerate() {
            if index > 0 {
                out.write_char(' ')?;
            }
            if node.operator.is_weighted() {
                write!(out, "{} ", self.effective_weight(child))?;
            }
            self.write_node(out, child)?;
        }
        out.write_char(')')
    }
}

impl fmt::Display for QueryTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => self.write_node(f, root),
            None => Ok(()),
        }
    }
}
