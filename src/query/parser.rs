//! Query parser for converting structured query strings to query trees.

use std::iter::Peekable;
use std::str::Chars;

use log::debug;

use crate::error::{Result, XiphosError};
use crate::query::node::{NodeId, Operator, QueryTree};

/// Field searched by terms without a field suffix.
pub const DEFAULT_FIELD: &str = "body";

/// Field suffixes recognized in `term.field` tokens.
pub const KNOWN_FIELDS: &[&str] = &["body", "title", "url", "keywords", "inlink"];

/// A parser for the structured query language.
///
/// Supported syntax:
/// - Terms: `apple`, or `apple.title` for a specific field
/// - Boolean operators: `#AND(a b)`, `#OR(a b)`
/// - Proximity operators: `#NEAR/2(a b)`, `#WINDOW/5(a b)`
/// - BM25 operator: `#SUM(a b)`
/// - Indri operators: `#WAND(0.3 a 0.7 b)`, `#WSUM(0.3 a 0.7 b)`
/// - Explicit scoring: `#SCORE(a)`
///
/// Operator names are case-insensitive.
#[derive(Debug, Clone)]
pub struct QueryParser {
    /// Field used when a term has no recognized field suffix.
    default_field: String,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    /// Create a new query parser searching `body` by default.
    pub fn new() -> Self {
        QueryParser {
            default_field: DEFAULT_FIELD.to_string(),
        }
    }

    /// Set the field searched by terms without a field suffix.
    pub fn with_default_field<S: Into<String>>(mut self, field: S) -> Self {
        self.default_field = field.into();
        self
    }

    /// Get the default field.
    pub fn default_field(&self) -> &str {
        &self.default_field
    }

    /// Parse a query string into a query tree.
    ///
    /// An empty string gives a tree without a root.
    pub fn parse(&self, query_str: &str) -> Result<QueryTree> {
        let parser = QueryStringParser::new(query_str.trim(), &self.default_field);
        let tree = parser.parse()?;
        debug!("parsed {query_str:?} as {tree}");
        Ok(tree)
    }
}

/// Internal parser for parsing query strings.
struct QueryStringParser<'a> {
    chars: Peekable<Chars<'a>>,
    default_field: &'a str,
    tree: QueryTree,
}

impl<'a> QueryStringParser<'a> {
    fn new(query_str: &'a str, default_field: &'a str) -> Self {
        QueryStringParser {
            chars: query_str.chars().peekable(),
            default_field,
            tree: QueryTree::new(),
        }
    }

    fn parse(mut self) -> Result<QueryTree> {
        self.skip_whitespace();
        if self.chars.peek().is_none() {
            return Ok(self.tree);
        }

        let root = self.parse_expression()?;
        self.skip_whitespace();
        if let Some(c) = self.chars.peek() {
            return Err(XiphosError::parse(format!(
                "unexpected '{c}' after the end of the query"
            )));
        }
        self.tree.set_root(root)?;
        Ok(self.tree)
    }

    fn parse_expression(&mut self) -> Result<NodeId> {
        self.skip_whitespace();
        match self.chars.peek() {
            None => Err(XiphosError::parse("unexpected end of query")),
            Some('#') => self.parse_operator(),
            Some(&(c @ ('(' | ')'))) => Err(XiphosError::parse(format!(
                "unexpected '{c}', expected a term or an operator"
            ))),
            Some(_) => self.parse_term(),
        }
    }

    fn parse_operator(&mut self) -> Result<NodeId> {
        self.chars.next(); // '#'
        let name = self
            .consume_while(|c| c.is_ascii_alphabetic())
            .to_ascii_uppercase();
        let distance = if self.chars.next_if_eq(&'/').is_some() {
            let digits = self.consume_while(|c| c.is_ascii_digit());
            Some(digits.parse::<u32>().map_err(|_| {
                XiphosError::parse(format!("#{name}/ must be followed by a distance"))
            })?)
        } else {
            None
        };

        let operator = match (name.as_str(), distance) {
            ("AND", None) => Operator::And,
            ("OR", None) => Operator::Or,
            ("SUM", None) => Operator::Sum,
            ("WAND", None) => Operator::Wand,
            ("WSUM", None) => Operator::Wsum,
            ("SCORE", None) => Operator::Score,
            ("NEAR", Some(distance)) => Operator::Near { distance },
            ("WINDOW", Some(distance)) => Operator::Window { distance },
            ("NEAR" | "WINDOW", None) => {
                return Err(XiphosError::parse(format!(
                    "#{name} requires a distance, e.g. #{name}/2"
                )));
            }
            ("AND" | "OR" | "SUM" | "WAND" | "WSUM" | "SCORE", Some(_)) => {
                return Err(XiphosError::parse(format!("#{name} does not take a distance")));
            }
            _ => return Err(XiphosError::parse(format!("unknown operator #{name}"))),
        };

        self.skip_whitespace();
        if self.chars.next_if_eq(&'(').is_none() {
            return Err(XiphosError::parse(format!(
                "expected '(' after {}",
                operator.name()
            )));
        }

        let mut children = Vec::new();
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some(')') => {
                    self.chars.next();
                    break;
                }
                None => {
                    return Err(XiphosError::parse(format!(
                        "missing ')' after the arguments of {}",
                        operator.name()
                    )));
                }
                Some(_) => {
                    let weight = if operator.is_weighted() {
                        Some(self.parse_weight(&operator)?)
                    } else {
                        None
                    };
                    let child = self.parse_expression()?;
                    if let Some(weight) = weight {
                        self.tree.set_weight(child, weight)?;
                    }
                    children.push(child);
                }
            }
        }

        self.tree.add_operator(operator, children)
    }

    fn parse_weight(&mut self, operator: &Operator) -> Result<f64> {
        let token = self.consume_token();
        token.parse::<f64>().map_err(|_| {
            XiphosError::parse(format!(
                "{} expects a weight before each argument, got '{token}'",
                operator.name()
            ))
        })
    }

    fn parse_term(&mut self) -> Result<NodeId> {
        let token = self.consume_token();
        let (term, field) = split_field(&token, self.default_field);
        Ok(self.tree.add_term(term, field))
    }

    /// Consume characters up to whitespace or a parenthesis.
    fn consume_token(&mut self) -> String {
        self.consume_while(|c| !c.is_whitespace() && c != '(' && c != ')')
    }

    fn consume_while<P>(&mut self, predicate: P) -> String
    where
        P: Fn(char) -> bool,
    {
        let mut out = String::new();
        while let Some(c) = self.chars.next_if(|&c| predicate(c)) {
            out.push(c);
        }
        out
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }
}

/// Split `term.field` into its parts.
///
/// Only known field names count as a suffix, so tokens like `e.g` stay whole.
fn split_field<'t>(token: &'t str, default_field: &'t str) -> (&'t str, String) {
    if let Some((term, field)) = token.rsplit_once('.') {
        let field = field.to_ascii_lowercase();
        if !term.is_empty() && KNOWN_FIELDS.contains(&field.as_str()) {
            return (term, field);
        }
    }
    (token, default_field.to_string())
}
