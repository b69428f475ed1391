//! Fake document for exercising extraction logic without HTML.
//!
//! Selectors are not interpreted: each `(scope, selector)` pair is answered
//! from a table, and a selector can be set to fail outright. Every query is
//! recorded so tests can assert which patterns were tried.

use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;

use crate::document::Document;
use crate::error::{ResolveError, Result};

/// Handle to a node in a [`FakeDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeNodeId(usize);

#[derive(Debug, Default)]
struct FakeNode {
    text: String,
    attrs: HashMap<String, String>,
}

/// A document answered from a lookup table.
#[derive(Debug)]
pub struct FakeDocument {
    url: Option<Url>,
    nodes: Vec<FakeNode>,
    matches: HashMap<(FakeNodeId, String), Vec<FakeNodeId>>,
    failures: HashMap<String, String>,
    queries: RefCell<Vec<String>>,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDocument {
    /// An empty document: only a root node with no text.
    pub fn new() -> Self {
        Self {
            url: None,
            nodes: vec![FakeNode::default()],
            matches: HashMap::new(),
            failures: HashMap::new(),
            queries: RefCell::new(Vec::new()),
        }
    }

    pub fn root_id(&self) -> FakeNodeId {
        FakeNodeId(0)
    }

    /// Set the document URL. Panics on an unparseable URL.
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = Some(Url::parse(url).unwrap());
        self
    }

    /// Make `selector` resolve (from the root) to a new node holding `text`.
    pub fn matching(mut self, selector: &str, text: impl Into<String>) -> Self {
        let root = self.root_id();
        let node = self.add_node(text);
        self.matches
            .entry((root, selector.to_string()))
            .or_default()
            .push(node);
        self
    }

    /// Make `selector` fail to resolve under any scope.
    pub fn failing(mut self, selector: &str, reason: &str) -> Self {
        self.failures.insert(selector.to_string(), reason.to_string());
        self
    }

    pub fn add_node(&mut self, text: impl Into<String>) -> FakeNodeId {
        self.nodes.push(FakeNode {
            text: text.into(),
            attrs: HashMap::new(),
        });
        FakeNodeId(self.nodes.len() - 1)
    }

    pub fn add_attr(&mut self, node: FakeNodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    /// Answer `selector` under `scope` with `nodes` (first one is the first match).
    pub fn set_matches(&mut self, scope: FakeNodeId, selector: &str, nodes: Vec<FakeNodeId>) {
        self.matches.insert((scope, selector.to_string()), nodes);
    }

    /// Every selector queried so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    fn lookup(&self, scope: FakeNodeId, selector: &str) -> Result<Vec<FakeNodeId>> {
        self.queries.borrow_mut().push(selector.to_string());

        if let Some(reason) = self.failures.get(selector) {
            return Err(ResolveError::Unsupported {
                selector: selector.to_string(),
                reason: reason.clone(),
            });
        }

        Ok(self
            .matches
            .get(&(scope, selector.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

impl Document for FakeDocument {
    type Node<'a> = FakeNodeId;

    fn root(&self) -> FakeNodeId {
        self.root_id()
    }

    fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    fn select_first<'a>(&'a self, scope: FakeNodeId, selector: &str) -> Result<Option<FakeNodeId>> {
        Ok(self.lookup(scope, selector)?.into_iter().next())
    }

    fn select_all<'a>(&'a self, scope: FakeNodeId, selector: &str) -> Result<Vec<FakeNodeId>> {
        self.lookup(scope, selector)
    }

    fn text<'a>(&'a self, node: FakeNodeId) -> String {
        self.nodes[node.0].text.clone()
    }

    fn attr<'a>(&'a self, node: FakeNodeId, name: &str) -> Option<String> {
        self.nodes[node.0].attrs.get(name).cloned()
    }
}
