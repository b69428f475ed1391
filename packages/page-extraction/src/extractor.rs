//! Ordered-fallback field extraction.
//!
//! Each pattern for a field is resolved in table order. A pattern that fails
//! to resolve (bad selector, unsupported query) is logged and skipped; it
//! never aborts the remaining fallbacks. The first candidate that passes
//! validation wins.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::document::Document;
use crate::error::Result;
use crate::patterns::{
    FieldKind, Locator, Pattern, PatternId, PatternTable, Reader, TEXT_BODY_SELECTOR,
    TEXT_POST_SELECTOR,
};

lazy_static! {
    static ref CHANNEL_HREF: Regex = Regex::new(r"/r/([^/]+)").unwrap();
    static ref CHANNEL_TEXT: Regex = Regex::new(r"r/(\S+)").unwrap();
    static ref METADATA_TAIL: Regex = Regex::new(r"(?s)(?:points|ago|score hidden)\s*(.+)").unwrap();
}

/// Outcome of extracting one field.
///
/// `value: None` is an ordinary result (a title-only post has no body).
/// `source_pattern` is always the id of a pattern that was tried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub value: Option<String>,
    pub source_pattern: Option<PatternId>,
}

impl ExtractionResult {
    fn found(pattern: &Pattern, value: String) -> Self {
        Self {
            value: Some(value),
            source_pattern: Some(pattern.id),
        }
    }

    pub fn absent() -> Self {
        Self {
            value: None,
            source_pattern: None,
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }

    /// The value, or `fallback` for display.
    pub fn value_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.value().unwrap_or(fallback)
    }
}

/// Rejects body candidates that look like raw markup rather than rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JunkFilter {
    /// Longest accepted text, in characters
    pub max_chars: usize,
}

impl Default for JunkFilter {
    fn default() -> Self {
        Self { max_chars: 10_000 }
    }
}

impl JunkFilter {
    /// Returns the reason for rejection, if any.
    pub fn rejects(&self, text: &str) -> Option<&'static str> {
        if text.chars().count() > self.max_chars {
            Some("too long")
        } else if text.contains('<') || text.contains('>') {
            Some("contains markup delimiters")
        } else {
            None
        }
    }
}

/// Applies a [`PatternTable`] to documents.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    table: PatternTable,
    junk: JunkFilter,
}

impl FieldExtractor {
    pub fn new(table: PatternTable) -> Self {
        Self {
            table,
            junk: JunkFilter::default(),
        }
    }

    pub fn with_junk_filter(mut self, junk: JunkFilter) -> Self {
        self.junk = junk;
        self
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Extract one field from the whole document.
    pub fn extract<D: Document>(&self, kind: FieldKind, doc: &D) -> ExtractionResult {
        self.extract_within(kind, doc, doc.root())
    }

    /// Extract one field from the subtree rooted at `scope`.
    pub fn extract_within<'a, D: Document>(
        &self,
        kind: FieldKind,
        doc: &'a D,
        scope: D::Node<'a>,
    ) -> ExtractionResult {
        if kind == FieldKind::Body && is_title_only(doc) {
            debug!("Text post without a body slot, skipping body patterns");
            return ExtractionResult::absent();
        }

        for pattern in self.table.for_kind(kind) {
            let candidate = match resolve(doc, scope, pattern) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    warn!(pattern = pattern.id, error = %e, "Pattern failed to resolve");
                    continue;
                }
            };

            let text = candidate.trim();
            if text.is_empty() {
                continue;
            }

            if kind.is_body_like() {
                if let Some(reason) = self.junk.rejects(text) {
                    debug!(pattern = pattern.id, reason, "Rejected candidate");
                    continue;
                }
            }

            debug!(pattern = pattern.id, len = text.len(), ?kind, "Field extracted");
            return ExtractionResult::found(pattern, text.to_string());
        }

        debug!(?kind, "No pattern matched");
        ExtractionResult::absent()
    }

    /// Resolve a list-valued field (e.g. comment containers).
    ///
    /// Patterns are tried in order; the first one yielding at least one node
    /// wins.
    pub fn find_all<'a, D: Document>(
        &self,
        kind: FieldKind,
        doc: &'a D,
        scope: D::Node<'a>,
    ) -> (Option<PatternId>, Vec<D::Node<'a>>) {
        for pattern in self.table.for_kind(kind) {
            let selector = match pattern.locator {
                Locator::Css(selector) | Locator::CssAll(selector) => selector,
                _ => continue,
            };

            match doc.select_all(scope, selector) {
                Ok(nodes) if !nodes.is_empty() => {
                    debug!(pattern = pattern.id, count = nodes.len(), "Found nodes");
                    return (Some(pattern.id), nodes);
                }
                Ok(_) => {}
                Err(e) => warn!(pattern = pattern.id, error = %e, "Pattern failed to resolve"),
            }
        }

        (None, Vec::new())
    }
}

/// A text post whose body slot is missing carries only a title.
pub fn is_title_only<D: Document>(doc: &D) -> bool {
    let root = doc.root();
    let present = |selector: &str| matches!(doc.select_first(root, selector), Ok(Some(_)));
    present(TEXT_POST_SELECTOR) && !present(TEXT_BODY_SELECTOR)
}

fn resolve<'a, D: Document>(
    doc: &'a D,
    scope: D::Node<'a>,
    pattern: &Pattern,
) -> Result<Option<String>> {
    match pattern.locator {
        Locator::Css(selector) => Ok(doc
            .select_first(scope, selector)?
            .and_then(|node| read(doc, node, pattern.reader))),
        Locator::CssAll(selector) => {
            let nodes = doc.select_all(scope, selector)?;
            let min_chars = match pattern.reader {
                Reader::Paragraphs { min_chars } => min_chars,
                _ => 0,
            };
            let paragraphs: Vec<String> = nodes
                .into_iter()
                .map(|node| doc.text(node).trim().to_string())
                .filter(|text| text.chars().count() > min_chars)
                .collect();
            Ok((!paragraphs.is_empty()).then(|| paragraphs.join("\n\n")))
        }
        Locator::UrlSegment(prefix) => Ok(doc.url().and_then(|url| {
            let path = url.path();
            let start = path.find(prefix)? + prefix.len();
            let segment = path[start..].split('/').next()?;
            (!segment.is_empty()).then(|| segment.to_string())
        })),
        Locator::Scope => Ok(read(doc, scope, pattern.reader)),
    }
}

fn read<'a, D: Document>(doc: &'a D, node: D::Node<'a>, reader: Reader) -> Option<String> {
    match reader {
        Reader::Text | Reader::Paragraphs { .. } => Some(doc.text(node)),
        Reader::ChannelName => channel_name(doc, node),
        Reader::MetadataTail => {
            let text = doc.text(node);
            match METADATA_TAIL.captures(&text) {
                Some(caps) => caps.get(1).map(|m| m.as_str().to_string()),
                None => Some(text),
            }
        }
    }
}

fn channel_name<'a, D: Document>(doc: &'a D, node: D::Node<'a>) -> Option<String> {
    // A link that does not point at a channel is not a channel
    if let Some(href) = doc.attr(node, "href") {
        return CHANNEL_HREF
            .captures(&href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
    }

    let text = doc.text(node);
    match CHANNEL_TEXT.captures(&text).and_then(|caps| caps.get(1)) {
        Some(name) => Some(name.as_str().to_string()),
        None => Some(text),
    }
}
