//! Resilient Field Extraction
//!
//! Locates named content fields (title, body, channel, comment text, post
//! metrics) in page documents whose markup changes without notice.
//!
//! # Design
//!
//! - Every field has an ordered list of structural patterns, most preferred
//!   first. The first candidate that passes validation wins.
//! - A pattern that fails to resolve is logged and skipped. Extraction itself
//!   never fails: "not found" is an ordinary result.
//! - Results name the pattern that produced them, so a wrong match can be
//!   traced back to its selector.
//!
//! # Usage
//!
//! ```rust,ignore
//! use page_extraction::{ExtractionOrchestrator, HtmlDocument};
//!
//! let doc = HtmlDocument::parse(&html).with_url(url)?;
//! let orchestrator = ExtractionOrchestrator::default();
//!
//! let snapshot = orchestrator.snapshot(&doc);
//! for comment in orchestrator.find_comments(&doc) {
//!     let text = orchestrator.extract_comment(&doc, comment);
//! }
//! ```
//!
//! # Modules
//!
//! - [`patterns`] - Pattern tables per field kind
//! - [`document`] - Document abstraction and the HTML implementation
//! - [`extractor`] - Ordered-fallback extraction with the junk filter
//! - [`snapshot`] - Whole-post snapshots and comment discovery
//! - [`testing`] - Table-driven fake document

pub mod document;
pub mod error;
pub mod extractor;
pub mod patterns;
pub mod snapshot;
pub mod testing;

pub use document::{Document, HtmlDocument};
pub use error::{ResolveError, Result};
pub use extractor::{is_title_only, ExtractionResult, FieldExtractor, JunkFilter};
pub use patterns::{FieldKind, Locator, Pattern, PatternId, PatternTable, Reader};
pub use snapshot::{ExtractionOrchestrator, PostMetrics, PostSnapshot};
