//! Post snapshots: one extraction pass over a whole page.

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::document::Document;
use crate::extractor::{ExtractionResult, FieldExtractor};
use crate::patterns::FieldKind;

/// Engagement numbers shown next to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetrics {
    pub comment_count: ExtractionResult,
    pub upvote_ratio: ExtractionResult,
}

/// Every field of a post, extracted from one document.
///
/// A new snapshot supersedes the previous one; nothing is merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostSnapshot {
    pub title: ExtractionResult,
    pub body: ExtractionResult,
    pub channel: ExtractionResult,
    pub metrics: PostMetrics,
}

impl PostSnapshot {
    /// SHA-256 over the extracted values, hex encoded.
    ///
    /// Two snapshots of an unchanged page share a fingerprint. Pattern ids do
    /// not contribute, only what was read.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            &self.title,
            &self.body,
            &self.channel,
            &self.metrics.comment_count,
            &self.metrics.upvote_ratio,
        ] {
            match field.value() {
                Some(value) => {
                    hasher.update([1u8]);
                    hasher.update((value.len() as u64).to_be_bytes());
                    hasher.update(value.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Title and body as one block of text, the way prompts quote a post.
    pub fn original_post(&self) -> String {
        match (self.title.value(), self.body.value()) {
            (Some(title), Some(body)) => format!("{}\n\n{}", title, body),
            (Some(title), None) => title.to_string(),
            (None, Some(body)) => body.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// Composes [`FieldExtractor`] calls into page-level operations.
#[derive(Debug, Clone, Default)]
pub struct ExtractionOrchestrator {
    extractor: FieldExtractor,
}

impl ExtractionOrchestrator {
    pub fn new(extractor: FieldExtractor) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    /// Extract every post field. Idempotent over an unchanged document.
    pub fn snapshot<D: Document>(&self, doc: &D) -> PostSnapshot {
        let snapshot = PostSnapshot {
            title: self.extractor.extract(FieldKind::Title, doc),
            body: self.extractor.extract(FieldKind::Body, doc),
            channel: self.extractor.extract(FieldKind::Channel, doc),
            metrics: PostMetrics {
                comment_count: self.extractor.extract(FieldKind::CommentCount, doc),
                upvote_ratio: self.extractor.extract(FieldKind::UpvoteRatio, doc),
            },
        };

        info!(
            title = snapshot.title.is_found(),
            body = snapshot.body.is_found(),
            channel = snapshot.channel.value_or("-"),
            "Captured post snapshot"
        );
        snapshot
    }

    /// Text of one comment, read inside the comment's own subtree.
    pub fn extract_comment<'a, D: Document>(
        &self,
        doc: &'a D,
        comment: D::Node<'a>,
    ) -> ExtractionResult {
        self.extractor
            .extract_within(FieldKind::CommentBody, doc, comment)
    }

    /// Comment containers on the page, in document order.
    pub fn find_comments<'a, D: Document>(&self, doc: &'a D) -> Vec<D::Node<'a>> {
        let (pattern, nodes) = self
            .extractor
            .find_all(FieldKind::Comment, doc, doc.root());
        debug!(?pattern, count = nodes.len(), "Comment discovery");
        nodes
    }

    /// Whether the document is a single post's page rather than a listing.
    pub fn is_post_detail_page<D: Document>(&self, doc: &D) -> bool {
        doc.url()
            .map(|url| url.path().contains("/comments/"))
            .unwrap_or(false)
    }
}
