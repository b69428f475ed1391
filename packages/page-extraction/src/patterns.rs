//! Ordered pattern tables per field kind.
//!
//! Patterns are listed from most to least preferred. The first pattern whose
//! resolution passes validation wins, so order is part of the contract.

use serde::Serialize;

/// Identifier of a pattern, reported back in extraction results.
pub type PatternId = &'static str;

/// The fields the extractor knows how to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Title,
    Body,
    /// Comment containers (resolved to a list of nodes)
    Comment,
    /// Text inside one comment container
    CommentBody,
    Channel,
    CommentCount,
    UpvoteRatio,
}

impl FieldKind {
    /// Body-like fields are subject to the junk filter.
    pub fn is_body_like(self) -> bool {
        matches!(self, FieldKind::Body)
    }
}

/// How a pattern locates its source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// First element matching a CSS selector within the scope
    Css(&'static str),
    /// Every element matching a CSS selector within the scope
    CssAll(&'static str),
    /// Path segment that follows this prefix in the document URL
    UrlSegment(&'static str),
    /// The scope node itself
    Scope,
}

/// How text is read from a resolved node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    /// Full text content
    Text,
    /// Channel name from an `href` (`/r/<name>`), `r/<name>` text, or the text itself
    ChannelName,
    /// Text after the first vote/age marker ("points", "ago", "score hidden")
    MetadataTail,
    /// Paragraphs longer than `min_chars`, joined by blank lines
    Paragraphs { min_chars: usize },
}

/// One way to locate a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub id: PatternId,
    pub kind: FieldKind,
    pub locator: Locator,
    pub reader: Reader,
}

impl Pattern {
    pub const fn css(id: PatternId, kind: FieldKind, selector: &'static str) -> Self {
        Self {
            id,
            kind,
            locator: Locator::Css(selector),
            reader: Reader::Text,
        }
    }

    pub const fn read_with(mut self, reader: Reader) -> Self {
        self.reader = reader;
        self
    }

    pub const fn locate(id: PatternId, kind: FieldKind, locator: Locator, reader: Reader) -> Self {
        Self {
            id,
            kind,
            locator,
            reader,
        }
    }
}

/// Present on text posts.
pub const TEXT_POST_SELECTOR: &str = r#"shreddit-post[post-type="text"]"#;
/// Present when a text post has a body.
pub const TEXT_BODY_SELECTOR: &str = r#"shreddit-post div[slot="text-body"]"#;

use FieldKind::*;

pub static TITLE_PATTERNS: &[Pattern] = &[
    Pattern::css("title.slot", Title, r#"h1[slot="title"]"#),
    Pattern::css("title.post-title-class", Title, "h1.Post__title"),
    Pattern::css("title.testid", Title, r#"h1[data-testid="post-title"]"#),
    Pattern::css("title.post-content-heading", Title, r#"div[data-test-id="post-content"] h1"#),
    Pattern::css("title.adclick-heading", Title, r#"div[data-adclicklocation="title"] h1"#),
    Pattern::css("title.legacy-heading", Title, "div.title h1"),
    Pattern::css("title.shreddit-title", Title, "shreddit-title"),
    Pattern::css("title.any-heading", Title, "h1"),
];

pub static BODY_PATTERNS: &[Pattern] = &[
    Pattern::css("body.click-text", Body, r#"div[data-click-id="text"]"#),
    Pattern::css("body.testid", Body, r#"div[data-testid="post-content"]"#),
    Pattern::css("body.text-body-slot", Body, TEXT_BODY_SELECTOR),
    Pattern::css("body.adclick-content", Body, r#"div[data-adclicklocation="post_content"]"#),
    Pattern::css("body.usertext-md", Body, "div.usertext-body div.md"),
    Pattern::css("body.expando-usertext", Body, "div.expando div.usertext-body"),
    Pattern::css("body.expando-md", Body, "div.expando div.md"),
    Pattern::css("body.post-content", Body, "div.post-content"),
    Pattern::css("body.article", Body, "article"),
    Pattern::locate(
        "body.main-paragraphs",
        Body,
        Locator::CssAll("main p"),
        Reader::Paragraphs { min_chars: 20 },
    ),
];

pub static COMMENT_PATTERNS: &[Pattern] = &[
    Pattern::css("comment.shreddit", Comment, "shreddit-comment"),
    Pattern::css("comment.testid", Comment, r#"div[data-testid="comment"]"#),
    Pattern::css("comment.class", Comment, "div.comment"),
    Pattern::css("comment.thing", Comment, "div.thing.comment"),
];

pub static COMMENT_BODY_PATTERNS: &[Pattern] = &[
    Pattern::css(
        "comment-body.testid-content",
        CommentBody,
        r#"div[data-testid="comment"] div[data-testid="comment-content"]"#,
    ),
    Pattern::css("comment-body.slot", CommentBody, r#"div[slot="comment"]"#),
    Pattern::css("comment-body.click-text", CommentBody, r#"div[data-click-id="text"]"#),
    Pattern::css("comment-body.usertext-md", CommentBody, "div.usertext-body div.md"),
    Pattern::css("comment-body.paragraph", CommentBody, "p"),
    Pattern::css("comment-body.md", CommentBody, "div.md"),
    Pattern::locate(
        "comment-body.metadata-tail",
        CommentBody,
        Locator::Scope,
        Reader::MetadataTail,
    ),
];

pub static CHANNEL_PATTERNS: &[Pattern] = &[
    Pattern::locate("channel.url", Channel, Locator::UrlSegment("/r/"), Reader::Text),
    Pattern::css("channel.link", Channel, r#"a[href^="/r/"]"#).read_with(Reader::ChannelName),
    Pattern::css("channel.testid-link", Channel, r#"a[data-testid="subreddit-link"]"#)
        .read_with(Reader::ChannelName),
    Pattern::css("channel.class-link", Channel, "a.subreddit").read_with(Reader::ChannelName),
    Pattern::css("channel.header", Channel, "shreddit-subreddit-header")
        .read_with(Reader::ChannelName),
];

pub static COMMENT_COUNT_PATTERNS: &[Pattern] = &[Pattern::css(
    "comment-count.testid",
    CommentCount,
    r#"span[data-testid="comment-count"]"#,
)];

pub static UPVOTE_RATIO_PATTERNS: &[Pattern] = &[Pattern::css(
    "upvote-ratio.testid",
    UpvoteRatio,
    r#"div[data-testid="post-upvote-ratio"]"#,
)];

/// The full set of patterns, grouped by kind in preference order.
#[derive(Debug, Clone)]
pub struct PatternTable {
    entries: Vec<Pattern>,
}

impl Default for PatternTable {
    fn default() -> Self {
        Self::reddit()
    }
}

impl PatternTable {
    /// Build a table from explicit entries. Relative order per kind is kept.
    pub fn new(entries: impl IntoIterator<Item = Pattern>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Patterns for current and legacy Reddit layouts.
    pub fn reddit() -> Self {
        Self::new(
            [
                TITLE_PATTERNS,
                BODY_PATTERNS,
                COMMENT_PATTERNS,
                COMMENT_BODY_PATTERNS,
                CHANNEL_PATTERNS,
                COMMENT_COUNT_PATTERNS,
                UPVOTE_RATIO_PATTERNS,
            ]
            .into_iter()
            .flatten()
            .copied(),
        )
    }

    /// Patterns for one kind, most preferred first.
    pub fn for_kind(&self, kind: FieldKind) -> impl Iterator<Item = &Pattern> + '_ {
        self.entries.iter().filter(move |p| p.kind == kind)
    }

    /// Look a pattern up by id.
    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.entries.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
