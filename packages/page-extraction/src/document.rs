//! Read-only view over a queryable document tree.
//!
//! The extractor only needs "first match", "all matches", text and
//! attributes. [`HtmlDocument`] provides them over a parsed HTML page;
//! [`FakeDocument`](crate::testing::FakeDocument) provides them from a table.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{ResolveError, Result};

/// A hierarchical, queryable document. Implementations never mutate the tree.
pub trait Document {
    /// Handle to a node, cheap to copy.
    type Node<'a>: Copy
    where
        Self: 'a;

    /// The top-level node.
    fn root(&self) -> Self::Node<'_>;

    /// Address of the document, when known.
    fn url(&self) -> Option<&Url>;

    /// First node under `scope` matching `selector`.
    fn select_first<'a>(
        &'a self,
        scope: Self::Node<'a>,
        selector: &str,
    ) -> Result<Option<Self::Node<'a>>>;

    /// All nodes under `scope` matching `selector`, in document order.
    fn select_all<'a>(&'a self, scope: Self::Node<'a>, selector: &str)
        -> Result<Vec<Self::Node<'a>>>;

    /// Concatenated text content of the node and its descendants.
    fn text<'a>(&'a self, node: Self::Node<'a>) -> String;

    /// Attribute value on the node.
    fn attr<'a>(&'a self, node: Self::Node<'a>, name: &str) -> Option<String>;
}

/// A parsed HTML page.
pub struct HtmlDocument {
    html: Html,
    url: Option<Url>,
}

impl HtmlDocument {
    /// Parse a full HTML document. Parsing never fails; malformed markup is
    /// recovered the way browsers recover it.
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
            url: None,
        }
    }

    /// Parse an HTML fragment (e.g. one comment's markup).
    pub fn parse_fragment(html: &str) -> Self {
        Self {
            html: Html::parse_fragment(html),
            url: None,
        }
    }

    /// Attach the page address.
    pub fn with_url(mut self, url: &str) -> Result<Self> {
        self.url = Some(Url::parse(url)?);
        Ok(self)
    }

    fn compile(selector: &str) -> Result<Selector> {
        Selector::parse(selector).map_err(|e| ResolveError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for HtmlDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlDocument")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

impl Document for HtmlDocument {
    type Node<'a> = ElementRef<'a>;

    fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    fn select_first<'a>(
        &'a self,
        scope: ElementRef<'a>,
        selector: &str,
    ) -> Result<Option<ElementRef<'a>>> {
        let selector = Self::compile(selector)?;
        Ok(scope.select(&selector).next())
    }

    fn select_all<'a>(&'a self, scope: ElementRef<'a>, selector: &str) -> Result<Vec<ElementRef<'a>>> {
        let selector = Self::compile(selector)?;
        Ok(scope.select(&selector).collect())
    }

    fn text<'a>(&'a self, node: ElementRef<'a>) -> String {
        node.text().collect()
    }

    fn attr<'a>(&'a self, node: ElementRef<'a>, name: &str) -> Option<String> {
        node.value().attr(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <h1 class="Post__title">Hello <em>there</em></h1>
          <a href="/r/rust/" data-testid="subreddit-link">r/rust</a>
          <div class="comment"><p>first</p></div>
          <div class="comment"><p>second</p></div>
        </body></html>
    "#;

    #[test]
    fn test_select_first_and_text() {
        let doc = HtmlDocument::parse(PAGE);
        let heading = doc.select_first(doc.root(), "h1.Post__title").unwrap().unwrap();
        assert_eq!(doc.text(heading), "Hello there");
    }

    #[test]
    fn test_select_all_in_order() {
        let doc = HtmlDocument::parse(PAGE);
        let comments = doc.select_all(doc.root(), "div.comment").unwrap();
        let texts: Vec<_> = comments.iter().map(|c| doc.text(*c)).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_scoped_query() {
        let doc = HtmlDocument::parse(PAGE);
        let comments = doc.select_all(doc.root(), "div.comment").unwrap();
        let paragraph = doc.select_first(comments[1], "p").unwrap().unwrap();
        assert_eq!(doc.text(paragraph), "second");
    }

    #[test]
    fn test_attr() {
        let doc = HtmlDocument::parse(PAGE);
        let link = doc.select_first(doc.root(), "a").unwrap().unwrap();
        assert_eq!(doc.attr(link, "href").as_deref(), Some("/r/rust/"));
        assert_eq!(doc.attr(link, "title"), None);
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let doc = HtmlDocument::parse(PAGE);
        let err = doc.select_first(doc.root(), "h1[").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidSelector { .. }));
    }

    #[test]
    fn test_url() {
        let doc = HtmlDocument::parse(PAGE)
            .with_url("https://www.reddit.com/r/rust/comments/abc/hello/")
            .unwrap();
        assert_eq!(doc.url().unwrap().path(), "/r/rust/comments/abc/hello/");
        assert!(HtmlDocument::parse(PAGE).with_url("not a url").is_err());
    }
}
