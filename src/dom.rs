//! Parsed document and read-only queries used by the structural suites.
//!
//! Element lists are always returned in document order so callers can index
//! into them directly instead of walking a shared cursor.

use crate::error::{GradeError, Result};
use scraper::{ElementRef, Html, Selector};

pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Document {
            html: Html::parse_document(text),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// All elements matching `css`, in document order.
    pub fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).collect())
    }

    pub fn count(&self, css: &str) -> Result<usize> {
        Ok(self.select(css)?.len())
    }

    pub fn first(&self, css: &str) -> Result<Option<ElementRef<'_>>> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).next())
    }
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| GradeError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Element children of `el`, text and comments skipped.
pub fn children(el: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap).collect()
}

/// Element children of `el` whose tag is `tag`.
pub fn children_named<'a>(el: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    children(el)
        .into_iter()
        .filter(|c| c.value().name() == tag)
        .collect()
}

pub fn parent(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

pub fn tag<'a>(el: &ElementRef<'a>) -> &'a str {
    el.value().name()
}

pub fn attr<'a>(el: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Concatenated descendant text.
pub fn text(el: &ElementRef<'_>) -> String {
    el.text().collect()
}

pub fn inner_html(el: &ElementRef<'_>) -> String {
    el.inner_html()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><body>
<header><h1>Title</h1></header>
<main><!-- posts --><section><h2>One</h2> text</section><article><h2>Two</h2></article></main>
<footer><address>Contact me</address></footer>
<pre><code>&lt;b&gt;</code></pre>
</body></html>"#;

    #[test]
    fn test_children_skip_text_and_comments() {
        let doc = Document::parse(PAGE);
        let main = doc.first("main").unwrap().unwrap();
        let kids = children(main);
        let tags: Vec<_> = kids.iter().map(tag).collect();
        assert_eq!(tags, vec!["section", "article"]);
    }

    #[test]
    fn test_body_children_in_order() {
        let doc = Document::parse(PAGE);
        let body = doc.first("body").unwrap().unwrap();
        let tags: Vec<_> = children(body).iter().map(tag).collect();
        assert_eq!(tags, vec!["header", "main", "footer", "pre"]);
    }

    #[test]
    fn test_parent_and_text() {
        let doc = Document::parse(PAGE);
        let address = doc.first("address").unwrap().unwrap();
        assert_eq!(parent(address).map(|p| tag(&p)), Some("footer"));
        assert_eq!(text(&address), "Contact me");
        let code = doc.first("code").unwrap().unwrap();
        assert_eq!(inner_html(&code), "&lt;b&gt;");
    }

    #[test]
    fn test_bad_selector_is_error() {
        let doc = Document::parse(PAGE);
        assert!(matches!(
            doc.select("main >"),
            Err(GradeError::Selector { .. })
        ));
    }
}
