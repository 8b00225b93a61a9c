//! Checks for the semantic blog page.

use super::{ensure_count, ensure_eq, pattern, query, run_checks, Check};
use crate::dom::{self, Document};
use crate::error::Result;
use crate::fixture;
use crate::models::CheckResult;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::path::Path;

pub const POST_TITLES: [&str; 3] = ["Check it out!", "How I did it", "A blog post!"];

const IMAGE_CREDIT: &str = r#"Bizzard, the pup, by Frank Harvey. From the <a href="https://www.flickr.com/photos/statelibraryofnsw/2959326615/">State Library of NSW</a>."#;

const ABBREVIATIONS: [(&str, &str); 2] = [
    ("HTML", "HyperText Markup Language"),
    ("CSS", "Cascading Style Sheets"),
];

/// Boilerplate from an earlier example that must not be copied into the address.
const FOREIGN_FOOTER: [&str; 3] = [
    r"(&copy;|©) 2017 The Author.",
    r"This blog was",
    r"UW Information School",
];

pub struct BlogContext {
    pub doc: Document,
}

pub fn checks() -> Vec<Check<BlogContext>> {
    const HEADINGS: &str = "Has appropriate headings";
    const SECTIONING: &str = "Include semantic sectioning elements";
    const IMAGES: &str = "First post has accessible images";
    const CODE: &str = "Second post describes code";
    const FOOTER: &str = "Footer is semantically accurate";
    vec![
        Check { group: HEADINGS, name: "Headings are meaningful", run: headings_meaningful },
        Check { group: HEADINGS, name: "Headings are hierarchical", run: headings_hierarchical },
        Check { group: SECTIONING, name: "Has header, main, footer sections", run: page_sections },
        Check { group: SECTIONING, name: "Has appropriate sections", run: post_sections },
        Check { group: SECTIONING, name: "Blog post times are annotated", run: post_times },
        Check { group: IMAGES, name: "Image has alternative text", run: image_alt },
        Check { group: IMAGES, name: "Figure is captioned", run: figure_caption },
        Check { group: CODE, name: "Abbreviations are annotated", run: abbreviations },
        Check { group: CODE, name: "HTML code example is displayed", run: code_example },
        Check { group: CODE, name: "CSS components described in descriptive list", run: definition_list },
        Check { group: FOOTER, name: "Contact info annotated", run: contact_info },
        Check { group: FOOTER, name: "Email has a link", run: email_link },
        Check { group: FOOTER, name: "Telephone number has a link", run: phone_link },
    ]
}

pub fn run(dir: &Path) -> Result<Vec<CheckResult>> {
    let source = fixture::load(&dir.join("index.html"))?;
    Ok(check_source(&source))
}

pub fn check_source(source: &str) -> Vec<CheckResult> {
    let ctx = BlogContext {
        doc: Document::parse(source),
    };
    run_checks(&ctx, &checks())
}

fn headings_meaningful(ctx: &BlogContext) -> Result<(), String> {
    ensure_count(&ctx.doc, "h6", 0)?;
    ensure_count(&ctx.doc, ".time-posted", 3)
}

fn headings_hierarchical(ctx: &BlogContext) -> Result<(), String> {
    ensure_count(&ctx.doc, "h1", 1)?;
    ensure_count(&ctx.doc, "h2", 3)?;
    ensure_count(&ctx.doc, "h3", 0)
}

fn page_sections(ctx: &BlogContext) -> Result<(), String> {
    let body = query(ctx.doc.first("body"))?.ok_or("document has no <body>")?;
    let tags: Vec<&str> = dom::children(body).iter().map(dom::tag).collect();
    ensure_eq("children of <body>", tags, vec!["header", "main", "footer"])
}

fn post_sections(ctx: &BlogContext) -> Result<(), String> {
    let main = query(ctx.doc.first("main"))?.ok_or("document has no <main>")?;
    let posts = dom::children(main);
    ensure_eq("number of posts in <main>", posts.len(), POST_TITLES.len())?;
    for (i, post) in posts.iter().enumerate() {
        let tag = dom::tag(post);
        if tag != "section" && tag != "article" {
            return Err(format!("post {} is a <{}>, expected <section> or <article>", i + 1, tag));
        }
        let text = dom::text(post);
        if !text.contains(POST_TITLES[i]) {
            return Err(format!("post {} does not contain its title '{}'", i + 1, POST_TITLES[i]));
        }
        let others = format!(
            "({}|{})",
            regex::escape(POST_TITLES[(i + 1) % 3]),
            regex::escape(POST_TITLES[(i + 2) % 3])
        );
        if let Some(m) = pattern(&others, false)?.find(&text) {
            return Err(format!(
                "post {} also contains the title '{}' of another post",
                i + 1,
                m.as_str()
            ));
        }
    }
    Ok(())
}

fn post_times(ctx: &BlogContext) -> Result<(), String> {
    let times = query(ctx.doc.select("time"))?;
    ensure_eq("number of <time> elements", times.len(), 3)?;
    for (i, time) in times.iter().enumerate() {
        match dom::attr(time, "datetime") {
            Some(stamp) if is_valid_datetime(stamp) => {}
            Some(stamp) => return Err(format!("<time> {} has invalid datetime '{}'", i + 1, stamp)),
            None => return Err(format!("<time> {} has no datetime attribute", i + 1)),
        }
    }
    Ok(())
}

fn image_alt(ctx: &BlogContext) -> Result<(), String> {
    let img = query(ctx.doc.first("img"))?.ok_or("document has no <img>")?;
    let alt = dom::attr(&img, "alt").ok_or("<img> has no alt attribute")?;
    if alt.chars().count() <= 3 {
        return Err(format!("alt text '{}' is too short", alt));
    }
    if pattern(r"an (image|picture) of", true)?.is_match(alt) {
        return Err(format!("alt text '{}' should describe the picture, not call it one", alt));
    }
    Ok(())
}

fn figure_caption(ctx: &BlogContext) -> Result<(), String> {
    let img = query(ctx.doc.first("img"))?.ok_or("document has no <img>")?;
    let figure = dom::parent(img)
        .filter(|p| dom::tag(p) == "figure")
        .ok_or("<img> is not directly inside a <figure>")?;
    let caption = dom::children_named(figure, "figcaption")
        .into_iter()
        .next()
        .ok_or("<figure> has no <figcaption>")?;
    let html = dom::inner_html(&caption);
    if !html.contains(IMAGE_CREDIT) {
        return Err(format!("caption does not credit the image: {}", html));
    }
    ensure_eq(
        "number of <cite> in <figcaption>",
        dom::children_named(caption, "cite").len(),
        1,
    )
}

fn abbreviations(ctx: &BlogContext) -> Result<(), String> {
    let abbrs = query(ctx.doc.select("abbr"))?;
    if abbrs.len() < ABBREVIATIONS.len() {
        return Err(format!(
            "expected at least {} <abbr> elements, found {}",
            ABBREVIATIONS.len(),
            abbrs.len()
        ));
    }
    for (abbr, (short, long)) in abbrs.iter().zip(ABBREVIATIONS) {
        let text = dom::text(abbr);
        if !text.contains(short) {
            return Err(format!("expected <abbr> for '{}', found '{}'", short, text));
        }
        let title = dom::attr(abbr, "title").unwrap_or_default();
        if !title.contains(long) {
            return Err(format!("<abbr>{}</abbr> should be titled '{}', found '{}'", short, long, title));
        }
    }
    Ok(())
}

fn code_example(ctx: &BlogContext) -> Result<(), String> {
    let code = query(ctx.doc.first("code"))?.ok_or("document has no <code>")?;
    ensure_eq(
        "<code> content",
        dom::inner_html(&code).as_str(),
        "&lt;h1&gt;Hello World&lt;/h1&gt;",
    )
}

fn definition_list(ctx: &BlogContext) -> Result<(), String> {
    ensure_count(&ctx.doc, "dl", 1)?;
    let terms = query(ctx.doc.select("dl > dt"))?;
    let defs = query(ctx.doc.select("dl > dd"))?;
    for (i, expected) in ["Selectors", "Properties"].iter().enumerate() {
        let term = terms.get(i).ok_or(format!("missing term {}", i + 1))?;
        ensure_eq(&format!("term {}", i + 1), dom::inner_html(term).as_str(), *expected)?;
    }
    let described = [
        r"Let you say which tags you want to style",
        r"Let you say what style you want to make those tags",
    ];
    for (i, re) in described.iter().enumerate() {
        let def = defs.get(i).ok_or(format!("missing definition {}", i + 1))?;
        let html = dom::inner_html(def);
        if !pattern(re, true)?.is_match(&html) {
            return Err(format!("definition {} does not explain its term: {}", i + 1, html));
        }
    }
    Ok(())
}

fn contact_info(ctx: &BlogContext) -> Result<(), String> {
    let addresses = query(ctx.doc.select("address"))?;
    ensure_eq("number of <address> elements", addresses.len(), 1)?;
    let address = addresses[0];
    if dom::parent(address).map(|p| dom::tag(&p)) != Some("footer") {
        return Err("<address> is not directly inside <footer>".into());
    }
    let html = dom::inner_html(&address);
    if !pattern(r"Contact me at", false)?.is_match(&html) {
        return Err(format!("<address> does not hold the contact line: {}", html));
    }
    for re in FOREIGN_FOOTER {
        if pattern(re, false)?.is_match(&html) {
            return Err(format!("<address> holds more than contact info: {}", html));
        }
    }
    Ok(())
}

fn email_link(ctx: &BlogContext) -> Result<(), String> {
    labelled_link(ctx, "mailto:me@here.com", "me@here.com")
}

fn phone_link(ctx: &BlogContext) -> Result<(), String> {
    labelled_link(ctx, "tel:555-123-4567", "(555) 123-4567")
}

fn labelled_link(ctx: &BlogContext, href: &str, label: &str) -> Result<(), String> {
    let css = format!("a[href=\"{}\"]", href);
    let links = query(ctx.doc.select(&css))?;
    ensure_eq(&format!("number of links to {}", href), links.len(), 1)?;
    ensure_eq(
        &format!("label of link to {}", href),
        dom::inner_html(&links[0]).as_str(),
        label,
    )
}

/// True when `stamp` names a real calendar date or date-time.
pub fn is_valid_datetime(stamp: &str) -> bool {
    let s = stamp.trim();
    if s.is_empty() {
        return false;
    }
    if DateTime::parse_from_rfc3339(s).is_ok() {
        return true;
    }
    let zoned = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(head) => format!("{}+00:00", head),
        None => s.to_string(),
    };
    for fmt in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if DateTime::parse_from_str(&zoned, fmt).is_ok() {
            return true;
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if NaiveDateTime::parse_from_str(s, fmt).is_ok() {
            return true;
        }
    }
    if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        return true;
    }
    if DateTime::parse_from_rfc2822(s).is_ok() {
        return true;
    }
    // written-out forms; %b and %B both accept short and full month names
    for fmt in [
        "%B %d, %Y %H:%M:%S",
        "%B %d, %Y %H:%M",
        "%b %d %Y %H:%M:%S",
        "%b %d %Y %H:%M",
        "%a %b %d %Y %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y/%m/%d %H:%M",
        "%m/%d/%Y %H:%M",
    ] {
        if NaiveDateTime::parse_from_str(s, fmt).is_ok() {
            return true;
        }
    }
    for fmt in [
        "%B %d, %Y",
        "%B %d %Y",
        "%d %B %Y",
        "%d %B, %Y",
        "%a %b %d %Y",
        "%a, %d %b %Y",
        "%Y/%m/%d",
        "%m/%d/%Y",
    ] {
        if NaiveDate::parse_from_str(s, fmt).is_ok() {
            return true;
        }
    }
    // month and year precision
    if s.len() == 7 && NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").is_ok() {
        return true;
    }
    s.len() == 4 && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datetime_validity() {
        for ok in [
            "2017-01-15",
            "2017-01-14T18:30",
            "2017-01-14 18:30:05",
            "2017-01-14T18:30:05.250",
            "2017-01-14T18:30Z",
            "2017-01-14T18:30:00-08:00",
            "2017-02",
            "2017",
        ] {
            assert!(is_valid_datetime(ok), "{} should be valid", ok);
        }
        for bad in ["", "yesterday", "2017-02-30", "2017-13", "15/01/2017", "2017-01-15T25:00"] {
            assert!(!is_valid_datetime(bad), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_written_out_dates_are_valid() {
        for ok in [
            "January 13, 2017",
            "Jan 13, 2017",
            "13 Jan 2017",
            "13 January 2017",
            "2017/01/13",
            "01/13/2017",
            "Fri Jan 13 2017",
            "Jan 13 2017 18:30",
            "January 13, 2017 18:30:05",
            "2017/01/13 18:30",
            "Fri, 13 Jan 2017 18:30:00 +0000",
        ] {
            assert!(is_valid_datetime(ok), "{} should be valid", ok);
        }
        for bad in [
            "February 30, 2017",
            "31 Apr 2017",
            "2017/02/29",
            "13/13/2017",
            "Jan 13, 2017 24:30",
            "Smarch 13, 2017",
        ] {
            assert!(!is_valid_datetime(bad), "{} should be invalid", bad);
        }
    }

    #[test]
    fn test_sibling_title_detected() {
        let page = r#"<html><body><header></header><main>
<section><h2>Check it out!</h2><p>see also How I did it</p></section>
<section><h2>How I did it</h2></section>
<section><h2>A blog post!</h2></section>
</main><footer></footer></body></html>"#;
        let results = check_source(page);
        let sections = results
            .iter()
            .find(|r| r.name == "Has appropriate sections")
            .unwrap();
        assert!(!sections.outcome.passed());
        assert!(sections.outcome.message().contains("How I did it"));
    }

    #[test]
    fn test_nested_definitions_are_not_direct_children() {
        let page = r#"<dl><div><dt>Selectors</dt><dd>Let you say which tags you want to style</dd>
<dt>Properties</dt><dd>Let you say what style you want to make those tags look like</dd></div></dl>"#;
        let ctx = BlogContext {
            doc: Document::parse(page),
        };
        let err = definition_list(&ctx).unwrap_err();
        assert!(err.contains("missing term 1"), "{}", err);
    }

    #[test]
    fn test_copied_footer_boilerplate_rejected() {
        let page = r#"<footer><address>Contact me at <a href="mailto:me@here.com">me@here.com</a>. This blog was made for INFO 343.</address></footer>"#;
        let ctx = BlogContext {
            doc: Document::parse(page),
        };
        assert!(contact_info(&ctx).is_err());
    }
}
