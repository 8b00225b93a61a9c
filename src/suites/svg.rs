//! Checks for the styled SVG illustration.
//!
//! Shapes are addressed by their position among the element children of the
//! first `<svg>`, which the fixture pins with its checksum.

use super::{query, run_checks, Check};
use crate::cascade::{self, ComputedStyles, Stylesheet};
use crate::dom::{self, Document};
use crate::error::Result;
use crate::fixture;
use crate::models::CheckResult;
use scraper::ElementRef;
use std::path::Path;

pub const PINNED_CHECKSUM: &str = "4689fe46fd5ce51dd11ed7a922c638d9";

const GRAY: &str = "#5f5f5f";
const LIGHT_GRAY: &str = "#c0c0c0";

pub struct SvgContext<'a> {
    pub source: &'a str,
    pub sheets: &'a [Stylesheet],
    pub styles: ComputedStyles<'a>,
    pub shapes: Vec<ElementRef<'a>>,
}

pub fn checks<'a>() -> Vec<Check<SvgContext<'a>>> {
    const CSS: &str = "Includes required CSS rules";
    vec![
        Check { group: "Source code is valid", name: "HTML is unmodified", run: unmodified },
        Check { group: CSS, name: "Colors circles gray", run: circles_gray },
        Check { group: CSS, name: "Specifies path stroke", run: antenna_stroke },
        Check { group: CSS, name: "Colors circles white", run: eyes_white },
        Check { group: CSS, name: "Colors circles brown", run: pupils_brown },
        Check { group: CSS, name: "Colors circle and rect light gray", run: nose_light_gray },
        Check { group: CSS, name: "Colors path gray with red stroke", run: mouth_colored },
        Check { group: CSS, name: "Changes color on hover", run: mouth_hover },
        Check { group: CSS, name: "Hides rects", run: teeth_hidden },
        Check { group: CSS, name: "Has no stroke", run: chin_unstroked },
    ]
}

pub fn run(dir: &Path) -> Result<Vec<CheckResult>> {
    let source = fixture::load(&dir.join("index.html"))?;
    check_source(&source, dir)
}

/// Run the suite on `source`, resolving linked stylesheets against `base_dir`.
pub fn check_source(source: &str, base_dir: &Path) -> Result<Vec<CheckResult>> {
    let doc = Document::parse(source);
    let sheets = cascade::collect_stylesheets(&doc, base_dir)?;
    let ctx = context(source, &doc, &sheets)?;
    Ok(run_checks(&ctx, &checks()))
}

fn context<'a>(source: &'a str, doc: &'a Document, sheets: &'a [Stylesheet]) -> Result<SvgContext<'a>> {
    let shapes = doc.first("svg")?.map(dom::children).unwrap_or_default();
    log::debug!("svg has {} shapes", shapes.len());
    Ok(SvgContext {
        source,
        sheets,
        styles: cascade::resolve(doc, sheets),
        shapes,
    })
}

fn shape<'a>(ctx: &SvgContext<'a>, index: usize) -> Result<ElementRef<'a>, String> {
    ctx.shapes
        .get(index)
        .copied()
        .ok_or_else(|| format!("<svg> has no child at position {}", index))
}

fn child<'a>(ctx: &SvgContext<'a>, index: usize, nth: usize) -> Result<ElementRef<'a>, String> {
    let group = shape(ctx, index)?;
    dom::children(group)
        .get(nth)
        .copied()
        .ok_or_else(|| format!("<{}> at position {} has no child {}", dom::tag(&group), index, nth))
}

fn ensure_css<'a>(ctx: &SvgContext<'a>, el: ElementRef<'a>, prop: &str, expected: &str) -> Result<(), String> {
    let actual = ctx.styles.css(&el, prop);
    if actual.is_some_and(|v| v.eq_ignore_ascii_case(expected)) {
        return Ok(());
    }
    Err(format!(
        "{} of {}: expected {}, found {}",
        prop,
        describe(el),
        expected,
        actual.unwrap_or("nothing")
    ))
}

fn describe(el: ElementRef<'_>) -> String {
    match (dom::attr(&el, "id"), dom::attr(&el, "class")) {
        (Some(id), _) => format!("<{}#{}>", dom::tag(&el), id),
        (None, Some(class)) => format!("<{}.{}>", dom::tag(&el), class),
        (None, None) => format!("<{}>", dom::tag(&el)),
    }
}

fn unmodified(ctx: &SvgContext<'_>) -> Result<(), String> {
    fixture::verify(ctx.source, PINNED_CHECKSUM)
}

fn circles_gray(ctx: &SvgContext<'_>) -> Result<(), String> {
    for i in [1, 2] {
        ensure_css(ctx, shape(ctx, i)?, "fill", GRAY)?;
    }
    Ok(())
}

fn antenna_stroke(ctx: &SvgContext<'_>) -> Result<(), String> {
    for i in [3, 4] {
        let el = shape(ctx, i)?;
        ensure_css(ctx, el, "stroke", GRAY)?;
        ensure_css(ctx, el, "stroke-width", "8px")?;
    }
    Ok(())
}

fn eyes_white(ctx: &SvgContext<'_>) -> Result<(), String> {
    for i in [5, 6] {
        ensure_css(ctx, shape(ctx, i)?, "fill", "white")?;
    }
    Ok(())
}

fn pupils_brown(ctx: &SvgContext<'_>) -> Result<(), String> {
    for nth in [0, 1] {
        ensure_css(ctx, child(ctx, 7, nth)?, "fill", "#573d29")?;
    }
    Ok(())
}

fn nose_light_gray(ctx: &SvgContext<'_>) -> Result<(), String> {
    ensure_css(ctx, child(ctx, 8, 0)?, "fill", LIGHT_GRAY)?;
    let rect = child(ctx, 8, 1)?;
    ensure_css(ctx, rect, "fill", LIGHT_GRAY)?;
    if ctx.styles.css(&rect, "opacity").map(str::trim) == Some("0") {
        return Err(format!("{} must stay visible", describe(rect)));
    }
    Ok(())
}

fn mouth_colored(ctx: &SvgContext<'_>) -> Result<(), String> {
    let mouth = shape(ctx, 9)?;
    ensure_css(ctx, mouth, "fill", LIGHT_GRAY)?;
    ensure_css(ctx, mouth, "stroke", "#bd250d")?;
    ensure_css(ctx, mouth, "stroke-width", "4px")
}

fn mouth_hover(ctx: &SvgContext<'_>) -> Result<(), String> {
    let mouth = shape(ctx, 9)?;
    for sheet in ctx.sheets {
        for (base, rule) in sheet.rules_with_pseudo(":hover") {
            if rule.declarations.is_empty() {
                continue;
            }
            let base = if base.trim().is_empty() { "*" } else { base.trim() };
            match query(dom::selector(base)) {
                Ok(sel) if sel.matches(&mouth) => return Ok(()),
                Ok(_) => {}
                Err(e) => log::debug!("skipping hover selector: {}", e),
            }
        }
    }
    Err(format!("no :hover rule applies to {}", describe(mouth)))
}

fn teeth_hidden(ctx: &SvgContext<'_>) -> Result<(), String> {
    for i in [11, 12, 13] {
        ensure_css(ctx, shape(ctx, i)?, "opacity", "0")?;
    }
    Ok(())
}

fn chin_unstroked(ctx: &SvgContext<'_>) -> Result<(), String> {
    let chin = shape(ctx, 14)?;
    let stroke = ctx.styles.css(&chin, "stroke").map(str::trim);
    if stroke.is_some_and(|s| s.eq_ignore_ascii_case("none")) {
        return Ok(());
    }
    let width = ctx.styles.css(&chin, "stroke-width").map(str::trim);
    if width.is_some_and(|w| super::pattern(r"^0(px)?$", false).is_ok_and(|re| re.is_match(w))) {
        return Ok(());
    }
    Err(format!(
        "{} still has a stroke ({}, width {})",
        describe(chin),
        stroke.unwrap_or("nothing"),
        width.unwrap_or("nothing")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><style>
circle { fill: #5f5f5f }
path { stroke: #5F5F5F; stroke-width: 8px }
.eye { fill: white }
g circle { fill: #573d29 }
#n * { fill: #c0c0c0 }
#m { fill: #c0c0c0; stroke: #bd250d; stroke-width: 4px }
svg #m:hover { fill: red }
rect.t { opacity: 0 }
#c { stroke-width: 0 }
</style></head><body><svg>
<rect/><circle/><circle/><path/><path/>
<circle class="eye"/><circle class="eye"/>
<g><circle/><circle/></g>
<g id="n"><circle/><rect/></g>
<path id="m"/><use/>
<rect class="t"/><rect class="t"/><rect class="t"/>
<rect id="c"/>
</svg></body></html>"#;

    fn results(page: &str) -> Vec<CheckResult> {
        check_source(page, Path::new(".")).unwrap()
    }

    #[test]
    fn test_style_checks_pass_on_matching_page() {
        for r in results(PAGE).iter().skip(1) {
            assert!(r.outcome.passed(), "{}: {}", r.name, r.outcome.message());
        }
    }

    #[test]
    fn test_modified_page_fails_integrity_only() {
        let first = &results(PAGE)[0];
        assert_eq!(first.name, "HTML is unmodified");
        assert!(!first.outcome.passed());
    }

    #[test]
    fn test_hover_rule_must_target_mouth() {
        let page = PAGE.replace("svg #m:hover", "#c:hover");
        let r = results(&page);
        let hover = r.iter().find(|r| r.name == "Changes color on hover").unwrap();
        assert!(!hover.outcome.passed());
        assert!(hover.outcome.message().contains("path#m"));
    }

    #[test]
    fn test_hidden_nose_rect_fails() {
        let page = PAGE.replace("#n * { fill: #c0c0c0 }", "#n * { fill: #c0c0c0; opacity: 0 }");
        let r = results(&page);
        let nose = r.iter().find(|r| r.name == "Colors circle and rect light gray").unwrap();
        assert!(!nose.outcome.passed());
    }

    #[test]
    fn test_missing_shapes_fail_instead_of_panicking() {
        let r = results("<html><body><p>no drawing</p></body></html>");
        assert!(r.iter().all(|r| !r.outcome.passed()));
    }
}
