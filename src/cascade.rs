//! Cascade resolution for author stylesheets.
//!
//! Computes the effective value of every property on every element the way a
//! browser would for a static page, then exposes it per element (the values
//! an inliner would write into `style` attributes).
//!
//! Precedence, lowest first:
//! 1. SVG presentation attributes (`fill="red"` on an element inside `<svg>`)
//! 2. author rules
//! 3. inline `style` declarations
//! 4. author `!important`
//! 5. inline `!important`
//!
//! Within a layer the higher specificity wins, then the later declaration.
//! Inherited properties flow from parent to child when the child has no
//! cascaded value of its own.

use crate::dom::{self, Document};
use crate::error::{GradeError, Result};
use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Properties that inherit by default.
const INHERITED: &[&str] = &[
    "color",
    "cursor",
    "direction",
    "fill",
    "fill-opacity",
    "fill-rule",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-type",
    "paint-order",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-align",
    "text-anchor",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
];

/// SVG attributes that act as lowest-priority style declarations.
const PRESENTATION_ATTRS: &[&str] = &[
    "color",
    "display",
    "fill",
    "fill-opacity",
    "fill-rule",
    "font-family",
    "font-size",
    "font-weight",
    "opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-opacity",
    "stroke-width",
    "visibility",
];

/// Pseudo-classes and pseudo-elements that never match a static document.
const DYNAMIC_PSEUDOS: &[&str] = &[
    ":hover",
    ":focus",
    ":active",
    ":visited",
    ":target",
    "::",
    ":before",
    ":after",
    ":first-line",
    ":first-letter",
];

pub fn is_inherited(prop: &str) -> bool {
    INHERITED.contains(&prop)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selectors: Vec<String>,
    pub declarations: Vec<Declaration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    pub rules: Vec<StyleRule>,
}

impl Stylesheet {
    /// Parse qualified rules. At-rules (`@media`, `@import`, ...) are skipped.
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        let mut rest = css.as_str();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if rest.starts_with('@') {
                rest = skip_at_rule(rest);
                continue;
            }
            let Some(open) = rest.find('{') else {
                break;
            };
            let prelude = &rest[..open];
            let body_start = open + 1;
            let close = matching_brace(rest, open).unwrap_or(rest.len());
            let body = &rest[body_start..close.min(rest.len())];
            let selectors = split_top_level(prelude, ',')
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>();
            if !selectors.is_empty() {
                rules.push(StyleRule {
                    selectors,
                    declarations: parse_declarations(body),
                });
            }
            rest = rest.get(close + 1..).unwrap_or("");
        }
        Stylesheet { rules }
    }

    /// Rules whose selector uses `pseudo` (e.g. `:hover`), paired with the
    /// selector with that pseudo-class removed.
    pub fn rules_with_pseudo<'s>(&'s self, pseudo: &str) -> Vec<(String, &'s StyleRule)> {
        let mut out = Vec::new();
        for rule in &self.rules {
            for sel in &rule.selectors {
                if sel.to_ascii_lowercase().contains(pseudo) {
                    out.push((remove_ci(sel, pseudo), rule));
                }
            }
        }
        out
    }
}

/// Parse the inside of a declaration block or a `style` attribute.
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    split_top_level(block, ';')
        .into_iter()
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let mut value = value.trim().to_string();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            let mut important = false;
            if let Some(bang) = value.rfind('!') {
                if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
                    important = true;
                    value = value[..bang].trim_end().to_string();
                }
            }
            Some(Declaration {
                name,
                value,
                important,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
/// Selector specificity: (ids, classes/attributes/pseudo-classes, types/pseudo-elements).
pub struct Specificity(pub u32, pub u32, pub u32);

pub fn specificity(selector: &str) -> Specificity {
    let chars: Vec<char> = selector.chars().collect();
    let mut spec = Specificity::default();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '#' => {
                spec.0 += 1;
                i = skip_ident(&chars, i + 1);
            }
            '.' => {
                spec.1 += 1;
                i = skip_ident(&chars, i + 1);
            }
            '[' => {
                spec.1 += 1;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                spec.2 += 1;
                i = skip_ident(&chars, i + 2);
                i = skip_parens(&chars, i);
            }
            ':' => {
                let end = skip_ident(&chars, i + 1);
                let name: String = chars[i + 1..end].iter().collect::<String>().to_ascii_lowercase();
                i = end;
                match name.as_str() {
                    // zero specificity, argument included
                    "where" => i = skip_parens(&chars, i),
                    // counts as its most specific argument
                    "not" | "is" | "has" => {
                        let end = skip_parens(&chars, i);
                        if end > i {
                            let close = if chars[end - 1] == ')' { end - 1 } else { end };
                            let arg: String = chars[i + 1..close].iter().collect();
                            let most = split_top_level(&arg, ',')
                                .into_iter()
                                .map(|part| specificity(part.trim()))
                                .max()
                                .unwrap_or_default();
                            spec.0 += most.0;
                            spec.1 += most.1;
                            spec.2 += most.2;
                        }
                        i = end;
                    }
                    "before" | "after" | "first-line" | "first-letter" => spec.2 += 1,
                    _ => {
                        spec.1 += 1;
                        i = skip_parens(&chars, i);
                    }
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                spec.2 += 1;
                i = skip_ident(&chars, i);
            }
            _ => i += 1,
        }
    }
    spec
}

pub fn is_dynamic(selector: &str) -> bool {
    let lower = selector.to_ascii_lowercase();
    DYNAMIC_PSEUDOS.iter().any(|p| lower.contains(p))
}

/// Gather `<style>` blocks and linked local stylesheets in document order.
pub fn collect_stylesheets(doc: &Document, base_dir: &Path) -> Result<Vec<Stylesheet>> {
    let mut sheets = Vec::new();
    for el in doc.select("style, link")? {
        match dom::tag(&el) {
            "style" => sheets.push(Stylesheet::parse(&dom::text(&el))),
            _ => {
                let is_sheet = dom::attr(&el, "rel")
                    .map(|rel| {
                        rel.split_whitespace()
                            .any(|r| r.eq_ignore_ascii_case("stylesheet"))
                    })
                    .unwrap_or(false);
                let Some(href) = dom::attr(&el, "href").filter(|_| is_sheet) else {
                    continue;
                };
                let lower = href.to_ascii_lowercase();
                if lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("//") {
                    log::warn!("skipping remote stylesheet {}", href);
                    continue;
                }
                let local = href.strip_prefix("file://").unwrap_or(href);
                let local = local.split(['?', '#']).next().unwrap_or(local);
                let path = base_dir.join(local);
                let css = fs::read_to_string(&path).map_err(|e| GradeError::io(&path, e))?;
                log::debug!("loaded stylesheet {}", path.display());
                sheets.push(Stylesheet::parse(&css));
            }
        }
    }
    Ok(sheets)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Layer {
    Presentation,
    Author,
    Inline,
    AuthorImportant,
    InlineImportant,
}

type Priority = (Layer, Specificity, usize);

struct CompiledSelector<'s> {
    selector: Selector,
    specificity: Specificity,
    rule: &'s StyleRule,
    order: usize,
}

/// Resolved style of every element in a document.
pub struct ComputedStyles<'a> {
    entries: Vec<(ElementRef<'a>, BTreeMap<String, String>)>,
}

impl<'a> ComputedStyles<'a> {
    /// Effective value of `prop` on `el`.
    pub fn css(&self, el: &ElementRef<'a>, prop: &str) -> Option<&str> {
        self.styles_of(el)?.get(prop).map(String::as_str)
    }

    pub fn styles_of(&self, el: &ElementRef<'a>) -> Option<&BTreeMap<String, String>> {
        self.entries
            .iter()
            .find(|(e, _)| e.id() == el.id())
            .map(|(_, styles)| styles)
    }

    /// The `style` attribute an inliner would write for `el`.
    pub fn style_attribute(&self, el: &ElementRef<'a>) -> Option<String> {
        let styles = self.styles_of(el)?;
        if styles.is_empty() {
            return None;
        }
        Some(
            styles
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Load the document's stylesheets relative to `base_dir` and resolve them.
pub fn inline<'a>(doc: &'a Document, base_dir: &Path) -> Result<ComputedStyles<'a>> {
    let sheets = collect_stylesheets(doc, base_dir)?;
    Ok(resolve(doc, &sheets))
}

pub fn resolve<'a>(doc: &'a Document, sheets: &[Stylesheet]) -> ComputedStyles<'a> {
    let mut compiled = Vec::new();
    let mut order = 0usize;
    for sheet in sheets {
        for rule in &sheet.rules {
            for sel in &rule.selectors {
                order += 1;
                if is_dynamic(sel) {
                    continue;
                }
                match Selector::parse(sel) {
                    Ok(selector) => compiled.push(CompiledSelector {
                        selector,
                        specificity: specificity(sel),
                        rule,
                        order,
                    }),
                    Err(e) => log::debug!("skipping selector '{}': {:?}", sel, e),
                }
            }
        }
    }

    let mut entries = Vec::new();
    walk(doc.html().root_element(), &compiled, &mut entries);
    ComputedStyles { entries }
}

/// Compute styles for `root` and its descendants, parents before children.
fn walk<'a>(
    root: ElementRef<'a>,
    compiled: &[CompiledSelector<'_>],
    out: &mut Vec<(ElementRef<'a>, BTreeMap<String, String>)>,
) {
    let none = BTreeMap::new();
    // element, index of its parent in `out`, whether the parent is inside <svg>
    let mut pending: Vec<(ElementRef<'a>, Option<usize>, bool)> = vec![(root, None, false)];
    while let Some((el, parent, parent_in_svg)) = pending.pop() {
        let in_svg = parent_in_svg || dom::tag(&el) == "svg";
        let inherited = parent.map_or(&none, |i| &out[i].1);
        let computed = compute(&el, inherited, in_svg, compiled);
        out.push((el, computed));
        let index = out.len() - 1;
        for child in dom::children(el).into_iter().rev() {
            pending.push((child, Some(index), in_svg));
        }
    }
}

fn compute(
    el: &ElementRef<'_>,
    parent: &BTreeMap<String, String>,
    in_svg: bool,
    compiled: &[CompiledSelector<'_>],
) -> BTreeMap<String, String> {
    let cascaded = cascade_element(el, in_svg, compiled);

    let mut computed: BTreeMap<String, String> = parent
        .iter()
        .filter(|(k, _)| is_inherited(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (prop, value) in cascaded {
        match value.to_ascii_lowercase().as_str() {
            "inherit" => match parent.get(&prop) {
                Some(v) => {
                    computed.insert(prop, v.clone());
                }
                None => {
                    computed.remove(&prop);
                }
            },
            "unset" if is_inherited(&prop) => {}
            "initial" | "unset" => {
                computed.remove(&prop);
            }
            _ => {
                computed.insert(prop, value);
            }
        }
    }
    computed
}

/// Winning declared value per property for one element.
fn cascade_element(
    el: &ElementRef<'_>,
    in_svg: bool,
    compiled: &[CompiledSelector<'_>],
) -> BTreeMap<String, String> {
    let mut best: BTreeMap<String, (Priority, String)> = BTreeMap::new();
    let mut offer = |name: &str, value: &str, priority: Priority| {
        let replace = best.get(name).map(|(p, _)| priority >= *p).unwrap_or(true);
        if replace {
            best.insert(name.to_string(), (priority, value.to_string()));
        }
    };

    if in_svg {
        for &attr in PRESENTATION_ATTRS {
            if let Some(v) = dom::attr(el, attr) {
                offer(attr, v.trim(), (Layer::Presentation, Specificity::default(), 0));
            }
        }
    }
    for c in compiled {
        if !c.selector.matches(el) {
            continue;
        }
        for d in &c.rule.declarations {
            let layer = if d.important {
                Layer::AuthorImportant
            } else {
                Layer::Author
            };
            offer(&d.name, &d.value, (layer, c.specificity, c.order));
        }
    }
    if let Some(style) = dom::attr(el, "style") {
        for (i, d) in parse_declarations(style).iter().enumerate() {
            let layer = if d.important {
                Layer::InlineImportant
            } else {
                Layer::Inline
            };
            offer(&d.name, &d.value, (layer, Specificity::default(), i));
        }
    }

    best.into_iter().map(|(k, (_, v))| (k, v)).collect()
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Skip an at-rule statement (`@import ...;`) or block (`@media ... { ... }`).
fn skip_at_rule(s: &str) -> &str {
    let semi = s.find(';');
    let open = s.find('{');
    match (semi, open) {
        (Some(sc), Some(op)) if sc < op => &s[sc + 1..],
        (_, Some(op)) => match matching_brace(s, op) {
            Some(close) => &s[close + 1..],
            None => "",
        },
        (Some(sc), None) => &s[sc + 1..],
        (None, None) => "",
    }
}

/// Byte index of the `}` closing the `{` at `open`.
fn matching_brace(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in s[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `sep` outside parentheses, brackets and quotes.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '(') | (None, '[') => depth += 1,
            (None, ')') | (None, ']') => depth -= 1,
            (None, c) if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

fn skip_ident(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '-' || chars[i] == '_') {
        i += 1;
    }
    i
}

fn skip_parens(chars: &[char], mut i: usize) -> usize {
    if chars.get(i) != Some(&'(') {
        return i;
    }
    let mut depth = 0;
    while i < chars.len() {
        match chars[i] {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    i
}

/// Remove every case-insensitive occurrence of `needle` (ASCII) from `s`.
fn remove_ci(s: &str, needle: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    while let Some(found) = lower[pos..].find(needle) {
        out.push_str(&s[pos..pos + found]);
        pos += found + needle.len();
    }
    out.push_str(&s[pos..]);
    out
}
