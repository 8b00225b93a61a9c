//! Structural check suites.
//!
//! A suite is a list of independent checks run against one parsed fixture.
//! A failing check is recorded and the remaining checks still run.

pub mod blog;
pub mod svg;

use crate::dom::Document;
use crate::error::{GradeError, Result};
use crate::lint::run_backend;
use crate::linters::markup::MarkupLinter;
use crate::linters::style::StyleLinter;
use crate::linters::ScriptHost;
use crate::models::options::{MarkupLintOptions, StyleLintConfig};
use crate::models::{CheckResult, GradeReport, LintRun, Outcome};
use crate::output::display_path;
use regex::{Regex, RegexBuilder};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type CheckFn<C> = fn(&C) -> Result<(), String>;

pub struct Check<C> {
    pub group: &'static str,
    pub name: &'static str,
    pub run: CheckFn<C>,
}

pub fn run_checks<C>(ctx: &C, checks: &[Check<C>]) -> Vec<CheckResult> {
    checks
        .iter()
        .map(|c| CheckResult {
            group: c.group,
            name: c.name,
            outcome: Outcome::from_check((c.run)(ctx)),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SuiteKind {
    /// Semantic blog page (headings, sectioning, figures, contact info)
    Blog,
    /// SVG illustration styled by a stylesheet
    Svg,
}

/// Files a suite also sends through the linters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintTargets {
    pub markup: Option<PathBuf>,
    pub styles: Vec<PathBuf>,
}

impl SuiteKind {
    pub fn name(self) -> &'static str {
        match self {
            SuiteKind::Blog => "blog",
            SuiteKind::Svg => "svg",
        }
    }

    /// Run the suite against the submission in `dir`.
    pub fn run(self, dir: &Path) -> Result<GradeReport> {
        log::info!("running {} suite on {}", self.name(), dir.display());
        let results = match self {
            SuiteKind::Blog => blog::run(dir)?,
            SuiteKind::Svg => svg::run(dir)?,
        };
        Ok(GradeReport {
            suite: self.name(),
            target: dir.to_string_lossy().to_string(),
            results,
        })
    }

    pub fn lint_targets(self, dir: &Path) -> LintTargets {
        match self {
            SuiteKind::Blog => LintTargets {
                markup: Some(dir.join("index.html")),
                styles: vec![dir.join("css").join("style.css")],
            },
            SuiteKind::Svg => LintTargets {
                markup: None,
                styles: vec![dir.join("css").join("style.css")],
            },
        }
    }

    /// Send the submission's files in `dir` through the markup and style linters.
    pub async fn lint(
        self,
        dir: &Path,
        host: &Arc<dyn ScriptHost>,
        markup: &MarkupLintOptions,
        style: &StyleLintConfig,
    ) -> Result<Vec<LintRun>> {
        let targets = self.lint_targets(&absolute(dir)?);
        let mut runs = Vec::new();
        if let Some(html) = targets.markup {
            let linter = MarkupLinter::new(Arc::clone(host), markup.clone());
            runs.push(run_backend(&linter, html.as_path(), vec![display_path(&html)]).await?);
        }
        if !targets.styles.is_empty() {
            let labels = targets.styles.iter().map(|p| display_path(p)).collect();
            let linter = StyleLinter::new(Arc::clone(host), style.clone());
            runs.push(run_backend(&linter, &targets.styles[..], labels).await?);
        }
        Ok(runs)
    }
}

/// Lint every submission directory. A directory whose files cannot be linted
/// is returned as an error and the remaining directories are still linted.
pub async fn lint_submissions(
    suite: SuiteKind,
    dirs: &[PathBuf],
    host: &Arc<dyn ScriptHost>,
    markup: &MarkupLintOptions,
    style: &StyleLintConfig,
) -> (Vec<LintRun>, Vec<GradeError>) {
    let mut runs = Vec::new();
    let mut errors = Vec::new();
    for dir in dirs {
        match suite.lint(dir, host, markup, style).await {
            Ok(found) => runs.extend(found),
            Err(e) => {
                log::debug!("linting {} failed: {}", dir.display(), e);
                errors.push(e);
            }
        }
    }
    (runs, errors)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| GradeError::io(".", e))?;
    Ok(cwd.join(path))
}

pub(crate) fn query<T>(result: Result<T>) -> Result<T, String> {
    result.map_err(|e: GradeError| e.to_string())
}

pub(crate) fn ensure_eq<T: PartialEq + Debug>(what: &str, actual: T, expected: T) -> Result<(), String> {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("{}: expected {:?}, found {:?}", what, expected, actual))
    }
}

pub(crate) fn ensure_count(doc: &Document, css: &str, expected: usize) -> Result<(), String> {
    let found = query(doc.count(css))?;
    ensure_eq(&format!("number of `{}` elements", css), found, expected)
}

pub(crate) fn pattern(re: &str, case_insensitive: bool) -> Result<Regex, String> {
    RegexBuilder::new(re)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| e.to_string())
}
