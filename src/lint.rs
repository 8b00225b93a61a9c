//! Uniform "no violations" assertion over pluggable linter backends.
//!
//! Every backend follows the same shape: run the external checker, decide
//! whether its report is clean, and describe the violations. `judge` turns a
//! report into an [`Outcome`]; the description is only rendered when a
//! failing outcome's message is requested.

use crate::error::Result;
use crate::linters::markup::MarkupLinter;
use crate::linters::script::ScriptLinter;
use crate::linters::style::StyleLinter;
use crate::linters::ScriptHost;
use crate::models::options::{MarkupLintOptions, ScriptLintOptions, StyleLintConfig};
use crate::models::{LintRun, Outcome, Violation};
use async_trait::async_trait;
use glob::glob;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[async_trait]
pub trait LintBackend: Send + Sync + 'static {
    /// What the backend lints: one file or a list of files.
    type Target: ?Sized + Sync;
    type Report: Send + Sync + 'static;

    /// Short name used in logs and errors.
    const NAME: &'static str;
    /// Message shown when a negated expectation unexpectedly passes.
    const NEGATED: &'static str;

    async fn lint(&self, target: &Self::Target) -> Result<Self::Report>;

    fn is_clean(report: &Self::Report) -> bool;

    fn describe(report: &Self::Report) -> String;

    fn violations(report: &Self::Report) -> Vec<Violation>;
}

/// Convert a finished report into an outcome.
pub fn judge<B: LintBackend>(report: B::Report) -> Outcome {
    if B::is_clean(&report) {
        Outcome::pass(B::NEGATED)
    } else {
        Outcome::fail(move || B::describe(&report))
    }
}

/// Lint `target` and require zero violations.
pub async fn expect_no_violations<B: LintBackend>(
    backend: &B,
    target: &B::Target,
) -> Result<Outcome> {
    let report = backend.lint(target).await?;
    Ok(judge::<B>(report))
}

/// Lint `target` and keep the structured violations next to the outcome.
pub async fn run_backend<B: LintBackend>(
    backend: &B,
    target: &B::Target,
    targets: Vec<String>,
) -> Result<LintRun> {
    log::debug!("running {} on {} target(s)", B::NAME, targets.len());
    let report = backend.lint(target).await?;
    let violations = B::violations(&report);
    Ok(LintRun {
        linter: B::NAME,
        targets,
        violations,
        outcome: judge::<B>(report),
    })
}

/// Assertion surface for lint targets: `expect(path).to_have_no_html_lint_errors(..)`.
pub struct Expectation<'a, T: ?Sized> {
    target: &'a T,
}

pub fn expect<T: ?Sized>(target: &T) -> Expectation<'_, T> {
    Expectation { target }
}

impl Expectation<'_, Path> {
    /// Markup lint a single file.
    pub async fn to_have_no_html_lint_errors(
        &self,
        host: Arc<dyn ScriptHost>,
        options: &MarkupLintOptions,
    ) -> Result<Outcome> {
        let linter = MarkupLinter::new(host, options.clone());
        expect_no_violations(&linter, self.target).await
    }

    /// Style lint a single stylesheet.
    pub async fn to_have_no_css_lint_errors(
        &self,
        host: Arc<dyn ScriptHost>,
        config: &StyleLintConfig,
    ) -> Result<Outcome> {
        let files = [self.target.to_path_buf()];
        expect(&files[..])
            .to_have_no_css_lint_errors(host, config)
            .await
    }
}

impl Expectation<'_, [PathBuf]> {
    pub async fn to_have_no_css_lint_errors(
        &self,
        host: Arc<dyn ScriptHost>,
        config: &StyleLintConfig,
    ) -> Result<Outcome> {
        let linter = StyleLinter::new(host, config.clone());
        expect_no_violations(&linter, self.target).await
    }

    pub async fn to_have_no_es_lint_errors(
        &self,
        host: Arc<dyn ScriptHost>,
        options: &ScriptLintOptions,
    ) -> Result<Outcome> {
        let linter = ScriptLinter::new(host, options.clone());
        expect_no_violations(&linter, self.target).await
    }
}

/// Expand file arguments into lint targets, in argument order.
///
/// Arguments without glob metacharacters are kept as given so a missing file
/// surfaces as a linter error instead of vanishing.
pub fn expand_targets(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut targets: Vec<PathBuf> = Vec::new();
    for pat in patterns {
        if !pat.contains(&['*', '?', '['][..]) {
            targets.push(PathBuf::from(pat));
            continue;
        }
        for entry in glob(pat)? {
            match entry {
                Ok(p) => targets.push(p),
                Err(e) => log::warn!("skipping unreadable match: {}", e),
            }
        }
    }
    let mut seen = std::collections::HashSet::new();
    targets.retain(|p| seen.insert(p.clone()));
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GradeError;
    use crate::models::Severity;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned {
        found: Vec<(String, u32, u32)>,
        describe_calls: Arc<AtomicUsize>,
    }

    struct CannedLinter {
        found: Vec<(String, u32, u32)>,
        describe_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl LintBackend for CannedLinter {
        type Target = str;
        type Report = Canned;
        const NAME: &'static str = "canned";
        const NEGATED: &'static str = "expected canned violations";

        async fn lint(&self, _target: &str) -> Result<Canned> {
            Ok(Canned {
                found: self.found.clone(),
                describe_calls: Arc::clone(&self.describe_calls),
            })
        }

        fn is_clean(report: &Canned) -> bool {
            report.found.is_empty()
        }

        fn describe(report: &Canned) -> String {
            report.describe_calls.fetch_add(1, Ordering::SeqCst);
            report
                .found
                .iter()
                .map(|(rule, line, col)| format!("Error: '{}' at line {}, column {}.\n", rule, line, col))
                .collect()
        }

        fn violations(report: &Canned) -> Vec<Violation> {
            report
                .found
                .iter()
                .map(|(rule, line, column)| Violation {
                    file: None,
                    rule: Some(rule.clone()),
                    severity: Severity::Error,
                    line: *line,
                    column: *column,
                    message: None,
                })
                .collect()
        }
    }

    fn canned(found: Vec<(String, u32, u32)>) -> CannedLinter {
        CannedLinter {
            found,
            describe_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[tokio::test]
    async fn test_clean_report_never_formats() {
        let linter = canned(vec![]);
        let outcome = expect_no_violations(&linter, "x").await.unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.message(), "expected canned violations");
        assert_eq!(linter.describe_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_report_formats_lazily() {
        let linter = canned(vec![("tag-close".into(), 4, 9)]);
        let outcome = expect_no_violations(&linter, "x").await.unwrap();
        assert!(!outcome.passed());
        // nothing rendered until asked
        assert_eq!(linter.describe_calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.message(), "Error: 'tag-close' at line 4, column 9.\n");
        assert_eq!(linter.describe_calls.load(Ordering::SeqCst), 1);

        let report = linter.lint("x").await.unwrap();
        let found = CannedLinter::violations(&report);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule.as_deref(), Some("tag-close"));
    }

    #[tokio::test]
    async fn test_run_backend_keeps_violations() {
        let linter = canned(vec![("attr-bans".into(), 2, 5)]);
        let run = run_backend(&linter, "x", vec!["index.html".into()]).await.unwrap();
        assert_eq!(run.linter, "canned");
        assert_eq!(run.violations.len(), 1);
        assert_eq!(run.violations[0].line, 2);
        assert!(!run.outcome.passed());
        // violations are collected without rendering the description
        assert_eq!(linter.describe_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_expand_targets_globs_and_literals() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("a.css"), "").unwrap();
        std::fs::write(root.join("b.css"), "").unwrap();
        std::fs::write(root.join("c.js"), "").unwrap();
        let pattern = root.join("*.css").to_string_lossy().to_string();
        let literal = root.join("a.css").to_string_lossy().to_string();
        let missing = root.join("gone.css").to_string_lossy().to_string();

        let found = expand_targets(&[pattern, literal, missing.clone()]).unwrap();
        assert_eq!(
            found,
            vec![root.join("a.css"), root.join("b.css"), PathBuf::from(missing)]
        );
    }

    #[test]
    fn test_expand_targets_bad_pattern() {
        let err = expand_targets(&["css/[".to_string()]).unwrap_err();
        assert!(matches!(err, GradeError::Pattern(_)));
    }
}
