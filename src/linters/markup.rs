//! Markup linting through `htmllint`.

use super::{decode, ScriptHost};
use crate::error::{GradeError, Result};
use crate::lint::LintBackend;
use crate::models::options::MarkupLintOptions;
use crate::models::{Severity, Violation};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

const BRIDGE: &str = r#"
const htmllint = require('htmllint');
let input = '';
process.stdin.on('data', (chunk) => { input += chunk; });
process.stdin.on('end', async () => {
  const req = JSON.parse(input);
  const issues = await htmllint(req.source, req.options);
  process.stdout.write(JSON.stringify(issues.map((i) => ({
    rule: i.rule, line: i.line, column: i.column, code: i.code,
  }))));
});
"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarkupIssue {
    pub rule: String,
    pub line: u32,
    pub column: u32,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MarkupReport {
    pub file: String,
    pub issues: Vec<MarkupIssue>,
}

pub struct MarkupLinter {
    host: Arc<dyn ScriptHost>,
    options: MarkupLintOptions,
}

impl MarkupLinter {
    pub fn new(host: Arc<dyn ScriptHost>, options: MarkupLintOptions) -> Self {
        MarkupLinter { host, options }
    }
}

#[async_trait]
impl LintBackend for MarkupLinter {
    type Target = Path;
    type Report = MarkupReport;
    const NAME: &'static str = "markup";
    const NEGATED: &'static str = "expected html to contain validity errors";

    async fn lint(&self, path: &Path) -> Result<MarkupReport> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GradeError::io(path, e))?;
        let options = self.options.to_json().map_err(|source| GradeError::Encode {
            linter: Self::NAME,
            source,
        })?;
        let request = json!({ "source": source, "options": options });
        let answer = self.host.eval(Self::NAME, BRIDGE, &request).await?;
        Ok(MarkupReport {
            file: path.to_string_lossy().to_string(),
            issues: decode(Self::NAME, answer)?,
        })
    }

    fn is_clean(report: &MarkupReport) -> bool {
        report.issues.is_empty()
    }

    fn describe(report: &MarkupReport) -> String {
        report.issues.iter().fold(String::new(), |mut out, i| {
            out.push_str(&format!(
                "Error: '{}' at line {}, column {}.\n",
                i.rule, i.line, i.column
            ));
            out
        })
    }

    fn violations(report: &MarkupReport) -> Vec<Violation> {
        report
            .issues
            .iter()
            .map(|i| Violation {
                file: Some(report.file.clone()),
                rule: Some(i.rule.clone()),
                severity: Severity::Error,
                line: i.line,
                column: i.column,
                message: i.code.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::expect;
    use crate::linters::testing::CannedHost;
    use tempfile::tempdir;

    fn page() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, "<!DOCTYPE html><html lang=\"en\"></html>").unwrap();
        (dir, path)
    }

    #[tokio::test]
    async fn test_single_issue_message_format() {
        let (_dir, path) = page();
        let host = Arc::new(CannedHost::new(
            json!([{ "rule": "attr-bans", "line": 12, "column": 5, "code": "E001" }]),
        ));
        let outcome = expect(path.as_path())
            .to_have_no_html_lint_errors(host.clone(), &MarkupLintOptions::course_default())
            .await
            .unwrap();
        assert!(!outcome.passed());
        assert_eq!(outcome.message(), "Error: 'attr-bans' at line 12, column 5.\n");

        let req = host.last_request();
        assert!(req["source"].as_str().unwrap().starts_with("<!DOCTYPE html>"));
        assert_eq!(req["options"]["doctype-html5"], true);
    }

    #[tokio::test]
    async fn test_clean_markup_passes() {
        let (_dir, path) = page();
        let host = Arc::new(CannedHost::new(json!([])));
        let outcome = expect(path.as_path())
            .to_have_no_html_lint_errors(host, &MarkupLintOptions::default())
            .await
            .unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.message(), "expected html to contain validity errors");
    }

    #[tokio::test]
    async fn test_missing_file_is_fatal() {
        let dir = tempdir().unwrap();
        let host = Arc::new(CannedHost::new(json!([])));
        let missing = dir.path().join("nope.html");
        let err = expect(missing.as_path())
            .to_have_no_html_lint_errors(host.clone(), &MarkupLintOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GradeError::Io { .. }));
        // the linter is never consulted
        assert_eq!(host.last_request(), serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_unreadable_report_is_decode_error() {
        let (_dir, path) = page();
        let linter = MarkupLinter::new(
            Arc::new(CannedHost::new(json!({ "unexpected": true }))),
            MarkupLintOptions::default(),
        );
        let err = linter.lint(&path).await.unwrap_err();
        assert!(matches!(err, GradeError::Decode { linter: "markup", .. }));
    }

    #[tokio::test]
    async fn test_options_are_encoded_into_request() {
        let (_dir, path) = page();
        let host = Arc::new(CannedHost::new(json!([])));
        let mut options = MarkupLintOptions::course_default();
        options
            .extra
            .insert("tag-name-match".into(), json!({ "nested": [1, 2] }));
        let linter = MarkupLinter::new(host.clone(), options);
        linter.lint(&path).await.unwrap();
        let req = host.last_request();
        assert_eq!(req["options"]["tag-name-match"]["nested"], json!([1, 2]));
        assert!(req["options"].is_object());
    }

    #[test]
    fn test_encode_error_names_linter() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = GradeError::Encode { linter: "markup", source };
        assert!(err.to_string().starts_with("markup options could not be encoded"));
    }
}
