//! Script linting through ESLint.

use super::{decode, path_strings, ScriptHost};
use crate::error::Result;
use crate::lint::LintBackend;
use crate::models::options::ScriptLintOptions;
use crate::models::{Severity, Violation};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

const BRIDGE: &str = r#"
const { ESLint } = require('eslint');
let input = '';
process.stdin.on('data', (chunk) => { input += chunk; });
process.stdin.on('end', async () => {
  const req = JSON.parse(input);
  const linter = new ESLint(req.options);
  const results = await linter.lintFiles(req.files);
  process.stdout.write(JSON.stringify(results.map((r) => ({
    filePath: r.filePath,
    messages: r.messages.map((m) => ({
      ruleId: m.ruleId, severity: m.severity, message: m.message,
      line: m.line || 0, column: m.column || 0,
    })),
  }))));
});
"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMessage {
    #[serde(default)]
    pub rule_id: Option<String>,
    /// ESLint level: 1 = warn, 2 = error.
    pub severity: u8,
    pub message: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl ScriptMessage {
    pub fn severity(&self) -> Severity {
        Severity::from_level(self.severity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptFileResult {
    pub file_path: String,
    #[serde(default)]
    pub messages: Vec<ScriptMessage>,
}

pub struct ScriptLinter {
    host: Arc<dyn ScriptHost>,
    options: ScriptLintOptions,
}

impl ScriptLinter {
    pub fn new(host: Arc<dyn ScriptHost>, options: ScriptLintOptions) -> Self {
        ScriptLinter { host, options }
    }
}

#[async_trait]
impl LintBackend for ScriptLinter {
    type Target = [PathBuf];
    type Report = Vec<ScriptFileResult>;
    const NAME: &'static str = "script";
    const NEGATED: &'static str = "expected JavaScript to show linting errors";

    async fn lint(&self, files: &[PathBuf]) -> Result<Vec<ScriptFileResult>> {
        let request = json!({
            "files": path_strings(files),
            "options": self.options.to_eslint_options(),
        });
        let answer = self.host.eval(Self::NAME, BRIDGE, &request).await?;
        decode(Self::NAME, answer)
    }

    fn is_clean(report: &Vec<ScriptFileResult>) -> bool {
        report.iter().map(|r| r.messages.len()).sum::<usize>() == 0
    }

    fn describe(report: &Vec<ScriptFileResult>) -> String {
        let mut out = String::new();
        for file in report {
            out.push_str(&file.file_path);
            out.push('\n');
            for m in &file.messages {
                out.push_str(&format!(
                    "    {}: {} At line {}, column {}\n",
                    m.severity().short_label(),
                    m.message,
                    m.line,
                    m.column
                ));
            }
        }
        out
    }

    fn violations(report: &Vec<ScriptFileResult>) -> Vec<Violation> {
        report
            .iter()
            .flat_map(|r| {
                r.messages.iter().map(move |m| Violation {
                    file: Some(r.file_path.clone()),
                    rule: m.rule_id.clone(),
                    severity: m.severity(),
                    line: m.line,
                    column: m.column,
                    message: Some(m.message.clone()),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::expect;
    use crate::linters::testing::CannedHost;

    #[tokio::test]
    async fn test_groups_messages_by_file() {
        let host = Arc::new(CannedHost::new(json!([
            {
                "filePath": "/work/js/app.js",
                "messages": [
                    { "ruleId": "no-unused-vars", "severity": 2, "message": "'x' is defined but never used.", "line": 1, "column": 5 },
                    { "ruleId": "semi", "severity": 1, "message": "Missing semicolon.", "line": 2, "column": 12 }
                ]
            },
            { "filePath": "/work/js/clean.js", "messages": [] }
        ])));
        let files = vec![PathBuf::from("js/app.js"), PathBuf::from("js/clean.js")];
        let outcome = expect(&files[..])
            .to_have_no_es_lint_errors(host.clone(), &ScriptLintOptions::default())
            .await
            .unwrap();
        assert!(!outcome.passed());
        assert_eq!(
            outcome.message(),
            "/work/js/app.js\n    Error: 'x' is defined but never used. At line 1, column 5\n    Warn: Missing semicolon. At line 2, column 12\n/work/js/clean.js\n"
        );
        assert_eq!(host.last_request()["options"]["useEslintrc"], false);
    }

    #[tokio::test]
    async fn test_zero_messages_passes() {
        let host = Arc::new(CannedHost::new(json!([
            { "filePath": "/work/js/app.js", "messages": [] }
        ])));
        let files = vec![PathBuf::from("js/app.js")];
        let outcome = expect(&files[..])
            .to_have_no_es_lint_errors(host, &ScriptLintOptions::default())
            .await
            .unwrap();
        assert!(outcome.passed());
    }

    #[test]
    fn test_fatal_parse_message_without_rule() {
        let report: Vec<ScriptFileResult> = serde_json::from_value(json!([
            { "filePath": "a.js", "messages": [{ "ruleId": null, "severity": 2, "message": "Parsing error: Unexpected token", "line": 3, "column": 1 }] }
        ]))
        .unwrap();
        let found = ScriptLinter::violations(&report);
        assert_eq!(found[0].rule, None);
        assert_eq!(found[0].severity, Severity::Error);
    }
}
