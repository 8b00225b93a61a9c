//! Stylesheet linting through `stylelint`.
//!
//! Only the warnings of the first reported file are described. Callers lint
//! one stylesheet at a time in practice; extra files still count towards the
//! pass flag through `errored`.

use super::{decode, path_strings, ScriptHost};
use crate::error::Result;
use crate::lint::LintBackend;
use crate::models::options::StyleLintConfig;
use crate::models::{Severity, Violation};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

const BRIDGE: &str = r#"
const stylelint = require('stylelint');
let input = '';
process.stdin.on('data', (chunk) => { input += chunk; });
process.stdin.on('end', async () => {
  const req = JSON.parse(input);
  const res = await stylelint.lint({ files: req.files, config: req.config });
  process.stdout.write(JSON.stringify({
    errored: res.errored,
    results: res.results.map((r) => ({
      source: r.source, errored: !!r.errored, warnings: r.warnings,
    })),
  }));
});
"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StyleWarning {
    pub line: u32,
    pub column: u32,
    #[serde(default)]
    pub rule: Option<String>,
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StyleFileResult {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub errored: bool,
    #[serde(default)]
    pub warnings: Vec<StyleWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StyleReport {
    pub errored: bool,
    #[serde(default)]
    pub results: Vec<StyleFileResult>,
}

pub struct StyleLinter {
    host: Arc<dyn ScriptHost>,
    config: StyleLintConfig,
}

impl StyleLinter {
    pub fn new(host: Arc<dyn ScriptHost>, config: StyleLintConfig) -> Self {
        StyleLinter { host, config }
    }
}

#[async_trait]
impl LintBackend for StyleLinter {
    type Target = [PathBuf];
    type Report = StyleReport;
    const NAME: &'static str = "style";
    const NEGATED: &'static str = "expected CSS to contain validity errors";

    async fn lint(&self, files: &[PathBuf]) -> Result<StyleReport> {
        let request = json!({ "files": path_strings(files), "config": self.config.to_json() });
        let answer = self.host.eval(Self::NAME, BRIDGE, &request).await?;
        decode(Self::NAME, answer)
    }

    fn is_clean(report: &StyleReport) -> bool {
        !report.errored
    }

    fn describe(report: &StyleReport) -> String {
        if report.results.len() > 1 {
            log::debug!(
                "describing the first of {} stylesheet results only",
                report.results.len()
            );
        }
        let Some(first) = report.results.first() else {
            return String::new();
        };
        first.warnings.iter().fold(String::new(), |mut out, w| {
            out.push_str(&format!(
                "{}: {}\n       At line {}, column {}.\n",
                w.severity, w.text, w.line, w.column
            ));
            out
        })
    }

    fn violations(report: &StyleReport) -> Vec<Violation> {
        report
            .results
            .iter()
            .flat_map(|r| {
                r.warnings.iter().map(move |w| Violation {
                    file: r.source.clone(),
                    rule: w.rule.clone(),
                    severity: w.severity,
                    line: w.line,
                    column: w.column,
                    message: Some(w.text.clone()),
                })
            })
            .collect()
    }
}
