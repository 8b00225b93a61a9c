//! Shared data models for lint outcomes, structural checks and reports.

pub mod options;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Severity of a single violation.
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    /// Lowercase label, as style linters print it.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    /// Short capitalised label used in script lint output.
    pub fn short_label(self) -> &'static str {
        match self {
            Severity::Warning => "Warn",
            Severity::Error => "Error",
        }
    }

    /// Map an ESLint numeric level. Levels of 2 and above are errors.
    pub fn from_level(level: u8) -> Self {
        if level >= 2 {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A single reported deviation from a lint rule.
pub struct Violation {
    pub file: Option<String>,
    pub rule: Option<String>,
    pub severity: Severity,
    pub line: u32,
    pub column: u32,
    pub message: Option<String>,
}

type MessageFn = Box<dyn Fn() -> String + Send + Sync>;

/// Pass flag plus a diagnostic that is only rendered on demand.
pub struct Outcome {
    pass: bool,
    message: MessageFn,
}

impl Outcome {
    /// Passing outcome. `negated` is the message a negated expectation would show.
    pub fn pass(negated: impl Into<String>) -> Self {
        let negated = negated.into();
        Outcome {
            pass: true,
            message: Box::new(move || negated.clone()),
        }
    }

    /// Failing outcome whose message is produced by `describe` when requested.
    pub fn fail<F>(describe: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Outcome {
            pass: false,
            message: Box::new(describe),
        }
    }

    /// Lift the result of a structural check.
    pub fn from_check(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Outcome::pass("expected check to fail"),
            Err(msg) => Outcome::fail(move || msg.clone()),
        }
    }

    pub fn passed(&self) -> bool {
        self.pass
    }

    pub fn message(&self) -> String {
        (self.message)()
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.pass {
            Ok(())
        } else {
            Err(self.message())
        }
    }

    /// Panic with the diagnostic when the outcome failed.
    #[track_caller]
    pub fn assert(&self) {
        if !self.pass {
            panic!("{}", self.message());
        }
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome").field("pass", &self.pass).finish()
    }
}

#[derive(Debug)]
/// Outcome of one named structural check.
pub struct CheckResult {
    pub group: &'static str,
    pub name: &'static str,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Aggregated counts used by printers and exit codes.
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

#[derive(Debug)]
/// All check results of one suite run against one submission directory.
pub struct GradeReport {
    pub suite: &'static str,
    pub target: String,
    pub results: Vec<CheckResult>,
}

impl GradeReport {
    pub fn summary(&self) -> Summary {
        let passed = self.results.iter().filter(|r| r.outcome.passed()).count();
        Summary {
            passed,
            failed: self.results.len() - passed,
            total: self.results.len(),
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.outcome.passed())
    }
}

#[derive(Debug)]
/// One linter invocation as shown by the CLI.
pub struct LintRun {
    pub linter: &'static str,
    pub targets: Vec<String>,
    pub violations: Vec<Violation>,
    pub outcome: Outcome,
}
