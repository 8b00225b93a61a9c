//! CLI argument parsing via `clap`.

use crate::suites::SuiteKind;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "webgrade",
    version,
    about = "Grade web submissions with linters and structural checks",
    long_about = "Webgrade — run markup, style, and script linters and the structural check suites against course submissions.\n\nConfiguration precedence: CLI > webgrade.toml > defaults.",
    after_help = "Examples:\n  webgrade lint-html index.html\n  webgrade lint-css 'css/*.css' --output json\n  webgrade check --suite blog submissions/* --lint\n  webgrade checksum fixtures/problem-b/index.html",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(long, short, global = true, action = clap::ArgAction::SetTrue, help = "Log debug details to stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Args, Clone, Debug, Default)]
/// Options shared by every command that reads configuration.
pub struct Common {
    #[arg(long, help = "Repository root (default: current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Node.js program used to run the linters (default: node)")]
    pub node: Option<String>,
}

#[derive(Subcommand)]
/// Supported subcommands for linting and grading.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current webgrade version.")]
    Version,
    /// Lint one HTML file
    #[command(
        about = "Lint an HTML file",
        long_about = "Run the markup linter with the course rule set. Any reported issue fails the run.",
        after_help = "Examples:\n  webgrade lint-html index.html"
    )]
    LintHtml {
        #[arg(help = "HTML file to lint")]
        file: String,
        #[command(flatten)]
        common: Common,
    },
    /// Lint stylesheets
    #[command(
        about = "Lint CSS files",
        long_about = "Run the style linter over files or glob patterns. Only the first file's warnings are listed on failure.",
        after_help = "Examples:\n  webgrade lint-css css/style.css\n  webgrade lint-css 'css/**/*.css'"
    )]
    LintCss {
        #[arg(required = true, help = "Files or glob patterns")]
        files: Vec<String>,
        #[command(flatten)]
        common: Common,
    },
    /// Lint scripts
    #[command(
        about = "Lint JavaScript files",
        long_about = "Run the script linter over files or glob patterns. Warnings fail the run as well as errors.",
        after_help = "Examples:\n  webgrade lint-js 'js/*.js'"
    )]
    LintJs {
        #[arg(required = true, help = "Files or glob patterns")]
        files: Vec<String>,
        #[command(flatten)]
        common: Common,
    },
    /// Run a structural suite
    #[command(
        about = "Run structural checks",
        long_about = "Run a check suite against one or more submission directories in parallel. With --lint, the suite's files are linted too.",
        after_help = "Examples:\n  webgrade check --suite blog submissions/alice\n  webgrade check --suite svg submissions/* --output json"
    )]
    Check {
        #[arg(long, value_enum, help = "Suite to run")]
        suite: SuiteKind,
        #[arg(required = true, help = "Submission directories")]
        dirs: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Also lint the suite's HTML/CSS files")]
        lint: bool,
        #[command(flatten)]
        common: Common,
    },
    /// Print a fixture checksum
    #[command(
        about = "Print fixture checksum",
        long_about = "Print the MD5 of a file with all whitespace removed, as used to pin fixtures."
    )]
    Checksum {
        #[arg(help = "File to hash")]
        file: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from([
            "webgrade", "check", "--suite", "svg", "a", "b", "--lint", "--output", "json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.cmd {
            Commands::Check { suite, dirs, lint, common } => {
                assert_eq!(suite, SuiteKind::Svg);
                assert_eq!(dirs, vec!["a", "b"]);
                assert!(lint);
                assert_eq!(common.output.as_deref(), Some("json"));
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_lint_css_requires_files() {
        assert!(Cli::try_parse_from(["webgrade", "lint-css"]).is_err());
    }
}
