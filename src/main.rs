//! Webgrade CLI binary entry point.
//! Delegates to the library for linting and suites and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use webgrade::cli::{Cli, Commands, Common};
use webgrade::config::{self, Effective};
use webgrade::error::GradeError;
use webgrade::fixture;
use webgrade::lint::{expand_targets, run_backend};
use webgrade::linters::markup::MarkupLinter;
use webgrade::linters::script::ScriptLinter;
use webgrade::linters::style::StyleLinter;
use webgrade::linters::{NodeHost, ScriptHost};
use webgrade::models::{GradeReport, LintRun};
use webgrade::output;
use webgrade::suites::{self, SuiteKind};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let failed = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            false
        }
        Commands::Checksum { file } => {
            let text = fixture::load(Path::new(&file))?;
            println!("{}", fixture::checksum(&text));
            false
        }
        Commands::LintHtml { file, common } => {
            let eff = effective(&common);
            let host = node_host(&eff);
            let path = absolute(&file)?;
            let linter = MarkupLinter::new(host, eff.markup.clone());
            let run = run_backend(&linter, path.as_path(), vec![output::display_path(&path)])
                .await
                .with_context(|| format!("linting {}", file))?;
            report_runs(vec![run], &eff.output)
        }
        Commands::LintCss { files, common } => {
            let eff = effective(&common);
            let targets = targets(&files)?;
            let linter = StyleLinter::new(node_host(&eff), eff.style.clone());
            let run = run_backend(&linter, &targets[..], labels(&targets))
                .await
                .context("linting stylesheets")?;
            report_runs(vec![run], &eff.output)
        }
        Commands::LintJs { files, common } => {
            let eff = effective(&common);
            let targets = targets(&files)?;
            let linter = ScriptLinter::new(node_host(&eff), eff.script.clone());
            let run = run_backend(&linter, &targets[..], labels(&targets))
                .await
                .context("linting scripts")?;
            report_runs(vec![run], &eff.output)
        }
        Commands::Check {
            suite,
            dirs,
            lint,
            common,
        } => {
            let eff = effective(&common);
            let dirs: Vec<PathBuf> = dirs.iter().map(PathBuf::from).collect();
            let (reports, mut failed) = run_suite(suite, dirs.clone()).await?;
            let runs = if lint {
                let host = node_host(&eff);
                let (runs, errors) =
                    suites::lint_submissions(suite, &dirs, &host, &eff.markup, &eff.style).await;
                for e in &errors {
                    eprintln!("{} {}", output::error_prefix(), e);
                }
                failed |= !errors.is_empty();
                runs
            } else {
                Vec::new()
            };
            output::print_reports(&reports, &runs, &eff.output);
            failed |= reports.iter().any(|r| r.summary().failed > 0);
            failed || runs.iter().any(|r| !r.outcome.passed())
        }
    };
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

/// Resolve configuration; a broken config file is a usage error.
fn effective(common: &Common) -> Effective {
    match config::resolve_effective(
        common.repo_root.as_deref(),
        common.output.as_deref(),
        common.node.as_deref(),
    ) {
        Ok(eff) => eff,
        Err(e) => {
            eprintln!("{} {}", output::error_prefix(), e);
            std::process::exit(2);
        }
    }
}

fn node_host(eff: &Effective) -> Arc<dyn ScriptHost> {
    Arc::new(NodeHost::new(eff.node.clone()).with_cwd(eff.repo_root.clone()))
}

fn absolute(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("reading current directory")?;
    Ok(cwd.join(path))
}

fn targets(files: &[String]) -> Result<Vec<PathBuf>> {
    let found = match expand_targets(files) {
        Ok(found) => found,
        Err(e @ GradeError::Pattern(_)) => {
            eprintln!("{} {}", output::error_prefix(), e);
            std::process::exit(2);
        }
        Err(e) => return Err(e.into()),
    };
    if found.is_empty() {
        eprintln!("{} no files matched {}", output::note_prefix(), files.join(" "));
    }
    found.iter().map(absolute).collect()
}

fn labels(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| output::display_path(p)).collect()
}

fn report_runs(runs: Vec<LintRun>, out: &str) -> bool {
    output::print_lint(&runs, out);
    runs.iter().any(|r| !r.outcome.passed())
}

/// Grade every directory in parallel; a directory that cannot be read is
/// reported and counted as a failure.
async fn run_suite(suite: SuiteKind, dirs: Vec<PathBuf>) -> Result<(Vec<GradeReport>, bool)> {
    let graded = tokio::task::spawn_blocking(move || {
        dirs.par_iter()
            .map(|dir| suite.run(dir))
            .collect::<Vec<_>>()
    })
    .await
    .context("grading worker panicked")?;

    let mut reports = Vec::new();
    let mut failed = false;
    for result in graded {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("{} {}", output::error_prefix(), e);
                failed = true;
            }
        }
    }
    Ok((reports, failed))
}
