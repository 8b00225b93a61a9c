//! Output rendering for lint and check commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form includes
//! per-item fields and a top-level summary.

use crate::models::{GradeReport, LintRun, Summary};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;
use std::path::Path;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

fn paint(text: &str, color: bool, style: fn(&str) -> String) -> String {
    if color {
        style(text)
    } else {
        text.to_string()
    }
}

pub fn error_prefix() -> String {
    paint("error:", use_colors("human"), |s| s.red().bold().to_string())
}

pub fn note_prefix() -> String {
    paint("note:", use_colors("human"), |s| s.blue().bold().to_string())
}

/// Render `path` relative to the current directory when possible.
pub fn display_path(path: &Path) -> String {
    let rel = std::env::current_dir()
        .ok()
        .and_then(|cwd| pathdiff::diff_paths(path, cwd));
    match rel {
        Some(p) if !p.as_os_str().is_empty() && p.is_relative() && !p.starts_with("..") => {
            p.to_string_lossy().to_string()
        }
        _ => path.to_string_lossy().to_string(),
    }
}

fn total(runs: &[LintRun], reports: &[GradeReport]) -> Summary {
    let mut sum = Summary::default();
    for passed in runs
        .iter()
        .map(|r| r.outcome.passed())
        .chain(reports.iter().flat_map(|r| r.results.iter().map(|c| c.outcome.passed())))
    {
        sum.total += 1;
        if passed {
            sum.passed += 1;
        } else {
            sum.failed += 1;
        }
    }
    sum
}

fn print_json(value: &JsonVal) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("{} {}", error_prefix(), e),
    }
}

fn print_runs_human(runs: &[LintRun], color: bool) {
    for run in runs {
        let icon = if run.outcome.passed() {
            paint("✔", color, |s| s.green().to_string())
        } else {
            paint("✖", color, |s| s.red().to_string())
        };
        let label = paint(&format!("{} lint", run.linter), color, |s| s.bold().to_string());
        println!("{} {} {}", icon, label, run.targets.join(", "));
        if !run.outcome.passed() {
            for line in run.outcome.message().lines() {
                println!("    {}", line);
            }
        }
    }
}

fn print_summary(sum: Summary, color: bool) {
    let line = format!(
        "— Summary — passed={} failed={} total={}",
        sum.passed, sum.failed, sum.total
    );
    println!("{}", paint(&line, color, |s| s.bold().to_string()));
}

/// Print linter runs in the requested format.
pub fn print_lint(runs: &[LintRun], output: &str) {
    match output {
        "json" => print_json(&compose_lint_json(runs)),
        _ => {
            let color = use_colors(output);
            print_runs_human(runs, color);
            print_summary(total(runs, &[]), color);
        }
    }
}

/// Print suite reports, followed by any lint runs made alongside them.
pub fn print_reports(reports: &[GradeReport], runs: &[LintRun], output: &str) {
    match output {
        "json" => print_json(&compose_reports_json(reports, runs)),
        _ => {
            let color = use_colors(output);
            for report in reports {
                let header = format!(
                    "{} ({} suite)",
                    display_path(Path::new(&report.target)),
                    report.suite
                );
                println!("{}", paint(&header, color, |s| s.bold().underline().to_string()));
                for r in &report.results {
                    if r.outcome.passed() {
                        let icon = paint("✔", color, |s| s.green().to_string());
                        println!("  {} {} › {}", icon, r.group, r.name);
                    } else {
                        let icon = paint("✖", color, |s| s.red().to_string());
                        println!("  {} {} › {}", icon, r.group, r.name);
                        for line in r.outcome.message().lines() {
                            println!("      {}", paint(line, color, |s| s.bright_black().to_string()));
                        }
                    }
                }
            }
            print_runs_human(runs, color);
            print_summary(total(runs, reports), color);
        }
    }
}

fn run_json(run: &LintRun) -> JsonVal {
    json!({
        "linter": run.linter,
        "targets": run.targets,
        "passed": run.outcome.passed(),
        "message": if run.outcome.passed() { None } else { Some(run.outcome.message()) },
        "violations": run.violations,
    })
}

/// Compose lint JSON object (pure) for testing/snapshot purposes.
pub fn compose_lint_json(runs: &[LintRun]) -> JsonVal {
    let items: Vec<_> = runs.iter().map(run_json).collect();
    json!({"results": items, "summary": total(runs, &[])})
}

/// Compose check JSON object (pure) for testing/snapshot purposes.
pub fn compose_reports_json(reports: &[GradeReport], runs: &[LintRun]) -> JsonVal {
    let items: Vec<_> = reports
        .iter()
        .map(|report| {
            let checks: Vec<_> = report
                .results
                .iter()
                .map(|r| {
                    json!({
                        "group": r.group,
                        "name": r.name,
                        "passed": r.outcome.passed(),
                        "message": if r.outcome.passed() { None } else { Some(r.outcome.message()) },
                    })
                })
                .collect();
            json!({
                "suite": report.suite,
                "target": report.target,
                "checks": checks,
                "summary": report.summary(),
            })
        })
        .collect();
    let lint: Vec<_> = runs.iter().map(run_json).collect();
    json!({"reports": items, "lint": lint, "summary": total(runs, reports)})
}
