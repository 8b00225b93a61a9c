//! Configuration discovery and effective settings resolution.
//!
//! Webgrade reads `webgrade.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `output`: `human`
//! - `node`: `node`
//! - `[markup]`: the course htmllint rule set
//! - `[style]`: recommended preset plus `declaration-colon-space-after`
//! - `[script]`: ES2020 modules in a browser environment
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{GradeError, Result};
use crate::models::options::{MarkupLintOptions, ScriptLintOptions, StyleLintConfig, StyleLintOverrides};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 3] = ["webgrade.toml", "webgrade.yaml", "webgrade.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `webgrade.toml|yaml`.
pub struct GradeConfig {
    pub output: Option<String>,
    pub node: Option<String>,
    #[serde(default)]
    pub markup: Option<MarkupLintOptions>,
    #[serde(default)]
    pub style: Option<StyleLintOverrides>,
    #[serde(default)]
    pub script: Option<ScriptLintOptions>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub output: String,
    pub node: String,
    pub markup: MarkupLintOptions,
    pub style: StyleLintConfig,
    pub script: ScriptLintOptions,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `webgrade.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `GradeConfig` from `webgrade.toml` or `webgrade.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<GradeConfig>> {
    for name in CONFIG_NAMES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|e| GradeError::io(&path, e))?;
        let parsed = if name.ends_with(".toml") {
            toml::from_str::<GradeConfig>(&s).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<GradeConfig>(&s).map_err(|e| e.to_string())
        };
        log::debug!("loaded configuration from {}", path.display());
        return parsed
            .map(Some)
            .map_err(|message| GradeError::Config { path, message });
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_node: Option<&str>,
) -> Result<Effective> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root)?.unwrap_or_default();

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    let node = cli_node
        .map(|s| s.to_string())
        .or(cfg.node)
        .unwrap_or_else(|| "node".to_string());

    let markup = match cfg.markup {
        Some(section) => MarkupLintOptions::course_default().overlay(&section),
        None => MarkupLintOptions::course_default(),
    };
    let style = match cfg.style {
        Some(section) => StyleLintConfig::course_default().merged(&section),
        None => StyleLintConfig::course_default(),
    };
    let script = cfg.script.unwrap_or_default();

    Ok(Effective {
        repo_root,
        output,
        node,
        markup,
        style,
        script,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::options::RECOMMENDED_STYLE_PRESET;
    use serde_json::json;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("webgrade.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output = "json"
node = "/opt/node/bin/node"
[markup]
indent-width = 2
[style.rules]
color-no-invalid-hex = false
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(root.to_str(), None, None).unwrap();
        assert_eq!(eff.output, "json");
        assert_eq!(eff.node, "/opt/node/bin/node");
        assert_eq!(eff.markup.to_json().unwrap()["indent-width"], json!(2));
        // course defaults survive the overlay
        assert_eq!(eff.markup.to_json().unwrap()["doctype-first"], json!(true));
        assert_eq!(eff.style.extends, vec![RECOMMENDED_STYLE_PRESET.to_string()]);
        assert_eq!(eff.style.rules.get("color-no-invalid-hex"), Some(&json!(false)));
        assert_eq!(
            eff.style.rules.get("declaration-colon-space-after"),
            Some(&json!("always"))
        );
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("webgrade.yaml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
output: human
script:
  env:
    node: true
  use-eslintrc: true
            "#
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None).unwrap();
        assert_eq!(eff.output, "human");
        assert_eq!(eff.node, "node");
        assert!(eff.script.use_eslintrc);
        assert_eq!(eff.script.env.get("node"), Some(&true));
        // fields absent from the section keep their defaults
        assert_eq!(eff.script.parser_options.get("ecmaVersion"), Some(&json!(2020)));
    }

    #[test]
    fn test_cli_takes_precedence() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("webgrade.toml"), "output = \"json\"\nnode = \"nodejs\"\n").unwrap();

        let eff = resolve_effective(root.to_str(), Some("human"), Some("/usr/bin/node")).unwrap();
        assert_eq!(eff.output, "human");
        assert_eq!(eff.node, "/usr/bin/node");
    }

    #[test]
    fn test_detect_walks_up_to_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("webgrade.yml"), "output: json\n").unwrap();
        let nested = root.join("submissions/alice");
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(detect_repo_root(&nested), root.to_path_buf());
        let eff = resolve_effective(nested.to_str(), None, None).unwrap();
        assert_eq!(eff.output, "json");
    }

    #[test]
    fn test_unparsable_config_is_error() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("webgrade.toml"), "output = [unterminated").unwrap();

        let err = resolve_effective(root.to_str(), None, None).unwrap_err();
        assert!(matches!(err, GradeError::Config { .. }));
    }

    #[test]
    fn test_style_extends_replaced_only_when_named() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("webgrade.toml"),
            "[style]\nextends = [\"stylelint-config-standard\"]\n",
        )
        .unwrap();

        let eff = resolve_effective(root.to_str(), None, None).unwrap();
        assert_eq!(eff.style.extends, vec!["stylelint-config-standard".to_string()]);
        assert_eq!(
            eff.style.rules.get("declaration-colon-space-after"),
            Some(&json!("always"))
        );
    }
}
