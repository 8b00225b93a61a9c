//! Typed configuration for the three external linters.
//!
//! Each struct serializes to the JSON object its linter expects. Override
//! semantics are explicit:
//! - `MarkupLintOptions::overlay`: fields set on the overlay win, unknown
//!   rules merge per key.
//! - `StyleLintConfig::merged`: `extends` is only replaced when the override
//!   names one, rules merge per key.
//! - `ScriptLintOptions`: a config section replaces whole fields; missing
//!   fields keep the defaults.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use std::collections::BTreeMap;

/// Preset every stylesheet is checked against unless a caller names another.
pub const RECOMMENDED_STYLE_PRESET: &str = "stylelint-config-recommended";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
/// Value of a single markup rule: `false` disables it, anything else configures it.
pub enum RuleSetting {
    Flag(bool),
    Number(i64),
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Rule configuration handed to the markup linter.
///
/// Unknown rule names land in `extra` and are forwarded untouched; the linter
/// ignores names it does not know.
pub struct MarkupLintOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_bans: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctype_first: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctype_html5: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_req_lang: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_end_style: Option<RuleSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_style: Option<RuleSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_width: Option<RuleSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_style: Option<RuleSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_req_alt: Option<RuleSetting>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Json>,
}

impl MarkupLintOptions {
    /// Rule set used for course submissions.
    pub fn course_default() -> Self {
        MarkupLintOptions {
            attr_bans: Some(
                [
                    "align",
                    "background",
                    "bgcolor",
                    "border",
                    "frameborder",
                    "marginwidth",
                    "marginheight",
                    "scrolling",
                    "style",
                    "width",
                    "height",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ),
            doctype_first: Some(true),
            doctype_html5: Some(true),
            html_req_lang: Some(true),
            line_end_style: Some(RuleSetting::Flag(false)),
            indent_style: Some(RuleSetting::Flag(false)),
            indent_width: Some(RuleSetting::Flag(false)),
            class_style: Some(RuleSetting::Text("none".into())),
            // alt text is graded by the structural suite instead
            img_req_alt: Some(RuleSetting::Flag(false)),
            extra: BTreeMap::new(),
        }
    }

    /// Layer `other` on top of `self`.
    pub fn overlay(&self, other: &MarkupLintOptions) -> MarkupLintOptions {
        let mut extra = self.extra.clone();
        extra.extend(other.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        MarkupLintOptions {
            attr_bans: other.attr_bans.clone().or_else(|| self.attr_bans.clone()),
            doctype_first: other.doctype_first.or(self.doctype_first),
            doctype_html5: other.doctype_html5.or(self.doctype_html5),
            html_req_lang: other.html_req_lang.or(self.html_req_lang),
            line_end_style: other
                .line_end_style
                .clone()
                .or_else(|| self.line_end_style.clone()),
            indent_style: other
                .indent_style
                .clone()
                .or_else(|| self.indent_style.clone()),
            indent_width: other
                .indent_width
                .clone()
                .or_else(|| self.indent_width.clone()),
            class_style: other
                .class_style
                .clone()
                .or_else(|| self.class_style.clone()),
            img_req_alt: other
                .img_req_alt
                .clone()
                .or_else(|| self.img_req_alt.clone()),
            extra,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Json> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Resolved configuration for the style linter.
pub struct StyleLintConfig {
    pub extends: Vec<String>,
    #[serde(default)]
    pub rules: BTreeMap<String, Json>,
}

impl Default for StyleLintConfig {
    fn default() -> Self {
        StyleLintConfig {
            extends: vec![RECOMMENDED_STYLE_PRESET.to_string()],
            rules: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
/// Caller-supplied changes to a [`StyleLintConfig`].
pub struct StyleLintOverrides {
    #[serde(default)]
    pub extends: Option<Vec<String>>,
    #[serde(default)]
    pub rules: BTreeMap<String, Json>,
}

impl StyleLintOverrides {
    pub fn with_rule(mut self, name: &str, value: Json) -> Self {
        self.rules.insert(name.to_string(), value);
        self
    }
}

impl StyleLintConfig {
    /// Rule set used for course submissions.
    pub fn course_default() -> Self {
        StyleLintConfig::default().merged(
            &StyleLintOverrides::default().with_rule("declaration-colon-space-after", json!("always")),
        )
    }

    /// Apply `overrides` without dropping the baseline preset.
    pub fn merged(&self, overrides: &StyleLintOverrides) -> StyleLintConfig {
        let mut rules = self.rules.clone();
        for (name, value) in &overrides.rules {
            rules.insert(name.clone(), value.clone());
        }
        StyleLintConfig {
            extends: overrides
                .extends
                .clone()
                .unwrap_or_else(|| self.extends.clone()),
            rules,
        }
    }

    pub fn to_json(&self) -> Json {
        json!({ "extends": self.extends, "rules": self.rules })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
/// Options for the script linter.
pub struct ScriptLintOptions {
    pub parser_options: BTreeMap<String, Json>,
    pub env: BTreeMap<String, bool>,
    pub rules: BTreeMap<String, Json>,
    pub ignore_patterns: Vec<String>,
    pub use_eslintrc: bool,
}

impl Default for ScriptLintOptions {
    fn default() -> Self {
        let mut parser_options = BTreeMap::new();
        parser_options.insert("ecmaVersion".to_string(), json!(2020));
        parser_options.insert("sourceType".to_string(), json!("module"));
        let mut env = BTreeMap::new();
        env.insert("browser".to_string(), true);
        env.insert("es2020".to_string(), true);
        ScriptLintOptions {
            parser_options,
            env,
            rules: BTreeMap::new(),
            ignore_patterns: Vec::new(),
            use_eslintrc: false,
        }
    }
}

impl ScriptLintOptions {
    /// Constructor options for the linter instance.
    pub fn to_eslint_options(&self) -> Json {
        json!({
            "useEslintrc": self.use_eslintrc,
            "overrideConfig": {
                "parserOptions": self.parser_options,
                "env": self.env,
                "rules": self.rules,
                "ignorePatterns": self.ignore_patterns,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_merge_keeps_extends_and_rules() {
        let base = StyleLintConfig::default();
        let over = StyleLintOverrides::default()
            .with_rule("declaration-colon-space-after", json!("always"));
        let merged = base.merged(&over);
        assert_eq!(merged.extends, vec![RECOMMENDED_STYLE_PRESET.to_string()]);
        assert_eq!(merged.rules["declaration-colon-space-after"], json!("always"));

        let out = merged.to_json();
        assert!(out.get("extends").is_some());
        assert!(out.get("rules").is_some());
        assert_eq!(out["rules"]["declaration-colon-space-after"], "always");
    }

    #[test]
    fn test_style_merge_explicit_extends_replaces_preset() {
        let over = StyleLintOverrides {
            extends: Some(vec!["stylelint-config-standard".into()]),
            rules: BTreeMap::new(),
        };
        let merged = StyleLintConfig::course_default().merged(&over);
        assert_eq!(merged.extends, vec!["stylelint-config-standard".to_string()]);
        // rules from the baseline survive
        assert!(merged.rules.contains_key("declaration-colon-space-after"));
    }

    #[test]
    fn test_markup_options_serialize_with_rule_names() {
        let out = MarkupLintOptions::course_default().to_json().unwrap();
        assert_eq!(out["doctype-first"], true);
        assert_eq!(out["class-style"], "none");
        assert_eq!(out["img-req-alt"], false);
        assert_eq!(out["attr-bans"].as_array().map(|a| a.len()), Some(11));
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn test_markup_overlay_and_unknown_rules_pass_through() {
        let section: MarkupLintOptions = toml::from_str(
            r#"
img-req-alt = "allownull"
no-such-rule = true
"#,
        )
        .unwrap();
        let eff = MarkupLintOptions::course_default().overlay(&section);
        assert_eq!(eff.img_req_alt, Some(RuleSetting::Text("allownull".into())));
        assert_eq!(eff.doctype_first, Some(true));
        assert_eq!(eff.to_json().unwrap()["no-such-rule"], true);
    }

    #[test]
    fn test_script_options_shape() {
        let section: ScriptLintOptions = toml::from_str(
            r#"
ignore-patterns = ["dist/**"]
[rules]
semi = "error"
"#,
        )
        .unwrap();
        let out = section.to_eslint_options();
        assert_eq!(out["useEslintrc"], false);
        assert_eq!(out["overrideConfig"]["rules"]["semi"], "error");
        assert_eq!(out["overrideConfig"]["parserOptions"]["ecmaVersion"], 2020);
        assert_eq!(out["overrideConfig"]["ignorePatterns"][0], "dist/**");
    }
}
