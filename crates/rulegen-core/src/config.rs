//! Configuration for rule scaffolding: project layout, registry anchors and
//! templates, the formatter command, and the closed set of categories.
//!
//! Load order: `.rulegen/config.toml` → defaults. Every table is optional.

use crate::error::ScaffoldError;
use crate::template_vars;
use anyhow::{Context, Result};
use heck::{ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Minimum normalized Levenshtein similarity for a "did you mean" suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Top-level rulegen configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulegenConfig {
    pub layout: LayoutConfig,
    pub registry: RegistryConfig,
    pub formatter: FormatterConfig,
    pub categories: CategoryCatalogue,
}

/// Where the registry files live, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Crate holding the rules.
    pub linter_dir: PathBuf,
    /// Rules directory, relative to `linter_dir`. Category directories live here.
    pub rules_dir: PathBuf,
    /// Test fixture root, relative to `linter_dir`.
    pub fixtures_dir: PathBuf,
    /// Master dispatch table, relative to `linter_dir`.
    pub dispatch_table: PathBuf,
    /// Per-category module index, relative to the category directory.
    pub module_index: PathBuf,
    /// Per-category test registration file, relative to the category directory.
    /// Defaults to the module index itself.
    pub test_registration: PathBuf,
    /// Extension of fixture files (without the dot).
    pub fixture_extension: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            linter_dir: PathBuf::from("crates/fortitude_linter"),
            rules_dir: PathBuf::from("src/rules"),
            fixtures_dir: PathBuf::from("resources/test/fixtures"),
            dispatch_table: PathBuf::from("src/rules/mod.rs"),
            module_index: PathBuf::from("mod.rs"),
            test_registration: PathBuf::from("mod.rs"),
            fixture_extension: "f90".to_string(),
        }
    }
}

/// Anchors and line templates used by the registry patchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Module declaration added to the category index.
    pub declaration_template: String,
    /// Optional re-export added next to the declaration, for index formats that have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_template: Option<String>,
    /// Exact (trimmed) text of the line the test annotations precede.
    pub test_anchor: String,
    /// Test-case annotation added above `test_anchor`.
    pub annotation_template: String,
    /// Comment line opening a category's section of the dispatch table.
    pub category_marker: String,
    /// Row added to the dispatch table, without indentation.
    pub row_template: String,
}

const ROW_TEMPLATE: &str = concat!(
    r#"({variant}, "{code}") => (RuleGroup::Preview, {kind}, Optional, "#,
    "{module}::{snake}::{name}),"
);

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            declaration_template: "pub(crate) mod {snake};".to_string(),
            export_template: None,
            test_anchor: "fn rules(rule_code: Rule, path: &Path) -> Result<()> {".to_string(),
            annotation_template: r#"#[test_case(Rule::{name}, Path::new("{file_stem}.{ext}"))]"#
                .to_string(),
            category_marker: "// {category}".to_string(),
            row_template: ROW_TEMPLATE.to_string(),
        }
    }
}

impl RegistryConfig {
    /// All templates with the key they were configured under.
    fn templates(&self) -> Vec<(&'static str, &str)> {
        let mut templates = vec![
            ("registry.declaration_template", self.declaration_template.as_str()),
            ("registry.annotation_template", self.annotation_template.as_str()),
            ("registry.category_marker", self.category_marker.as_str()),
            ("registry.row_template", self.row_template.as_str()),
        ];
        if let Some(export) = &self.export_template {
            templates.push(("registry.export_template", export.as_str()));
        }
        templates
    }
}

/// External formatter run on touched files after a successful scaffold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatterConfig {
    pub enabled: bool,
    /// Program and leading arguments; touched file paths are appended.
    pub command: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: vec![
                "rustfmt".to_string(),
                "--edition".to_string(),
                "2024".to_string(),
            ],
        }
    }
}

/// Overrides for one category. Missing fields are derived from the category name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorySpec {
    /// Directory slug under the rules and fixtures directories.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Enum variant naming the category in the dispatch table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl CategorySpec {
    pub fn dir_for(&self, name: &str) -> String {
        self.dir.clone().unwrap_or_else(|| name.to_snake_case())
    }

    pub fn variant_for(&self, name: &str) -> String {
        self.variant
            .clone()
            .unwrap_or_else(|| name.to_upper_camel_case())
    }
}

/// The closed set of known categories, keyed by name.
///
/// Configuring `[categories]` replaces the default set entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalogue(BTreeMap<String, CategorySpec>);

impl Default for CategoryCatalogue {
    fn default() -> Self {
        let names = [
            "correctness",
            "error",
            "modernisation",
            "obsolescent",
            "portability",
            "style",
        ];
        Self(
            names
                .into_iter()
                .map(|n| (n.to_string(), CategorySpec::default()))
                .collect(),
        )
    }
}

impl CategoryCatalogue {
    pub fn new(categories: BTreeMap<String, CategorySpec>) -> Self {
        Self(categories)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CategorySpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Find a category by exact name, then case-insensitively.
    ///
    /// Unknown names never create a new category; the closest known name is
    /// offered as a suggestion instead.
    pub fn resolve(&self, name: &str) -> Result<(&str, &CategorySpec), ScaffoldError> {
        let wanted = name.trim();
        if let Some((key, spec)) = self.0.get_key_value(wanted) {
            return Ok((key.as_str(), spec));
        }
        let mut folded = self
            .0
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(wanted));
        if let (Some((key, spec)), None) = (folded.next(), folded.next()) {
            return Ok((key.as_str(), spec));
        }

        Err(ScaffoldError::UnknownCategory {
            name: wanted.to_string(),
            suggestion: self.suggest(wanted),
        })
    }

    fn suggest(&self, name: &str) -> Option<String> {
        let lowered = name.to_lowercase();
        self.0
            .keys()
            .map(|key| (key, strsim::normalized_levenshtein(&lowered, &key.to_lowercase())))
            .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(key, _)| key.clone())
    }
}

/// Path of the config file for a project root.
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(".rulegen").join("config.toml")
}

impl RulegenConfig {
    /// Load config from `.rulegen/config.toml` in the project root.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = config_path(project_root);

        let config: Self = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        config
            .validate()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Reject configurations the patchers cannot work with.
    pub fn validate(&self) -> Result<()> {
        for (key, template) in self.registry.templates() {
            template_vars::validate(template).with_context(|| format!("bad template `{key}`"))?;
        }
        if self.registry.test_anchor.trim().is_empty() {
            anyhow::bail!("registry.test_anchor must not be empty");
        }
        if template_vars::literal_prefix(&self.registry.annotation_template)
            .trim()
            .is_empty()
        {
            anyhow::bail!("registry.annotation_template must start with literal text");
        }
        if self.registry.category_marker.trim().is_empty() {
            anyhow::bail!("registry.category_marker must not be empty");
        }
        if self.categories.is_empty() {
            anyhow::bail!("at least one category must be configured");
        }
        if self.formatter.enabled && self.formatter.command.is_empty() {
            anyhow::bail!("formatter.command must not be empty when the formatter is enabled");
        }
        let ext = &self.layout.fixture_extension;
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            anyhow::bail!("layout.fixture_extension must be a bare extension such as \"f90\"");
        }
        Ok(())
    }
}
