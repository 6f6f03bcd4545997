//! Rule identity: the raw user inputs and every name form derived from them.

use crate::config::CategoryCatalogue;
use crate::error::ScaffoldError;
use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};

/// Words that cannot be used as a module name.
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl",
    "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Which checking trait the generated rule implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Runs on tree-sitter nodes.
    #[default]
    Ast,
    /// Runs on the raw source text.
    Text,
    /// Runs on the file path only.
    Path,
}

impl RuleKind {
    /// Name of the kind as it appears in the dispatch table.
    pub const fn variant_name(self) -> &'static str {
        match self {
            Self::Ast => "Ast",
            Self::Text => "Text",
            Self::Path => "Path",
        }
    }

    /// Parse a CLI spelling (`ast`, `text`, `path`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ast" => Some(Self::Ast),
            "text" => Some(Self::Text),
            "path" => Some(Self::Path),
            _ => None,
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.variant_name())
    }
}

/// Identity of a new rule. Immutable once built; every derived field is computed
/// from the four raw inputs in [`RuleIdentity::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleIdentity {
    display_name: String,
    prefix: String,
    code: String,
    category: String,
    category_dir: String,
    category_variant: String,
    snake_name: String,
}

impl RuleIdentity {
    /// Validate raw inputs and derive every name form.
    pub fn new(
        display_name: &str,
        prefix: &str,
        code: &str,
        category: &str,
        catalogue: &CategoryCatalogue,
    ) -> Result<Self, ScaffoldError> {
        let display_name = display_name.trim();
        let prefix = prefix.trim();
        let code = code.trim();

        validate_display_name(display_name)?;
        if prefix.is_empty() {
            return Err(ScaffoldError::invalid("prefix", "must not be empty"));
        }
        if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ScaffoldError::invalid(
                "prefix",
                format!("'{prefix}' must contain only ASCII letters"),
            ));
        }
        if code.is_empty() {
            return Err(ScaffoldError::invalid("code", "must not be empty"));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ScaffoldError::invalid(
                "code",
                format!("'{code}' must contain only ASCII letters and digits"),
            ));
        }

        let snake_name = display_name.to_snake_case();
        if RUST_KEYWORDS.contains(&snake_name.as_str()) {
            return Err(ScaffoldError::invalid(
                "name",
                format!("'{display_name}' becomes the reserved module name '{snake_name}'"),
            ));
        }

        let (category_name, spec) = catalogue.resolve(category)?;

        Ok(Self {
            display_name: display_name.to_string(),
            prefix: prefix.to_string(),
            code: code.to_string(),
            category: category_name.to_string(),
            category_dir: spec.dir_for(category_name),
            category_variant: spec.variant_for(category_name),
            snake_name,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Canonical category name, as spelled in the catalogue.
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn category_dir(&self) -> &str {
        &self.category_dir
    }

    pub fn category_variant(&self) -> &str {
        &self.category_variant
    }

    pub fn snake_name(&self) -> &str {
        &self.snake_name
    }

    /// `prefix + code`, e.g. `C807`.
    pub fn file_stem(&self) -> String {
        format!("{}{}", self.prefix, self.code)
    }

    /// `category_dir/snake_name`, relative to the rules directory.
    pub fn module_path(&self) -> String {
        format!("{}/{}", self.category_dir, self.snake_name)
    }

    /// Category directory as a Rust path segment.
    pub fn category_module(&self) -> String {
        self.category_dir.replace('-', "_")
    }
}

fn validate_display_name(name: &str) -> Result<(), ScaffoldError> {
    let Some(first) = name.chars().next() else {
        return Err(ScaffoldError::invalid("name", "must not be empty"));
    };
    if !first.is_ascii_uppercase() {
        return Err(ScaffoldError::invalid(
            "name",
            format!("'{name}' must start with an uppercase ASCII letter (e.g. PreferListBuiltin)"),
        ));
    }
    if let Some(bad) = name.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(ScaffoldError::invalid(
            "name",
            format!("'{name}' contains disallowed character {bad:?}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(
        name: &str,
        prefix: &str,
        code: &str,
        category: &str,
    ) -> Result<RuleIdentity, ScaffoldError> {
        RuleIdentity::new(name, prefix, code, category, &CategoryCatalogue::default())
    }

    #[test]
    fn test_derived_forms() {
        let id = build("PreferListBuiltin", "C", "807", "correctness").unwrap();
        assert_eq!(id.display_name(), "PreferListBuiltin");
        assert_eq!(id.snake_name(), "prefer_list_builtin");
        assert_eq!(id.file_stem(), "C807");
        assert_eq!(id.category_dir(), "correctness");
        assert_eq!(id.category_variant(), "Correctness");
        assert_eq!(id.module_path(), "correctness/prefer_list_builtin");
        assert_eq!(id.category_module(), "correctness");
    }

    #[test]
    fn test_acronyms_split_on_capitalization() {
        let id = build("MissingIOSpecifier", "C", "041", "correctness").unwrap();
        assert_eq!(id.snake_name(), "missing_io_specifier");
    }

    #[test]
    fn test_inputs_are_trimmed() {
        let id = build("  TrailingTab ", " S ", " 101 ", "style").unwrap();
        assert_eq!(id.display_name(), "TrailingTab");
        assert_eq!(id.file_stem(), "S101");
    }

    #[test]
    fn test_category_lookup_is_case_insensitive() {
        let id = build("UnusedLabel", "S", "301", "Style").unwrap();
        assert_eq!(id.category(), "style");
        assert_eq!(id.category_variant(), "Style");
    }

    #[test]
    fn test_invalid_display_names() {
        let names = [
            "",
            "lowercase",
            "Has-Dash",
            "Has Space",
            "Ünicode",
            "Snake_Case",
        ];
        for bad in names {
            let err = build(bad, "C", "001", "correctness").unwrap_err();
            assert!(
                matches!(err, ScaffoldError::InvalidIdentity { field: "name", .. }),
                "expected invalid name for {bad:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_keyword_module_name_rejected() {
        let err = build("Match", "C", "001", "correctness").unwrap_err();
        assert!(matches!(err, ScaffoldError::InvalidIdentity { field: "name", .. }));
        assert!(build("Matches", "C", "001", "correctness").is_ok());
    }

    #[test]
    fn test_invalid_prefix_and_code() {
        assert!(matches!(
            build("Foo", "", "001", "correctness").unwrap_err(),
            ScaffoldError::InvalidIdentity { field: "prefix", .. }
        ));
        assert!(matches!(
            build("Foo", "C1", "001", "correctness").unwrap_err(),
            ScaffoldError::InvalidIdentity { field: "prefix", .. }
        ));
        assert!(matches!(
            build("Foo", "C", "", "correctness").unwrap_err(),
            ScaffoldError::InvalidIdentity { field: "code", .. }
        ));
        assert!(matches!(
            build("Foo", "C", "0/1", "correctness").unwrap_err(),
            ScaffoldError::InvalidIdentity { field: "code", .. }
        ));
    }

    #[test]
    fn test_unknown_category_fails_fast() {
        let err = build("Foo", "C", "001", "corectness").unwrap_err();
        match err {
            ScaffoldError::UnknownCategory { name, suggestion } => {
                assert_eq!(name, "corectness");
                assert_eq!(suggestion.as_deref(), Some("correctness"));
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn test_rule_kind_names() {
        assert_eq!(RuleKind::from_name("AST"), Some(RuleKind::Ast));
        assert_eq!(RuleKind::from_name("path"), Some(RuleKind::Path));
        assert_eq!(RuleKind::from_name("tokens"), None);
        assert_eq!(RuleKind::Text.to_string(), "Text");
        assert_eq!(RuleKind::default(), RuleKind::Ast);
    }
}
