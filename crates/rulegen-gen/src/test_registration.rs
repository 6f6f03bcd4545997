//! Test registration: the `#[test_case(...)]` annotations stacked above the
//! parameterised snapshot test of each category.

use crate::region::{
    Document, InsertionPoint, Patched, RegistryRole, SortOrder, indentation, insertion_offset,
    is_blank, runs,
};
use rulegen_core::ScaffoldError;
use rulegen_core::config::RegistryConfig;
use rulegen_core::template_vars::{TemplateVars, literal_prefix};

/// Add the rule's annotation above the configured test anchor.
pub fn patch_test_registration(
    content: &str,
    vars: &TemplateVars<'_>,
    registry: &RegistryConfig,
) -> Result<Patched, ScaffoldError> {
    let anchor = registry.test_anchor.trim();
    let mut doc = Document::parse(content);
    let anchor_at = doc
        .lines()
        .iter()
        .position(|line| line.trim() == anchor)
        .ok_or_else(|| ScaffoldError::AnchorNotFound(anchor.to_string()))?;

    let annotation = format!(
        "{}{}",
        indentation(&doc.lines()[anchor_at]),
        vars.render(&registry.annotation_template)?.trim()
    );

    let prefix = literal_prefix(&registry.annotation_template);
    let prefix = prefix.trim();
    let lines = doc.lines();
    let mut block_start = anchor_at;
    while block_start > 0 && !is_blank(&lines[block_start - 1]) {
        block_start -= 1;
    }
    let is_annotation = |i: usize| lines[i].trim_start().starts_with(prefix);
    let annotations = runs(block_start..anchor_at, is_annotation).pop();

    let (at, order) = match annotations {
        Some(region) => {
            let existing: Vec<&str> = lines[region.clone()].iter().map(String::as_str).collect();
            let (offset, order) = insertion_offset(&existing, &annotation, fixture_key);
            (region.start + offset, order)
        }
        None => (anchor_at, SortOrder::Text),
    };
    doc.insert(at, &annotation);

    let point = InsertionPoint {
        role: RegistryRole::TestRegistration,
        region: format!("annotations above `{anchor}`"),
        line_index: at,
        key: fixture_key(&annotation),
        text: annotation,
        order,
    };
    let line = at + 1;
    tracing::debug!("test registration: {} at line {line}", point.text.trim());

    Ok(Patched {
        content: doc.render(),
        insertions: vec![point],
    })
}

/// The fixture path inside `Path::new("...")`, or the whole line.
fn fixture_key(line: &str) -> String {
    line.split_once("Path::new(\"")
        .and_then(|(_, rest)| rest.split_once('"'))
        .map_or_else(|| line.trim().to_string(), |(path, _)| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegen_core::identity::RuleKind;
    use rulegen_core::{CategoryCatalogue, RuleIdentity};

    const STYLE_TESTS: &str = r#"#[cfg(test)]
mod tests {
    use std::path::Path;

    use test_case::test_case;

    #[test_case(Rule::LineTooLong, Path::new("S001.f90"))]
    #[test_case(Rule::MissingNewlineAtEndOfFile, Path::new("S002.f90"))]
    #[test_case(Rule::UnnamedEndStatement, Path::new("S061.f90"))]
    #[test_case(Rule::TrailingWhitespace, Path::new("S101.f90"))]
    fn rules(rule_code: Rule, path: &Path) -> Result<()> {
        Ok(())
    }

    #[test_case(Rule::LineTooLong, Path::new("S001_long.f90"))]
    fn rules_with_settings(rule_code: Rule, path: &Path) -> Result<()> {
        Ok(())
    }
}
"#;

    fn patch(content: &str, name: &str, code: &str) -> Result<Patched, ScaffoldError> {
        let id =
            RuleIdentity::new(name, "S", code, "style", &CategoryCatalogue::default()).unwrap();
        patch_test_registration(
            content,
            &TemplateVars::new(&id, RuleKind::Ast, "f90"),
            &RegistryConfig::default(),
        )
    }

    #[test]
    fn test_annotation_sorted_by_fixture_path() {
        let patched = patch(STYLE_TESTS, "SuperfluousSemicolon", "081").unwrap();
        let point = &patched.insertions[0];
        assert_eq!(point.key, "S081.f90");
        assert_eq!(point.order, SortOrder::Key);
        assert_eq!(point.line_index, 9);
        let expected = concat!(
            "    #[test_case(Rule::UnnamedEndStatement, Path::new(\"S061.f90\"))]\n",
            "    #[test_case(Rule::SuperfluousSemicolon, Path::new(\"S081.f90\"))]\n",
            "    #[test_case(Rule::TrailingWhitespace, Path::new(\"S101.f90\"))]\n",
        );
        assert!(patched.content.contains(expected));

        let mut lines: Vec<&str> = patched.content.split('\n').collect();
        lines.remove(point.line_index);
        assert_eq!(lines.join("\n"), STYLE_TESTS);
    }

    #[test]
    fn test_first_anchor_only() {
        let patched = patch(STYLE_TESTS, "Zebra", "999").unwrap();
        assert_eq!(patched.insertions[0].line_index, 10);
        assert_eq!(patched.content.matches("Rule::Zebra").count(), 1);
        let expected = "Path::new(\"S999.f90\"))]\n    fn rules(rule_code: Rule, path: &Path)";
        assert!(patched.content.contains(expected));
    }

    #[test]
    fn test_text_sorted_block() {
        let content = "\
    #[test_case(Rule::Alpha, Path::new(\"A001.f90\"))]
    #[test_case(Rule::Gamma, Path::new(\"A003.f90\"))]
    fn rules(rule_code: Rule, path: &Path) -> Result<()> {
";
        let patched = patch(content, "Beta", "002").unwrap();
        assert_eq!(patched.insertions[0].order, SortOrder::Text);
        assert_eq!(patched.insertions[0].line_index, 1);
    }

    #[test]
    fn test_no_annotations_inserts_directly_before_anchor() {
        let content = "\
mod tests {
    #[allow(unused)]
    fn rules(rule_code: Rule, path: &Path) -> Result<()> {
    }
}
";
        let patched = patch(content, "NewRule", "001").unwrap();
        assert_eq!(
            patched.content,
            "\
mod tests {
    #[allow(unused)]
    #[test_case(Rule::NewRule, Path::new(\"S001.f90\"))]
    fn rules(rule_code: Rule, path: &Path) -> Result<()> {
    }
}
"
        );
        assert_eq!(patched.insertions[0].line_index, 2);
    }

    #[test]
    fn test_uses_anchor_indentation() {
        let content = concat!(
            "\t#[test_case(Rule::A, Path::new(\"S001.f90\"))]\n",
            "\tfn rules(rule_code: Rule, path: &Path) -> Result<()> {\n",
        );
        let patched = patch(content, "B", "002").unwrap();
        let expected = "\t#[test_case(Rule::B, Path::new(\"S002.f90\"))]\n\tfn rules";
        assert!(patched.content.contains(expected));
    }

    #[test]
    fn test_missing_anchor() {
        let err = patch("mod tests {}\n", "NewRule", "001").unwrap_err();
        assert!(matches!(err, ScaffoldError::AnchorNotFound(a) if a.starts_with("fn rules(")));
    }

    #[test]
    fn test_fixture_key() {
        assert_eq!(
            fixture_key("    #[test_case(Rule::A, Path::new(\"S001.f90\"))]"),
            "S001.f90"
        );
        assert_eq!(
            fixture_key("  #[test_case(Rule::A)]"),
            "#[test_case(Rule::A)]"
        );
    }
}
