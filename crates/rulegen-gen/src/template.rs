//! Stub implementation files for new rules.
//!
//! Each rule kind has its own template, rendered with the same placeholders
//! as the registry templates.

use rulegen_core::ScaffoldError;
use rulegen_core::identity::RuleKind;
use rulegen_core::template_vars::TemplateVars;

/// Stub for rules checked against tree-sitter nodes
const AST_RULE: &str = include_str!("templates/ast_rule.rs.tmpl");

/// Stub for rules checked against the raw source text
const TEXT_RULE: &str = include_str!("templates/text_rule.rs.tmpl");

/// Stub for rules checked against the file path
const PATH_RULE: &str = include_str!("templates/path_rule.rs.tmpl");

/// Template source for a rule kind.
pub const fn stub_template(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::Ast => AST_RULE,
        RuleKind::Text => TEXT_RULE,
        RuleKind::Path => PATH_RULE,
    }
}

/// Render the stub file for the rule described by `vars`.
pub fn render_stub(vars: &TemplateVars<'_>) -> Result<String, ScaffoldError> {
    Ok(vars.render(stub_template(vars.kind()))?)
}
