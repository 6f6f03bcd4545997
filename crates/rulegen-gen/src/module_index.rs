//! Per-category module index: the `mod` declarations (and optional re-exports)
//! that make a rule's module part of the crate.
//!
//! Only unindented lines take part. A declaration or export directly below an
//! attribute such as `#[cfg(test)]` belongs to that attribute and is treated
//! as ordinary content. Trailing `//` comments are ignored when classifying
//! and kept as written.

use crate::region::{
    Document, InsertionPoint, Patched, RegistryRole, SortOrder, indentation, insertion_offset,
    is_blank, runs,
};
use rulegen_core::ScaffoldError;
use rulegen_core::config::RegistryConfig;
use rulegen_core::template_vars::TemplateVars;
use std::ops::Range;

const DECLARATIONS: &str = "module declarations";
const EXPORTS: &str = "module exports";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class<'a> {
    Declaration(&'a str),
    Export,
    Other,
}

/// Insert the rule's module declaration, plus its export line when an
/// export template is configured.
pub fn patch_module_index(
    content: &str,
    vars: &TemplateVars<'_>,
    registry: &RegistryConfig,
) -> Result<Patched, ScaffoldError> {
    if content.trim().is_empty() {
        return Err(ScaffoldError::MalformedIndex("module index is empty".to_string()));
    }

    let mut doc = Document::parse(content);
    let mut insertions = Vec::new();

    let decl = vars.render(&registry.declaration_template)?;
    let classes = classify_all(doc.lines())?;
    let point = match first_run(&classes, |c| matches!(c, Class::Declaration(_))) {
        Some(region) => insert_sorted(&mut doc, region, &decl, DECLARATIONS, declaration_key),
        None => {
            let at = first_run(&classes, |c| matches!(c, Class::Export))
                .map_or_else(|| header_end(doc.lines()), |exports| exports.start);
            insert_new_region(&mut doc, at, &decl, DECLARATIONS, declaration_key)
        }
    };
    log_insertion(&point);
    insertions.push(point);

    if let Some(template) = &registry.export_template {
        let export = vars.render(template)?;
        let classes = classify_all(doc.lines())?;
        let point = match first_run(&classes, |c| matches!(c, Class::Export)) {
            Some(region) => insert_sorted(&mut doc, region, &export, EXPORTS, text_key),
            None => {
                let declared_at = insertions[0].line_index;
                let is_declaration = |i: usize| matches!(classes[i], Class::Declaration(_));
                let at = runs(0..classes.len(), is_declaration)
                    .into_iter()
                    .find(|run| run.contains(&declared_at))
                    .map_or(declared_at + 1, |run| run.end);
                insert_new_region(&mut doc, at, &export, EXPORTS, text_key)
            }
        };
        for earlier in &mut insertions {
            if earlier.line_index >= point.line_index {
                earlier.line_index += 1;
            }
        }
        log_insertion(&point);
        insertions.push(point);
    }

    Ok(Patched {
        content: doc.render(),
        insertions,
    })
}

fn log_insertion(point: &InsertionPoint) {
    let line = point.line_index + 1;
    tracing::debug!("module index: {} at line {line}", point.text);
}

fn classify_all(lines: &[String]) -> Result<Vec<Class<'_>>, ScaffoldError> {
    let mut classes = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let pinned = i > 0 && {
            let prev = lines[i - 1].trim_end();
            indentation(prev).is_empty() && prev.starts_with("#[")
        };
        let class = classify(line).map_err(|reason| {
            ScaffoldError::MalformedIndex(format!("line {}: {reason}", i + 1))
        })?;
        classes.push(if pinned { Class::Other } else { class });
    }
    Ok(classes)
}

fn classify(line: &str) -> Result<Class<'_>, String> {
    if !indentation(line).is_empty() {
        return Ok(Class::Other);
    }
    let rest = strip_visibility(strip_comment(line));

    if let Some(after) = rest.strip_prefix("mod")
        && after.starts_with(char::is_whitespace)
    {
        let body = after.trim();
        // Inline module
        if body.contains('{') {
            return Ok(Class::Other);
        }
        let name = body
            .strip_suffix(';')
            .map(str::trim_end)
            .filter(|name| is_identifier(name))
            .ok_or_else(|| format!("cannot read a module name from `{}`", line.trim_end()))?;
        return Ok(Class::Declaration(name));
    }

    if rest.starts_with("use ") && rest.ends_with(';') {
        return Ok(Class::Export);
    }
    Ok(Class::Other)
}

/// Code part of a line, without a trailing `//` comment.
fn strip_comment(line: &str) -> &str {
    line.find("//").map_or(line, |at| &line[..at]).trim_end()
}

fn strip_visibility(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix("pub(")
        && let Some(close) = rest.find(')')
    {
        return rest[close + 1..].trim_start();
    }
    line.strip_prefix("pub ").map_or(line, str::trim_start)
}

fn is_identifier(name: &str) -> bool {
    let name = name.strip_prefix("r#").unwrap_or(name);
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn first_run(classes: &[Class<'_>], pred: impl Fn(&Class<'_>) -> bool) -> Option<Range<usize>> {
    runs(0..classes.len(), |i| pred(&classes[i]))
        .into_iter()
        .next()
}

fn declaration_key(line: &str) -> String {
    match classify(line) {
        Ok(Class::Declaration(name)) => name.to_string(),
        _ => line.trim().to_string(),
    }
}

fn text_key(line: &str) -> String {
    line.trim().to_string()
}

/// End of the file header: leading comments and inner attributes.
fn header_end(lines: &[String]) -> usize {
    let mut end = 0;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("//") || trimmed.starts_with("#![") {
            end = i + 1;
        } else if !trimmed.is_empty() {
            break;
        }
    }
    end
}

fn insert_sorted(
    doc: &mut Document,
    region: Range<usize>,
    line: &str,
    name: &str,
    key: fn(&str) -> String,
) -> InsertionPoint {
    let existing: Vec<&str> = doc.lines()[region.clone()]
        .iter()
        .map(String::as_str)
        .collect();
    let (offset, order) = insertion_offset(&existing, line, key);
    let at = region.start + offset;
    doc.insert(at, line);
    InsertionPoint {
        role: RegistryRole::ModuleIndex,
        region: name.to_string(),
        line_index: at,
        text: line.to_string(),
        key: key(line),
        order,
    }
}

/// Start a region of one line at `at`, separated from neighbours by blank lines.
fn insert_new_region(
    doc: &mut Document,
    at: usize,
    line: &str,
    name: &str,
    key: fn(&str) -> String,
) -> InsertionPoint {
    let mut at = at;
    if at < doc.len() && !is_blank(&doc.lines()[at]) {
        doc.insert(at, "");
    }
    if at > 0 && !is_blank(&doc.lines()[at - 1]) {
        doc.insert(at, "");
        at += 1;
    }
    doc.insert(at, line);
    InsertionPoint {
        role: RegistryRole::ModuleIndex,
        region: name.to_string(),
        line_index: at,
        text: line.to_string(),
        key: key(line),
        order: SortOrder::Text,
    }
}
