//! Master dispatch table mapping `(category, code)` to each rule.
//!
//! Rows are grouped under a `// <category>` comment and each group ends at the
//! first blank line. A group is kept sorted by row text as a whole: a group
//! that is out of order comes out fully sorted once the new row is in.

use crate::region::{
    Document, InsertionPoint, Patched, RegistryRole, SortOrder, indentation, insertion_offset,
    is_blank,
};
use rulegen_core::ScaffoldError;
use rulegen_core::config::RegistryConfig;
use rulegen_core::template_vars::TemplateVars;

/// Add the rule's row to its category section.
pub fn patch_dispatch_table(
    content: &str,
    vars: &TemplateVars<'_>,
    registry: &RegistryConfig,
) -> Result<Patched, ScaffoldError> {
    let marker = vars.render(&registry.category_marker)?;
    let marker = marker.trim();
    let mut doc = Document::parse(content);
    let lines = doc.lines();

    let marker_at = lines
        .iter()
        .position(|line| line.trim() == marker)
        .ok_or_else(|| ScaffoldError::CategoryMarkerNotFound(marker.to_string()))?;
    let start = marker_at + 1;
    let end = lines[start..]
        .iter()
        .position(|line| is_blank(line))
        .map_or(lines.len(), |offset| start + offset);

    let row = format!(
        "{}{}",
        indentation(&lines[marker_at]),
        vars.render(&registry.row_template)?.trim()
    );
    let existing: Vec<&str> = lines[start..end].iter().map(String::as_str).collect();
    let (offset, order) = insertion_offset(&existing, &row, |line| line.trim().to_string());
    let at = if order == SortOrder::Unordered {
        doc.sort_range(start..end, |line| line.trim().to_string());
        let sorted = &doc.lines()[start..end];
        start + sorted.partition_point(|line| line.trim() <= row.trim())
    } else {
        start + offset
    };
    doc.insert(at, &row);

    let point = InsertionPoint {
        role: RegistryRole::DispatchTable,
        region: format!("section `{marker}`"),
        line_index: at,
        key: row.trim().to_string(),
        text: row,
        order,
    };
    tracing::debug!("dispatch table: {} at line {}", point.key, at + 1);

    Ok(Patched {
        content: doc.render(),
        insertions: vec![point],
    })
}
