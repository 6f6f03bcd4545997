//! `{placeholder}` substitution for the line templates kept in configuration.
//!
//! Templates use `{name}` placeholders and `{{` / `}}` for literal braces.

use crate::identity::{RuleIdentity, RuleKind};
use std::borrow::Cow;

/// Every placeholder a registry template may reference.
pub const PLACEHOLDERS: &[&str] = &[
    "name",
    "snake",
    "prefix",
    "code",
    "file_stem",
    "ext",
    "category",
    "dir",
    "module",
    "variant",
    "kind",
];

/// Error from parsing a template string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown placeholder `{{{0}}}`")]
    UnknownPlaceholder(String),
    #[error("unclosed `{{` at byte {0}")]
    Unclosed(usize),
    #[error("unmatched `}}` at byte {0}")]
    Unmatched(usize),
}

enum Piece<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

fn parse(template: &str) -> Result<Vec<Piece<'_>>, TemplateError> {
    let mut pieces = Vec::new();
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                pieces.push(Piece::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                pieces.push(Piece::Literal(&template[literal_start..=i]));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                let close = template[i..]
                    .find('}')
                    .map(|offset| i + offset)
                    .ok_or(TemplateError::Unclosed(i))?;
                pieces.push(Piece::Literal(&template[literal_start..i]));
                pieces.push(Piece::Placeholder(&template[i + 1..close]));
                i = close + 1;
                literal_start = i;
            }
            b'}' => return Err(TemplateError::Unmatched(i)),
            _ => i += 1,
        }
    }
    pieces.push(Piece::Literal(&template[literal_start..]));
    Ok(pieces)
}

/// Check that a template is well formed and only uses known placeholders.
pub fn validate(template: &str) -> Result<(), TemplateError> {
    for piece in parse(template)? {
        if let Piece::Placeholder(name) = piece
            && !PLACEHOLDERS.contains(&name)
        {
            return Err(TemplateError::UnknownPlaceholder(name.to_string()));
        }
    }
    Ok(())
}

/// Text preceding the first placeholder, e.g. `#[test_case(` for an annotation template.
pub fn literal_prefix(template: &str) -> String {
    let Ok(pieces) = parse(template) else {
        return String::new();
    };
    let mut prefix = String::new();
    for piece in pieces {
        match piece {
            Piece::Literal(text) => prefix.push_str(text),
            Piece::Placeholder(_) => break,
        }
    }
    prefix
}

/// Values bound to each placeholder for one rule.
#[derive(Debug, Clone)]
pub struct TemplateVars<'a> {
    identity: &'a RuleIdentity,
    kind: RuleKind,
    ext: &'a str,
}

impl<'a> TemplateVars<'a> {
    pub fn new(identity: &'a RuleIdentity, kind: RuleKind, ext: &'a str) -> Self {
        Self {
            identity,
            kind,
            ext,
        }
    }

    pub fn identity(&self) -> &'a RuleIdentity {
        self.identity
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    fn lookup(&self, name: &str) -> Option<Cow<'a, str>> {
        let id = self.identity;
        Some(match name {
            "name" => Cow::Borrowed(id.display_name()),
            "snake" => Cow::Borrowed(id.snake_name()),
            "prefix" => Cow::Borrowed(id.prefix()),
            "code" => Cow::Borrowed(id.code()),
            "file_stem" => Cow::Owned(id.file_stem()),
            "ext" => Cow::Borrowed(self.ext),
            "category" => Cow::Borrowed(id.category()),
            "dir" => Cow::Borrowed(id.category_dir()),
            "module" => Cow::Owned(id.category_module()),
            "variant" => Cow::Borrowed(id.category_variant()),
            "kind" => Cow::Borrowed(self.kind.variant_name()),
            _ => return None,
        })
    }

    /// Substitute every placeholder in `template`.
    ///
    /// Templates are validated when configuration loads; an unknown
    /// placeholder reaching this point is still reported rather than dropped.
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len() + 32);
        for piece in parse(template)? {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Placeholder(name) => {
                    let value = self
                        .lookup(name)
                        .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}
