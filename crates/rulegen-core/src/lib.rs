//! Core types for rulegen, the rule-scaffolding generator.
//!
//! Provides the rule identity model ([`identity::RuleIdentity`]), the typed error
//! taxonomy ([`error::ScaffoldError`]), configuration loading from
//! `.rulegen/config.toml`, placeholder templates, and project-relative storage
//! helpers with atomic writes.

pub mod config;
pub mod error;
pub mod identity;
pub mod storage;
pub mod template_vars;

pub use config::{CategoryCatalogue, CategorySpec, RulegenConfig};
pub use error::ScaffoldError;
pub use identity::{RuleIdentity, RuleKind};
