//! # rulegen-gen
//!
//! The registry-patching engine behind `rulegen add-rule`.
//!
//! Adding a rule touches several files that must stay consistent:
//!
//! - **Stub**: a new implementation file rendered from a per-kind template
//! - **Module index**: the category's `mod` declarations
//! - **Test registration**: the `#[test_case(...)]` list above the snapshot test
//! - **Dispatch table**: the `(category, code)` → rule mapping
//!
//! Each patcher is a pure function from file text to file text that adds one
//! line to one ordered region. Everything outside that region is left alone.
//! The [`scaffold`] module stages all of them in memory before writing anything.

pub mod dispatch_table;
pub mod format;
pub mod module_index;
pub mod region;
pub mod scaffold;
pub mod template;
pub mod test_registration;

// Re-export main types for convenience
pub use dispatch_table::patch_dispatch_table;
pub use module_index::patch_module_index;
pub use region::{InsertionPoint, Patched, RegistryRole, SortOrder};
pub use scaffold::{
    PlannedInsertion, ScaffoldFailure, ScaffoldOptions, ScaffoldReport, Step, scaffold,
};
pub use template::render_stub;
pub use test_registration::patch_test_registration;
