//! Scaffolding a rule end to end.
//!
//! A run is staged: the stub is rendered and every registry file is read and
//! patched in memory first. Only when all patches succeed is anything written,
//! in this order: fixture, stub, module index, test registration, dispatch
//! table. Roles that share a file are patched one after another on the same
//! in-memory text and the file is written once.

use crate::dispatch_table::patch_dispatch_table;
use crate::format::{format_files, rust_sources};
use crate::module_index::patch_module_index;
use crate::region::{InsertionPoint, Patched};
use crate::template::render_stub;
use crate::test_registration::patch_test_registration;
use rulegen_core::ScaffoldError;
use rulegen_core::config::{RegistryConfig, RulegenConfig};
use rulegen_core::identity::{RuleIdentity, RuleKind};
use rulegen_core::storage::{self, RulePaths};
use rulegen_core::template_vars::TemplateVars;
use serde::Serialize;
use std::path::{Path, PathBuf};

type Patcher = fn(&str, &TemplateVars<'_>, &RegistryConfig) -> Result<Patched, ScaffoldError>;

/// A stage of a scaffold run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Fixture,
    Stub,
    ModuleIndex,
    TestRegistration,
    DispatchTable,
    Format,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixture => write!(f, "fixture"),
            Self::Stub => write!(f, "stub"),
            Self::ModuleIndex => write!(f, "module index"),
            Self::TestRegistration => write!(f, "test registration"),
            Self::DispatchTable => write!(f, "dispatch table"),
            Self::Format => write!(f, "format"),
        }
    }
}

/// Switches for one run.
#[derive(Debug, Clone)]
pub struct ScaffoldOptions {
    pub kind: RuleKind,
    /// Compute everything, write nothing.
    pub dry_run: bool,
    pub create_fixture: bool,
    pub run_formatter: bool,
}

impl Default for ScaffoldOptions {
    fn default() -> Self {
        Self {
            kind: RuleKind::Ast,
            dry_run: false,
            create_fixture: true,
            run_formatter: true,
        }
    }
}

/// A line added to a registry file.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedInsertion {
    pub path: PathBuf,
    #[serde(flatten)]
    pub point: InsertionPoint,
}

impl PlannedInsertion {
    /// One-based line number, as editors show it.
    pub fn line_number(&self) -> usize {
        self.point.line_index + 1
    }
}

/// What a run created, changed, or (for a dry run) would have.
#[derive(Debug, Clone, Serialize)]
pub struct ScaffoldReport {
    pub rule: String,
    pub code: String,
    pub category: String,
    pub kind: RuleKind,
    pub dry_run: bool,
    pub created: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub insertions: Vec<PlannedInsertion>,
    pub formatted: bool,
}

/// A failed run: the step that failed and every file already written.
///
/// Files listed in `mutated` are left as they are.
#[derive(Debug, thiserror::Error)]
#[error("{step} step failed")]
pub struct ScaffoldFailure {
    pub step: Step,
    pub mutated: Vec<PathBuf>,
    #[source]
    pub source: ScaffoldError,
}

impl ScaffoldFailure {
    fn at(step: Step, mutated: &[PathBuf]) -> impl FnOnce(ScaffoldError) -> Self + '_ {
        move |source| Self {
            step,
            mutated: mutated.to_vec(),
            source,
        }
    }

    pub const fn exit_code(&self) -> u8 {
        self.source.exit_code()
    }
}

/// A registry file after all of its roles were patched in memory.
#[derive(Debug)]
struct StagedFile {
    path: PathBuf,
    /// First role that touched the file; its step is blamed for write failures.
    step: Step,
    content: String,
}

#[derive(Debug)]
struct Plan {
    paths: RulePaths,
    stub: String,
    fixture_missing: bool,
    files: Vec<StagedFile>,
    insertions: Vec<PlannedInsertion>,
}

/// Add the rule described by `identity` to the project at `project_root`.
pub fn scaffold(
    project_root: &Path,
    config: &RulegenConfig,
    identity: &RuleIdentity,
    options: &ScaffoldOptions,
) -> Result<ScaffoldReport, ScaffoldFailure> {
    let vars = TemplateVars::new(identity, options.kind, &config.layout.fixture_extension);
    let plan = stage(project_root, config, &vars, options)?;

    let mut report = ScaffoldReport {
        rule: identity.display_name().to_string(),
        code: identity.file_stem(),
        category: identity.category().to_string(),
        kind: options.kind,
        dry_run: options.dry_run,
        created: Vec::new(),
        modified: Vec::new(),
        insertions: plan.insertions,
        formatted: false,
    };

    if options.dry_run {
        if plan.fixture_missing {
            report.created.push(plan.paths.fixture.clone());
        }
        report.created.push(plan.paths.stub.clone());
        report.modified = plan.files.iter().map(|f| f.path.clone()).collect();
        return Ok(report);
    }

    let mut mutated: Vec<PathBuf> = Vec::new();

    if options.create_fixture {
        let created = storage::touch(&plan.paths.fixture)
            .map_err(ScaffoldFailure::at(Step::Fixture, &mutated))?;
        if created {
            tracing::info!("created fixture {}", plan.paths.fixture.display());
            mutated.push(plan.paths.fixture.clone());
            report.created.push(plan.paths.fixture.clone());
        }
    }

    storage::create_new(&plan.paths.stub, &plan.stub)
        .map_err(ScaffoldFailure::at(Step::Stub, &mutated))?;
    tracing::info!("created stub {}", plan.paths.stub.display());
    mutated.push(plan.paths.stub.clone());
    report.created.push(plan.paths.stub.clone());

    for file in &plan.files {
        storage::write_atomic(&file.path, &file.content)
            .map_err(ScaffoldFailure::at(file.step, &mutated))?;
        tracing::info!("updated {}", file.path.display());
        mutated.push(file.path.clone());
        report.modified.push(file.path.clone());
    }

    if options.run_formatter && config.formatter.enabled {
        let touched = rust_sources(report.created.iter().chain(&report.modified));
        match format_files(&config.formatter, project_root, &touched) {
            Ok(()) => report.formatted = true,
            Err(e) => {
                let step = Step::Format;
                tracing::warn!("{step} step failed, files were left unformatted: {e}");
            }
        }
    }

    Ok(report)
}

/// Render and patch everything in memory. Reads files but never writes.
fn stage(
    project_root: &Path,
    config: &RulegenConfig,
    vars: &TemplateVars<'_>,
    options: &ScaffoldOptions,
) -> Result<Plan, ScaffoldFailure> {
    let paths = RulePaths::new(project_root, &config.layout, vars.identity());

    let stub = render_stub(vars).map_err(ScaffoldFailure::at(Step::Stub, &[]))?;
    if paths.stub.exists() {
        let exists = ScaffoldError::FileAlreadyExists(paths.stub.clone());
        return Err(ScaffoldFailure::at(Step::Stub, &[])(exists));
    }

    let patchers: [(Step, &Path, Patcher); 3] = [
        (
            Step::ModuleIndex,
            paths.module_index.as_path(),
            patch_module_index,
        ),
        (
            Step::TestRegistration,
            paths.test_registration.as_path(),
            patch_test_registration,
        ),
        (
            Step::DispatchTable,
            paths.dispatch_table.as_path(),
            patch_dispatch_table,
        ),
    ];

    let mut files: Vec<StagedFile> = Vec::new();
    let mut insertions: Vec<PlannedInsertion> = Vec::new();
    for (step, path, patcher) in patchers {
        let index = match files.iter().position(|f| f.path == path) {
            Some(index) => index,
            None => {
                let content = storage::read_text(path).map_err(ScaffoldFailure::at(step, &[]))?;
                files.push(StagedFile {
                    path: path.to_path_buf(),
                    step,
                    content,
                });
                files.len() - 1
            }
        };

        let patched = patcher(&files[index].content, vars, &config.registry)
            .map_err(ScaffoldFailure::at(step, &[]))?;
        for point in patched.insertions {
            for earlier in insertions.iter_mut().filter(|i| i.path == path) {
                if earlier.point.line_index >= point.line_index {
                    earlier.point.line_index += 1;
                }
            }
            insertions.push(PlannedInsertion {
                path: path.to_path_buf(),
                point,
            });
        }
        files[index].content = patched.content;
    }

    Ok(Plan {
        fixture_missing: options.create_fixture && !paths.fixture.exists(),
        paths,
        stub,
        files,
        insertions,
    })
}
