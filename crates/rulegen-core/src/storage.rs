//! Project-root discovery, registry path layout, and file writes.
//!
//! Rewrites go through a temporary file in the destination directory followed
//! by a rename, so other processes never observe a half-written registry file.

use crate::config::{LayoutConfig, config_path};
use crate::error::ScaffoldError;
use crate::identity::RuleIdentity;
use anyhow::{Context, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Environment variable that pins the project root.
pub const PROJECT_ROOT_ENV: &str = "RULEGEN_PROJECT_ROOT";

/// Find the project root: the nearest ancestor of `start` holding a
/// `.rulegen/config.toml` or a `Cargo.toml` that declares `[workspace]`.
pub fn find_project_root(start: &Path) -> Result<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if config_path(&dir).exists() {
            return Ok(dir);
        }
        let manifest = dir.join("Cargo.toml");
        if manifest.exists()
            && let Ok(contents) = fs::read_to_string(&manifest)
            && contents.lines().any(|line| line.trim() == "[workspace]")
        {
            return Ok(dir);
        }
        if !dir.pop() {
            anyhow::bail!(
                "could not find a project root above {} \
                 (no .rulegen/config.toml or workspace Cargo.toml)",
                start.display()
            );
        }
    }
}

/// Resolve the project root from an explicit flag, then the environment, then discovery.
pub fn resolve_project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(PROJECT_ROOT_ENV) {
        return Ok(PathBuf::from(path));
    }
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    find_project_root(&cwd)
}

/// Absolute paths of every file a rule touches.
#[derive(Debug, Clone)]
pub struct RulePaths {
    pub fixture: PathBuf,
    pub stub: PathBuf,
    pub module_index: PathBuf,
    pub test_registration: PathBuf,
    pub dispatch_table: PathBuf,
}

impl RulePaths {
    pub fn new(project_root: &Path, layout: &LayoutConfig, identity: &RuleIdentity) -> Self {
        let linter = project_root.join(&layout.linter_dir);
        let category_dir = linter.join(&layout.rules_dir).join(identity.category_dir());
        Self {
            fixture: linter
                .join(&layout.fixtures_dir)
                .join(identity.category_dir())
                .join(format!("{}.{}", identity.file_stem(), layout.fixture_extension)),
            stub: category_dir.join(format!("{}.rs", identity.snake_name())),
            module_index: category_dir.join(&layout.module_index),
            test_registration: category_dir.join(&layout.test_registration),
            dispatch_table: linter.join(&layout.dispatch_table),
        }
    }
}

/// Read a registry file in full.
pub fn read_text(path: &Path) -> Result<String, ScaffoldError> {
    fs::read_to_string(path).map_err(|e| ScaffoldError::io(path, e))
}

/// Replace `path` with `content` atomically.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ScaffoldError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ScaffoldError::io(path, e))?;
    tmp.write_all(content.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| ScaffoldError::io(path, e))?;
    if let Ok(meta) = fs::metadata(path) {
        // Keep the original permissions; a fresh temp file is 0600 on unix.
        if let Err(e) = fs::set_permissions(tmp.path(), meta.permissions()) {
            tracing::warn!("could not keep permissions of {}: {e}", path.display());
        }
    }
    tmp.persist(path)
        .map_err(|e| ScaffoldError::io(path, e.error))?;
    tracing::debug!("rewrote {} ({} bytes)", path.display(), content.len());
    Ok(())
}

/// Create a new file with `content`, failing with
/// [`ScaffoldError::FileAlreadyExists`] if anything occupies the path.
pub fn create_new(path: &Path, content: &str) -> Result<(), ScaffoldError> {
    ensure_parent(path)?;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => ScaffoldError::FileAlreadyExists(path.to_path_buf()),
            _ => ScaffoldError::io(path, e),
        })?;
    file.write_all(content.as_bytes())
        .map_err(|e| ScaffoldError::io(path, e))?;
    tracing::debug!("created {}", path.display());
    Ok(())
}

/// Make sure an (empty) file exists at `path`. Returns true if it was created.
pub fn touch(path: &Path) -> Result<bool, ScaffoldError> {
    if path.exists() {
        return Ok(false);
    }
    ensure_parent(path)?;
    fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| ScaffoldError::io(path, e))?;
    Ok(true)
}

fn ensure_parent(path: &Path) -> Result<(), ScaffoldError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ScaffoldError::io(parent, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryCatalogue;
    use tempfile::TempDir;

    #[test]
    fn test_rule_paths_follow_layout() {
        let catalogue = CategoryCatalogue::default();
        let id =
            RuleIdentity::new("PreferListBuiltin", "C", "807", "correctness", &catalogue).unwrap();
        let paths = RulePaths::new(Path::new("/repo"), &LayoutConfig::default(), &id);
        let rules = Path::new("/repo/crates/fortitude_linter/src/rules");
        assert_eq!(paths.stub, rules.join("correctness/prefer_list_builtin.rs"));
        assert_eq!(paths.module_index, rules.join("correctness/mod.rs"));
        assert_eq!(paths.test_registration, paths.module_index);
        assert_eq!(paths.dispatch_table, rules.join("mod.rs"));
        assert_eq!(
            paths.fixture,
            Path::new("/repo/crates/fortitude_linter/resources/test/fixtures/correctness/C807.f90")
        );
    }

    #[test]
    fn test_find_project_root_walks_up_to_workspace() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[workspace]\nmembers = []\n").unwrap();
        let nested = tmp.path().join("crates/linter/src");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            tmp.path().join("crates/linter/Cargo.toml"),
            "[package]\nname = \"x\"\n",
        )
        .unwrap();

        assert_eq!(find_project_root(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn test_find_project_root_prefers_config_dir() {
        let tmp = TempDir::new().unwrap();
        let inner = tmp.path().join("inner");
        fs::create_dir_all(inner.join(".rulegen")).unwrap();
        fs::write(inner.join(".rulegen/config.toml"), "").unwrap();
        fs::write(tmp.path().join("Cargo.toml"), "[workspace]\n").unwrap();

        assert_eq!(find_project_root(&inner).unwrap(), inner);
    }

    #[test]
    fn test_explicit_root_wins() {
        let root = resolve_project_root(Some(Path::new("/somewhere"))).unwrap();
        assert_eq!(root, PathBuf::from("/somewhere"));
    }

    #[test]
    fn test_create_new_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/rule.rs");
        create_new(&path, "first").unwrap();
        let err = create_new(&path, "second").unwrap_err();
        assert!(matches!(err, ScaffoldError::FileAlreadyExists(p) if p == path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mod.rs");
        fs::write(&path, "old\n").unwrap();
        write_atomic(&path, "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        // No temp files left behind
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mod.rs");
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        write_atomic(&path, "new\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_touch_keeps_existing_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fixtures/style/S001.f90");
        assert!(touch(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        fs::write(&path, "program p\nend program p\n").unwrap();
        assert!(!touch(&path).unwrap());
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "program p\nend program p\n"
        );
    }

    #[test]
    fn test_read_text_missing_is_io_failure() {
        let tmp = TempDir::new().unwrap();
        let err = read_text(&tmp.path().join("missing.rs")).unwrap_err();
        assert!(matches!(err, ScaffoldError::Io { .. }));
    }
}
