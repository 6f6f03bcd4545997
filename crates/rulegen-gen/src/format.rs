//! External formatter run over the files a scaffold touched.

use rulegen_core::config::FormatterConfig;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Why the formatter did not succeed. Never fatal to a scaffold.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("formatter command is empty")]
    NoCommand,
    #[error("failed to execute formatter '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("formatter '{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Only Rust sources are handed to the formatter.
pub fn rust_sources<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "rs"))
        .cloned()
        .collect()
}

/// Run the configured formatter once with every file appended to its arguments.
pub fn format_files(
    config: &FormatterConfig,
    working_dir: &Path,
    files: &[PathBuf],
) -> Result<(), FormatError> {
    if files.is_empty() {
        return Ok(());
    }
    let (program, args) = config.command.split_first().ok_or(FormatError::NoCommand)?;

    let output = Command::new(program)
        .args(args)
        .args(files)
        .current_dir(working_dir)
        .output()
        .map_err(|source| FormatError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(FormatError::Failed {
            program: program.clone(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    tracing::debug!("{program} formatted {} file(s)", files.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(parts: &[&str]) -> FormatterConfig {
        FormatterConfig {
            enabled: true,
            command: parts.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_rust_sources_filters_extensions() {
        let paths = [
            PathBuf::from("a/mod.rs"),
            PathBuf::from("fixtures/C001.f90"),
            PathBuf::from("b/rule.rs"),
        ];
        assert_eq!(
            rust_sources(&paths),
            vec![PathBuf::from("a/mod.rs"), PathBuf::from("b/rule.rs")]
        );
    }

    #[test]
    fn test_no_files_is_a_no_op() {
        let config = command(&["definitely-not-a-formatter-xyz"]);
        assert!(format_files(&config, Path::new("."), &[]).is_ok());
    }

    #[test]
    fn test_empty_command() {
        let config = command(&[]);
        let err = format_files(&config, Path::new("."), &[PathBuf::from("a.rs")]).unwrap_err();
        assert!(matches!(err, FormatError::NoCommand));
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let config = command(&["definitely-not-a-formatter-xyz"]);
        let err = format_files(&config, Path::new("."), &[PathBuf::from("a.rs")]).unwrap_err();
        assert!(matches!(err, FormatError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_reports_status() {
        let config = command(&["false"]);
        let err = format_files(&config, Path::new("."), &[PathBuf::from("a.rs")]).unwrap_err();
        assert!(matches!(err, FormatError::Failed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_successful_program() {
        let config = command(&["true", "--ignored"]);
        format_files(&config, Path::new("."), &[PathBuf::from("a.rs")]).unwrap();
    }
}
