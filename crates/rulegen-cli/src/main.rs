//! CLI binary for rulegen: scaffold a new lint rule into every registry file it belongs in.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rulegen_core::config::RulegenConfig;
use rulegen_core::identity::{RuleIdentity, RuleKind};
use rulegen_core::{ScaffoldError, storage};
use rulegen_gen::{ScaffoldFailure, ScaffoldOptions, ScaffoldReport, scaffold};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rulegen", about = "Scaffold new rules into a linter's rule registry")]
struct Cli {
    /// Project root directory (defaults to the nearest workspace above the current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the boilerplate for a new rule
    AddRule {
        /// Rule name in PascalCase (e.g. PreferListBuiltin)
        #[arg(long)]
        name: String,

        /// Code prefix of the rule's category (e.g. C)
        #[arg(long)]
        prefix: String,

        /// Rule code within the prefix (e.g. 807)
        #[arg(long)]
        code: String,

        /// Category to add the rule to (e.g. correctness)
        #[arg(long)]
        category: String,

        /// Rule kind: ast, text, path
        #[arg(long, default_value = "ast", value_parser = parse_kind)]
        kind: RuleKind,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Skip running the formatter on touched files
        #[arg(long)]
        no_format: bool,

        /// Do not create the empty test fixture
        #[arg(long)]
        no_fixture: bool,

        /// Print the report as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// List the configured categories
    Categories,
}

fn parse_kind(value: &str) -> Result<RuleKind, String> {
    RuleKind::from_name(value)
        .ok_or_else(|| format!("unknown rule kind '{value}' (expected ast, text or path)"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let project_root = storage::resolve_project_root(cli.project.as_deref())?;

    match cli.command {
        Commands::AddRule {
            name,
            prefix,
            code,
            category,
            kind,
            dry_run,
            no_format,
            no_fixture,
            json,
        } => {
            let options = ScaffoldOptions {
                kind,
                dry_run,
                create_fixture: !no_fixture,
                run_formatter: !no_format,
            };
            cmd_add_rule(
                &project_root,
                &name,
                &prefix,
                &code,
                &category,
                &options,
                json,
            )
        }
        Commands::Categories => cmd_categories(&project_root),
    }
}

/// Exit status for a failed run: typed scaffold errors get their own code, anything else is 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(failure) = err.downcast_ref::<ScaffoldFailure>() {
        return failure.exit_code();
    }
    if let Some(error) = err.downcast_ref::<ScaffoldError>() {
        return error.exit_code();
    }
    1
}

fn cmd_add_rule(
    project_root: &Path,
    name: &str,
    prefix: &str,
    code: &str,
    category: &str,
    options: &ScaffoldOptions,
    json: bool,
) -> Result<()> {
    let config = RulegenConfig::load(project_root)?;
    let identity = RuleIdentity::new(name, prefix, code, category, &config.categories)?;

    if !json {
        eprintln!(
            "Adding {} ({}) to {}...",
            identity.display_name(),
            identity.file_stem(),
            identity.category()
        );
    }

    let report = match scaffold(project_root, &config, &identity, options) {
        Ok(report) => report,
        Err(failure) => {
            if !failure.mutated.is_empty() {
                eprintln!("Files already written before the failure:");
                for path in &failure.mutated {
                    eprintln!("  {}", relative(project_root, path).display());
                }
            }
            return Err(failure.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(project_root, &report);
    }
    Ok(())
}

fn print_summary(project_root: &Path, report: &ScaffoldReport) {
    let (create, modify) = if report.dry_run {
        ("Would create", "Would modify")
    } else {
        ("Created", "Modified")
    };
    for path in &report.created {
        eprintln!("  {create}: {}", relative(project_root, path).display());
    }
    for path in &report.modified {
        eprintln!("  {modify}: {}", relative(project_root, path).display());
    }
    for insertion in &report.insertions {
        eprintln!(
            "    {}:{}  {}",
            relative(project_root, &insertion.path).display(),
            insertion.line_number(),
            insertion.point.text.trim()
        );
    }
    if report.dry_run {
        eprintln!("Dry run: nothing was written.");
    } else {
        eprintln!(
            "Done: {} {} ({}){}",
            report.rule,
            report.code,
            report.kind,
            if report.formatted { ", formatted" } else { "" }
        );
    }
}

fn cmd_categories(project_root: &Path) -> Result<()> {
    let config = RulegenConfig::load(project_root)?;
    println!("{:<20} {:<20} VARIANT", "CATEGORY", "DIRECTORY");
    for (name, spec) in config.categories.iter() {
        println!(
            "{:<20} {:<20} {}",
            name,
            spec.dir_for(name),
            spec.variant_for(name)
        );
    }
    Ok(())
}

fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}
