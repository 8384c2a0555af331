//! detype CLI
//!
//! Transpiles TypeScript files and directory trees to JavaScript.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use detype::driver::{self, DriverOptions};
use detype::tsconfig::TsConfig;
use detype::{JsTarget, ModuleKind, RemovalMode, TranspileOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "detype")]
#[command(author, version, about = "Strip TypeScript down to JavaScript by editing the source in place", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Files or directories to transpile
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Write output under this directory, mirroring the input tree
    #[arg(short, long = "out-dir", value_name = "OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Remove the output directory before writing
    #[arg(long)]
    clean: bool,

    /// Keep removed type syntax as comments
    #[arg(long)]
    preserve: bool,

    /// Target JavaScript version of synthetic code (ES5 ... ESNext)
    #[arg(long, value_name = "TARGET")]
    target: Option<JsTarget>,

    /// Module syntax of the output (commonjs or esnext)
    #[arg(long, value_name = "KIND")]
    module: Option<ModuleKind>,

    /// Read options from a tsconfig.json
    #[arg(short, long, value_name = "TSCONFIG")]
    project: Option<PathBuf>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and bind only, printing syntax diagnostics
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match &cli.command {
        Some(Commands::Check { inputs }) => run_check(inputs),
        None => run_transpile(&cli),
    };
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings, or more with `-v`
fn setup_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_transpile(cli: &Cli) -> anyhow::Result<bool> {
    let mut options = TranspileOptions::default();
    let mut out_dir = None;
    let mut inputs = cli.inputs.clone();

    if let Some(project) = &cli.project {
        let config = TsConfig::load_file(project)
            .with_context(|| format!("failed to load {}", project.display()))?;
        for warning in config.validate() {
            tracing::warn!(config = %project.display(), "{}", warning);
        }
        options = config
            .to_transpile_options()
            .with_context(|| format!("invalid options in {}", project.display()))?;
        out_dir = config.out_dir();
        if inputs.is_empty() {
            inputs.push(config.base_dir.clone().unwrap_or_else(|| PathBuf::from(".")));
        }
    }
    if inputs.is_empty() {
        bail!("no input files; pass files or directories, or --project");
    }

    if let Some(target) = cli.target {
        options.target = target;
    }
    if let Some(module) = cli.module {
        options.module = module;
    }
    if cli.preserve {
        options.removal_mode = RemovalMode::Preserve;
    }
    if cli.out_dir.is_some() {
        out_dir = cli.out_dir.clone();
    }
    if cli.clean && out_dir.is_none() {
        bail!("--clean needs an output directory");
    }

    let driver_options = DriverOptions {
        inputs,
        out_dir,
        clean: cli.clean,
        transpile: options,
    };
    let summary = driver::run(&driver_options).context("transpilation failed")?;

    for (path, error) in &summary.failed {
        eprintln!("{}: {}", path.display(), error);
    }
    tracing::info!(
        written = summary.written.len(),
        failed = summary.failed.len(),
        "done"
    );
    if cli.verbose > 0 {
        eprintln!(
            "{} file(s) written, {} failed",
            summary.written.len(),
            summary.failed.len()
        );
    }
    Ok(summary.is_success())
}

fn run_check(inputs: &[PathBuf]) -> anyhow::Result<bool> {
    let results = driver::check(inputs).context("check failed")?;
    let mut clean = true;
    for (path, result) in results {
        match result {
            Ok(diagnostics) if diagnostics.is_empty() => {
                tracing::debug!(path = %path.display(), "ok");
            }
            Ok(diagnostics) => {
                clean = false;
                for diagnostic in diagnostics {
                    println!("{}: {}", path.display(), diagnostic);
                }
            }
            Err(e) => {
                clean = false;
                println!("{}: {}", path.display(), e);
            }
        }
    }
    Ok(clean)
}
