//! handc - The HAND compiler CLI.
//!
//! Single entry point: compile one source file to the selected target,
//! writing the artifact and `build_report.json` into the output
//! directory. Exit codes: 0 success, 2 diagnostics or capability
//! failure, 3 backend-unsupported subset, 4 internal error.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use handc_drv::{build, CompileOptions};
use handc_gen::Target;
use handc_ir::Capability;

/// The HAND compiler.
#[derive(Parser, Debug)]
#[command(name = "handc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile HAND source to python, wasm, sql or html", long_about = None)]
struct Cli {
    /// Path to the source file
    input: PathBuf,

    /// Compilation target
    #[arg(long, value_parser = parse_target)]
    target: Target,

    /// Output directory
    #[arg(long, default_value = "dist")]
    out: PathBuf,

    /// Supervision level (1..4)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=4))]
    level: u8,

    /// Capability approvals (repeatable), e.g. --approve io.read
    #[arg(long = "approve", value_parser = parse_capability)]
    approvals: Vec<Capability>,

    /// Write the canonical IR to <out>/ir.json
    #[arg(long)]
    emit_ir: bool,

    /// Write the AST dump to <out>/ast.json
    #[arg(long)]
    emit_ast: bool,

    /// Print diagnostics as JSON on stdout
    #[arg(long)]
    json_diagnostics: bool,

    /// Enable verbose logging
    #[arg(short, long, env = "HANDC_VERBOSE")]
    verbose: bool,
}

fn parse_target(name: &str) -> Result<Target, String> {
    Target::parse(name)
        .ok_or_else(|| format!("unknown target '{name}' (expected python, wasm, sql or html)"))
}

fn parse_capability(name: &str) -> Result<Capability, String> {
    Capability::parse(name).ok_or_else(|| format!("unknown capability '{name}'"))
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("handc: {err:#}");
            ExitCode::from(4)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    init_logging(cli.verbose);

    let options = CompileOptions {
        target: cli.target,
        out_dir: cli.out,
        level: cli.level,
        approvals: cli.approvals.iter().copied().collect::<BTreeSet<_>>(),
        emit_ir: cli.emit_ir,
        emit_ast: cli.emit_ast,
    };

    let outcome = build(&cli.input, &options);

    if cli.json_diagnostics {
        let text = serde_json::to_string_pretty(&outcome.report.diagnostics)?;
        println!("{text}");
    } else {
        for diag in &outcome.report.diagnostics {
            let location = diag
                .span
                .as_ref()
                .map(|s| format!(" at {}:{}:{}", s.file, s.line, s.col))
                .unwrap_or_default();
            eprintln!("{}: {} [{}]{}", diag.severity, diag.message, diag.code, location);
            if let Some(hint) = &diag.hint {
                eprintln!("  hint: {hint}");
            }
        }
    }

    Ok(ExitCode::from(outcome.exit_code as u8))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}
