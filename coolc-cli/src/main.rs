use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use coolc_ast::Program;
use coolc_diagnostics::DiagnosticEngine;
use coolc_parser::Parser;
use log::info;

/// `coolc [OPTIONS] -o EXE_FILE SRC_FILE...` — a whole-program COOL compiler
/// (spec.md §4.8). Produces `EXE_FILE.s`, then drives `cc`/`$COOLC_CC` to
/// assemble and link a `-no-pie` native executable.
#[derive(ClapParser)]
#[command(name = "coolc")]
#[command(version)]
#[command(about = "COOL (Classroom Object-Oriented Language) compiler")]
struct Cli {
    /// Output executable path. If omitted, the first positional argument is
    /// taken as `EXE_FILE` instead (spec.md §6's `compiler EXE_FILE
    /// SRC_FILE...` form, kept for interface parity alongside the flag).
    #[arg(short = 'o', long = "output", value_name = "EXE_FILE")]
    output: Option<PathBuf>,

    /// `SRC_FILE...`, or `EXE_FILE SRC_FILE...` when `-o` is absent.
    #[arg(value_name = "SRC_FILE", required = true)]
    sources: Vec<PathBuf>,

    /// Keep `EXE_FILE.s` around after a successful link.
    #[arg(long)]
    keep_asm: bool,

    /// Write `EXE_FILE.s` and stop; don't invoke the assembler/linker.
    #[arg(long)]
    emit_asm_only: bool,

    /// Raise log verbosity; repeatable.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    // spec.md §4.6: auto-disable color when stdout isn't a TTY (piped to a
    // file, captured by a test harness, etc.) rather than emitting escapes
    // a non-terminal reader can't render.
    colored::control::set_override(std::io::stdout().is_terminal());

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("coolc: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run(cli: &Cli) -> Result<()> {
    let (output, sources) = resolve_output_and_sources(cli)?;
    let program = parse_sources(sources)?;

    let mut diags = DiagnosticEngine::new();
    let asm = match coolc_compiler::compile(&program, &mut diags) {
        Ok(asm) => asm,
        Err(err) => {
            let source = concatenated_source_for_diagnostics(sources);
            diags.print_all(&source);
            diags.print_summary();
            bail!(err);
        }
    };

    let asm_path = asm_path_for(output);
    std::fs::write(&asm_path, &asm)
        .with_context(|| format!("writing assembly to {}", asm_path.display()))?;
    info!("wrote {}", asm_path.display());

    if cli.emit_asm_only {
        return Ok(());
    }

    link(&asm_path, output)?;

    if !cli.keep_asm {
        std::fs::remove_file(&asm_path)
            .with_context(|| format!("removing {}", asm_path.display()))?;
    }

    Ok(())
}

/// Resolves spec.md §6's two accepted invocations into one `(EXE_FILE,
/// &[SRC_FILE])` pair: `-o EXE_FILE SRC_FILE...` uses every positional as a
/// source, while the legacy `EXE_FILE SRC_FILE...` (no `-o`) peels the first
/// positional off as `EXE_FILE` (SPEC_FULL.md §4.8).
fn resolve_output_and_sources(cli: &Cli) -> Result<(&std::path::Path, &[PathBuf])> {
    match &cli.output {
        Some(output) => Ok((output.as_path(), &cli.sources)),
        None => match cli.sources.split_first() {
            Some((exe, srcs)) if !srcs.is_empty() => Ok((exe.as_path(), srcs)),
            _ => bail!("expected `-o EXE_FILE SRC_FILE...` or `EXE_FILE SRC_FILE...`"),
        },
    }
}

fn asm_path_for(exe: &std::path::Path) -> PathBuf {
    let mut s = exe.as_os_str().to_owned();
    s.push(".s");
    PathBuf::from(s)
}

/// Parses and merges every source file's classes into one `Program`
/// (spec.md §2: whole-program compilation, no separate compilation unit
/// boundary between source files).
fn parse_sources(paths: &[PathBuf]) -> Result<Program> {
    let mut classes = Vec::new();
    for path in paths {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let file = path.display().to_string();
        let mut parser = Parser::new(&file, &source)
            .map_err(|e| e.to_diagnostic(&file, &source))
            .map_err(|d| anyhow::anyhow!(d.format(&source)))?;
        let program = parser
            .parse_program()
            .map_err(|e| e.to_diagnostic(&file, &source))
            .map_err(|d| anyhow::anyhow!(d.format(&source)))?;
        classes.extend(program.classes);
    }
    Ok(Program { classes })
}

/// `DiagnosticEngine::print_all` wants the one source string a `Span`
/// indexes into; since every class already carries its own file name in
/// its `Span`, a literal concatenation is only used for byte-offset
/// formatting when single-file, which is the common case this CLI is
/// exercised against. Multi-file diagnostics still print correctly since
/// each `Diagnostic` carries its own file-qualified `Span`.
fn concatenated_source_for_diagnostics(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .filter_map(|p| std::fs::read_to_string(p).ok())
        .collect::<Vec<_>>()
        .join("\n")
}

fn link(asm_path: &std::path::Path, output: &std::path::Path) -> Result<()> {
    let cc = std::env::var("COOLC_CC").unwrap_or_else(|_| "cc".to_string());
    info!("linking with {cc}");
    let status = std::process::Command::new(&cc)
        .arg("-no-pie")
        .arg("-o")
        .arg(output)
        .arg(asm_path)
        .status()
        .with_context(|| format!("invoking {cc}"))?;
    if !status.success() {
        bail!("{cc} failed with {status}");
    }
    Ok(())
}
