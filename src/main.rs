// firc: front end of the Fir compiler

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use firc::compiler::{self, Compiler};

#[derive(Parser)]
#[command(name = "firc", version, about = "Fir compiler front end")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a .fir file, or every .fir file under a directory, and report syntax errors
    Build {
        path: PathBuf,
        /// Number of worker threads
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Print the canonical form of a .fir file
    Format {
        path: PathBuf,
        /// Only report whether the file is already formatted
        #[arg(long)]
        check: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Command::Build { path, jobs } => build(path, jobs),
        Command::Format { path, check } => format(path, check),
    }
}

fn build(path: PathBuf, jobs: Option<usize>) -> Result<ExitCode> {
    let files = compiler::discover(&path)?;
    eprintln!("Parsing {} file(s)...", files.len());

    let outcomes = Compiler::new(jobs).check_files(&files)?;
    let mut errors = 0;
    let mut failed = 0;
    let mut statements = 0;
    for outcome in &outcomes {
        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                eprintln!("{err}");
                errors += 1;
                failed += 1;
                continue;
            }
        };
        for diagnostic in &report.diagnostics {
            eprintln!(
                "{}:{}:{}: {}",
                report.path.display(),
                diagnostic.location.line,
                diagnostic.location.column,
                diagnostic.message
            );
        }
        if !report.is_ok() {
            errors += report.diagnostics.len();
            failed += 1;
        }
        statements += report.statements;
    }

    if errors > 0 {
        eprintln!("{errors} error(s) in {failed} file(s)");
        return Ok(ExitCode::FAILURE);
    }
    eprintln!(
        "Parsed successfully. Found {statements} top-level statements in {} file(s).",
        outcomes.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn format(path: PathBuf, check: bool) -> Result<ExitCode> {
    let formatted = compiler::format_file(&path)?;
    if !check {
        print!("{formatted}");
        return Ok(ExitCode::SUCCESS);
    }

    let original = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    if original == formatted.as_bytes() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{} is not formatted", path.display());
        Ok(ExitCode::FAILURE)
    }
}
