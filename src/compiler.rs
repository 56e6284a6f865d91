//! Compilation driver
//!
//! Finds `.fir` sources and runs one independent parse per file on a rayon
//! worker pool. Every parse gets its own arena and error list, so nothing is
//! shared between workers; reports come back in path order and each file's
//! diagnostics stay in source order.

use std::fs;
use std::path::{Path, PathBuf};

use bumpalo::Bump;
use rayon::prelude::*;
use thiserror::Error;

use crate::parser::{parse_file, ParseError};

/// Extension of Fir source files
pub const SOURCE_EXTENSION: &str = "fir";

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no .fir files found in {}", .0.display())]
    NoSources(PathBuf),
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("{}: {count} syntax error(s)", .path.display())]
    Syntax { path: PathBuf, count: usize },
}

/// Outcome of parsing one file
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub statements: usize,
    pub diagnostics: Vec<ParseError>,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Result of checking one file; a read failure affects only that file
pub type FileOutcome = Result<FileReport, CompileError>;

/// Parallel checker over a set of source files
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    /// Worker threads; rayon's default when `None`
    pub jobs: Option<usize>,
}

impl Compiler {
    pub fn new(jobs: Option<usize>) -> Self {
        Self { jobs }
    }

    /// Discover and check every source under `path`.
    pub fn check(&self, path: &Path) -> Result<Vec<FileOutcome>, CompileError> {
        let files = discover(path)?;
        self.check_files(&files)
    }

    /// Parse `files` concurrently and wait for all of them. The outcomes
    /// are in the order of `files`.
    pub fn check_files(&self, files: &[PathBuf]) -> Result<Vec<FileOutcome>, CompileError> {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.jobs {
            builder = builder.num_threads(jobs);
        }
        let pool = builder.build()?;
        Ok(pool.install(|| files.par_iter().map(|file| check_file(file)).collect()))
    }
}

/// A file is taken as given; a directory is searched recursively for
/// `.fir` files. The result is sorted.
pub fn discover(path: &Path) -> Result<Vec<PathBuf>, CompileError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    collect_sources(path, &mut files)?;
    if files.is_empty() {
        return Err(CompileError::NoSources(path.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

fn collect_sources(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CompileError> {
    let io_error = |source| CompileError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if path.is_dir() {
            collect_sources(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<Vec<u8>, CompileError> {
    fs::read(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a single file, collecting its diagnostics.
pub fn check_file(path: &Path) -> Result<FileReport, CompileError> {
    let buffer = read_source(path)?;
    let (filename, directory) = split_path(path);
    let arena = Bump::new();
    let mut diagnostics = Vec::new();
    let file = parse_file(
        &filename,
        &directory,
        &buffer,
        &arena,
        |message, location| {
            diagnostics.push(ParseError {
                message: message.to_string(),
                location,
            })
        },
    );
    Ok(FileReport {
        path: path.to_path_buf(),
        statements: file.body.len(),
        diagnostics,
    })
}

/// Canonical source text of an error-free file.
pub fn format_file(path: &Path) -> Result<String, CompileError> {
    let buffer = read_source(path)?;
    let (filename, directory) = split_path(path);
    let arena = Bump::new();
    let mut count = 0;
    let file = parse_file(&filename, &directory, &buffer, &arena, |_, _| count += 1);
    if count > 0 {
        return Err(CompileError::Syntax {
            path: path.to_path_buf(),
            count,
        });
    }
    Ok(file.to_string())
}

fn split_path(path: &Path) -> (String, String) {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let directory = path
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default();
    (filename, directory)
}
