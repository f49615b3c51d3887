use crate::classify::{ClassifyError, Classifier};
use crate::config::PipelineConfig;
use crate::layout::{InclusionLayout, LayoutError};
use crate::mesh::region::Region;
use crate::unv::{append_groups, read_unv, UnvError};

use rayon::prelude::*;
use std::any::Any;
use std::collections::BTreeMap;
use std::fs::{read_dir, remove_file, File};
use std::io::{BufWriter, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Fatal problems for a single file. They end that file's pipeline and nothing else
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Mesh(#[from] UnvError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Unable to append groups: {0}")]
    Annotate(#[from] std::io::Error),

    #[error("Worker panicked: {0}")]
    Panic(String),
}

/// Problems that stop a whole batch from running (or from reporting)
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Unable to search {} for mesh files: {source}", .path.display())]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error("Unable to write error log {}: {source}", .path.display())]
    ErrorLog {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A file that went through the whole pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Number of Elements written to each group
    pub counts: BTreeMap<Region, usize>,
    /// Elements left out of every group
    pub issues: Vec<ClassifyError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub annotated: Vec<FileOutcome>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn num_files(&self) -> usize {
        self.annotated.len() + self.failures.len()
    }

    /// Lines of the error log: one per failed file, then one summary per annotated file that left Elements out
    ///
    /// The individual Element issues are only reported through `tracing` as they are found.
    pub fn log_lines(&self) -> Vec<String> {
        let failures = self
            .failures
            .iter()
            .map(|f| format!("Error processing {}: {}", f.path.display(), f.message));

        let incomplete = self.annotated.iter().filter_map(|outcome| {
            let first = outcome.issues.first()?;
            Some(format!(
                "Incomplete classification in {}: {} element(s) left out, first: {}",
                outcome.path.display(),
                outcome.issues.len(),
                first
            ))
        });

        failures.chain(incomplete).collect()
    }
}

/// Result of a directory search: the matching files and the directories that could not be read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    /// Sorted by path
    pub files: Vec<PathBuf>,
    pub unreadable: Vec<FileFailure>,
}

/// Every file under `root` (recursively) with the given extension
///
/// Only an unreadable `root` is an error. A nested directory that cannot be read is recorded in
/// [Discovery::unreadable] and the search goes on. Symbolic links to directories are not followed.
pub fn discover(root: impl AsRef<Path>, extension: &str) -> Result<Discovery, BatchError> {
    let root = root.as_ref();
    read_dir(root).map_err(|source| BatchError::Discovery {
        path: root.to_path_buf(),
        source,
    })?;

    Ok(walk(vec![root.to_path_buf()], extension))
}

fn walk(mut pending: Vec<PathBuf>, extension: &str) -> Discovery {
    let mut found = Discovery::default();
    let unreadable = |path: PathBuf, err: std::io::Error| {
        warn!(path = %path.display(), "skipping unreadable directory: {}", err);
        FileFailure {
            path,
            message: format!("Unable to read directory: {}", err),
        }
    };

    while let Some(dir) = pending.pop() {
        let entries = match read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                found.unreadable.push(unreadable(dir, err));
                continue;
            }
        };

        for entry in entries {
            let (path, file_type) = match entry.and_then(|e| Ok((e.path(), e.file_type()?))) {
                Ok(entry) => entry,
                Err(err) => {
                    found.unreadable.push(unreadable(dir.clone(), err));
                    continue;
                }
            };

            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == extension) && path.is_file() {
                found.files.push(path);
            }
        }
    }

    found.files.sort();
    found.unreadable.sort_by(|a, b| a.path.cmp(&b.path));
    found
}

/// Run the read -> classify -> annotate pipeline on one mesh file
pub fn process_file(path: &Path, config: &PipelineConfig) -> Result<FileOutcome, PipelineError> {
    let mesh = read_unv(path)?;
    let layout = InclusionLayout::for_mesh(path, config)?;

    let classification = Classifier::new(&layout, config).classify(&mesh);
    append_groups(path, &classification.groups(), classification.num_inclusions())?;

    let outcome = FileOutcome {
        path: path.to_path_buf(),
        counts: classification.counts(),
        issues: classification.issues().to_vec(),
    };

    info!(
        path = %path.display(),
        elements = mesh.num_elements(),
        issues = outcome.issues.len(),
        "annotated mesh"
    );

    Ok(outcome)
}

/// Annotates every mesh file below a root directory on a fixed-size pool of workers
///
/// Each worker takes one file at a time and runs [process_file] on it. Failures (including panics) are isolated to their
/// file and collected into the [BatchReport]; the error log is written once, after every worker has finished.
///
/// Besides failed files, the log carries nested directories that could not be searched and one summary line for
/// each annotated file that had Elements left out of every group (see [BatchReport::log_lines]).
#[derive(Debug, Clone)]
pub struct BatchRunner {
    config: PipelineConfig,
    error_log: Option<PathBuf>,
}

impl BatchRunner {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            error_log: None,
        }
    }

    /// Write the error log to `path` instead of `<root>/<config.error_log_name>`
    pub fn with_error_log(mut self, path: impl AsRef<Path>) -> Self {
        self.error_log = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn error_log_path(&self, root: &Path) -> PathBuf {
        self.error_log
            .clone()
            .unwrap_or_else(|| root.join(&self.config.error_log_name))
    }

    pub fn run(&self, root: impl AsRef<Path>) -> Result<BatchReport, BatchError> {
        let root = root.as_ref();
        let Discovery { files: paths, unreadable } = discover(root, &self.config.mesh_extension)?;
        let num_workers = self.config.worker_count();
        info!(root = %root.display(), files = paths.len(), workers = num_workers, "starting batch");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .build()?;

        let results: Vec<(PathBuf, Result<FileOutcome, PipelineError>)> = pool.install(|| {
            paths
                .par_iter()
                .map(|path| (path.clone(), self.isolated(path)))
                .collect()
        });

        let mut report = BatchReport::default();
        for (path, result) in results {
            match result {
                Ok(outcome) => report.annotated.push(outcome),
                Err(err) => {
                    error!(path = %path.display(), "{}", err);
                    report.failures.push(FileFailure {
                        path,
                        message: err.to_string(),
                    });
                }
            }
        }
        report.failures.extend(unreadable);
        report.failures.sort_by(|a, b| a.path.cmp(&b.path));

        self.write_error_log(root, &report)?;

        info!(
            annotated = report.annotated.len(),
            failed = report.failures.len(),
            "finished batch"
        );

        Ok(report)
    }

    fn isolated(&self, path: &Path) -> Result<FileOutcome, PipelineError> {
        debug!(path = %path.display(), "processing");
        catch_unwind(AssertUnwindSafe(|| process_file(path, &self.config)))
            .unwrap_or_else(|payload| Err(PipelineError::Panic(panic_message(payload.as_ref()))))
    }

    /// Write the log if there is anything to report; otherwise remove a log left over from an earlier run
    fn write_error_log(&self, root: &Path, report: &BatchReport) -> Result<(), BatchError> {
        let path = self.error_log_path(root);
        let log_err = |source| BatchError::ErrorLog {
            path: path.clone(),
            source,
        };

        let lines = report.log_lines();
        if lines.is_empty() {
            if path.is_file() {
                remove_file(&path).map_err(log_err)?;
                debug!(path = %path.display(), "removed stale error log");
            }
            return Ok(());
        }

        let f = File::create(&path).map_err(log_err)?;
        let mut w = BufWriter::new(&f);
        for line in lines.iter() {
            writeln!(w, "{}", line).map_err(log_err)?;
        }
        w.flush().map_err(log_err)?;

        warn!(path = %path.display(), entries = lines.len(), "wrote error log");
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("unknown panic")
    }
}
