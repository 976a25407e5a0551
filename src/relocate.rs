use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fs_util::read_dir_sorted;

#[derive(Debug, Clone, Default)]
pub struct RelocateReport {
    pub moved: usize,
    /// Moves that replaced a file already present at the destination.
    pub overwritten: usize,
    pub failures: Vec<RelocateFailure>,
}

#[derive(Debug, Clone)]
pub struct RelocateFailure {
    pub path: PathBuf,
    pub message: String,
}

impl RelocateReport {
    fn fail(&mut self, path: &Path, err: &FetchError) {
        warn!(path = %path.display(), error = %err, "relocation failed for item");
        self.failures.push(RelocateFailure {
            path: path.to_path_buf(),
            message: err.to_string(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Replaced,
}

/// A file that is about to leave its current location.
///
/// Moving consumes the value, so the old path cannot be used afterwards.
#[derive(Debug)]
pub struct SourceFile {
    path: PathBuf,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Moves the file to `target`, replacing an existing file there.
    pub fn move_to(self, target: &Path) -> Result<MoveOutcome, FetchError> {
        let fs_err = |action: &str, err: std::io::Error| {
            FetchError::Filesystem(format!(
                "{action} {} -> {}: {err}",
                self.path.display(),
                target.display()
            ))
        };

        let mut outcome = MoveOutcome::Moved;
        if let Ok(existing) = fs::symlink_metadata(target) {
            if existing.is_dir() {
                return Err(FetchError::Filesystem(format!(
                    "cannot replace directory {} with a file",
                    target.display()
                )));
            }
            fs::remove_file(target).map_err(|err| fs_err("replace", err))?;
            outcome = MoveOutcome::Replaced;
        }

        if fs::rename(&self.path, target).is_err() {
            // rename fails across filesystems
            fs::copy(&self.path, target).map_err(|err| fs_err("copy", err))?;
            fs::remove_file(&self.path).map_err(|err| fs_err("remove", err))?;
        }
        Ok(outcome)
    }
}

/// Merges the contents of `source` into `destination`, moving files.
///
/// Subdirectories are merged recursively and same-named files are replaced.
/// A missing `source` is a no-op. Failures on individual items are recorded
/// in the report; only failing to create `destination` or to list `source`
/// is returned as an error.
pub fn merge_move(source: &Path, destination: &Path) -> Result<RelocateReport, FetchError> {
    let mut report = RelocateReport::default();
    if !source.exists() {
        debug!(source = %source.display(), "nothing to relocate");
        return Ok(report);
    }

    fs::create_dir_all(destination).map_err(|err| {
        FetchError::Filesystem(format!("create {}: {err}", destination.display()))
    })?;
    merge_into(source, destination, &mut report)?;
    let _ = fs::remove_dir(source);
    Ok(report)
}

fn merge_into(
    source: &Path,
    destination: &Path,
    report: &mut RelocateReport,
) -> Result<(), FetchError> {
    for child in read_dir_sorted(source)? {
        let Some(name) = child.path.file_name() else {
            continue;
        };
        let target = destination.join(name);

        if child.is_dir {
            let merged = fs::create_dir_all(&target)
                .map_err(|err| {
                    FetchError::Filesystem(format!("create {}: {err}", target.display()))
                })
                .and_then(|()| merge_into(&child.path, &target, report));
            match merged {
                Ok(()) => {
                    let _ = fs::remove_dir(&child.path);
                }
                Err(err) => report.fail(&child.path, &err),
            }
            continue;
        }

        match SourceFile::new(child.path.clone()).move_to(&target) {
            Ok(MoveOutcome::Moved) => report.moved += 1,
            Ok(MoveOutcome::Replaced) => {
                report.moved += 1;
                report.overwritten += 1;
            }
            Err(err) => report.fail(&child.path, &err),
        }
    }
    Ok(())
}
