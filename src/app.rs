use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::domain::TargetName;
use crate::error::FetchError;
use crate::kaggle::KaggleClient;
use crate::locate::find_target_dirs;
use crate::relocate::{RelocateReport, merge_move};
use crate::unpack::{UnpackReport, unpack_nested};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressLevel {
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub level: ProgressLevel,
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Info,
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ProgressLevel::Warning,
            message: message.into(),
            elapsed: None,
        }
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone)]
pub struct RelocatedTarget {
    pub name: TargetName,
    pub source: PathBuf,
    pub destination: Utf8PathBuf,
    pub report: RelocateReport,
}

#[derive(Debug, Clone)]
pub struct TargetFailure {
    pub name: TargetName,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub data_dir: Utf8PathBuf,
    pub unpack: UnpackReport,
    pub relocated: Vec<RelocatedTarget>,
    pub failed: Vec<TargetFailure>,
    pub missing: Vec<TargetName>,
    pub cleanup_error: Option<String>,
    /// Paths a complete run produces: one per configured target, then the
    /// final folder.
    pub outputs: Vec<Utf8PathBuf>,
}

pub struct App<K: KaggleClient> {
    client: K,
}

impl<K: KaggleClient> App<K> {
    pub fn new(client: K) -> Self {
        Self { client }
    }

    /// Fetches the dataset, unpacks it and moves the target folders into the
    /// data directory.
    ///
    /// Only a failed download aborts the run; in that case the working
    /// directory is left as it is. Everything after that is best effort and
    /// reported through the returned [`RunReport`].
    pub fn run(
        &self,
        config: &RunConfig,
        sink: &dyn ProgressSink,
    ) -> Result<RunReport, FetchError> {
        let work_dir = config.work_dir();
        fs::create_dir_all(work_dir.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("create {work_dir}: {err}")))?;

        sink.event(ProgressEvent::info(format!(
            "Downloading '{}' to {work_dir} ...",
            config.dataset
        )));
        let start = Instant::now();
        self.client
            .download_dataset(&config.dataset, work_dir.as_std_path())?;
        info!(
            dataset = %config.dataset,
            latency_ms = start.elapsed().as_millis(),
            "dataset fetched"
        );

        let unpack = unpack_nested(work_dir.as_std_path())?;
        for skipped in &unpack.skipped {
            sink.event(ProgressEvent::warning(format!(
                "Skipped unreadable archive '{}'",
                skipped.display()
            )));
        }
        for dir in &unpack.unreadable {
            sink.event(ProgressEvent::warning(format!(
                "Skipped unreadable folder '{}'",
                dir.display()
            )));
        }

        let data_dir = config.data_dir();
        let final_dir = config.final_dir();
        fs::create_dir_all(final_dir.as_std_path())
            .map_err(|err| FetchError::Filesystem(format!("create {final_dir}: {err}")))?;

        let found = find_target_dirs(work_dir.as_std_path(), &config.targets)?;
        let missing: Vec<TargetName> = found
            .missing(&config.targets)
            .into_iter()
            .cloned()
            .collect();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(TargetName::as_str).collect();
            warn!(missing = ?names, "target folders not found");
            sink.event(ProgressEvent::warning(format!(
                "No folders found (missing): {}",
                names.join(", ")
            )));
        }

        let mut relocated = Vec::new();
        let mut failed = Vec::new();
        for (name, source) in found.iter() {
            let destination = config.target_dir(name);
            sink.event(ProgressEvent::info(format!(
                "Moving '{}' -> '{destination}'",
                source.display()
            )));
            let start = Instant::now();
            match merge_move(source, destination.as_std_path()) {
                Ok(report) => {
                    for failure in &report.failures {
                        sink.event(ProgressEvent::warning(format!(
                            "Could not move '{}': {}",
                            failure.path.display(),
                            failure.message
                        )));
                    }
                    let moved = format!("Moved {} file(s) into '{destination}'", report.moved);
                    sink.event(ProgressEvent::info(moved).with_elapsed(start.elapsed()));
                    relocated.push(RelocatedTarget {
                        name: name.clone(),
                        source: source.to_path_buf(),
                        destination,
                        report,
                    });
                }
                Err(err) => {
                    warn!(target_name = %name, error = %err, "relocation failed");
                    sink.event(ProgressEvent::warning(format!(
                        "Failed to move '{name}': {err}"
                    )));
                    failed.push(TargetFailure {
                        name: name.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }

        let cleanup_error = remove_work_dir(config);
        if let Some(message) = &cleanup_error {
            sink.event(ProgressEvent::warning(format!(
                "Failed to remove temporary folder: {message}"
            )));
        }

        Ok(RunReport {
            data_dir,
            unpack,
            relocated,
            failed,
            missing,
            cleanup_error,
            outputs: config.expected_outputs(),
        })
    }
}

fn remove_work_dir(config: &RunConfig) -> Option<String> {
    let work_dir = config.work_dir();
    if !work_dir.as_std_path().exists() {
        return None;
    }
    match fs::remove_dir_all(work_dir.as_std_path()) {
        Ok(()) => None,
        Err(err) => {
            warn!(path = %work_dir, error = %err, "failed to remove working directory");
            Some(err.to_string())
        }
    }
}
