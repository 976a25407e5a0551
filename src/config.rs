use camino::{Utf8Path, Utf8PathBuf};

use crate::domain::{DatasetSlug, TargetName};
use crate::error::FetchError;

pub const DATASET_SLUG: &str = "arashnic/fitbit";

pub const TARGET_FOLDERS: [&str; 2] = [
    "Fitabase Data 3.12.16-4.11.16",
    "Fitabase Data 4.12.16-5.12.16",
];

pub const WORK_DIR_NAME: &str = "kaggle_tmp_download";
pub const DATA_DIR_NAME: &str = "data";
pub const FINAL_DIR_NAME: &str = "Final_data";

/// Everything a run needs, built once at startup and passed down.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dataset: DatasetSlug,
    pub targets: Vec<TargetName>,
    base_dir: Utf8PathBuf,
}

impl RunConfig {
    pub fn from_current_dir() -> Result<Self, FetchError> {
        let cwd = std::env::current_dir().map_err(|err| FetchError::Filesystem(err.to_string()))?;
        let base_dir = Utf8PathBuf::from_path_buf(cwd)
            .map_err(|_| FetchError::Filesystem("non-utf8 working directory".to_string()))?;
        Self::new_with_base(base_dir)
    }

    pub fn new_with_base(base_dir: Utf8PathBuf) -> Result<Self, FetchError> {
        let targets = TARGET_FOLDERS
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<TargetName>, FetchError>>()?;
        Ok(Self {
            dataset: DATASET_SLUG.parse()?,
            targets,
            base_dir,
        })
    }

    pub fn with_targets(mut self, targets: Vec<TargetName>) -> Self {
        self.targets = targets;
        self
    }

    pub fn base_dir(&self) -> &Utf8Path {
        &self.base_dir
    }

    pub fn work_dir(&self) -> Utf8PathBuf {
        self.base_dir.join(WORK_DIR_NAME)
    }

    pub fn data_dir(&self) -> Utf8PathBuf {
        self.base_dir.join(DATA_DIR_NAME)
    }

    pub fn final_dir(&self) -> Utf8PathBuf {
        self.data_dir().join(FINAL_DIR_NAME)
    }

    pub fn target_dir(&self, target: &TargetName) -> Utf8PathBuf {
        self.data_dir().join(target.as_str())
    }

    /// Paths a complete run is expected to produce, in summary order.
    pub fn expected_outputs(&self) -> Vec<Utf8PathBuf> {
        let mut outputs: Vec<Utf8PathBuf> = self
            .targets
            .iter()
            .map(|target| self.target_dir(target))
            .collect();
        outputs.push(self.final_dir());
        outputs
    }
}
