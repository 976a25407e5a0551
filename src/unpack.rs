use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fs_util::{extract_zip, is_zip_file, walk_dir};

#[derive(Debug, Clone, Default)]
pub struct UnpackReport {
    /// Archives that were extracted and removed.
    pub extracted: Vec<PathBuf>,
    /// Archives left in place because they could not be unpacked.
    pub skipped: Vec<PathBuf>,
    /// Directories that could not be listed while scanning.
    pub unreadable: Vec<PathBuf>,
    pub passes: usize,
}

/// Size and modification time of a flagged archive.
///
/// A later extraction that rewrites the same path changes the stamp, which
/// puts the new file back in the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveStamp {
    len: u64,
    modified: Option<SystemTime>,
}

impl ArchiveStamp {
    pub fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

pub type FlaggedArchives = BTreeMap<PathBuf, Option<ArchiveStamp>>;

/// Expands every zip under `root` in place until none are left.
///
/// Each archive is extracted next to itself and then deleted, so archives
/// nested inside archives are picked up on the next pass. Archives that fail
/// are remembered and excluded from later passes while they stay unchanged
/// on disk.
pub fn unpack_nested(root: &Path) -> Result<UnpackReport, FetchError> {
    let mut report = UnpackReport::default();
    let mut flagged = FlaggedArchives::new();
    let mut unreadable = BTreeSet::<PathBuf>::new();

    loop {
        let scan = find_archives(root, &flagged)?;
        unreadable.extend(scan.unreadable);
        if scan.archives.is_empty() {
            break;
        }
        report.passes += 1;
        debug!(pass = report.passes, archives = scan.archives.len(), "unpacking archives");

        for zip_path in scan.archives {
            // an earlier extraction in this pass may have replaced or removed it
            if !zip_path.is_file() {
                continue;
            }
            let Some(parent) = zip_path.parent() else {
                flag(&mut flagged, zip_path);
                continue;
            };

            if let Err(err) = extract_zip(&zip_path, parent) {
                warn!(archive = %zip_path.display(), error = %err, "skipping unreadable archive");
                if !report.skipped.contains(&zip_path) {
                    report.skipped.push(zip_path.clone());
                }
                flag(&mut flagged, zip_path);
                continue;
            }

            match fs::remove_file(&zip_path) {
                Ok(()) => {
                    report.skipped.retain(|skipped| skipped != &zip_path);
                    flagged.remove(&zip_path);
                    report.extracted.push(zip_path);
                }
                Err(err) => {
                    warn!(
                        archive = %zip_path.display(),
                        error = %err,
                        "extracted archive could not be removed"
                    );
                    if !report.skipped.contains(&zip_path) {
                        report.skipped.push(zip_path.clone());
                    }
                    flag(&mut flagged, zip_path);
                }
            }
        }
    }

    report.unreadable = unreadable.into_iter().collect();
    Ok(report)
}

fn flag(flagged: &mut FlaggedArchives, path: PathBuf) {
    let stamp = ArchiveStamp::of(&path);
    flagged.insert(path, stamp);
}

#[derive(Debug, Clone, Default)]
pub struct ArchiveScan {
    pub archives: Vec<PathBuf>,
    pub unreadable: Vec<PathBuf>,
}

/// Lists zip files under `root`, excluding flagged ones that have not changed
/// since they were flagged.
pub fn find_archives(root: &Path, flagged: &FlaggedArchives) -> Result<ArchiveScan, FetchError> {
    let walk = walk_dir(root)?;
    let archives = walk
        .entries
        .into_iter()
        .filter(|entry| !entry.is_dir && is_zip_file(&entry.path))
        .map(|entry| entry.path)
        .filter(|path| match flagged.get(path) {
            Some(stamp) => *stamp != ArchiveStamp::of(path),
            None => true,
        })
        .collect();
    Ok(ArchiveScan {
        archives,
        unreadable: walk.unreadable,
    })
}
