use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{TargetName, fold_case};
use crate::error::FetchError;
use crate::fs_util::walk_dir;

/// First directory found for each wanted name, keyed by its canonical name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FoundTargets {
    entries: Vec<(TargetName, PathBuf)>,
}

impl FoundTargets {
    pub fn get(&self, name: &TargetName) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(found, _)| found == name)
            .map(|(_, path)| path.as_path())
    }

    pub fn contains(&self, name: &TargetName) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wanted names with no match, in the order they were asked for.
    pub fn missing<'a>(&self, names: &'a [TargetName]) -> Vec<&'a TargetName> {
        names.iter().filter(|name| !self.contains(name)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TargetName, &Path)> {
        self.entries.iter().map(|(name, path)| (name, path.as_path()))
    }

    fn insert(&mut self, name: TargetName, path: PathBuf) {
        self.entries.push((name, path));
    }

    fn sort_by_wanted(&mut self, names: &[TargetName]) {
        self.entries.sort_by_key(|(found, _)| {
            names
                .iter()
                .position(|name| name == found)
                .unwrap_or(usize::MAX)
        });
    }
}

/// Walks `root` and records the first directory matching each wanted name,
/// ignoring case.
///
/// Wanted names that differ only in case share one match; the last of them
/// is the one recorded. Unreadable subdirectories are skipped.
pub fn find_target_dirs(root: &Path, names: &[TargetName]) -> Result<FoundTargets, FetchError> {
    let mut wanted = HashMap::<String, &TargetName>::new();
    for name in names {
        wanted.insert(name.match_key(), name);
    }

    let mut found = FoundTargets::default();
    for entry in walk_dir(root)?.entries {
        if !entry.is_dir {
            continue;
        }
        let Some(dir_name) = entry.path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(&name) = wanted.get(&fold_case(dir_name)) else {
            continue;
        };
        if found.contains(name) {
            continue;
        }
        debug!(target_name = %name, path = %entry.path.display(), "matched target folder");
        found.insert(name.clone(), entry.path);
        if found.len() == wanted.len() {
            break;
        }
    }

    found.sort_by_wanted(names);
    Ok(found)
}
