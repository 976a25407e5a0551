use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use zip::ZipArchive;

use crate::error::FetchError;

/// Extracts every entry of `zip_path` under `target_dir`.
///
/// Anything that makes the archive unusable, including entries that would
/// escape `target_dir`, is reported as [`FetchError::CorruptArchive`].
pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<(), FetchError> {
    let corrupt = |message: String| FetchError::CorruptArchive {
        path: zip_path.to_path_buf(),
        message,
    };

    let file = fs::File::open(zip_path).map_err(|err| corrupt(format!("open: {err}")))?;
    let mut archive = ZipArchive::new(file).map_err(|err| corrupt(err.to_string()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|err| corrupt(err.to_string()))?;
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => return Err(corrupt("zip entry path traversal detected".to_string())),
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| FetchError::Filesystem(err.to_string()))?;
            continue;
        }

        if let Some(parent) = entry_path.parent() {
            fs::create_dir_all(parent).map_err(|err| FetchError::Filesystem(err.to_string()))?;
        }
        let mut outfile = fs::File::create(&entry_path)
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        io::copy(&mut entry, &mut outfile).map_err(|err| corrupt(err.to_string()))?;
    }
    Ok(())
}

pub fn is_zip_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Result of [`walk_dir`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirWalk {
    pub entries: Vec<WalkEntry>,
    /// Directories below the root that could not be listed. Their contents
    /// are missing from `entries`.
    pub unreadable: Vec<PathBuf>,
}

/// Pre-order walk of everything below `root` (root itself excluded).
///
/// Entries are visited in file-name order at every level so the result is
/// stable for a given tree. Symlinks are listed but never followed. Only an
/// unreadable `root` is an error; unreadable subdirectories are skipped and
/// listed in [`DirWalk::unreadable`].
pub fn walk_dir(root: &Path) -> Result<DirWalk, FetchError> {
    let mut walk = DirWalk::default();
    let children = read_dir_sorted(root)?;
    walk_children(children, &mut walk);
    Ok(walk)
}

fn walk_children(children: Vec<WalkEntry>, walk: &mut DirWalk) {
    for child in children {
        let descend = child.is_dir.then(|| child.path.clone());
        walk.entries.push(child);
        let Some(dir) = descend else {
            continue;
        };
        match read_dir_sorted(&dir) {
            Ok(grandchildren) => walk_children(grandchildren, walk),
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "skipping unreadable directory");
                walk.unreadable.push(dir);
            }
        }
    }
}

pub fn read_dir_sorted(dir: &Path) -> Result<Vec<WalkEntry>, FetchError> {
    let entries = fs::read_dir(dir)
        .map_err(|err| FetchError::Filesystem(format!("read dir {}: {err}", dir.display())))?;
    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| FetchError::Filesystem(err.to_string()))?;
        let file_type = entry
            .file_type()
            .map_err(|err| FetchError::Filesystem(err.to_string()))?;
        children.push(WalkEntry {
            path: entry.path(),
            is_dir: file_type.is_dir(),
        });
    }
    children.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, files: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in files {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extract_zip_creates_nested_paths() {
        let temp = tempfile::tempdir().unwrap();
        let zip_path = temp.path().join("bundle.zip");
        write_zip(&zip_path, &[("a/b/c.txt", b"hello"), ("top.txt", b"x")]);

        extract_zip(&zip_path, temp.path()).unwrap();

        assert_eq!(fs::read(temp.path().join("a/b/c.txt")).unwrap(), b"hello");
        assert!(temp.path().join("top.txt").is_file());
    }

    #[test]
    fn extract_zip_rejects_garbage() {
        let temp = tempfile::tempdir().unwrap();
        let zip_path = temp.path().join("broken.zip");
        fs::write(&zip_path, b"definitely not a zip").unwrap();

        let err = extract_zip(&zip_path, temp.path()).unwrap_err();
        assert!(matches!(err, FetchError::CorruptArchive { .. }));
    }

    #[test]
    fn zip_detection_ignores_case() {
        assert!(is_zip_file(Path::new("x/Data.ZIP")));
        assert!(is_zip_file(Path::new("inner.zip")));
        assert!(!is_zip_file(Path::new("notes.zip.txt")));
        assert!(!is_zip_file(Path::new("zip")));
    }

    #[test]
    fn walk_is_pre_order_and_sorted() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/file.txt"), b"").unwrap();
        fs::write(root.join("c.txt"), b"").unwrap();

        let names: Vec<_> = walk_dir(root)
            .unwrap()
            .entries
            .into_iter()
            .map(|entry| {
                entry
                    .path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, vec!["a", "a/file.txt", "b", "b/inner", "c.txt"]);
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = walk_dir(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, FetchError::Filesystem(_)));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("locked/hidden")).unwrap();
        fs::create_dir_all(root.join("open")).unwrap();
        fs::write(root.join("open/file.txt"), b"").unwrap();
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // permissions are not enforced for root
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let walk = walk_dir(root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let walk = walk.unwrap();

        assert_eq!(walk.unreadable, vec![locked.clone()]);
        let paths: Vec<_> = walk.entries.iter().map(|entry| entry.path.clone()).collect();
        assert_eq!(paths, vec![locked, root.join("open"), root.join("open/file.txt")]);
    }
}
