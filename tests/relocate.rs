mod support;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use fitabase_fetch::relocate::merge_move;

use support::write_file;

fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let relative = path
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/");
                files.insert(relative, fs::read(&path).unwrap());
            }
        }
    }
    files
}

#[test]
fn merging_disjoint_trees_yields_the_union() {
    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("dest");
    let first = temp.path().join("first");
    let second = temp.path().join("second");
    write_file(&first.join("minute/steps_a.csv"), b"a");
    write_file(&first.join("daily.csv"), b"d1");
    write_file(&second.join("minute/steps_b.csv"), b"b");
    write_file(&second.join("hourly.csv"), b"h");

    merge_move(&first, &dest).unwrap();
    merge_move(&second, &dest).unwrap();

    let files = snapshot(&dest);
    let names: Vec<_> = files.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["daily.csv", "hourly.csv", "minute/steps_a.csv", "minute/steps_b.csv"]
    );
}

#[test]
fn merging_same_names_twice_keeps_the_latest_content() {
    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("dest");
    let src = temp.path().join("src");
    write_file(&src.join("sub/weight.csv"), b"first");
    merge_move(&src, &dest).unwrap();

    write_file(&src.join("sub/weight.csv"), b"second");
    let report = merge_move(&src, &dest).unwrap();

    assert_eq!(report.overwritten, 1);
    assert_eq!(fs::read(dest.join("sub/weight.csv")).unwrap(), b"second");
    assert_eq!(snapshot(&dest).len(), 1);
}

#[test]
fn missing_source_leaves_destination_unchanged() {
    let temp = tempfile::tempdir().unwrap();
    let dest = temp.path().join("dest");
    write_file(&dest.join("keep/me.txt"), b"untouched");
    let before = snapshot(&dest);

    let report = merge_move(&temp.path().join("does-not-exist"), &dest).unwrap();

    assert_eq!(report.moved, 0);
    assert_eq!(snapshot(&dest), before);
}

#[test]
fn moved_files_leave_the_source() {
    let temp = tempfile::tempdir().unwrap();
    let src = temp.path().join("src");
    write_file(&src.join("a/b/c.txt"), b"c");

    merge_move(&src, &temp.path().join("dest")).unwrap();

    assert!(!src.join("a/b/c.txt").exists());
}
