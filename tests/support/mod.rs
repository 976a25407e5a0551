#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::Path;

use camino::Utf8PathBuf;
use zip::write::SimpleFileOptions;

use fitabase_fetch::app::{ProgressEvent, ProgressLevel, ProgressSink};
use fitabase_fetch::config::RunConfig;
use fitabase_fetch::domain::TargetName;

#[derive(Default)]
pub struct RecordingSink {
    pub events: RefCell<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter(|event| event.level == ProgressLevel::Warning)
            .map(|event| event.message.clone())
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|event| event.message.clone())
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.events.borrow_mut().push(event);
    }
}

pub fn targets(names: &[&str]) -> Vec<TargetName> {
    names.iter().map(|name| name.parse().unwrap()).collect()
}

pub fn config_in(base: &Path, names: &[&str]) -> RunConfig {
    let base = Utf8PathBuf::from_path_buf(base.to_path_buf()).unwrap();
    RunConfig::new_with_base(base)
        .unwrap()
        .with_targets(targets(names))
}

pub fn write_file(path: &Path, content: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

pub fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in files {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
