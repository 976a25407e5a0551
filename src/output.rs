use std::fmt::Write as _;
use std::io::{self, Write};

use crate::app::{ProgressEvent, ProgressLevel, ProgressSink, RunReport};

const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Prints progress lines to stdout as they happen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleOutput {
    pub color: bool,
}

impl ConsoleOutput {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn print_summary(&self, report: &RunReport) -> io::Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(self.render_summary(report).as_bytes())?;
        stdout.flush()
    }

    pub fn render_summary(&self, report: &RunReport) -> String {
        let (green, yellow, reset) = self.palette();
        let mut out = String::new();
        let _ = writeln!(out);
        if report.missing.is_empty() && report.failed.is_empty() {
            let _ = writeln!(out, "{green}Done{reset}");
        } else {
            let _ = writeln!(
                out,
                "{yellow}Done with warnings ({} missing, {} failed){reset}",
                report.missing.len(),
                report.failed.len()
            );
        }
        let _ = writeln!(out, "Data structure: {}", report.data_dir);
        for path in &report.outputs {
            let _ = writeln!(out, " - {path}");
        }
        if let Some(message) = &report.cleanup_error {
            let _ = writeln!(out, "{yellow}Temporary folder not removed: {message}{reset}");
        }
        out
    }

    fn palette(&self) -> (&'static str, &'static str, &'static str) {
        if self.color {
            (GREEN, YELLOW, RESET)
        } else {
            ("", "", "")
        }
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let (_, yellow, reset) = self.palette();
        let elapsed = event
            .elapsed
            .map(|elapsed| format!(" ({} ms)", elapsed.as_millis()))
            .unwrap_or_default();
        match event.level {
            ProgressLevel::Info => println!("{}{elapsed}", event.message),
            ProgressLevel::Warning => {
                println!("{yellow}warning: {}{reset}{elapsed}", event.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unpack::UnpackReport;
    use camino::Utf8PathBuf;

    #[test]
    fn summary_lists_expected_paths() {
        let report = RunReport {
            data_dir: Utf8PathBuf::from("/w/data"),
            unpack: UnpackReport::default(),
            relocated: Vec::new(),
            failed: Vec::new(),
            missing: vec!["C".parse().unwrap()],
            cleanup_error: None,
            outputs: vec![
                Utf8PathBuf::from("/w/data/A"),
                Utf8PathBuf::from("/w/data/C"),
                Utf8PathBuf::from("/w/data/Final_data"),
            ],
        };

        let text = ConsoleOutput::new(false).render_summary(&report);

        assert!(text.contains("Done with warnings (1 missing, 0 failed)"));
        assert!(text.contains("Data structure: /w/data"));
        assert!(text.contains(" - /w/data/Final_data"));
    }

    #[test]
    fn summary_reports_cleanup_failure() {
        let report = RunReport {
            data_dir: Utf8PathBuf::from("/w/data"),
            unpack: UnpackReport::default(),
            relocated: Vec::new(),
            failed: Vec::new(),
            missing: Vec::new(),
            cleanup_error: Some("permission denied".to_string()),
            outputs: vec![Utf8PathBuf::from("/w/data/Final_data")],
        };

        let text = ConsoleOutput::new(false).render_summary(&report);

        assert!(text.contains("Temporary folder not removed: permission denied"));
    }
}
