use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::workspace::AppConfig;

/// Log files under the configured log directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum LogFile {
    DataQuality,
    Scheduler,
    Dashboard,
}

impl LogFile {
    pub fn path(&self, config: &AppConfig) -> PathBuf {
        let name = match self {
            LogFile::DataQuality => "data_quality.log",
            LogFile::Scheduler => "scheduler.log",
            LogFile::Dashboard => "dashboard.log",
        };
        config.log_dir.join(name)
    }
}

/// Last `count` lines of `path`, oldest first.
pub fn tail_lines(path: &Path, count: usize) -> std::io::Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut tail = VecDeque::with_capacity(count);
    for line in reader.lines() {
        let line = line?;
        if tail.len() == count {
            tail.pop_front();
        }
        if count > 0 {
            tail.push_back(line.trim_end().to_string());
        }
    }
    Ok(tail.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_last_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data_quality.log");
        let content: String = (1..=15).map(|idx| format!("line {idx}\n")).collect();
        std::fs::write(&path, content).expect("write");

        let lines = tail_lines(&path, 10).expect("tail");
        assert_eq!(lines.len(), 10);
        assert_eq!(lines.first().map(String::as_str), Some("line 6"));
        assert_eq!(lines.last().map(String::as_str), Some("line 15"));
        assert!(tail_lines(&path, 0).expect("empty").is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(tail_lines(&dir.path().join("absent.log"), 10).is_err());
    }
}
