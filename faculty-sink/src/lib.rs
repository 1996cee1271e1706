//! File sinks for crawl output.
//!
//! Both sinks write two tables, the faculty profiles and the graduate-year
//! records, streaming one line per record and flushing as they go so an
//! interrupted crawl still leaves every emitted row on disk.
//!
//! - [`CsvSink`]: two CSV files with the directory's column headings
//! - [`JsonLinesSink`]: two `.jsonl` files, one serialized record per line
//! - [`open_sink`]: build the sink selected by [`OutputSettings`]

pub mod csv_sink;
pub mod jsonl;

pub use csv_sink::CsvSink;
pub use jsonl::JsonLinesSink;

use anyhow::Context;
use faculty_crawl::RecordSink;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

/// Where and how the two output tables are written.
///
/// `profiles_file` and `graduates_file` are file stems; the extension follows
/// `format`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub format: OutputFormat,
    pub profiles_file: String,
    pub graduates_file: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: OutputFormat::Csv,
            profiles_file: "faculty_table".into(),
            graduates_file: "faculty_grad_year".into(),
        }
    }
}

impl OutputSettings {
    pub fn profiles_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.profiles_file, self.format.extension()))
    }

    pub fn graduates_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.graduates_file, self.format.extension()))
    }
}

/// Create the output directory and open the configured sink.
pub fn open_sink(settings: &OutputSettings) -> anyhow::Result<Box<dyn RecordSink>> {
    fs::create_dir_all(&settings.dir)
        .with_context(|| format!("creating output directory {}", settings.dir.display()))?;
    let profiles = settings.profiles_path();
    let graduates = settings.graduates_path();
    tracing::info!(
        target: "sink",
        format = ?settings.format,
        profiles = %profiles.display(),
        graduates = %graduates.display(),
        "opening output files"
    );

    Ok(match settings.format {
        OutputFormat::Csv => Box::new(CsvSink::create(&profiles, &graduates)?),
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(&profiles, &graduates)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_format() {
        let mut settings = OutputSettings {
            dir: PathBuf::from("out"),
            ..OutputSettings::default()
        };
        assert_eq!(settings.profiles_path(), PathBuf::from("out/faculty_table.csv"));
        settings.format = OutputFormat::Jsonl;
        assert_eq!(
            settings.graduates_path(),
            PathBuf::from("out/faculty_grad_year.jsonl")
        );
    }

    #[test]
    fn open_sink_creates_the_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = OutputSettings {
            dir: tmp.path().join("nested/out"),
            ..OutputSettings::default()
        };
        let mut sink = open_sink(&settings).unwrap();
        sink.flush().unwrap();
        assert!(settings.profiles_path().exists());
        assert!(settings.graduates_path().exists());
    }
}
