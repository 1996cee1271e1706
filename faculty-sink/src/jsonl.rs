use anyhow::Context;
use faculty_common::{FacultyProfile, GraduateYearRecord};
use faculty_crawl::RecordSink;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Streams both tables as JSON Lines. Profiles keep their detail status.
pub struct JsonLinesSink {
    profiles: BufWriter<File>,
    graduates: BufWriter<File>,
}

impl JsonLinesSink {
    pub fn create(profiles: &Path, graduates: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            profiles: open(profiles)?,
            graduates: open(graduates)?,
        })
    }
}

fn open(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_line<T: Serialize>(out: &mut BufWriter<File>, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

impl RecordSink for JsonLinesSink {
    fn write_profile(&mut self, profile: &FacultyProfile) -> anyhow::Result<()> {
        write_line(&mut self.profiles, profile)
            .with_context(|| format!("writing profile for {}", profile.english_name))
    }

    fn write_graduate(&mut self, record: &GraduateYearRecord) -> anyhow::Result<()> {
        write_line(&mut self.graduates, record)
            .with_context(|| format!("writing graduate record for {}", record.english_name))
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.profiles.flush()?;
        self.graduates.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faculty_common::DetailStatus;
    use std::fs;

    #[test]
    fn one_json_document_per_line() {
        let tmp = tempfile::tempdir().unwrap();
        let profiles = tmp.path().join("faculty_table.jsonl");
        let graduates = tmp.path().join("faculty_grad_year.jsonl");
        let mut sink = JsonLinesSink::create(&profiles, &graduates).unwrap();

        let profile = FacultyProfile {
            english_name: "Carol WANG".into(),
            chinese_name: "王卡罗".into(),
            title: "Associate Professor".into(),
            department: "DSA".into(),
            email: "carol@example.edu".into(),
            location: String::new(),
            homepage: String::new(),
            overview: String::new(),
            research_interests: vec![],
            degrees: vec![],
            graduate_year: None,
            detail_url: "not found".into(),
            detail_status: DetailStatus::Unavailable {
                reason: "timeout".into(),
            },
        };
        sink.write_profile(&profile).unwrap();
        sink.write_profile(&profile).unwrap();
        sink.flush().unwrap();

        let text = fs::read_to_string(&profiles).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let back: FacultyProfile = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(back, profile);
        assert_eq!(fs::read_to_string(&graduates).unwrap(), "");
    }
}
