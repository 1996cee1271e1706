use anyhow::Context;
use faculty_common::{FacultyProfile, GraduateYearRecord};
use faculty_crawl::RecordSink;
use std::fs::{File, OpenOptions};
use std::path::Path;

pub const PROFILE_HEADERS: [&str; 11] = [
    "English Name",
    "Chinese Name",
    "Title",
    "Thrust/Department/Division",
    "Email",
    "Location",
    "Overview",
    "Research Interest",
    "Homepage",
    "Degrees",
    "More",
];

pub const GRADUATE_HEADERS: [&str; 4] = [
    "English Name",
    "Chinese Name",
    "Graduate Year",
    "Estimated age",
];

/// Separator for list-valued columns.
const LIST_SEPARATOR: &str = "; ";

/// Streams both tables to CSV, flushing after every record.
pub struct CsvSink {
    profiles: csv::Writer<File>,
    graduates: csv::Writer<File>,
}

impl CsvSink {
    /// Create (truncating) both files and write their header rows.
    pub fn create(profiles: &Path, graduates: &Path) -> anyhow::Result<Self> {
        let mut sink = Self {
            profiles: writer(profiles)?,
            graduates: writer(graduates)?,
        };
        sink.profiles.write_record(PROFILE_HEADERS)?;
        sink.graduates.write_record(GRADUATE_HEADERS)?;
        sink.flush()?;
        Ok(sink)
    }
}

fn writer(path: &Path) -> anyhow::Result<csv::Writer<File>> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(csv::WriterBuilder::new().has_headers(false).from_writer(file))
}

fn profile_row(profile: &FacultyProfile) -> [String; 11] {
    [
        profile.english_name.clone(),
        profile.chinese_name.clone(),
        profile.title.clone(),
        profile.department.clone(),
        profile.email.clone(),
        profile.location.clone(),
        profile.overview.clone(),
        profile.research_interests.join(LIST_SEPARATOR),
        profile.homepage.clone(),
        profile.degrees.join(LIST_SEPARATOR),
        profile.detail_url.clone(),
    ]
}

impl RecordSink for CsvSink {
    fn write_profile(&mut self, profile: &FacultyProfile) -> anyhow::Result<()> {
        self.profiles
            .write_record(profile_row(profile))
            .with_context(|| format!("writing profile row for {}", profile.english_name))?;
        self.profiles.flush()?;
        Ok(())
    }

    fn write_graduate(&mut self, record: &GraduateYearRecord) -> anyhow::Result<()> {
        self.graduates
            .write_record([
                record.english_name.clone(),
                record.chinese_name.clone(),
                record.graduate_year.to_string(),
                record.estimated_age.to_string(),
            ])
            .with_context(|| format!("writing graduate row for {}", record.english_name))?;
        self.graduates.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        self.profiles.flush()?;
        self.graduates.flush()?;
        Ok(())
    }
}
