//! Where finished records go.

use faculty_common::{FacultyProfile, GraduateYearRecord};

/// Receives records as soon as each row is merged.
///
/// Records arrive in document order. A write error aborts the crawl; rows
/// written before it are kept.
pub trait RecordSink: Send {
    fn write_profile(&mut self, profile: &FacultyProfile) -> anyhow::Result<()>;

    fn write_graduate(&mut self, record: &GraduateYearRecord) -> anyhow::Result<()>;

    fn flush(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Collects both output tables in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub profiles: Vec<FacultyProfile>,
    pub graduates: Vec<GraduateYearRecord>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_tables(self) -> (Vec<FacultyProfile>, Vec<GraduateYearRecord>) {
        (self.profiles, self.graduates)
    }
}

impl RecordSink for MemorySink {
    fn write_profile(&mut self, profile: &FacultyProfile) -> anyhow::Result<()> {
        self.profiles.push(profile.clone());
        Ok(())
    }

    fn write_graduate(&mut self, record: &GraduateYearRecord) -> anyhow::Result<()> {
        self.graduates.push(record.clone());
        Ok(())
    }
}
