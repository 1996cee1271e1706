//! Records produced by one crawl run.

use crate::field::{Absence, Field};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel `detail_url` for rows whose detail context could not be reached.
pub const DETAIL_URL_NOT_FOUND: &str = "not found";

/// Identity of a directory row (its English name).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowKey(pub String);

impl RowKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Basic fields of one listing row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRow {
    pub english_name: String,
    pub chinese_name: String,
    pub title: String,
    pub department: String,
    pub email: String,
}

impl DirectoryRow {
    pub fn key(&self) -> RowKey {
        RowKey(self.english_name.clone())
    }
}

/// Row columns, used to report which ones were missing in the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowField {
    EnglishName,
    ChineseName,
    Title,
    Department,
    Email,
}

/// Locates the "more" control of one row by the row's identity.
///
/// `ordinal_hint` is the row's position when the listing was parsed; sessions
/// try it first but always confirm the key before activating the control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRef {
    pub row_key: RowKey,
    pub ordinal_hint: usize,
    pub row_selector: String,
    pub key_selector: String,
    pub control_selector: String,
}

/// A parsed listing row together with the means to open its detail context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRow {
    pub row: DirectoryRow,
    pub trigger: Option<TriggerRef>,
    pub absent: Vec<RowField>,
}

/// Detail-context fields. Each one carries its own presence state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub email: Field<String>,
    pub location: Field<String>,
    pub homepage: Field<String>,
    pub overview: Field<String>,
    pub research_interests: Field<Vec<String>>,
    pub degrees: Field<Vec<String>>,
    pub graduate_year: Field<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailField {
    Email,
    Location,
    Homepage,
    Overview,
    ResearchInterests,
    Degrees,
    GraduateYear,
}

impl DetailRecord {
    /// Every field that carries no value, with the reason.
    pub fn absent_fields(&self) -> Vec<(DetailField, &Absence)> {
        let fields = [
            (DetailField::Email, self.email.absence()),
            (DetailField::Location, self.location.absence()),
            (DetailField::Homepage, self.homepage.absence()),
            (DetailField::Overview, self.overview.absence()),
            (DetailField::ResearchInterests, self.research_interests.absence()),
            (DetailField::Degrees, self.degrees.absence()),
            (DetailField::GraduateYear, self.graduate_year.absence()),
        ];
        fields
            .into_iter()
            .filter_map(|(field, absence)| absence.map(|a| (field, a)))
            .collect()
    }
}

/// How far detail extraction got for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetailStatus {
    Complete,
    Partial { absent: Vec<DetailField> },
    Unavailable { reason: String },
    NoTrigger,
}

impl DetailStatus {
    /// `Complete` when every detail field is present, `Partial` otherwise.
    pub fn from_record(record: &DetailRecord) -> Self {
        let absent: Vec<DetailField> = record
            .absent_fields()
            .into_iter()
            .map(|(field, _)| field)
            .collect();
        if absent.is_empty() {
            DetailStatus::Complete
        } else {
            DetailStatus::Partial { absent }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DetailStatus::Complete)
    }
}

/// One row of the faculty table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyProfile {
    pub english_name: String,
    pub chinese_name: String,
    pub title: String,
    pub department: String,
    pub email: String,
    pub location: String,
    pub homepage: String,
    pub overview: String,
    pub research_interests: Vec<String>,
    pub degrees: Vec<String>,
    pub graduate_year: Option<u32>,
    pub detail_url: String,
    pub detail_status: DetailStatus,
}

/// Graduate year with a heuristic age estimate.
///
/// `estimated_age` is `reference_year + graduation_age - graduate_year`; it is
/// an estimate, not a measured value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduateYearRecord {
    pub english_name: String,
    pub chinese_name: String,
    pub graduate_year: u32,
    pub estimated_age: i32,
}
