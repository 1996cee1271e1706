//! Pure merging of listing and detail data into output records.

use faculty_common::{
    AgeHeuristic, DetailRecord, DetailStatus, DirectoryRow, FacultyProfile, GraduateYearRecord,
};

/// Combine one listing row with its detail record.
///
/// The detail email replaces the listing email only when it is present and
/// non-blank. Absent detail fields become empty values.
pub fn merge(
    row: DirectoryRow,
    detail: DetailRecord,
    detail_url: impl Into<String>,
    status: DetailStatus,
) -> FacultyProfile {
    let email = match detail.email.into_option() {
        Some(email) if !email.trim().is_empty() => email,
        _ => row.email,
    };

    FacultyProfile {
        english_name: row.english_name,
        chinese_name: row.chinese_name,
        title: row.title,
        department: row.department,
        email,
        location: detail.location.value_or_default(),
        homepage: detail.homepage.value_or_default(),
        overview: detail.overview.value_or_default(),
        research_interests: detail.research_interests.value_or_default(),
        degrees: detail.degrees.value_or_default(),
        graduate_year: detail.graduate_year.into_option(),
        detail_url: detail_url.into(),
        detail_status: status,
    }
}

/// The graduate-year record for `profile`, if it has a positive graduate year
/// whose age estimate is representable.
pub fn derive_graduate_year(
    profile: &FacultyProfile,
    heuristic: &AgeHeuristic,
) -> Option<GraduateYearRecord> {
    let year = profile.graduate_year.filter(|y| *y > 0)?;
    Some(GraduateYearRecord {
        english_name: profile.english_name.clone(),
        chinese_name: profile.chinese_name.clone(),
        graduate_year: year,
        estimated_age: heuristic.estimate_age(year)?,
    })
}
