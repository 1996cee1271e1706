//! HTML extraction for the faculty directory.
//!
//! Everything here is a pure function of an HTML snapshot: the listing
//! parser turns the directory table into [`ListedRow`]s and the detail parser
//! reads contact, degree, overview and research-interest markup from a
//! detail page. No browser is involved, so the same code runs against live
//! page sources and saved fixtures.
//!
//! - [`listing::ListingParser`]: directory rows and their trigger references
//! - [`detail::DetailParser`]: detail-page fields, tab count, research panel
//! - [`detail::graduate_year_from_degrees`]: the degree-line year rule
//!
//! [`ListedRow`]: faculty_common::ListedRow

pub mod detail;
pub mod listing;

pub use detail::{DetailParser, DetailSnapshot, graduate_year_from_degrees};
pub use listing::{ListingParser, extract_rows};

use scraper::{ElementRef, Selector};

/// Errors raised while preparing parsers.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A configured CSS selector could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

pub(crate) fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Concatenate the element's text nodes and collapse whitespace.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<String>())
}

pub(crate) fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
