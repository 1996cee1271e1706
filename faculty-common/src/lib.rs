//! Common types shared across the faculty crawler crates.
//!
//! This crate defines the records produced by a crawl, the tunables
//! (selectors, timeouts, retry, age heuristic), the browser-session error
//! taxonomy and the tracing initialiser. It is dependency-light so every
//! crate in the workspace can depend on it.
//!
//! # Overview
//!
//! - [`model`]: [`DirectoryRow`], [`DetailRecord`], [`FacultyProfile`],
//!   [`GraduateYearRecord`] and friends
//! - [`field`]: [`Field`], a per-field `present | absent` result
//! - [`settings`]: selectors and bounds used by the session and extractors
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`SessionError`]: failures reported by a browsing session
//!
//! # Examples
//!
//! ```rust
//! use faculty_common::{DetailRecord, DetailStatus, Field};
//!
//! let mut detail = DetailRecord::default();
//! assert!(matches!(DetailStatus::from_record(&detail), DetailStatus::Partial { .. }));
//!
//! detail.email = Field::Present("a@b.edu".into());
//! assert_eq!(detail.email.as_option().map(String::as_str), Some("a@b.edu"));
//! ```

pub mod field;
pub mod model;
pub mod observability;
pub mod settings;

pub use field::{Absence, Field};
pub use model::{
    DetailField, DetailRecord, DetailStatus, DirectoryRow, FacultyProfile, GraduateYearRecord,
    ListedRow, RowField, RowKey, TriggerRef, DETAIL_URL_NOT_FOUND,
};
pub use settings::{
    AgeHeuristic, BrowserKind, BrowserSettings, DetailSelectors, ListingSelectors, PacingSettings,
    RetryPolicy, Timeouts,
};

/// Errors reported by a browsing session.
///
/// Everything except [`SessionError::Fatal`] is recoverable at the row level.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The trigger was activated but no new browsing context appeared in time.
    #[error("no new browsing context opened for row '{row}' within {waited_ms} ms")]
    ContextNotOpened { row: String, waited_ms: u64 },

    /// A page never reached its ready condition.
    #[error("navigation to {url} did not become ready within {waited_ms} ms")]
    NavigationTimeout { url: String, waited_ms: u64 },

    /// No row with this key exposes a trigger control.
    #[error("no trigger control found for row '{0}'")]
    TriggerNotFound(String),

    /// A single WebDriver command failed.
    #[error("browser command failed: {0}")]
    Command(String),

    /// The session itself is unusable (connection lost, browser crashed).
    #[error("browser session lost: {0}")]
    Fatal(String),
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Fatal(_))
    }
}

/// Convenient alias for results that use [`SessionError`].
pub type SessionResult<T> = std::result::Result<T, SessionError>;
