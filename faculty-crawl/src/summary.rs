use faculty_common::DetailStatus;
use serde::Serialize;
use std::fmt;

/// How a crawl ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CrawlOutcome {
    Completed,
    Cancelled,
    Aborted { reason: String },
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages: usize,
    pub rows_processed: usize,
    pub rows_complete: usize,
    pub partial: usize,
    pub unavailable: usize,
    pub without_trigger: usize,
    pub graduate_records: usize,
    pub outcome: CrawlOutcome,
}

impl Default for CrawlSummary {
    fn default() -> Self {
        Self {
            pages: 0,
            rows_processed: 0,
            rows_complete: 0,
            partial: 0,
            unavailable: 0,
            without_trigger: 0,
            graduate_records: 0,
            outcome: CrawlOutcome::Completed,
        }
    }
}

impl CrawlSummary {
    pub fn record(&mut self, status: &DetailStatus) {
        self.rows_processed += 1;
        match status {
            DetailStatus::Complete => self.rows_complete += 1,
            DetailStatus::Partial { .. } => self.partial += 1,
            DetailStatus::Unavailable { .. } => self.unavailable += 1,
            DetailStatus::NoTrigger => self.without_trigger += 1,
        }
    }

    /// Rows whose detail extraction did not yield every field.
    pub fn incomplete(&self) -> usize {
        self.rows_processed - self.rows_complete
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, CrawlOutcome::Aborted { .. })
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} rows over {} page(s); {} with incomplete detail ({} partial, {} unavailable, {} without trigger); {} graduate-year records",
            self.rows_processed,
            self.pages,
            self.incomplete(),
            self.partial,
            self.unavailable,
            self.without_trigger,
            self.graduate_records,
        )?;
        match &self.outcome {
            CrawlOutcome::Completed => Ok(()),
            CrawlOutcome::Cancelled => write!(f, "; cancelled"),
            CrawlOutcome::Aborted { reason } => write!(f, "; aborted: {reason}"),
        }
    }
}
