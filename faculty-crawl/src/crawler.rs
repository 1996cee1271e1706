//! The crawl loop: list rows, visit each detail context, merge, emit.

use crate::aggregate::{derive_graduate_year, merge};
use crate::detail::extract_detail;
use crate::sink::RecordSink;
use crate::summary::{CrawlOutcome, CrawlSummary};
use faculty_common::{
    AgeHeuristic, DETAIL_URL_NOT_FOUND, DetailRecord, DetailSelectors, DetailStatus,
    FacultyProfile, ListedRow, ListingSelectors, PacingSettings, RetryPolicy, SessionError,
    SessionResult, Timeouts, TriggerRef,
};
use faculty_drivers::{BrowsingSession, ContextHandle, Pacing};
use faculty_extract::{DetailParser, ExtractError, ListingParser};
use std::collections::HashSet;
use std::fmt;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything the crawler needs besides the session and the sink.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub directory_url: String,
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    pub pacing: PacingSettings,
    pub age: AgeHeuristic,
    pub max_pages: usize,
}

impl CrawlSettings {
    pub fn new(directory_url: impl Into<String>) -> Self {
        Self {
            directory_url: directory_url.into(),
            listing: ListingSelectors::default(),
            detail: DetailSelectors::default(),
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
            pacing: PacingSettings::default(),
            age: AgeHeuristic::default(),
            max_pages: 50,
        }
    }
}

/// Per-row progress, logged as rows move through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowState {
    ListedRowParsed,
    DetailContextRequested,
    DetailExtracted,
    Merged,
    Emitted,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A merged profile, plus the fatal error that ended the run while producing it.
struct RowOutcome {
    profile: FacultyProfile,
    abort: Option<SessionError>,
}

/// Drives one browsing session through the directory, one row at a time.
///
/// Rows are visited strictly in document order and the primary context is
/// restored before each next row.
pub struct Crawler {
    settings: CrawlSettings,
    listing: ListingParser,
    detail: DetailParser,
    pacing: Pacing,
    age: AgeHeuristic,
}

impl Crawler {
    /// Compile the selectors; fails only on an invalid selector.
    pub fn new(settings: CrawlSettings) -> Result<Self, ExtractError> {
        Ok(Self {
            listing: ListingParser::new(&settings.listing)?,
            detail: DetailParser::new(&settings.detail)?,
            pacing: Pacing::new(settings.pacing),
            age: settings.age.resolved(),
            settings,
        })
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Crawl the directory, streaming every record into `sink`.
    ///
    /// Never drops a row: each listed row yields exactly one profile. The run
    /// stops early on cancellation (checked between rows), on a fatal session
    /// error, or when the sink fails; records already written are kept.
    pub async fn run<S, K>(
        &self,
        session: &mut S,
        sink: &mut K,
        cancel: &CancellationToken,
    ) -> CrawlSummary
    where
        S: BrowsingSession + ?Sized,
        K: RecordSink + ?Sized,
    {
        let mut summary = CrawlSummary::default();
        let url = self.settings.directory_url.clone();

        info!(target: "crawl", %url, "starting crawl");
        if let Err(e) = self
            .navigate_with_retry(session, &url, &self.settings.listing.row)
            .await
        {
            error!(target: "crawl", %url, error = %e, "directory did not load");
            summary.outcome = CrawlOutcome::Aborted {
                reason: e.to_string(),
            };
            self.finish(sink, &mut summary);
            return summary;
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut page = 1;
        summary.outcome = 'pages: loop {
            summary.pages = page;
            let html = match session.page_source().await {
                Ok(html) => html,
                Err(e) => {
                    break 'pages CrawlOutcome::Aborted {
                        reason: e.to_string(),
                    };
                }
            };
            let rows = self.listing.parse(&html);
            info!(target: "crawl", page, rows = rows.len(), "listing parsed");

            for listed in rows {
                if cancel.is_cancelled() {
                    info!(target: "crawl", "cancelled between rows");
                    break 'pages CrawlOutcome::Cancelled;
                }
                if !seen.insert(listed.row.english_name.clone()) {
                    warn!(target: "crawl.row", row = %listed.row.english_name, "duplicate row key in listing");
                }

                let RowOutcome { profile, abort } = self.process_row(session, listed).await;
                if let Err(e) = self.emit(sink, &profile, &mut summary) {
                    error!(target: "sink", error = %e, "sink rejected record");
                    break 'pages CrawlOutcome::Aborted {
                        reason: format!("sink failure: {e:#}"),
                    };
                }
                if let Some(fatal) = abort {
                    error!(target: "crawl", error = %fatal, "browser session lost; aborting remaining rows");
                    break 'pages CrawlOutcome::Aborted {
                        reason: fatal.to_string(),
                    };
                }
                self.pacing.between_rows().await;
            }

            if cancel.is_cancelled() {
                break 'pages CrawlOutcome::Cancelled;
            }
            match self.advance_page(session, &html, page).await {
                Ok(true) => page += 1,
                Ok(false) => break 'pages CrawlOutcome::Completed,
                Err(e) if e.is_fatal() => {
                    break 'pages CrawlOutcome::Aborted {
                        reason: e.to_string(),
                    };
                }
                Err(e) => {
                    warn!(target: "crawl", error = %e, "pagination stopped");
                    break 'pages CrawlOutcome::Completed;
                }
            }
        };

        self.finish(sink, &mut summary);
        info!(target: "crawl", %summary, "crawl finished");
        summary
    }

    async fn process_row<S>(&self, session: &mut S, listed: ListedRow) -> RowOutcome
    where
        S: BrowsingSession + ?Sized,
    {
        let ListedRow { row, trigger, .. } = listed;
        let name = row.english_name.clone();
        debug!(target: "crawl.row", row = %name, state = %RowState::ListedRowParsed);

        let Some(trigger) = trigger else {
            debug!(target: "crawl.row", row = %name, state = %RowState::Merged, "no detail trigger");
            return RowOutcome {
                profile: merge(
                    row,
                    DetailRecord::default(),
                    DETAIL_URL_NOT_FOUND,
                    DetailStatus::NoTrigger,
                ),
                abort: None,
            };
        };

        debug!(target: "crawl.row", row = %name, state = %RowState::DetailContextRequested);
        let visited = self.visit_detail(session, &trigger).await;

        // The primary context must be active before the next row is resolved.
        let restored = session.restore_primary().await.map_err(|e| match e {
            SessionError::Fatal(_) => e,
            other => SessionError::Fatal(format!("could not restore primary context: {other}")),
        });

        let (profile, visit_error) = match visited {
            Ok((record, detail_url)) => {
                debug!(target: "crawl.row", row = %name, state = %RowState::DetailExtracted, %detail_url);
                let status = DetailStatus::from_record(&record);
                (merge(row, record, detail_url, status), None)
            }
            Err(e) => {
                warn!(target: "crawl.row", row = %name, error = %e, "detail unavailable; emitting listing fields only");
                let profile = merge(
                    row,
                    DetailRecord::default(),
                    DETAIL_URL_NOT_FOUND,
                    DetailStatus::Unavailable {
                        reason: e.to_string(),
                    },
                );
                (profile, e.is_fatal().then_some(e))
            }
        };
        debug!(target: "crawl.row", row = %name, state = %RowState::Merged);

        RowOutcome {
            profile,
            abort: visit_error.or(restored.err()),
        }
    }

    /// Open the row's detail context and read it. Leaves contexts open; the
    /// caller restores the primary context.
    async fn visit_detail<S>(
        &self,
        session: &mut S,
        trigger: &TriggerRef,
    ) -> SessionResult<(DetailRecord, String)>
    where
        S: BrowsingSession + ?Sized,
    {
        let child = self.open_with_retry(session, trigger).await?;
        self.read_detail_context(session, &child).await
    }

    async fn read_detail_context<S>(
        &self,
        session: &mut S,
        child: &ContextHandle,
    ) -> SessionResult<(DetailRecord, String)>
    where
        S: BrowsingSession + ?Sized,
    {
        let timeouts = &self.settings.timeouts;
        let ready = &self.settings.detail.ready;

        session.switch_to(child).await?;

        // The context's URL is only meaningful once the page has settled.
        let mut ready_now = session.wait_for(ready, timeouts.page_load()).await?;
        let mut attempt = 1;
        while !ready_now {
            let url = session.current_url().await?;
            if attempt >= self.settings.retry.attempts {
                return Err(SessionError::NavigationTimeout {
                    url,
                    waited_ms: timeouts.page_load_ms,
                });
            }
            warn!(target: "crawl.detail", %url, attempt, "detail page not ready; reloading");
            self.pacing.backoff(&self.settings.retry, attempt).await;
            attempt += 1;
            ready_now = match session.navigate(&url, ready, timeouts.page_load()).await {
                Ok(()) => true,
                Err(SessionError::NavigationTimeout { .. }) => false,
                Err(e) => return Err(e),
            };
        }
        let url = session.current_url().await?;

        let record = extract_detail(session, &self.detail, timeouts).await?;
        Ok((record, url))
    }

    async fn open_with_retry<S>(
        &self,
        session: &mut S,
        trigger: &TriggerRef,
    ) -> SessionResult<ContextHandle>
    where
        S: BrowsingSession + ?Sized,
    {
        let retry = &self.settings.retry;
        let mut attempt = 1;
        loop {
            match session
                .open_child_context(trigger, self.settings.timeouts.context_open())
                .await
            {
                Ok(child) => return Ok(child),
                Err(e)
                    if e.is_fatal()
                        || matches!(e, SessionError::TriggerNotFound(_))
                        || attempt >= retry.attempts =>
                {
                    return Err(e);
                }
                Err(e) => {
                    warn!(target: "crawl.detail", row = %trigger.row_key, attempt, error = %e, "retrying detail context");
                    // A late window from the failed attempt must not be mistaken for the next one.
                    session.restore_primary().await?;
                    self.pacing.backoff(retry, attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn navigate_with_retry<S>(
        &self,
        session: &mut S,
        url: &str,
        ready: &str,
    ) -> SessionResult<()>
    where
        S: BrowsingSession + ?Sized,
    {
        let retry = &self.settings.retry;
        let mut attempt = 1;
        loop {
            match session
                .navigate(url, ready, self.settings.timeouts.page_load())
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) if e.is_fatal() || attempt >= retry.attempts => return Err(e),
                Err(e) => {
                    warn!(target: "crawl", %url, attempt, error = %e, "retrying navigation");
                    self.pacing.backoff(retry, attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Click the next-page control and wait for a different first row.
    ///
    /// `Ok(false)` when there is no further page.
    async fn advance_page<S>(
        &self,
        session: &mut S,
        current_html: &str,
        page: usize,
    ) -> SessionResult<bool>
    where
        S: BrowsingSession + ?Sized,
    {
        let Some(next) = &self.settings.listing.next_page else {
            return Ok(false);
        };
        if page >= self.settings.max_pages {
            info!(target: "crawl", page, "page limit reached");
            return Ok(false);
        }

        let before = self.listing.first_row_key(current_html);
        if !session.click(next).await? {
            return Ok(false);
        }

        let timeouts = &self.settings.timeouts;
        let deadline = Instant::now() + timeouts.content();
        loop {
            let html = session.page_source().await?;
            let first = self.listing.first_row_key(&html);
            if first.is_some() && first != before {
                debug!(target: "crawl", page = page + 1, "next page rendered");
                return Ok(true);
            }
            if Instant::now() >= deadline {
                warn!(target: "crawl", page, "next page did not render; stopping");
                return Ok(false);
            }
            sleep(timeouts.poll()).await;
        }
    }

    fn emit<K>(
        &self,
        sink: &mut K,
        profile: &FacultyProfile,
        summary: &mut CrawlSummary,
    ) -> anyhow::Result<()>
    where
        K: RecordSink + ?Sized,
    {
        sink.write_profile(profile)?;
        summary.record(&profile.detail_status);
        info!(
            target: "crawl.row",
            row = %profile.english_name,
            chinese_name = %profile.chinese_name,
            title = %profile.title,
            department = %profile.department,
            email = %profile.email,
            detail_url = %profile.detail_url,
            status = ?profile.detail_status,
            state = %RowState::Emitted,
            "profile emitted"
        );

        if let Some(graduate) = derive_graduate_year(profile, &self.age) {
            sink.write_graduate(&graduate)?;
            summary.graduate_records += 1;
            info!(
                target: "crawl.row",
                row = %graduate.english_name,
                graduate_year = graduate.graduate_year,
                estimated_age = graduate.estimated_age,
                "graduate-year record emitted"
            );
        }
        Ok(())
    }

    fn finish<K>(&self, sink: &mut K, summary: &mut CrawlSummary)
    where
        K: RecordSink + ?Sized,
    {
        if let Err(e) = sink.flush() {
            error!(target: "sink", error = %e, "flush failed");
            if !summary.is_aborted() {
                summary.outcome = CrawlOutcome::Aborted {
                    reason: format!("sink flush failed: {e:#}"),
                };
            }
        }
    }
}
