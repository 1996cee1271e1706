//! Crawl orchestration for the faculty directory.
//!
//! [`Crawler`] walks the listing of one [`BrowsingSession`] in document
//! order, opens each row's detail context, extracts and merges the fields and
//! streams the results into a [`RecordSink`]. It never holds more than one
//! detail context open and always restores the primary context before moving
//! to the next row.
//!
//! ```rust,no_run
//! use faculty_crawl::{CrawlSettings, Crawler, MemorySink};
//! use faculty_drivers::BrowsingSession;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo(session: &mut dyn BrowsingSession) -> anyhow::Result<()> {
//! let crawler = Crawler::new(CrawlSettings::new("https://faculty.example.edu/"))?;
//! let mut sink = MemorySink::new();
//! let summary = crawler.run(session, &mut sink, &CancellationToken::new()).await;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! [`BrowsingSession`]: faculty_drivers::BrowsingSession

pub mod aggregate;
pub mod crawler;
pub mod detail;
pub mod sink;
pub mod summary;

pub use aggregate::{derive_graduate_year, merge};
pub use crawler::{CrawlSettings, Crawler};
pub use detail::extract_detail;
pub use sink::{MemorySink, RecordSink};
pub use summary::{CrawlOutcome, CrawlSummary};
