//! Detail extraction inside an opened detail context.

use faculty_common::{Absence, DetailRecord, Field, SessionResult, Timeouts};
use faculty_drivers::BrowsingSession;
use faculty_extract::DetailParser;
use tracing::{debug, warn};

/// Read a [`DetailRecord`] from the active context of `session`.
///
/// Missing markup never fails: each field falls back to `Absent`. Only
/// errors that make the page unreadable (the first snapshot, or a fatal
/// session error) are returned.
pub async fn extract_detail<S>(
    session: &mut S,
    parser: &DetailParser,
    timeouts: &Timeouts,
) -> SessionResult<DetailRecord>
where
    S: BrowsingSession + ?Sized,
{
    let selectors = parser.selectors();
    if !session.wait_for(&selectors.ready, timeouts.content()).await? {
        debug!(target: "crawl.detail", selector = %selectors.ready, "ready marker missing; reading what rendered");
    }

    let html = session.page_source().await?;
    let snapshot = parser.parse(&html);
    let tab_count = snapshot.tab_count;

    let research_interests = if tab_count == 0 {
        Field::Present(Vec::new())
    } else {
        match research_panel(session, parser, timeouts, tab_count - 1).await {
            Ok(field) => field,
            Err(e) if !e.is_fatal() => {
                warn!(target: "crawl.detail", error = %e, "research interests unreadable");
                Field::Absent(Absence::Unreadable {
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e),
        }
    };

    Ok(snapshot.into_record(research_interests))
}

/// Activate tab `index`, wait for its items and read them.
async fn research_panel<S>(
    session: &mut S,
    parser: &DetailParser,
    timeouts: &Timeouts,
    index: usize,
) -> SessionResult<Field<Vec<String>>>
where
    S: BrowsingSession + ?Sized,
{
    let selectors = parser.selectors();
    let control = selectors.tab_control_for(index);
    if !session.click(&control).await? {
        return Ok(Field::missing(&control));
    }

    let items = selectors.interest_items_for(index);
    if !session.wait_for(&items, timeouts.content()).await? {
        debug!(target: "crawl.detail", selector = %items, "research panel stayed empty");
    }

    let html = session.page_source().await?;
    Ok(parser.parse_research_interests(&html, index))
}
