//! Driver layer: the browsing session used by the crawler.
//!
//! - [`browser::session::BrowsingSession`]: the session contract (navigate,
//!   condition waits, child-context lifecycle)
//! - [`browser::driver::WebDriverSession`]: `fantoccini`-backed implementation
//! - [`browser::capabilities`]: Chrome/Firefox capability construction
//! - [`browser::pacing::Pacing`]: jittered pauses and retry backoff
pub mod browser;

pub use browser::driver::WebDriverSession;
pub use browser::pacing::Pacing;
pub use browser::session::{BrowsingSession, ContextHandle};
