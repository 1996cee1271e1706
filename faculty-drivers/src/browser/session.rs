use async_trait::async_trait;
use faculty_common::{SessionResult, TriggerRef};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Opaque handle to one browsing context (window or tab) of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextHandle(Uuid);

impl ContextHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0.simple())
    }
}

/// One controllable browser, driven by a single owner.
///
/// All waits are condition-based and bounded by the `timeout` passed in;
/// implementations never sleep for a fixed settle period. Every method acts
/// on the currently active context.
#[async_trait]
pub trait BrowsingSession: Send {
    /// The context that was active when the session opened.
    fn primary_context(&self) -> ContextHandle;

    /// Load `url`, then wait until `ready_selector` matches.
    ///
    /// Fails with `NavigationTimeout` if the page does not become ready in time.
    async fn navigate(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> SessionResult<()>;

    /// Poll until `selector` matches. `Ok(false)` when the bound elapses.
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<bool>;

    /// Click the first element matching `selector`. `Ok(false)` if none exists.
    async fn click(&mut self, selector: &str) -> SessionResult<bool>;

    async fn page_source(&mut self) -> SessionResult<String>;

    async fn current_url(&mut self) -> SessionResult<String>;

    /// Activate the row trigger and return the context it opens.
    ///
    /// The trigger is resolved by row key, never by list position alone.
    /// Fails with `ContextNotOpened` when no new context appears in time. The
    /// new context is not activated.
    async fn open_child_context(
        &mut self,
        trigger: &TriggerRef,
        timeout: Duration,
    ) -> SessionResult<ContextHandle>;

    async fn switch_to(&mut self, context: &ContextHandle) -> SessionResult<()>;

    /// Close a non-primary context. The active context is undefined afterwards.
    async fn close_context(&mut self, context: &ContextHandle) -> SessionResult<()>;

    /// Close every non-primary context and activate the primary one.
    async fn restore_primary(&mut self) -> SessionResult<()>;
}
