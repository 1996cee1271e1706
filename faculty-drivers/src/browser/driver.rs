use crate::browser::{
    capabilities::build_capabilities,
    session::{BrowsingSession, ContextHandle},
};
use async_trait::async_trait;
use fantoccini::{
    elements::Element,
    error::CmdError,
    wd::WindowHandle,
    Client, ClientBuilder, Locator,
};
use faculty_common::{BrowserSettings, SessionError, SessionResult, Timeouts, TriggerRef};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// What remains of a budget ending at `deadline`; zero once it has passed.
fn time_left(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

/// Map a WebDriver command failure onto the session error taxonomy.
fn classify(err: CmdError) -> SessionError {
    match &err {
        CmdError::Lost(..) => SessionError::Fatal(err.to_string()),
        _ => {
            let msg = err.to_string();
            if msg.contains("invalid session id") || msg.contains("session deleted") {
                SessionError::Fatal(msg)
            } else {
                SessionError::Command(msg)
            }
        }
    }
}

fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`BrowsingSession`] over a `fantoccini` WebDriver client.
///
/// Browsing contexts are browser windows; the window active at connect time
/// is the primary context.
pub struct WebDriverSession {
    client: Client,
    primary: ContextHandle,
    contexts: HashMap<ContextHandle, WindowHandle>,
    poll: Duration,
}

impl WebDriverSession {
    /// Connect to the WebDriver service named in `settings.webdriver_url`.
    pub async fn open(settings: &BrowserSettings, timeouts: &Timeouts) -> SessionResult<Self> {
        let client = ClientBuilder::native()
            .capabilities(build_capabilities(settings))
            .connect(&settings.webdriver_url)
            .await
            .map_err(|e| {
                SessionError::Fatal(format!(
                    "cannot start session at {}: {e}",
                    settings.webdriver_url
                ))
            })?;

        let window = client.window().await.map_err(classify)?;
        let primary = ContextHandle::new();
        let mut contexts = HashMap::new();
        contexts.insert(primary.clone(), window);

        info!(
            target: "browser.session",
            endpoint = %settings.webdriver_url,
            kind = ?settings.kind,
            headless = settings.headless,
            "browser session opened"
        );

        Ok(Self {
            client,
            primary,
            contexts,
            poll: timeouts.poll(),
        })
    }

    /// End the WebDriver session and close the browser.
    pub async fn shutdown(self) -> SessionResult<()> {
        self.client.close().await.map_err(classify)
    }

    fn window_of(&self, context: &ContextHandle) -> SessionResult<WindowHandle> {
        self.contexts
            .get(context)
            .cloned()
            .ok_or_else(|| SessionError::Command(format!("unknown browsing context {context}")))
    }

    /// Find the row whose key text equals `trigger.row_key` and return its control.
    async fn locate_trigger(&self, trigger: &TriggerRef) -> SessionResult<Element> {
        let rows = self
            .client
            .find_all(Locator::Css(&trigger.row_selector))
            .await
            .map_err(classify)?;

        let mut order: Vec<usize> = Vec::with_capacity(rows.len());
        if trigger.ordinal_hint < rows.len() {
            order.push(trigger.ordinal_hint);
        }
        order.extend((0..rows.len()).filter(|i| *i != trigger.ordinal_hint));

        for idx in order {
            let row = &rows[idx];
            let key = match row.find(Locator::Css(&trigger.key_selector)).await {
                Ok(el) => el.text().await.map_err(classify)?,
                Err(e) if e.is_no_such_element() => continue,
                Err(e) => return Err(classify(e)),
            };
            if normalize_text(&key) != trigger.row_key.as_str() {
                continue;
            }
            if idx != trigger.ordinal_hint {
                debug!(
                    target: "browser.session",
                    row = %trigger.row_key,
                    hint = trigger.ordinal_hint,
                    found = idx,
                    "row moved since listing was parsed"
                );
            }
            return match row.find(Locator::Css(&trigger.control_selector)).await {
                Ok(control) => Ok(control),
                Err(e) if e.is_no_such_element() => {
                    Err(SessionError::TriggerNotFound(trigger.row_key.to_string()))
                }
                Err(e) => Err(classify(e)),
            };
        }

        Err(SessionError::TriggerNotFound(trigger.row_key.to_string()))
    }
}

#[async_trait]
impl BrowsingSession for WebDriverSession {
    fn primary_context(&self) -> ContextHandle {
        self.primary.clone()
    }

    async fn navigate(
        &mut self,
        url: &str,
        ready_selector: &str,
        timeout: Duration,
    ) -> SessionResult<()> {
        let timed_out = || SessionError::NavigationTimeout {
            url: url.to_string(),
            waited_ms: timeout.as_millis() as u64,
        };

        // Loading and the ready wait share one budget.
        let deadline = Instant::now() + timeout;
        debug!(target: "browser.session", %url, "navigating");
        match tokio::time::timeout_at(deadline, self.client.goto(url)).await {
            Err(_) => return Err(timed_out()),
            Ok(result) => result.map_err(classify)?,
        }

        if self.wait_for(ready_selector, time_left(deadline)).await? {
            Ok(())
        } else {
            Err(timed_out())
        }
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> SessionResult<bool> {
        let waited = self
            .client
            .wait()
            .at_most(timeout)
            .every(self.poll)
            .for_element(Locator::Css(selector))
            .await;
        match waited {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => {
                debug!(target: "browser.session", %selector, ?timeout, "wait elapsed");
                Ok(false)
            }
            Err(e) => Err(classify(e)),
        }
    }

    async fn click(&mut self, selector: &str) -> SessionResult<bool> {
        match self.client.find(Locator::Css(selector)).await {
            Ok(el) => {
                el.click().await.map_err(classify)?;
                Ok(true)
            }
            Err(e) if e.is_no_such_element() => Ok(false),
            Err(e) => Err(classify(e)),
        }
    }

    async fn page_source(&mut self) -> SessionResult<String> {
        self.client.source().await.map_err(classify)
    }

    async fn current_url(&mut self) -> SessionResult<String> {
        self.client
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(classify)
    }

    async fn open_child_context(
        &mut self,
        trigger: &TriggerRef,
        timeout: Duration,
    ) -> SessionResult<ContextHandle> {
        let before = self.client.windows().await.map_err(classify)?;
        let control = self.locate_trigger(trigger).await?;
        control.click().await.map_err(classify)?;

        let deadline = Instant::now() + timeout;
        loop {
            let now = self.client.windows().await.map_err(classify)?;
            if let Some(window) = now.into_iter().find(|w| !before.contains(w)) {
                let handle = ContextHandle::new();
                self.contexts.insert(handle.clone(), window);
                debug!(target: "browser.session", row = %trigger.row_key, context = %handle, "child context opened");
                return Ok(handle);
            }
            if Instant::now() >= deadline {
                return Err(SessionError::ContextNotOpened {
                    row: trigger.row_key.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            sleep(self.poll).await;
        }
    }

    async fn switch_to(&mut self, context: &ContextHandle) -> SessionResult<()> {
        let window = self.window_of(context)?;
        self.client.switch_to_window(window).await.map_err(classify)
    }

    async fn close_context(&mut self, context: &ContextHandle) -> SessionResult<()> {
        if *context == self.primary {
            return Err(SessionError::Command(
                "refusing to close the primary context".to_string(),
            ));
        }
        self.switch_to(context).await?;
        self.client.close_window().await.map_err(classify)?;
        self.contexts.remove(context);
        Ok(())
    }

    async fn restore_primary(&mut self) -> SessionResult<()> {
        let primary = self.window_of(&self.primary)?;
        let open = self.client.windows().await.map_err(classify)?;
        if !open.contains(&primary) {
            return Err(SessionError::Fatal(
                "primary browsing context was closed".to_string(),
            ));
        }

        for window in open.into_iter().filter(|w| *w != primary) {
            self.client
                .switch_to_window(window)
                .await
                .map_err(classify)?;
            if let Err(e) = self.client.close_window().await {
                warn!(target: "browser.session", error = %e, "failed to close stray context");
            }
        }

        let primary_handle = self.primary.clone();
        self.contexts.retain(|handle, _| *handle == primary_handle);
        self.client
            .switch_to_window(primary)
            .await
            .map_err(classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_text_is_normalized() {
        assert_eq!(normalize_text("  Alice \n CHEN "), "Alice CHEN");
    }

    #[tokio::test]
    async fn remaining_budget_shrinks_to_zero() {
        let budget = Duration::from_secs(1);
        let left = time_left(Instant::now() + budget);
        assert!(left > Duration::ZERO && left <= budget);

        let past = Instant::now() - Duration::from_millis(10);
        assert_eq!(time_left(past), Duration::ZERO);
        assert_eq!(time_left(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn wait_timeout_is_not_fatal() {
        assert!(!classify(CmdError::WaitTimeout).is_fatal());
    }
}
