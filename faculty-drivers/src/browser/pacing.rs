use faculty_common::{PacingSettings, RetryPolicy};
use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, Default)]
/// Jittered pauses between rows and between retry attempts.
pub struct Pacing {
    settings: PacingSettings,
}

impl Pacing {
    pub fn new(settings: PacingSettings) -> Self {
        Self { settings }
    }

    /// Sleep a random duration in `[min_ms, max_ms]`; no-op when `max_ms` is 0.
    pub async fn between_rows(&self) {
        if self.settings.max_ms == 0 {
            return;
        }
        let min = self.settings.min_ms.min(self.settings.max_ms);
        let ms = OsRng.gen_range(min..=self.settings.max_ms);
        sleep(Duration::from_millis(ms)).await;
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_delay(&self, policy: &RetryPolicy, attempt: u32) -> Duration {
        if policy.backoff_ms == 0 {
            return Duration::ZERO;
        }
        let exp = policy
            .backoff_ms
            .saturating_mul(1u64 << attempt.saturating_sub(1).min(6));
        let jitter = OsRng.gen_range(0..=policy.backoff_ms / 2);
        Duration::from_millis(exp + jitter)
    }

    pub async fn backoff(&self, policy: &RetryPolicy, attempt: u32) {
        let delay = self.backoff_delay(policy, attempt);
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}
