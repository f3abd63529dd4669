//! Yield point between auto-proceeding steps.
//!
//! The scheduler awaits a [`Pacer`] after each successful step before it
//! dispatches the next one. This hands control back to the runtime so
//! observers and other plans can make progress. Tests swap in
//! [`YieldPacer`] to run plans without real delays.

use std::time::Duration;

use async_trait::async_trait;

/// Default pause between auto-proceeding steps.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(100);

#[async_trait]
pub trait Pacer: Send + Sync {
    async fn between_steps(&self);
}

/// Sleeps for a fixed delay between steps.
#[derive(Debug, Clone, Copy)]
pub struct DelayPacer {
    delay: Duration,
}

impl DelayPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for DelayPacer {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}

#[async_trait]
impl Pacer for DelayPacer {
    async fn between_steps(&self) {
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Yields to the runtime once without sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct YieldPacer;

#[async_trait]
impl Pacer for YieldPacer {
    async fn between_steps(&self) {
        tokio::task::yield_now().await;
    }
}
