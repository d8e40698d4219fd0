//! ブラウザ操作
//!
//! [`UiSession`] is the only surface the runner drives. The Chromium
//! implementation lives in [`chrome`]; tests use a scripted fake.

pub mod chrome;

use crate::error::{EntryError, Result};
use async_trait::async_trait;
use pavement_entry_common::DropdownOption;
use std::time::Duration;

pub use chrome::{ChromeLauncher, ChromeSession};

/// Interval between visibility checks while waiting
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One browser page. Every method is a suspension point; none blocks the
/// runtime, and every wait is bounded by the caller's timeout.
#[async_trait]
pub trait UiSession: Send {
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Waits for the navigation started by the last action
    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<()>;

    /// `true` when `selector` matches a rendered, non-hidden element
    async fn is_visible(&mut self, selector: &str) -> Result<bool>;

    /// Polls [`UiSession::is_visible`] until it holds or `timeout` elapses.
    ///
    /// # Errors
    /// [`EntryError::Timeout`] when the element never shows.
    async fn wait_for_visible(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, poll_visible(self, selector)).await {
            Ok(result) => result,
            Err(_) => Err(EntryError::Timeout {
                what: selector.to_string(),
                seconds: timeout.as_secs_f64(),
            }),
        }
    }

    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Replaces the content of a text input
    async fn fill(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Options of a `<select>`, read from the live page on every call
    async fn options(&mut self, selector: &str) -> Result<Vec<DropdownOption>>;

    /// Selects the option with `value` and fires `change`
    async fn select(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Trimmed text content of the element
    async fn text(&mut self, selector: &str) -> Result<String>;

    /// Releases the page and the browser behind it
    async fn close(&mut self) -> Result<()>;
}

async fn poll_visible<S: UiSession + ?Sized>(session: &mut S, selector: &str) -> Result<()> {
    loop {
        if session.is_visible(selector).await? {
            return Ok(());
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Opens sessions. Separate from [`UiSession`] so the run can own the
/// acquire/release pair.
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: UiSession;

    async fn launch(&self) -> Result<Self::Session>;
}
