//! Chromium session over CDP (chromiumoxide)

use super::{SessionLauncher, UiSession};
use crate::error::{EntryError, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use pavement_entry_common::DropdownOption;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Launches Chromium with a throwaway profile
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    pub headless: bool,
}

impl ChromeLauncher {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    async fn launch(&self) -> Result<ChromeSession> {
        ChromeSession::launch(self.headless).await
    }
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: Option<JoinHandle<()>>,
    profile_dir: PathBuf,
}

impl ChromeSession {
    pub async fn launch(headless: bool) -> Result<Self> {
        let profile_dir = temp_profile_dir()?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&profile_dir);

        if headless {
            info!("Launching Chromium (headless)");
        } else {
            info!("Launching Chromium (visible)");
            builder = builder.with_head();
        }

        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            info!("Using Chrome binary from CHROME_BIN: {}", chrome_bin);
            builder = builder.chrome_executable(chrome_bin);
        }

        let config = match builder.build() {
            Ok(config) => config,
            Err(e) => {
                remove_profile_dir(&profile_dir);
                return Err(EntryError::Browser(format!("invalid browser config: {}", e)));
            }
        };

        let (mut browser, mut handler) = match Browser::launch(config).await {
            Ok(launched) => launched,
            Err(e) => {
                remove_profile_dir(&profile_dir);
                return Err(EntryError::Browser(format!("failed to launch Chromium: {}", e)));
            }
        };

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("CDP handler error (ignored): {}", e);
                }
            }
            debug!("CDP handler loop ended");
        });

        let page = match open_page(&browser).await {
            Ok(page) => page,
            Err(e) => {
                shutdown(&mut browser, handler_task, &profile_dir).await;
                return Err(e);
            }
        };

        Ok(Self {
            browser,
            page,
            handler_task: Some(handler_task),
            profile_dir,
        })
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EntryError::Browser(format!("script failed: {}", e)))?;
        Ok(result.into_value::<T>()?)
    }

    /// Like [`Self::eval`], but a `null` result reads as a missing element
    async fn eval_element<T: DeserializeOwned>(&self, selector: &str, script: String) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EntryError::Browser(format!("script failed: {}", e)))?;
        element_value(selector, result.value())
    }
}

fn element_value<T: DeserializeOwned>(selector: &str, value: Option<&serde_json::Value>) -> Result<T> {
    match value {
        None | Some(serde_json::Value::Null) => Err(EntryError::ElementNotFound(selector.to_string())),
        Some(value) => Ok(serde_json::from_value(value.clone())?),
    }
}

async fn open_page(browser: &Browser) -> Result<Page> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| EntryError::Browser(format!("failed to open page: {}", e)))?;
    accept_native_dialogs(&page).await?;
    Ok(page)
}

async fn shutdown(browser: &mut Browser, handler_task: JoinHandle<()>, profile_dir: &Path) {
    if let Err(e) = browser.close().await {
        warn!("Browser close failed: {}", e);
    }
    if let Err(e) = handler_task.await {
        warn!("CDP handler task failed: {}", e);
    }
    remove_profile_dir(profile_dir);
}

fn remove_profile_dir(profile_dir: &Path) {
    if let Err(e) = std::fs::remove_dir_all(profile_dir) {
        debug!("Profile cleanup failed for {}: {}", profile_dir.display(), e);
    }
}

/// Native `alert`/`confirm` boxes would block every later CDP call
async fn accept_native_dialogs(page: &Page) -> Result<()> {
    let mut dialogs = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| EntryError::Browser(format!("dialog listener: {}", e)))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialogs.next().await {
            info!("Accepting native dialog: {}", event.message);
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                warn!("Failed to accept dialog: {}", e);
            }
        }
    });
    Ok(())
}

fn temp_profile_dir() -> Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| EntryError::Browser(format!("system clock: {}", e)))?
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "pavement-entry-profile-{}-{}",
        std::process::id(),
        nanos
    ));
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Selector as a JS string literal
fn js_str(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn visible_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            const rect = el.getBoundingClientRect();
            return style.display !== 'none'
                && style.visibility !== 'hidden'
                && (rect.width > 0 || rect.height > 0);
        }})()"#,
        sel = js_str(selector)
    )
}

fn clear_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el) return false;
            el.value = '';
            return true;
        }})()"#,
        sel = js_str(selector)
    )
}

fn options_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el || !el.options) return null;
            return Array.from(el.options).map(o => ({{ value: o.value, label: o.text }}));
        }})()"#,
        sel = js_str(selector)
    )
}

fn select_script(selector: &str, value: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            if (!el || !el.options) return false;
            const option = Array.from(el.options).find(o => o.value === {val});
            if (!option) return false;
            option.selected = true;
            el.value = option.value;
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return true;
        }})()"#,
        sel = js_str(selector),
        val = js_str(value)
    )
}

fn text_script(selector: &str) -> String {
    format!(
        r#"(() => {{
            const el = document.querySelector({sel});
            return el ? (el.innerText || el.textContent || '').trim() : null;
        }})()"#,
        sel = js_str(selector)
    )
}

#[async_trait]
impl UiSession for ChromeSession {
    async fn goto(&mut self, url: &str) -> Result<()> {
        info!("Navigating to {}", url);
        self.page
            .goto(url)
            .await
            .map_err(|e| EntryError::Browser(format!("navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn wait_for_navigation(&mut self, timeout: Duration) -> Result<()> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(EntryError::Browser(format!("navigation failed: {}", e))),
            Err(_) => Err(EntryError::Timeout {
                what: "navigation".into(),
                seconds: timeout.as_secs_f64(),
            }),
        }
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        self.eval(visible_script(selector)).await
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| EntryError::ElementNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| EntryError::Browser(format!("click on {} failed: {}", selector, e)))?;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        let found: bool = self.eval(clear_script(selector)).await?;
        if !found {
            return Err(EntryError::ElementNotFound(selector.to_string()));
        }
        if value.is_empty() {
            return Ok(());
        }

        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| EntryError::ElementNotFound(selector.to_string()))?;
        element
            .click()
            .await
            .map_err(|e| EntryError::Browser(format!("focus on {} failed: {}", selector, e)))?
            .type_str(value)
            .await
            .map_err(|e| EntryError::Browser(format!("typing into {} failed: {}", selector, e)))?;
        Ok(())
    }

    async fn options(&mut self, selector: &str) -> Result<Vec<DropdownOption>> {
        self.eval_element(selector, options_script(selector)).await
    }

    async fn select(&mut self, selector: &str, value: &str) -> Result<()> {
        let selected: bool = self.eval(select_script(selector, value)).await?;
        if selected {
            Ok(())
        } else {
            Err(EntryError::ElementNotFound(format!(
                "{} option value {:?}",
                selector, value
            )))
        }
    }

    async fn text(&mut self, selector: &str) -> Result<String> {
        self.eval_element(selector, text_script(selector)).await
    }

    async fn close(&mut self) -> Result<()> {
        let Some(handler_task) = self.handler_task.take() else {
            return Ok(());
        };

        info!("Closing Chromium");
        shutdown(&mut self.browser, handler_task, &self.profile_dir).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_is_quoted() {
        let script = visible_script(r#"a[title="x"]"#);
        assert!(script.contains(r#"document.querySelector("a[title=\"x\"]")"#));
    }

    #[test]
    fn test_null_result_is_missing_element() {
        let missing: Result<Vec<DropdownOption>> =
            element_value("#cboSurfaceType", Some(&serde_json::Value::Null));
        assert!(matches!(missing, Err(EntryError::ElementNotFound(s)) if s == "#cboSurfaceType"));

        let absent: Result<String> = element_value("#lblError", None);
        assert!(matches!(absent, Err(EntryError::ElementNotFound(_))));

        let options: Vec<DropdownOption> = element_value(
            "#cboSurfaceType",
            Some(&serde_json::json!([{"value": "AC", "label": "Asphalt Concrete"}])),
        )
        .unwrap();
        assert_eq!(options, vec![DropdownOption::new("AC", "Asphalt Concrete")]);
    }

    /// 起動失敗時もプロファイルを残さない
    #[tokio::test]
    async fn test_failed_launch_removes_profile() {
        let prefix = format!("pavement-entry-profile-{}-", std::process::id());
        let profiles = || {
            std::fs::read_dir(std::env::temp_dir())
                .unwrap()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
                .count()
        };
        let before = profiles();

        std::env::set_var("CHROME_BIN", "/nonexistent/chromium");
        let result = ChromeSession::launch(true).await;
        std::env::remove_var("CHROME_BIN");

        assert!(matches!(result, Err(EntryError::Browser(_))));
        assert_eq!(profiles(), before);
    }

    #[test]
    fn test_select_script_compares_value() {
        let script = select_script("#cboDBName", "42");
        assert!(script.contains(r#"o.value === "42""#));
        assert!(script.contains("new Event('change'"));
    }
}
