//! 一括入力の実行制御
//!
//! Opens the browser, logs in, picks the database, then feeds every row to
//! the [`RowProcessor`] in sheet order. Login and database selection failures
//! end the run; row failures do not. The browser is closed on every path
//! after it was opened.

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::browser::{SessionLauncher, UiSession};
use crate::config::{Config, Timing};
use crate::error::Result;
use crate::processor::{select_closest, RowOutcome, RowProcessor, RowSinks};
use crate::report::UnmatchedSink;
use crate::resilient::{click_when_visible, perform};
use crate::site::SiteProfile;
use chrono::FixedOffset;
use indicatif::{ProgressBar, ProgressStyle};
use pavement_entry_common::{AliasConfig, Row, RowIdentity};
use tracing::{info, warn};

/// Everything a run needs besides the rows and the sinks
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub username: String,
    pub password: String,
    /// fuzzy-matched against the database dropdown
    pub target_database: String,
    pub site: SiteProfile,
    pub timing: Timing,
    pub aliases: AliasConfig,
    pub min_score: f64,
    pub offset: FixedOffset,
    pub show_progress: bool,
}

impl RunSettings {
    pub fn from_config(config: &Config, password: String) -> Result<Self> {
        Ok(Self {
            username: config.username.clone(),
            password,
            target_database: config.target_database_name.clone(),
            site: config.site.clone(),
            timing: config.timing.clone(),
            aliases: config.matching.alias_table()?,
            min_score: config.matching.min_score,
            offset: config.audit_offset()?,
            show_progress: true,
        })
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub database: String,
    pub outcomes: Vec<RowOutcome>,
}

impl RunSummary {
    pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
        self.outcomes.iter().filter(|o| !o.is_submitted())
    }
}

pub struct RunController {
    settings: RunSettings,
}

impl RunController {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Runs the whole entry.
    ///
    /// # Errors
    /// [`crate::error::EntryError::Session`] when the browser cannot be
    /// opened, the login fails or no database can be selected. Row failures
    /// are counted in the summary instead.
    pub async fn run<L: SessionLauncher>(
        &self,
        launcher: &L,
        rows: &[Row],
        audit: &mut dyn AuditSink,
        unmatched: &mut dyn UnmatchedSink,
    ) -> Result<RunSummary> {
        unmatched.reset()?;

        println!("[2/4] Opening browser...");
        let mut session = launcher
            .launch()
            .await
            .map_err(|e| e.into_session("browser launch"))?;
        println!("✔ Browser ready\n");

        let result = self.drive(&mut session, rows, audit, unmatched).await;

        if let Err(e) = session.close().await {
            warn!("Browser did not close cleanly: {}", e);
        }
        result
    }

    async fn drive<S: UiSession>(
        &self,
        session: &mut S,
        rows: &[Row],
        audit: &mut dyn AuditSink,
        unmatched: &mut dyn UnmatchedSink,
    ) -> Result<RunSummary> {
        println!("[3/4] Logging in as {}...", self.settings.username);
        self.authenticate(session)
            .await
            .map_err(|e| e.into_session("login"))?;
        let database = self
            .select_workspace(session, audit)
            .await
            .map_err(|e| e.into_session("database selection"))?;
        println!("✔ Database: {}\n", database);

        println!("[4/4] Entering {} section(s)...", rows.len());
        let mut summary = self.process_rows(session, rows, audit, unmatched).await;
        summary.database = database;
        Ok(summary)
    }

    pub async fn authenticate<S: UiSession>(&self, session: &mut S) -> Result<()> {
        let site = &self.settings.site;
        let timing = &self.settings.timing;

        session.goto(&site.login_url).await?;
        session
            .wait_for_visible(&site.login.username, timing.wait_timeout())
            .await?;
        session
            .fill(&site.login.username, &self.settings.username)
            .await?;
        session
            .fill(&site.login.password, &self.settings.password)
            .await?;

        click_when_visible(
            session,
            timing.retry_policy(),
            &site.login.submit,
            timing.wait_timeout(),
        )
        .await?;
        session
            .wait_for_navigation(timing.navigation_timeout())
            .await?;

        info!("Logged in, waiting {:?} for the landing page", timing.login_settle());
        tokio::time::sleep(timing.login_settle()).await;
        Ok(())
    }

    /// Opens the database picker, selects the closest database and navigates
    /// to the section list. Returns the selected database label.
    pub async fn select_workspace<S: UiSession>(
        &self,
        session: &mut S,
        audit: &mut dyn AuditSink,
    ) -> Result<String> {
        let ws = &self.settings.site.workspace;
        let timing = &self.settings.timing;
        let policy = timing.retry_policy();
        let wait = timing.wait_timeout();

        click_when_visible(session, policy, &ws.admin_menu_toggle, wait).await?;
        session.wait_for_visible(&ws.admin_menu_open, wait).await?;
        click_when_visible(session, policy, &ws.open_database_link, wait).await?;
        tokio::time::sleep(timing.menu_settle()).await;
        session.wait_for_visible(&ws.database_dropdown, wait).await?;

        let matched = perform(session, policy, "select database", |s| {
            let selector = ws.database_dropdown.clone();
            let target = self.settings.target_database.clone();
            Box::pin(async move { select_closest(s, &selector, &target).await })
        })
        .await?
        .value;

        info!(
            "Database {:?} matched {:?} (score {:.2})",
            self.settings.target_database, matched.option.label, matched.score
        );
        if matched.score < self.settings.min_score {
            warn!(
                "Weak database match; check targetDatabaseName ({:.2} < {:.2})",
                matched.score, self.settings.min_score
            );
        }

        let entry = AuditEntry::now(
            self.settings.offset,
            AuditAction::WorkspaceSelected(matched.option.label.clone()),
            RowIdentity::default(),
        );
        if let Err(e) = audit.append(entry) {
            warn!("Audit write failed: {}", e);
        }

        click_when_visible(session, policy, &ws.sections_menu_toggle, wait).await?;
        session.wait_for_visible(&ws.sections_menu_open, wait).await?;
        click_when_visible(session, policy, &ws.section_list_link, wait).await?;
        session.wait_for_visible(&ws.section_list_ready, wait).await?;

        Ok(matched.option.label)
    }

    /// Processes every row in order; a failed row never stops the loop
    pub async fn process_rows<S: UiSession>(
        &self,
        session: &mut S,
        rows: &[Row],
        audit: &mut dyn AuditSink,
        unmatched: &mut dyn UnmatchedSink,
    ) -> RunSummary {
        let settings = &self.settings;
        let processor = RowProcessor::new(
            &settings.site.section_form,
            &settings.timing,
            &settings.aliases,
            settings.min_score,
            settings.offset,
        );
        let mut sinks = RowSinks { audit, unmatched };
        let progress = progress_bar(rows.len(), settings.show_progress);

        let mut summary = RunSummary::default();
        for (index, row) in rows.iter().enumerate() {
            let outcome = processor.process(session, index, row, &mut sinks).await;

            summary.attempted += 1;
            if outcome.is_submitted() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            progress.set_message(format!("✔ {} ✘ {}", summary.succeeded, summary.failed));
            progress.inc(1);
            summary.outcomes.push(outcome);

            if index + 1 < rows.len() {
                tokio::time::sleep(settings.timing.row_pause()).await;
            }
        }
        progress.finish_and_clear();

        summary
    }
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len as u64);
    let style = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} rows  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}
