//! 行処理
//!
//! One spreadsheet row goes `Pending → Normalizing → Filling → Submitted`, or
//! to `Failed` from any step. A failure ends only that row: it is logged,
//! audited with the row's identifying fields and returned as the outcome.

use crate::audit::{AuditAction, AuditEntry, AuditSink};
use crate::browser::UiSession;
use crate::config::Timing;
use crate::error::{EntryError, Result};
use crate::report::{UnmatchedReason, UnmatchedRow, UnmatchedSink};
use crate::resilient::{click_when_visible, perform, RetryPolicy};
use crate::site::{FieldBinding, InputKind, SectionFormSelectors};
use chrono::FixedOffset;
use pavement_entry_common::{
    select_best, AliasConfig, MatchResult, Row, RowIdentity, SectionField, SectionRecord,
};
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Pending,
    Normalizing,
    Filling,
    Submitted,
    Failed,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowState::Pending => "pending",
            RowState::Normalizing => "normalizing",
            RowState::Filling => "filling",
            RowState::Submitted => "submitted",
            RowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct RowOutcome {
    /// 0-based position among the data rows
    pub index: usize,
    /// row number in the source sheet, when known
    pub sheet_row: Option<usize>,
    pub identity: RowIdentity,
    /// `Submitted` or `Failed`
    pub state: RowState,
    pub error: Option<EntryError>,
    /// retries spent across every action of the row
    pub retries: u32,
}

impl RowOutcome {
    pub fn is_submitted(&self) -> bool {
        self.state == RowState::Submitted
    }

    /// Sheet row when known, otherwise the 1-based data row
    pub fn location(&self) -> String {
        match self.sheet_row {
            Some(row) => format!("sheet row {}", row),
            None => format!("data row {}", self.index + 1),
        }
    }
}

/// Sinks a row reports into
pub struct RowSinks<'s> {
    pub audit: &'s mut dyn AuditSink,
    pub unmatched: &'s mut dyn UnmatchedSink,
}

pub struct RowProcessor<'a> {
    form: &'a SectionFormSelectors,
    timing: &'a Timing,
    aliases: &'a AliasConfig,
    min_score: f64,
    offset: FixedOffset,
}

impl<'a> RowProcessor<'a> {
    pub fn new(
        form: &'a SectionFormSelectors,
        timing: &'a Timing,
        aliases: &'a AliasConfig,
        min_score: f64,
        offset: FixedOffset,
    ) -> Self {
        Self {
            form,
            timing,
            aliases,
            min_score,
            offset,
        }
    }

    fn policy(&self) -> RetryPolicy {
        self.timing.retry_policy()
    }

    /// Enters one row. Never returns an error; failures are in the outcome.
    pub async fn process<S: UiSession>(
        &self,
        session: &mut S,
        index: usize,
        row: &Row,
        sinks: &mut RowSinks<'_>,
    ) -> RowOutcome {
        let mut state = RowState::Pending;
        debug!("Row {}: {}", index + 1, state);

        state = advance(index, state, RowState::Normalizing);
        let record = SectionRecord::from_row(row);
        let identity = record.identity();
        info!("Processing {}", identity);

        state = advance(index, state, RowState::Filling);
        let mut retries = 0;
        let result = self
            .fill_and_submit(session, &record, &identity, &mut retries, sinks)
            .await;

        let (state, action, error) = match result {
            Ok(()) => {
                info!("Submitted {}", identity);
                (
                    advance(index, state, RowState::Submitted),
                    AuditAction::RowSubmitted,
                    None,
                )
            }
            Err(e) => {
                error!("Row {} failed ({}): {}", index + 1, identity, e);
                (
                    advance(index, state, RowState::Failed),
                    AuditAction::RowFailed(e.to_string()),
                    Some(e),
                )
            }
        };

        let entry = AuditEntry::now(self.offset, action, identity.clone());
        if let Err(e) = sinks.audit.append(entry) {
            warn!("Audit write failed for row {}: {}", index + 1, e);
        }

        RowOutcome {
            index,
            sheet_row: row.sheet_row(),
            identity,
            state,
            error,
            retries,
        }
    }

    async fn fill_and_submit<S: UiSession>(
        &self,
        session: &mut S,
        record: &SectionRecord,
        identity: &RowIdentity,
        retries: &mut u32,
        sinks: &mut RowSinks<'_>,
    ) -> Result<()> {
        let wait = self.timing.wait_timeout();

        *retries += click_when_visible(session, self.policy(), &self.form.add_button, wait).await?;
        session.wait_for_visible(&self.form.form_ready, wait).await?;

        for binding in &self.form.fields {
            let value = record.get(binding.field);
            match binding.input {
                InputKind::Text => {
                    if value.is_empty() {
                        continue;
                    }
                    *retries += self.type_value(session, binding, value).await?;
                }
                InputKind::Choice => {
                    if value.is_empty() {
                        debug!("{} is empty, left unselected", binding.field);
                        continue;
                    }
                    *retries += self
                        .choose(session, binding, value, identity, sinks)
                        .await?;
                }
            }
        }

        *retries += click_when_visible(session, self.policy(), &self.form.save_button, wait).await?;
        self.check_rejection(session).await
    }

    async fn type_value<S: UiSession>(
        &self,
        session: &mut S,
        binding: &FieldBinding,
        value: &str,
    ) -> Result<u32> {
        let label = format!("fill {}", binding.field);
        let attempted = perform(session, self.policy(), &label, |s| {
            let selector = binding.selector.clone();
            let value = value.to_string();
            Box::pin(async move { s.fill(&selector, &value).await })
        })
        .await?;
        Ok(attempted.retries)
    }

    /// Aliases `value`, then selects the closest option of the live dropdown
    async fn choose<S: UiSession>(
        &self,
        session: &mut S,
        binding: &FieldBinding,
        value: &str,
        identity: &RowIdentity,
        sinks: &mut RowSinks<'_>,
    ) -> Result<u32> {
        let target = self.aliases.resolve(binding.field, value).to_string();
        if target != value {
            debug!("{}: alias {:?} → {:?}", binding.field, value, target);
        }

        let label = format!("select {}", binding.field);
        let result = perform(session, self.policy(), &label, |s| {
            let selector = binding.selector.clone();
            let target = target.clone();
            Box::pin(async move { select_closest(s, &selector, &target).await })
        })
        .await;

        let attempted = match result {
            Ok(attempted) => attempted,
            Err(e) => {
                if e.is_no_candidates() {
                    self.report(sinks, identity, binding.field, &target, UnmatchedReason::NoOptions);
                }
                return Err(e);
            }
        };

        let matched = attempted.value;
        if matched.score < self.min_score {
            warn!(
                "{}: weak match {:?} → {:?} ({:.2})",
                binding.field, target, matched.option.label, matched.score
            );
            self.report(
                sinks,
                identity,
                binding.field,
                &target,
                UnmatchedReason::LowScore {
                    selected: matched.option.label.clone(),
                    score: matched.score,
                },
            );
        }
        Ok(attempted.retries)
    }

    fn report(
        &self,
        sinks: &mut RowSinks<'_>,
        identity: &RowIdentity,
        field: SectionField,
        value: &str,
        reason: UnmatchedReason,
    ) {
        let row = UnmatchedRow {
            identity: identity.clone(),
            field,
            value: value.to_string(),
            reason,
        };
        if let Err(e) = sinks.unmatched.record(row) {
            warn!("Unmatched report write failed: {}", e);
        }
    }

    /// Looks for the application's error dialog after a save. When it shows,
    /// it is dismissed and the row is rejected; the form is not resubmitted.
    async fn check_rejection<S: UiSession>(&self, session: &mut S) -> Result<()> {
        let dialog = &self.form.error_dialog;
        match session
            .wait_for_visible(dialog, self.timing.error_dialog_wait())
            .await
        {
            Ok(()) => {}
            Err(EntryError::Timeout { .. }) => return Ok(()),
            Err(e) => return Err(e),
        }

        let message = match session.text(&self.form.error_message).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "error dialog without message".to_string(),
            Err(e) => {
                debug!("Error dialog message unreadable: {}", e);
                "error dialog without message".to_string()
            }
        };

        if let Err(e) = click_when_visible(
            session,
            self.policy(),
            &self.form.error_dismiss,
            self.timing.wait_timeout(),
        )
        .await
        {
            warn!("Could not dismiss error dialog: {}", e);
        }

        Err(EntryError::ValidationRejected(message))
    }
}

/// Reads the options of `selector`, picks the closest to `target` and selects
/// it. Also used for the database picker.
pub async fn select_closest<S: UiSession + ?Sized>(
    session: &mut S,
    selector: &str,
    target: &str,
) -> Result<MatchResult> {
    let options = session.options(selector).await?;
    debug!("{} offers {} option(s)", selector, options.len());

    let matched = select_best(target, &options)?;
    debug!(
        "{:?} → {:?} (score {:.2}, index {})",
        target, matched.option.label, matched.score, matched.index
    );

    session.select(selector, &matched.option.value).await?;
    Ok(matched)
}

fn advance(index: usize, from: RowState, to: RowState) -> RowState {
    debug!("Row {}: {} → {}", index + 1, from, to);
    to
}
