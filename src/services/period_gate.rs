//! Period changes, gated on confirmation for non-idempotent pages.

use crate::app::App;
use crate::host::BrowserHost;
use crate::types::entity::{EntityId, PERIOD_CUSTOM, PERIOD_DISABLED};
use crate::types::errors::AppError;
use crate::types::event::Prompt;

/// Result of a period change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodOutcome {
    /// The period was stored, the timer re-armed and the state persisted.
    Applied,
    /// The page was fetched with a non-idempotent request; the user was asked to
    /// confirm resubmission and nothing changed yet.
    ConfirmationRequired,
    /// The user was asked for a custom interval; nothing changed yet.
    CustomIntervalRequested,
    /// The entity no longer exists.
    EntityGone,
}

/// Trait defining period change operations.
pub trait PeriodGateTrait {
    fn set_period(&mut self, id: EntityId, period: i64) -> Result<PeriodOutcome, AppError>;
    fn confirm_resend(&mut self, id: EntityId, period: i64) -> Result<PeriodOutcome, AppError>;
}

impl<H: BrowserHost> PeriodGateTrait for App<H> {
    /// Sets the reload period of `id`.
    ///
    /// The resend confirmation is checked before the custom-interval sentinel,
    /// so picking "custom" on an unconfirmed form page asks for confirmation
    /// first. Negative periods other than the custom sentinel all disable.
    fn set_period(&mut self, id: EntityId, period: i64) -> Result<PeriodOutcome, AppError> {
        if let Err(e) = self.host.entity(id) {
            if e.is_entity_gone() {
                return Ok(PeriodOutcome::EntityGone);
            }
            return Err(e.into());
        }

        let period = if period < 0 && period != PERIOD_CUSTOM {
            PERIOD_DISABLED
        } else {
            period
        };

        let never_confirm = self.settings().never_confirm_post;
        let entity = self.entity_state(id);
        let needs_confirmation = entity.has_unsafe_request()
            && period != PERIOD_DISABLED
            && !entity.resend_confirmed
            && !never_confirm;

        if needs_confirmation {
            self.host.prompt(Prompt::ConfirmResend { entity_id: id, period })?;
            tracing::debug!(entity = %id, period, "period change waits for resend confirmation");
            return Ok(PeriodOutcome::ConfirmationRequired);
        }

        if period == PERIOD_CUSTOM {
            self.host.prompt(Prompt::CustomInterval { entity_id: id })?;
            return Ok(PeriodOutcome::CustomIntervalRequested);
        }

        self.entity_state(id).period = period;
        self.apply(id)?;
        self.remember_set(id)?;
        tracing::debug!(entity = %id, period, "period applied");
        Ok(PeriodOutcome::Applied)
    }

    /// Records that the user accepted resubmitting form data, then retries `period`.
    fn confirm_resend(&mut self, id: EntityId, period: i64) -> Result<PeriodOutcome, AppError> {
        match self.live_state(id) {
            Ok(entity) => entity.resend_confirmed = true,
            Err(e) if e.is_entity_gone() => return Ok(PeriodOutcome::EntityGone),
            Err(e) => return Err(e),
        }
        self.set_period(id, period)
    }
}
