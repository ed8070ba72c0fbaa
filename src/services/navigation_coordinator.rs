//! Keeps, cancels or restarts timers as entities load and navigate.

use crate::app::App;
use crate::host::BrowserHost;
use crate::types::entity::{is_plain_retrieval, EntityId, FormData, TimerKey, PERIOD_DISABLED};
use crate::types::errors::AppError;
use crate::types::event::{AgentMessage, TransitionKind, TOP_LEVEL_FRAME};

/// Trait defining navigation lifecycle handling.
pub trait NavigationCoordinatorTrait {
    fn on_load_started(&mut self, id: EntityId) -> Result<(), AppError>;
    fn on_load_completed(&mut self, id: EntityId) -> Result<(), AppError>;
    fn on_navigation_committed(
        &mut self,
        id: EntityId,
        frame_id: u32,
        kind: TransitionKind,
        url: &str,
    ) -> Result<bool, AppError>;
    fn on_navigation_completed(&mut self, id: EntityId, frame_id: u32) -> Result<(), AppError>;
    fn on_request_started(
        &mut self,
        id: EntityId,
        method: &str,
        form_data: Option<FormData>,
    ) -> Result<(), AppError>;
    fn on_response_error(&mut self, id: EntityId) -> Result<(), AppError>;
    fn on_response_completed(&mut self, id: EntityId, status_code: u16) -> Result<(), AppError>;
}

impl<H: BrowserHost> NavigationCoordinatorTrait for App<H> {
    /// No reload may fire while a page is loading.
    fn on_load_started(&mut self, id: EntityId) -> Result<(), AppError> {
        self.live_state(id)?;
        self.scheduler.disarm(&TimerKey::for_entity(id));
        Ok(())
    }

    /// Restores the scroll position after a reload we issued, then re-arms.
    fn on_load_completed(&mut self, id: EntityId) -> Result<(), AppError> {
        let entity = self.live_state(id)?;
        let scroll = if entity.reload_initiated_by_system {
            entity.scroll
        } else {
            None
        };
        entity.reload_initiated_by_system = false;

        if let Some(pos) = scroll {
            self.notify_agent(id, AgentMessage::Scroll { x: pos.x, y: pos.y })?;
        }
        self.restart_timer(id)
    }

    /// Handles a committed navigation. Returns whether the timer was cancelled.
    ///
    /// Only top-level navigations count. A navigation that is not a reload
    /// clears `remember`, and unless a resend is in flight or sticky reload is
    /// on it also cancels the timer. Remembered settings for the new URL are
    /// recalled either way.
    fn on_navigation_committed(
        &mut self,
        id: EntityId,
        frame_id: u32,
        kind: TransitionKind,
        url: &str,
    ) -> Result<bool, AppError> {
        if frame_id != TOP_LEVEL_FRAME {
            return Ok(false);
        }

        let reloading = kind.is_reload();
        let entity = self.live_state(id)?;
        let cancel = !reloading && !entity.keep_refreshing && !entity.sticky_reload;
        if !reloading {
            entity.remember = false;
        }
        if entity.current_url != url {
            entity.scroll = None;
            entity.current_url = url.to_string();
        }

        if cancel {
            entity.period = PERIOD_DISABLED;
            self.apply(id)?;
            tracing::debug!(entity = %id, ?kind, "user navigation cancelled the timer");
        }

        self.remember_get(id, url)?;
        Ok(cancel)
    }

    fn on_navigation_completed(&mut self, id: EntityId, frame_id: u32) -> Result<(), AppError> {
        if frame_id == TOP_LEVEL_FRAME {
            self.live_state(id)?.keep_refreshing = false;
        }
        Ok(())
    }

    /// Captures the method and form payload of a top-level request.
    ///
    /// An unconfirmed non-idempotent request switches the timer off.
    fn on_request_started(
        &mut self,
        id: EntityId,
        method: &str,
        form_data: Option<FormData>,
    ) -> Result<(), AppError> {
        let never_confirm = self.settings().never_confirm_post;
        let entity = self.live_state(id)?;
        entity.request_method = method.to_string();
        entity.form_snapshot = if is_plain_retrieval(method) { None } else { form_data };

        if entity.has_unsafe_request() && !entity.resend_confirmed && !never_confirm {
            entity.period = PERIOD_DISABLED;
            self.apply(id)?;
        }
        Ok(())
    }

    fn on_response_error(&mut self, id: EntityId) -> Result<(), AppError> {
        self.live_state(id)?.load_error = true;
        Ok(())
    }

    fn on_response_completed(&mut self, id: EntityId, status_code: u16) -> Result<(), AppError> {
        self.live_state(id)?.load_error = status_code >= 400;
        Ok(())
    }
}
