//! Performs reloads, resending form data only when the user allowed it.

use crate::host::BrowserHost;
use crate::types::entity::EntityState;
use crate::types::errors::HostError;
use crate::types::event::AgentMessage;
use crate::types::settings::Settings;

/// How an entity was reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Plain browser reload.
    Standard { bypass_cache: bool },
    /// Form data re-submitted through the page agent.
    Resend { history_entry_removed: bool },
    /// The page agent could not be reached, so no resend happened.
    Undelivered,
}

pub struct ReloadExecutor;

impl ReloadExecutor {
    /// Reloads `entity`.
    ///
    /// A page fetched with a non-idempotent method is re-submitted through its
    /// page agent when the user confirmed it (or confirmation is switched off
    /// globally). The visit that submission will duplicate is removed from
    /// history first. Every other page gets a standard reload.
    pub fn execute<H: BrowserHost + ?Sized>(
        entity: &mut EntityState,
        settings: &Settings,
        host: &mut H,
        force_no_cache: bool,
    ) -> Result<ReloadKind, HostError> {
        entity.reload_initiated_by_system = true;

        if entity.has_unsafe_request() && (entity.resend_confirmed || settings.never_confirm_post) {
            let history_entry_removed = Self::drop_last_visit(entity, host)?;

            let message = AgentMessage::Reload {
                post_data: entity.form_snapshot.clone(),
            };
            match host.send(entity.entity_id, message) {
                Ok(()) => {}
                Err(HostError::ChannelError(e)) => {
                    tracing::debug!(entity = %entity.entity_id, error = %e, "page agent unreachable, resend skipped");
                    entity.reload_initiated_by_system = false;
                    return Ok(ReloadKind::Undelivered);
                }
                Err(e) => return Err(e),
            }
            entity.keep_refreshing = true;
            tracing::debug!(entity = %entity.entity_id, "form data resent");
            return Ok(ReloadKind::Resend {
                history_entry_removed,
            });
        }

        let bypass_cache = force_no_cache || entity.no_cache;
        host.reload(entity.entity_id, bypass_cache)?;
        tracing::debug!(entity = %entity.entity_id, bypass_cache, "reload issued");
        Ok(ReloadKind::Standard { bypass_cache })
    }

    /// Deletes the latest visit of the entity's URL, within a millisecond of its timestamp.
    fn drop_last_visit<H: BrowserHost + ?Sized>(
        entity: &EntityState,
        host: &mut H,
    ) -> Result<bool, HostError> {
        let visits = host.search_history(&entity.current_url, 1)?;
        match visits.first() {
            Some(visit) => {
                let t = visit.last_visit_time;
                host.delete_history_range(t - 1, t + 1)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
