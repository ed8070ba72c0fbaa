//! Menu command dispatch.

use crate::app::{skip_vanished, App};
use crate::host::BrowserHost;
use crate::services::period_gate::PeriodGateTrait;
use crate::types::command::{Command, Flag};
use crate::types::entity::{EntityId, PERIOD_DISABLED};
use crate::types::errors::AppError;

/// Trait defining the command surface.
pub trait CommandDispatchTrait {
    fn dispatch(&mut self, id: EntityId, command: Command) -> Result<(), AppError>;
}

impl<H: BrowserHost> CommandDispatchTrait for App<H> {
    /// Runs `command` against the entity the menu was opened on, then saves
    /// that entity's session value. A vanished target is a silent no-op.
    fn dispatch(&mut self, id: EntityId, command: Command) -> Result<(), AppError> {
        let result = run(self, id, command).and_then(|()| self.persist_session(id));
        skip_vanished(result).map(|_| ())
    }
}

fn run<H: BrowserHost>(app: &mut App<H>, id: EntityId, command: Command) -> Result<(), AppError> {
    tracing::debug!(entity = %id, ?command, "dispatching command");
    match command {
        Command::SetPeriod { period } => {
            app.set_period(id, period.raw())?;
        }
        Command::Toggle { flag, enabled } => {
            let entity = app.live_state(id)?;
            match flag {
                Flag::Randomize => entity.randomize = enabled,
                Flag::Remember => entity.remember = enabled,
                Flag::NoCache => entity.no_cache = enabled,
                Flag::Smart => entity.smart = enabled,
                Flag::Sticky => entity.sticky_reload = enabled,
                Flag::OnlyOnError => entity.only_on_error = enabled,
            }
            app.remember_set(id)?;
            if flag == Flag::OnlyOnError {
                app.restart_timer(id)?;
            }
        }
        Command::ReloadOne => {
            app.reload_entity(id, true)?;
        }
        Command::ReloadAll => {
            app.reload_window()?;
        }
        Command::EnableAll => {
            let template = app.live_state(id)?.user_settings();
            for desc in app.host.entities(None) {
                // The period goes through the gate; an entity still waiting for
                // resend confirmation keeps its old one.
                let other = app.entity_state(desc.id);
                let current = other.period;
                other.apply_user_settings(&template);
                other.period = current;
                skip_vanished(app.set_period(desc.id, template.period))?;
            }
        }
        Command::DisableAll => {
            for desc in app.host.entities(None) {
                skip_vanished(app.set_period(desc.id, PERIOD_DISABLED))?;
            }
        }
    }
    Ok(())
}
