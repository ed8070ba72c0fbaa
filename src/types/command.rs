use serde::{Deserialize, Serialize};

use super::entity::{PERIOD_CUSTOM, PERIOD_DISABLED};

/// Commands issued from the menu layer against the entity it was opened on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub enum Command {
    SetPeriod { period: PeriodChoice },
    Toggle { flag: Flag, enabled: bool },
    ReloadOne,
    ReloadAll,
    EnableAll,
    DisableAll,
}

/// A period picked from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodChoice {
    Minutes(u32),
    Custom,
    Disable,
}

impl PeriodChoice {
    /// The signed period value stored on the entity.
    pub fn raw(self) -> i64 {
        match self {
            PeriodChoice::Minutes(m) => i64::from(m),
            PeriodChoice::Custom => PERIOD_CUSTOM,
            PeriodChoice::Disable => PERIOD_DISABLED,
        }
    }
}

/// Independently toggleable per-entity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Flag {
    Randomize,
    Remember,
    NoCache,
    Smart,
    Sticky,
    OnlyOnError,
}
