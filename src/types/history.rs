use serde::{Deserialize, Serialize};

/// A visited page in the history mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub url: String,
    pub title: String,
    /// Milliseconds since the UNIX epoch of the most recent visit.
    pub last_visit_time: i64,
    pub visit_count: i32,
}
