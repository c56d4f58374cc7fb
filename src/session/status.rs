use serde::{Deserialize, Serialize};

/// Client-side live-session lifecycle. `Completed` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LiveSessionStatus {
    Waiting,
    Ready,
    Started,
    Ending,
    Completed,
}

impl Default for LiveSessionStatus {
    fn default() -> Self {
        LiveSessionStatus::Waiting
    }
}

impl LiveSessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LiveSessionStatus::Completed)
    }
}

/// Maps the backend's live-status vocabulary onto the client's. Total:
/// unrecognized or absent values fall back to `Waiting`.
pub fn map_live_status(raw: Option<&str>) -> LiveSessionStatus {
    match raw.unwrap_or_default() {
        "upcoming" => LiveSessionStatus::Waiting,
        "ready" => LiveSessionStatus::Ready,
        "started" => LiveSessionStatus::Started,
        "ending" => LiveSessionStatus::Ending,
        "completed" => LiveSessionStatus::Completed,
        _ => LiveSessionStatus::Waiting,
    }
}
