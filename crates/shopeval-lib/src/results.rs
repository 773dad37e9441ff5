use serde::{Deserialize, Serialize};

/// One `(action, reward)` pair of the per-step history.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub action: String,
    pub reward: f64,
}

/// The frozen outcome of one episode, serialized into the controller's
/// result message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EpisodeMetrics {
    /// True iff the final reward equals exactly 1.0.
    pub success: bool,
    /// Last-seen reward, not a sum.
    pub reward: f64,
    /// Turns consumed; never exceeds the step budget.
    pub steps: usize,
    pub history: Vec<HistoryEntry>,
    /// Wall-clock seconds, filled in by the controller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_used: Option<f64>,
}
