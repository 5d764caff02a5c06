// Announcement domain models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Someone an announcement may be delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: u64,
    pub is_bot: bool,
}

/// Aggregate result of a broadcast. Individual failures are only ever
/// surfaced through these counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub sent: u32,
    pub failed: u32,
    pub skipped_bots: u32,
}

/// Pacing for direct-message delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Pause after every delivery attempt, to stay under the platform rate limit.
    pub send_interval: Duration,
    /// Wait before the single retry of a transient failure.
    pub retry_delay: Duration,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_millis(500),
            retry_delay: Duration::from_secs(1),
        }
    }
}
