// Ticket domain models - configuration and per-channel watch state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CLOSURE_PROMPT: &str = "Can this ticket be closed?";
pub const TIMEOUT_NOTICE: &str = "Closing the ticket due to inactivity.";

/// How ticket channels are found and how long each phase waits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Category ids whose text channels are tickets.
    pub categories: Vec<u64>,
    /// A channel is idle once its last message is at least this old.
    pub idle_threshold: Duration,
    /// How long the closure prompt waits for an affirmative reply.
    pub reply_window: Duration,
    /// Delay between the closing notice and the actual delete.
    pub grace_delay: Duration,
    /// How often the background sweep looks for idle channels.
    pub sweep_interval: Duration,
    /// Lowercase keywords; a reply containing any of them confirms closure.
    pub affirmative_tokens: Vec<String>,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            idle_threshold: Duration::from_secs(24 * 60 * 60), // 1 day
            reply_window: Duration::from_secs(12 * 60 * 60),   // 12 hours
            grace_delay: Duration::from_secs(5 * 60),          // 5 minutes
            sweep_interval: Duration::from_secs(60 * 60),      // hourly
            affirmative_tokens: vec!["yes".to_string(), "yepp".to_string(), "sure".to_string()],
        }
    }
}

impl TicketConfig {
    /// Case-insensitive substring match against the affirmative tokens.
    pub fn is_affirmative(&self, content: &str) -> bool {
        let content = content.to_lowercase();
        self.affirmative_tokens
            .iter()
            .any(|token| content.contains(token.as_str()))
    }

    /// Notice posted after a "yes", mentioning the grace delay.
    pub fn confirm_notice(&self) -> String {
        let minutes = self.grace_delay.as_secs() / 60;
        if minutes >= 1 {
            format!(
                "Ticket will be closed in {} minute{}.",
                minutes,
                if minutes == 1 { "" } else { "s" }
            )
        } else {
            format!(
                "Ticket will be closed in {} seconds.",
                self.grace_delay.as_secs()
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchState {
    /// Prompt posted, waiting for a reply or the deadline.
    AwaitingReply,
    /// Someone said yes; grace delay running.
    Confirmed,
    /// Nobody answered in time; grace delay running.
    TimedOut,
    Deleting,
    Closed,
    /// The channel disappeared underneath us.
    Cancelled,
}

/// The single active watch on a ticket channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketWatch {
    pub channel_id: u64,
    /// Unset until the prompt has actually been posted.
    pub prompt_message_id: Option<u64>,
    pub deadline: DateTime<Utc>,
    pub state: WatchState,
}

/// How a `watch_channel` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// Another watch already owns this channel; nothing was posted.
    AlreadyWatching,
    Confirmed,
    TimedOut,
    Cancelled,
}
