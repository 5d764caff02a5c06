// Moderation domain models.
//
// These are pure domain types with no Discord dependencies.

use std::time::Duration;

pub const DEFAULT_REASON: &str = "No reason provided";

/// Platform ceiling for a member timeout.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(28 * 24 * 60 * 60);

/// A privileged moderation command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Kick,
    Ban,
    Timeout,
    Announce,
}

impl ModerationAction {
    /// Reply shown only to an invoker who lacks the required permission.
    pub fn denial_message(&self) -> &'static str {
        match self {
            ModerationAction::Kick => "❌ You don't have permission to kick members.",
            ModerationAction::Ban => "❌ You don't have permission to ban members.",
            ModerationAction::Timeout => "❌ You don't have permission to timeout members.",
            ModerationAction::Announce => "❌ You don't have permission to make announcements.",
        }
    }

    /// Map a command name to the action it performs.
    pub fn from_command(name: &str) -> Option<Self> {
        match name {
            "kick" => Some(ModerationAction::Kick),
            "ban" => Some(ModerationAction::Ban),
            "timeout" => Some(ModerationAction::Timeout),
            "announce" => Some(ModerationAction::Announce),
            _ => None,
        }
    }
}
