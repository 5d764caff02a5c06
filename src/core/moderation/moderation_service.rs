// Moderation rules - timeout validation, reasons and the pre-ban notice.
//
// NO Discord dependencies here - just pure domain logic.

use super::moderation_models::{DEFAULT_REASON, MAX_TIMEOUT};
use crate::core::announcements::{BroadcastService, DeliveryError, DirectMessenger};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModerationError {
    #[error("Timeout must be between 1 second and {max} days", max = MAX_TIMEOUT.as_secs() / 86400)]
    InvalidDuration,
}

// ============================================================================
// TIMEOUTS
// ============================================================================

/// A validated timeout length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutRequest {
    duration: Duration,
}

impl TimeoutRequest {
    pub fn new(seconds: u64) -> Result<Self, ModerationError> {
        let duration = Duration::from_secs(seconds);
        if seconds == 0 || duration > MAX_TIMEOUT {
            return Err(ModerationError::InvalidDuration);
        }
        Ok(Self { duration })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// When the timeout ends, counted from `now`.
    pub fn until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        // Bounded by MAX_TIMEOUT, so the conversion can't overflow.
        now + chrono::Duration::seconds(self.duration.as_secs() as i64)
    }
}

// ============================================================================
// MESSAGES
// ============================================================================

pub fn reason_or_default(reason: Option<String>) -> String {
    match reason {
        Some(reason) if !reason.trim().is_empty() => reason,
        _ => DEFAULT_REASON.to_string(),
    }
}

/// Direct message sent to a member right before they are banned.
pub fn ban_notice(guild_name: &str, appeal_url: Option<&str>) -> String {
    let mut notice = format!(
        "You have been banned from **{}** for violating our rules.\n\
         If you believe this was a mistake, please contact a moderator",
        guild_name
    );
    match appeal_url {
        Some(url) => notice.push_str(&format!(" or use the appeal form: {}", url)),
        None => notice.push('.'),
    }
    notice
}

// ============================================================================
// NOTIFY, THEN ACT
// ============================================================================

/// Result of telling a member about an action and then carrying it out.
#[derive(Debug)]
pub struct NoticedAction<T> {
    pub notice: Result<(), DeliveryError>,
    pub action: T,
}

/// DM `notice` to the member, then run `action` whatever happened to the DM.
///
/// The notice goes first because a banned member can't be messaged anymore.
/// Delivery is best-effort: a refusal or a failed retry is reported back
/// in `notice` and never stops the action.
pub async fn notify_then<M, F, Fut, T>(
    delivery: &BroadcastService,
    messenger: &M,
    user_id: u64,
    notice: &str,
    action: F,
) -> NoticedAction<T>
where
    M: DirectMessenger,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let notice = delivery.deliver(messenger, user_id, notice).await;
    if let Err(e) = &notice {
        tracing::warn!(user_id, "Moderation notice not delivered: {}", e);
    }

    NoticedAction {
        notice,
        action: action().await,
    }
}

// ============================================================================
// TESTS
// ============================================================================
