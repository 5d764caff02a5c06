// Serenity implementation of the DirectMessenger port.

use crate::core::announcements::{DeliveryError, DirectMessenger};
use crate::discord::http_errors::status_of;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

/// Sends DMs through the current serenity context.
pub struct SerenityMessenger<'a> {
    ctx: &'a serenity::Context,
}

impl<'a> SerenityMessenger<'a> {
    pub fn new(ctx: &'a serenity::Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl DirectMessenger for SerenityMessenger<'_> {
    async fn send_direct(&self, user_id: u64, content: &str) -> Result<(), DeliveryError> {
        serenity::UserId::new(user_id)
            .direct_message(self.ctx, serenity::CreateMessage::new().content(content))
            .await
            .map(|_| ())
            .map_err(|e| match status_of(&e) {
                // 403: DMs disabled or no shared server; retrying won't help.
                Some(403) => DeliveryError::Refused,
                _ => DeliveryError::Transient(e.to_string()),
            })
    }
}
