// Serenity implementation of the TicketChannels port.

use crate::core::tickets::{TicketChannels, TicketError};
use crate::discord::http_errors::status_of;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Owns its own handles (not a borrowed Context) because ticket watches
/// outlive the event that started them.
pub struct SerenityTicketChannels {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
}

impl SerenityTicketChannels {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self { http, cache }
    }
}

fn to_ticket_error(err: serenity::Error) -> TicketError {
    match status_of(&err) {
        // Unknown Channel
        Some(404) => TicketError::ChannelGone,
        _ => TicketError::Platform(err.to_string()),
    }
}

#[async_trait]
impl TicketChannels for SerenityTicketChannels {
    async fn send_notice(&self, channel_id: u64, content: &str) -> Result<u64, TicketError> {
        serenity::ChannelId::new(channel_id)
            .say(&self.http, content)
            .await
            .map(|message| message.id.get())
            .map_err(to_ticket_error)
    }

    async fn delete_channel(&self, channel_id: u64) -> Result<(), TicketError> {
        self.http
            .delete_channel(
                serenity::ChannelId::new(channel_id),
                Some("Ticket closed"),
            )
            .await
            .map(|_| ())
            .map_err(to_ticket_error)
    }

    async fn last_message_at(
        &self,
        channel_id: u64,
    ) -> Result<Option<DateTime<Utc>>, TicketError> {
        let messages = serenity::ChannelId::new(channel_id)
            .messages(&self.http, serenity::GetMessages::new().limit(1))
            .await
            .map_err(to_ticket_error)?;

        Ok(messages
            .first()
            .and_then(|message| DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)))
    }

    async fn channels_in_categories(&self, categories: &[u64]) -> Result<Vec<u64>, TicketError> {
        let mut tickets = Vec::new();

        for guild_id in self.cache.guilds() {
            let channels = match guild_id.channels(&self.http).await {
                Ok(channels) => channels,
                Err(e) => {
                    tracing::warn!(guild_id = guild_id.get(), "Failed to list channels: {}", e);
                    continue;
                }
            };

            tickets.extend(
                channels
                    .values()
                    .filter(|channel| channel.kind == serenity::ChannelType::Text)
                    .filter(|channel| {
                        channel
                            .parent_id
                            .is_some_and(|parent| categories.contains(&parent.get()))
                    })
                    .map(|channel| channel.id.get()),
            );
        }

        Ok(tickets)
    }
}
