// Ticket commands - manual sweep and per-channel status.

use crate::discord::{Context, Error};
use std::sync::Arc;

/// Check ticket channels for inactivity now instead of waiting for the next sweep.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_CHANNELS")]
pub async fn ticketsweep(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let monitor = Arc::clone(&ctx.data().tickets);
    let started = Arc::clone(&monitor).sweep().await?;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "🎫 Asked {} idle ticket channel{} whether they can be closed. \
                 {} closure check{} running.",
                started,
                if started == 1 { "" } else { "s" },
                monitor.active_watch_count(),
                if monitor.active_watch_count() == 1 { "" } else { "s" }
            ))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Show whether this ticket channel is waiting to be closed.
#[poise::command(slash_command, guild_only)]
pub async fn ticketstatus(ctx: Context<'_>) -> Result<(), Error> {
    let text = match ctx.data().tickets.active_watch(ctx.channel_id().get()) {
        Some(watch) => {
            let prompt = match watch.prompt_message_id {
                Some(message_id) => format!(" Prompt: message `{}`.", message_id),
                None => String::new(),
            };
            format!(
                "🎫 Closure state: **{:?}**. Reply deadline <t:{}:R>.{}",
                watch.state,
                watch.deadline.timestamp(),
                prompt
            )
        }
        None => "No closure check is running in this channel.".to_string(),
    };

    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}
