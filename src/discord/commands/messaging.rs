// Direct-message commands: one-off DMs and server-wide announcements.

use crate::core::announcements::Recipient;
use crate::discord::messaging::SerenityMessenger;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const MEMBER_PAGE_SIZE: u64 = 1000;

/// Send a DM to a user.
#[poise::command(slash_command, guild_only)]
pub async fn dm(
    ctx: Context<'_>,
    #[description = "The user to DM"] user: serenity::User,
    #[description = "Message to send"] message: String,
) -> Result<(), Error> {
    // A transient failure waits out a retry, which can outlast the reply window.
    ctx.defer_ephemeral().await?;

    let messenger = SerenityMessenger::new(ctx.serenity_context());
    let reply = match ctx
        .data()
        .announcements
        .deliver(&messenger, user.id.get(), &message)
        .await
    {
        Ok(()) => format!("✅ Sent: '{}' to {}", message, user.name),
        Err(e) => {
            tracing::debug!(user_id = user.id.get(), "DM not delivered: {}", e);
            "❌ Couldn't send DM. User may have DMs off.".to_string()
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}

/// Send an announcement to all members in the server.
///
/// Members are messaged one at a time with a short pause in between, so
/// this takes a while on big servers. Only the totals are reported back.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn announce(
    ctx: Context<'_>,
    #[description = "The message to send to all members"] message: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    // Defer right away; delivery outlives the interaction's reply window.
    ctx.defer_ephemeral().await?;

    let recipients = fetch_recipients(ctx.http(), guild_id).await?;
    tracing::info!(
        guild_id = guild_id.get(),
        members = recipients.len(),
        "Starting announcement broadcast"
    );

    let messenger = SerenityMessenger::new(ctx.serenity_context());
    let report = ctx
        .data()
        .announcements
        .broadcast(&messenger, &recipients, &message)
        .await;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Announcement sent to {} members.\n\
                 ⚠️ Could not send to {} members (DMs off or other error).",
                report.sent, report.failed
            ))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Page through the full member list over HTTP; the cache may be partial.
async fn fetch_recipients(
    http: &serenity::Http,
    guild_id: serenity::GuildId,
) -> Result<Vec<Recipient>, Error> {
    let mut recipients = Vec::new();
    let mut after: Option<serenity::UserId> = None;

    loop {
        let page = guild_id
            .members(http, Some(MEMBER_PAGE_SIZE), after)
            .await?;

        recipients.extend(page.iter().map(|member| Recipient {
            user_id: member.user.id.get(),
            is_bot: member.user.bot,
        }));

        match page.last() {
            Some(last) if page.len() as u64 == MEMBER_PAGE_SIZE => {
                after = Some(last.user.id);
            }
            _ => break,
        }
    }

    Ok(recipients)
}
