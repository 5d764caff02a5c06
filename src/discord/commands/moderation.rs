// Moderation slash commands: kick, timeout, ban.
//
// Permission checks are declared on each command; the framework's on_error
// hook tells the invoker (and only the invoker) when they're missing one.

use crate::core::moderation::{ban_notice, notify_then, reason_or_default, TimeoutRequest};
use crate::discord::messaging::SerenityMessenger;
use crate::discord::{Context, Error};
use poise::serenity_prelude::{self as serenity, Mentionable};

async fn say_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Kick a user from the server.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "KICK_MEMBERS",
    required_bot_permissions = "KICK_MEMBERS"
)]
pub async fn kick(
    ctx: Context<'_>,
    #[description = "The member to kick"] member: serenity::Member,
    #[description = "Reason for kicking"] reason: Option<String>,
) -> Result<(), Error> {
    let reason = reason_or_default(reason);

    if let Err(e) = member.kick_with_reason(ctx.http(), &reason).await {
        tracing::warn!(user_id = member.user.id.get(), "Kick failed: {}", e);
        return say_ephemeral(ctx, format!("❌ Error kicking user: {}", e)).await;
    }

    ctx.say(format!(
        "👢 {} has been kicked. Reason: {}",
        member.user.name, reason
    ))
    .await?;
    Ok(())
}

/// Timeout a user for a certain duration.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MODERATE_MEMBERS",
    required_bot_permissions = "MODERATE_MEMBERS"
)]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "The member to timeout"] member: serenity::Member,
    #[description = "Duration in seconds"] duration: u64,
    #[description = "Reason for timeout"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let reason = reason_or_default(reason);

    let request = match TimeoutRequest::new(duration) {
        Ok(request) => request,
        Err(e) => return say_ephemeral(ctx, format!("❌ {}", e)).await,
    };

    let until = request.until(chrono::Utc::now());
    let timeout_until = match serenity::Timestamp::from_unix_timestamp(until.timestamp()) {
        Ok(ts) => ts,
        Err(e) => {
            tracing::error!("Failed to create timeout timestamp: {}", e);
            return say_ephemeral(ctx, "❌ Could not compute the timeout end.").await;
        }
    };

    if let Err(e) = guild_id
        .edit_member(
            ctx.http(),
            member.user.id,
            serenity::EditMember::new()
                .disable_communication_until_datetime(timeout_until)
                .audit_log_reason(&reason),
        )
        .await
    {
        tracing::warn!(user_id = member.user.id.get(), "Timeout failed: {}", e);
        return say_ephemeral(ctx, format!("❌ Error timing out user: {}", e)).await;
    }

    ctx.say(format!(
        "⏲️ {} has been timed out for {} seconds. Reason: {}",
        member.user.name,
        request.duration().as_secs(),
        reason
    ))
    .await?;
    Ok(())
}

/// Ban a user from the server.
///
/// The member is told why by DM first; if their DMs are closed the ban
/// still goes through.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "BAN_MEMBERS",
    required_bot_permissions = "BAN_MEMBERS"
)]
pub async fn ban(
    ctx: Context<'_>,
    #[description = "The member to ban"] member: serenity::Member,
    #[description = "Reason for banning"] reason: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let reason = reason_or_default(reason);
    let user_id = member.user.id;

    // The DM and its retry can outlast the interaction's reply window.
    if let Err(e) = ctx.defer_ephemeral().await {
        tracing::warn!(user_id = user_id.get(), "Failed to defer ban reply: {}", e);
    }

    let guild_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "this server".to_string());
    let notice = ban_notice(&guild_name, ctx.data().ban_appeal_url.as_deref());

    let http = ctx.http();
    let messenger = SerenityMessenger::new(ctx.serenity_context());
    let result = notify_then(
        &ctx.data().announcements,
        &messenger,
        user_id.get(),
        &notice,
        || guild_id.ban_with_reason(http, user_id, 0, &reason),
    )
    .await;

    let dm_note = match result.notice {
        Ok(()) => "",
        Err(_) => "\n⚠️ Could not send DM before the ban.",
    };

    let reply = match result.action {
        Ok(()) => format!("🔨 {} has been banned.{}", member.mention(), dm_note),
        Err(e) => {
            tracing::warn!(user_id = user_id.get(), "Ban failed: {}", e);
            format!("❌ Error banning user: {}", e)
        }
    };

    // The ban call is already done; a lost reply only costs the confirmation.
    if let Err(e) = say_ephemeral(ctx, reply).await {
        tracing::warn!(user_id = user_id.get(), "Failed to confirm ban: {}", e);
    }
    Ok(())
}
