// Self-service role command: posts a message whose reactions hand out roles.

use crate::discord::reaction_roles::symbol_key;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

async fn reply_ephemeral(ctx: Context<'_>, text: impl Into<String>) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Parse a custom emoji (`<:name:id>`) or a unicode emoji.
///
/// Anything else is taken as unicode by the parser, so plain ASCII text is
/// rejected here; Discord itself has the final say when we react.
fn parse_reaction(raw: &str) -> Option<serenity::ReactionType> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match serenity::ReactionType::try_from(raw).ok()? {
        serenity::ReactionType::Unicode(text) if text.is_ascii() => None,
        reaction => Some(reaction),
    }
}

/// Create a reaction role message.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES | ADD_REACTIONS"
)]
pub async fn selfroleadd(
    ctx: Context<'_>,
    #[description = "The message users will see"] message: String,
    #[description = "First emoji"] emoji1: String,
    #[description = "Role for first emoji"] role1: serenity::Role,
    #[description = "Second emoji (optional)"] emoji2: Option<String>,
    #[description = "Role for second emoji (optional)"] role2: Option<serenity::Role>,
) -> Result<(), Error> {
    let mut pairs = Vec::new();

    let Some(first) = parse_reaction(&emoji1) else {
        return reply_ephemeral(ctx, format!("❌ `{}` is not a usable emoji.", emoji1)).await;
    };
    pairs.push((first, role1));

    match (emoji2, role2) {
        (Some(emoji), Some(role)) => {
            let Some(second) = parse_reaction(&emoji) else {
                return reply_ephemeral(ctx, format!("❌ `{}` is not a usable emoji.", emoji))
                    .await;
            };
            pairs.push((second, role));
        }
        (None, None) => {}
        _ => {
            return reply_ephemeral(ctx, "❌ emoji2 and role2 have to be given together.").await;
        }
    }

    let posted = ctx.channel_id().say(ctx.http(), message).await?;

    // Every reaction has to land before anything is bound; otherwise the
    // half-built message is taken down again.
    for (reaction, _) in &pairs {
        if let Err(e) = posted.react(ctx.http(), reaction.clone()).await {
            tracing::warn!(message_id = posted.id.get(), "Reaction role setup failed: {}", e);
            if let Err(e) = posted.delete(ctx.http()).await {
                tracing::warn!(message_id = posted.id.get(), "Failed to remove setup message: {}", e);
            }
            return reply_ephemeral(ctx, format!("❌ Couldn't react with {}: {}", reaction, e))
                .await;
        }
    }

    let mut summary = Vec::new();
    for (reaction, role) in pairs {
        ctx.data()
            .reaction_roles
            .bind(posted.id.get(), &symbol_key(&reaction), role.id.get())?;
        summary.push(format!("{} → {}", reaction, role.name));
    }

    let bound = ctx.data().reaction_roles.bindings_for(posted.id.get()).len();
    reply_ephemeral(
        ctx,
        format!(
            "✅ Reaction role message created with {} reaction role{}!\n{}",
            bound,
            if bound == 1 { "" } else { "s" },
            summary.join("\n")
        ),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reaction_accepts_emoji() {
        assert_eq!(
            parse_reaction(" 🎮 "),
            Some(serenity::ReactionType::Unicode("🎮".to_string()))
        );
        assert!(matches!(
            parse_reaction("<:ferris:1234567890>"),
            Some(serenity::ReactionType::Custom { .. })
        ));
    }

    #[test]
    fn test_parse_reaction_rejects_plain_text() {
        assert_eq!(parse_reaction(""), None);
        assert_eq!(parse_reaction("   "), None);
        assert_eq!(parse_reaction("gamer"), None);
        assert_eq!(parse_reaction(":smile:"), None);
    }
}
