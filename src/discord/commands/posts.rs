// Content commands: polls and rich posts, sent as plain channel messages
// (not as replies to the interaction).

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const POST_COLOR: u32 = 0x00FFCC;

async fn acknowledge(ctx: Context<'_>, text: &str) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Post a daily poll in the channel.
#[poise::command(slash_command, guild_only)]
pub async fn dailypoll(
    ctx: Context<'_>,
    #[description = "The poll question"] message: String,
) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new().description(message);

    ctx.channel_id()
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;

    acknowledge(ctx, "✅ Your poll has been posted!").await
}

/// Send a post with an optional image.
#[poise::command(slash_command, guild_only)]
pub async fn post(
    ctx: Context<'_>,
    #[description = "The title of your post (supports # for big letters)"] title: String,
    #[description = "The message to display (optional)"] description: Option<String>,
    #[description = "Direct link to an image (jpg, png, gif)"] image_url: Option<String>,
) -> Result<(), Error> {
    if let Some(url) = image_url.as_deref() {
        if !is_web_url(url) {
            return acknowledge(ctx, "❌ The image link must start with http:// or https://.")
                .await;
        }
    }

    ctx.defer_ephemeral().await?;

    let mut embed = serenity::CreateEmbed::new()
        .description(compose_post_body(&title, description.as_deref()))
        .color(POST_COLOR);
    if let Some(url) = image_url {
        embed = embed.image(url);
    }

    ctx.channel_id()
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;

    acknowledge(ctx, "✅ Post published!").await
}

/// Title, then a blank line and the description when there is one.
pub fn compose_post_body(title: &str, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{}\n\n{}", title, description),
        None => title.to_string(),
    }
}

fn is_web_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_body() {
        assert_eq!(compose_post_body("# Welcome", None), "# Welcome");
        assert_eq!(compose_post_body("# Welcome", Some("  ")), "# Welcome");
        assert_eq!(
            compose_post_body("# Welcome", Some("Read the rules first.")),
            "# Welcome\n\nRead the rules first."
        );
    }

    #[test]
    fn test_image_links_must_be_web_urls() {
        assert!(is_web_url("https://i.ibb.co/banner.png"));
        assert!(!is_web_url("ftp://example.com/banner.png"));
        assert!(!is_web_url("banner.png"));
    }
}
