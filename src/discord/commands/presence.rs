// This module handles bot presence.
//
// Discord-layer glue only: it works with serenity's ActivityData and
// OnlineStatus and nothing from the core.

use poise::serenity_prelude as serenity;

/// Default status shown while the bot is up.
pub fn reset_status(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::watching("over the tickets");
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is ready.
pub fn on_ready(ctx: &serenity::Context) {
    reset_status(ctx);
}
