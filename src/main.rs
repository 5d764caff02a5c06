// This is the entry point of the Discord bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits, config, keep-alive endpoint
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::announcements::BroadcastService;
use crate::core::reaction_roles::RoleBindingRegistry;
use crate::core::tickets::TicketCloseMonitor;
use crate::discord::commands::presence;
use crate::discord::reaction_roles as reaction_events;
use crate::discord::tickets::SerenityTicketChannels;
use crate::discord::{Data, Error};
use crate::infra::config::BotConfig;
use crate::infra::keep_alive;
use crate::infra::reaction_roles::InMemoryBindingStore;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            // Ignore bot messages (including our own prompts and notices)
            if new_message.author.bot {
                return Ok(());
            }

            if data
                .tickets
                .on_message(new_message.channel_id.get(), &new_message.content)
            {
                tracing::info!(
                    channel_id = new_message.channel_id.get(),
                    user_id = new_message.author.id.get(),
                    "Ticket closure confirmed"
                );
            }
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            reaction_events::handle_reaction_add(ctx, data, add_reaction).await;
        }
        serenity::FullEvent::ReactionRemove { removed_reaction } => {
            reaction_events::handle_reaction_remove(ctx, data, removed_reaction).await;
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            data.tickets.on_channel_deleted(channel.id.get());
        }

        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    if config.tickets.categories.is_empty() {
        tracing::warn!("TICKET_CATEGORY_IDS is empty, ticket closing is disabled");
    }

    // The supervisor only needs to see that the process answers.
    let keep_alive_port = config.keep_alive_port;
    tokio::spawn(async move {
        if let Err(e) = keep_alive::serve(keep_alive_port).await {
            tracing::error!("Keep-alive endpoint failed: {:#}", e);
        }
    });

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Services that don't need a Discord connection are built here; the
    // ticket monitor needs the HTTP client, so it's built in `setup`.

    let reaction_roles = Arc::new(RoleBindingRegistry::new(InMemoryBindingStore::new()));
    let announcements = Arc::new(BroadcastService::new(config.broadcast.clone()));
    let ticket_config = config.tickets.clone();
    let ban_appeal_url = config.ban_appeal_url.clone();
    let dev_guild_id = config.dev_guild_id;

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read ticket replies
        | serenity::GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::messaging::dm(),
                discord::commands::messaging::announce(),
                discord::commands::moderation::kick(),
                discord::commands::moderation::timeout(),
                discord::commands::moderation::ban(),
                discord::commands::posts::dailypoll(),
                discord::commands::posts::post(),
                discord::commands::reaction_roles::selfroleadd(),
                discord::commands::tickets::ticketsweep(),
                discord::commands::tickets::ticketstatus(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(discord::errors::on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                match dev_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                    }
                    None => {
                        // Can take up to an hour to propagate
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                    }
                }
                tracing::info!("Commands registered");
                presence::on_ready(ctx);

                let channels = SerenityTicketChannels::new(ctx.http.clone(), ctx.cache.clone());
                let tickets = Arc::new(TicketCloseMonitor::new(channels, ticket_config));

                // Background sweep for idle ticket channels. Sleeps first so
                // the guild cache has been filled by the time it runs.
                let monitor = Arc::clone(&tickets);
                tokio::spawn(async move {
                    let interval = monitor.config().sweep_interval;
                    loop {
                        tokio::time::sleep(interval).await;

                        tracing::debug!("Starting ticket inactivity sweep...");
                        match Arc::clone(&monitor).sweep().await {
                            Ok(0) => tracing::debug!("No idle ticket channels found"),
                            Ok(started) => {
                                tracing::info!("Started {} ticket closure checks", started)
                            }
                            Err(e) => tracing::warn!("Ticket sweep failed: {}", e),
                        }
                    }
                });

                tracing::info!("Bot is ready!");
                Ok(Data {
                    reaction_roles,
                    tickets,
                    announcements,
                    ban_appeal_url,
                })
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
