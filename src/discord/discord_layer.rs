// Discord layer - commands, event handlers and the serenity adapters that
// implement the core ports.

use crate::core::announcements::BroadcastService;
use crate::core::reaction_roles::RoleBindingRegistry;
use crate::core::tickets::TicketCloseMonitor;
use crate::infra::reaction_roles::InMemoryBindingStore;
use std::sync::Arc;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "errors.rs"]
pub mod errors;

#[path = "http_errors.rs"]
pub mod http_errors;

#[path = "messaging/direct_messenger.rs"]
pub mod messaging;

#[path = "reaction_roles/events.rs"]
pub mod reaction_roles;

#[path = "tickets/channels.rs"]
pub mod tickets;

use self::tickets::SerenityTicketChannels;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands and event handlers.
pub struct Data {
    pub reaction_roles: Arc<RoleBindingRegistry<InMemoryBindingStore>>,
    pub tickets: Arc<TicketCloseMonitor<SerenityTicketChannels>>,
    pub announcements: Arc<BroadcastService>,
    pub ban_appeal_url: Option<String>,
}
