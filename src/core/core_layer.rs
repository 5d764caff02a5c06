// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "reaction_roles/mod.rs"]
pub mod reaction_roles;

#[path = "tickets/mod.rs"]
pub mod tickets;

#[path = "announcements/mod.rs"]
pub mod announcements;

#[path = "moderation/mod.rs"]
pub mod moderation;
