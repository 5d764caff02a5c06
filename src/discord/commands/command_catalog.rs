// Discord commands module.
// Each feature gets its own command file.

pub mod messaging;

pub mod moderation;

pub mod posts;

pub mod reaction_roles;

pub mod tickets;

// Bot presence management
pub mod presence;
