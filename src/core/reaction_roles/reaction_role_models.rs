// Reaction-role domain models.
//
// Pure data, no Discord types. Reaction symbols arrive here already
// canonicalized by the Discord layer, so they are compared as plain strings.

use serde::{Deserialize, Serialize};

/// One reaction symbol on one message, granting one role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub message_id: u64,
    pub symbol: String,
    pub role_id: u64,
}

/// A reaction add/remove, reduced to the ids the registry cares about.
#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub guild_id: u64,
    pub message_id: u64,
    pub symbol: String,
    pub user_id: u64,
}

/// What happened when a reaction event went through the registry.
///
/// Handlers never fail outward: a failed grant is a `Failed` outcome,
/// not an error, so the event dispatcher keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// No binding for this message/symbol pair.
    Unbound,
    /// The bot reacted to its own setup message.
    IgnoredSelf,
    /// The bound role no longer exists in the guild.
    RoleMissing,
    /// The reacting user could not be found in the guild anymore.
    MemberMissing,
    Granted(u64),
    Revoked(u64),
    /// The platform refused the grant/revoke (permissions, hierarchy, ...).
    Failed(u64),
}
