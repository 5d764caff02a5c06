// Reaction-role registry - maps (message, reaction symbol) to a grantable role
// and turns reaction events into role grants/revokes.
//
// NO Discord dependencies here. The registry talks to the platform only
// through the `RoleGateway` port, so the whole flow is testable with a
// recording mock.

use super::reaction_role_models::{ReactionEvent, ReactionOutcome, RoleBinding};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ReactionRoleError {
    #[error("Invalid binding: {0}")]
    InvalidBinding(&'static str),

    #[error("Role update failed: {0}")]
    RoleUpdateFailed(String),
}

// ============================================================================
// PORTS
// ============================================================================

/// Where bindings live. Process-lifetime only; nothing is persisted.
///
/// Implementations must tolerate concurrent calls from many event handlers.
pub trait BindingStore: Send + Sync {
    /// Insert or overwrite a binding. Returns the role it replaced, if any.
    fn insert(&self, binding: RoleBinding) -> Option<u64>;

    /// Look up the role bound to a symbol on a message.
    fn get(&self, message_id: u64, symbol: &str) -> Option<u64>;

    /// All bindings on a message, in no particular order.
    fn bindings_for(&self, message_id: u64) -> Vec<RoleBinding>;
}

/// The platform operations the registry needs.
#[async_trait]
pub trait RoleGateway: Send + Sync {
    /// The bot's own user id, used to ignore its setup reactions.
    fn current_user_id(&self) -> u64;

    async fn role_exists(&self, guild_id: u64, role_id: u64) -> bool;

    /// Must ask the platform, not trust the event payload: removal events
    /// don't carry member data.
    async fn member_exists(&self, guild_id: u64, user_id: u64) -> bool;

    async fn grant_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), ReactionRoleError>;

    async fn revoke_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), ReactionRoleError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct RoleBindingRegistry<S: BindingStore> {
    store: S,
}

impl<S: BindingStore> RoleBindingRegistry<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a binding, overwriting any previous role for the same symbol.
    pub fn bind(
        &self,
        message_id: u64,
        symbol: &str,
        role_id: u64,
    ) -> Result<Option<u64>, ReactionRoleError> {
        if message_id == 0 {
            return Err(ReactionRoleError::InvalidBinding("message id is empty"));
        }
        if role_id == 0 {
            return Err(ReactionRoleError::InvalidBinding("role id is empty"));
        }
        if symbol.trim().is_empty() {
            return Err(ReactionRoleError::InvalidBinding("reaction symbol is empty"));
        }

        let previous = self.store.insert(RoleBinding {
            message_id,
            symbol: symbol.to_string(),
            role_id,
        });

        tracing::info!(message_id, symbol, role_id, ?previous, "Reaction role bound");
        Ok(previous)
    }

    /// `None` is the normal answer for reactions on unrelated messages.
    pub fn resolve(&self, message_id: u64, symbol: &str) -> Option<u64> {
        self.store.get(message_id, symbol)
    }

    pub fn bindings_for(&self, message_id: u64) -> Vec<RoleBinding> {
        self.store.bindings_for(message_id)
    }

    /// Grant the bound role to whoever reacted.
    pub async fn on_reaction_added<G: RoleGateway>(
        &self,
        gateway: &G,
        event: &ReactionEvent,
    ) -> ReactionOutcome {
        let Some(role_id) = self.resolve(event.message_id, &event.symbol) else {
            return ReactionOutcome::Unbound;
        };

        if event.user_id == gateway.current_user_id() {
            return ReactionOutcome::IgnoredSelf;
        }

        if !gateway.role_exists(event.guild_id, role_id).await {
            tracing::debug!(
                message_id = event.message_id,
                role_id,
                "Bound role no longer exists, ignoring reaction"
            );
            return ReactionOutcome::RoleMissing;
        }

        match gateway
            .grant_role(event.guild_id, event.user_id, role_id)
            .await
        {
            Ok(()) => ReactionOutcome::Granted(role_id),
            Err(e) => {
                tracing::warn!(
                    guild_id = event.guild_id,
                    user_id = event.user_id,
                    role_id,
                    "Failed to grant reaction role: {}",
                    e
                );
                ReactionOutcome::Failed(role_id)
            }
        }
    }

    /// Revoke the bound role from whoever removed their reaction.
    pub async fn on_reaction_removed<G: RoleGateway>(
        &self,
        gateway: &G,
        event: &ReactionEvent,
    ) -> ReactionOutcome {
        let Some(role_id) = self.resolve(event.message_id, &event.symbol) else {
            return ReactionOutcome::Unbound;
        };

        if !gateway.member_exists(event.guild_id, event.user_id).await {
            return ReactionOutcome::MemberMissing;
        }

        if !gateway.role_exists(event.guild_id, role_id).await {
            return ReactionOutcome::RoleMissing;
        }

        match gateway
            .revoke_role(event.guild_id, event.user_id, role_id)
            .await
        {
            Ok(()) => ReactionOutcome::Revoked(role_id),
            Err(e) => {
                tracing::warn!(
                    guild_id = event.guild_id,
                    user_id = event.user_id,
                    role_id,
                    "Failed to revoke reaction role: {}",
                    e
                );
                ReactionOutcome::Failed(role_id)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
