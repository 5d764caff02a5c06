// Discord glue for reaction roles: the serenity RoleGateway plus the
// reaction add/remove event handlers.

use crate::core::reaction_roles::{ReactionEvent, ReactionOutcome, ReactionRoleError, RoleGateway};
use crate::discord::Data;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

const AUDIT_REASON: &str = "Reaction role";

/// Canonical form of a reaction symbol, shared by the setup command and the
/// reaction events: unicode emoji as-is, custom emoji by id (names can change).
pub fn symbol_key(emoji: &serenity::ReactionType) -> String {
    match emoji {
        serenity::ReactionType::Custom { id, .. } => id.get().to_string(),
        serenity::ReactionType::Unicode(text) => text.clone(),
        other => other.to_string(),
    }
}

pub struct SerenityRoleGateway<'a> {
    ctx: &'a serenity::Context,
}

impl<'a> SerenityRoleGateway<'a> {
    pub fn new(ctx: &'a serenity::Context) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl RoleGateway for SerenityRoleGateway<'_> {
    fn current_user_id(&self) -> u64 {
        self.ctx.cache.current_user().id.get()
    }

    async fn role_exists(&self, guild_id: u64, role_id: u64) -> bool {
        let guild_id = serenity::GuildId::new(guild_id);
        let role_id = serenity::RoleId::new(role_id);

        // Cache guard must be gone before the HTTP fallback awaits.
        let cached = {
            self.ctx
                .cache
                .guild(guild_id)
                .map(|guild| guild.roles.contains_key(&role_id))
        };

        match cached {
            Some(found) => found,
            None => guild_id
                .roles(&self.ctx.http)
                .await
                .map(|roles| roles.contains_key(&role_id))
                .unwrap_or(false),
        }
    }

    async fn member_exists(&self, guild_id: u64, user_id: u64) -> bool {
        self.ctx
            .http
            .get_member(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
            )
            .await
            .is_ok()
    }

    async fn grant_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), ReactionRoleError> {
        self.ctx
            .http
            .add_member_role(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                Some(AUDIT_REASON),
            )
            .await
            .map_err(|e| ReactionRoleError::RoleUpdateFailed(e.to_string()))
    }

    async fn revoke_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), ReactionRoleError> {
        self.ctx
            .http
            .remove_member_role(
                serenity::GuildId::new(guild_id),
                serenity::UserId::new(user_id),
                serenity::RoleId::new(role_id),
                Some(AUDIT_REASON),
            )
            .await
            .map_err(|e| ReactionRoleError::RoleUpdateFailed(e.to_string()))
    }
}

/// Reactions outside guilds, or without a user, can't map to a role.
fn to_event(reaction: &serenity::Reaction) -> Option<ReactionEvent> {
    Some(ReactionEvent {
        guild_id: reaction.guild_id?.get(),
        message_id: reaction.message_id.get(),
        symbol: symbol_key(&reaction.emoji),
        user_id: reaction.user_id?.get(),
    })
}

pub async fn handle_reaction_add(
    ctx: &serenity::Context,
    data: &Data,
    reaction: &serenity::Reaction,
) {
    let Some(event) = to_event(reaction) else {
        return;
    };

    let outcome = data
        .reaction_roles
        .on_reaction_added(&SerenityRoleGateway::new(ctx), &event)
        .await;
    log_outcome(&event, outcome);
}

pub async fn handle_reaction_remove(
    ctx: &serenity::Context,
    data: &Data,
    reaction: &serenity::Reaction,
) {
    let Some(event) = to_event(reaction) else {
        return;
    };

    let outcome = data
        .reaction_roles
        .on_reaction_removed(&SerenityRoleGateway::new(ctx), &event)
        .await;
    log_outcome(&event, outcome);
}

fn log_outcome(event: &ReactionEvent, outcome: ReactionOutcome) {
    match outcome {
        ReactionOutcome::Unbound => {}
        ReactionOutcome::Granted(role_id) => {
            tracing::info!(user_id = event.user_id, role_id, "Granted reaction role");
        }
        ReactionOutcome::Revoked(role_id) => {
            tracing::info!(user_id = event.user_id, role_id, "Revoked reaction role");
        }
        other => {
            tracing::debug!(
                message_id = event.message_id,
                user_id = event.user_id,
                ?other,
                "Reaction role not applied"
            );
        }
    }
}
