// Framework-level error handling.
//
// Privileged-command errors go back to the invoker only (ephemeral), never
// to the channel. Everything else is logged for operators.

use crate::core::moderation::ModerationAction;
use crate::discord::{Data, Error};

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::MissingUserPermissions {
            missing_permissions,
            ctx,
            ..
        } => {
            let text = match ModerationAction::from_command(&ctx.command().name) {
                Some(action) => action.denial_message().to_string(),
                None => match missing_permissions {
                    Some(permissions) => format!(
                        "❌ You need the {} permission to use this command.",
                        permissions.get_permission_names().join(", ")
                    ),
                    None => "❌ You don't have permission to use this command.".to_string(),
                },
            };

            if let Err(e) = ctx
                .send(poise::CreateReply::default().content(text).ephemeral(true))
                .await
            {
                tracing::warn!("Failed to send permission denial: {}", e);
            }
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(command = %ctx.command().name, "Command failed: {}", error);

            if let Err(e) = ctx
                .send(
                    poise::CreateReply::default()
                        .content(format!("❌ Something went wrong: {}", error))
                        .ephemeral(true),
                )
                .await
            {
                tracing::warn!("Failed to report command error: {}", e);
            }
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling framework error: {}", e);
            }
        }
    }
}
