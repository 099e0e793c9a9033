use tracing::{error, info};

use crate::discord_text::{chunk_response, DISCORD_CHUNK_LIMIT};
use crate::{Context, Data, Error};

pub mod admin;
pub mod agent;
pub mod games;
pub mod general;
pub mod logs;

pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![
        agent::query(),
        agent::model(),
        general::ping(),
        general::health(),
        games::coinflip(),
        games::rps(),
        admin::clear(),
        admin::shutdown(),
        logs::db_stats(),
        logs::recent_logs(),
    ]
}

/// Sends `text` as consecutive messages that each fit in one Discord message.
pub async fn send_chunked(ctx: Context<'_>, text: &str) -> Result<(), Error> {
    let chunks = chunk_response(text, DISCORD_CHUNK_LIMIT);
    info!("Sending reply of {} chars in {} chunks", text.chars().count(), chunks.len());
    for chunk in chunks {
        if chunk.trim().is_empty() {
            continue;
        }
        ctx.say(chunk).await?;
    }
    Ok(())
}

/// `(server_id, channel_id, user_id)` of the invocation.
fn invocation_ids(ctx: Context<'_>) -> (Option<u64>, u64, u64) {
    (
        ctx.guild_id().map(|id| id.get()),
        ctx.channel_id().get(),
        ctx.author().id.get(),
    )
}

pub async fn post_command(ctx: Context<'_>) {
    let (server_id, channel_id, user_id) = invocation_ids(ctx);
    info!(
        event_type = "discord_command",
        server_id,
        channel_id,
        user_id,
        "Command completed: {}{}",
        ctx.prefix(),
        ctx.command().qualified_name
    );
}

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let (server_id, channel_id, user_id) = invocation_ids(ctx);
            error!(
                event_type = "discord_command_error",
                server_id,
                channel_id,
                user_id,
                "Command error: {}{} - {}",
                ctx.prefix(),
                ctx.command().qualified_name,
                error
            );
            let _ = ctx.say(format!("❌ Error: {}", error)).await;
        }
        poise::FrameworkError::ArgumentParse {
            error, input, ctx, ..
        } => {
            let (server_id, channel_id, user_id) = invocation_ids(ctx);
            error!(
                event_type = "discord_command_error",
                server_id,
                channel_id,
                user_id,
                "Command error: {}{} - bad argument {:?}: {}",
                ctx.prefix(),
                ctx.command().qualified_name,
                input,
                error
            );
            let usage = ctx
                .command()
                .help_text
                .clone()
                .unwrap_or_else(|| "Check the command's arguments.".to_string());
            let _ = ctx
                .say(format!("❌ Invalid arguments: {}\n{}", error, usage))
                .await;
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}
