use crate::{Context, Error};
use poise::serenity_prelude as serenity;
use tracing::info;

const DEFAULT_CLEAR_LIMIT: u8 = 100;

/// Delete recent messages (Owner only). In DMs only the bot's own messages are removed.
#[poise::command(prefix_command, owners_only, hide_in_help, broadcast_typing)]
pub async fn clear(ctx: Context<'_>, remove: Option<u8>) -> Result<(), Error> {
    let limit = remove.unwrap_or(DEFAULT_CLEAR_LIMIT).clamp(1, 100);
    let channel = ctx.channel_id();
    let messages = channel
        .messages(ctx.serenity_context(), serenity::GetMessages::new().limit(limit))
        .await?;

    if ctx.guild_id().is_some() {
        let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();
        match ids.as_slice() {
            [] => {}
            [single] => channel.delete_message(ctx.http(), *single).await?,
            _ => channel.delete_messages(ctx.http(), &ids).await?,
        }
        info!("Purged {} messages in channel {}", ids.len(), channel);
    } else {
        let bot_id = ctx.framework().bot_id;
        let mut count = 0;
        for message in messages.iter().filter(|m| m.author.id == bot_id) {
            message.delete(ctx.serenity_context()).await?;
            count += 1;
        }
        ctx.say(format!("Deleted {} of my messages", count)).await?;
        info!("Deleted {} of my messages", count);
    }
    Ok(())
}

/// Shut down the bot (Owner only)
#[poise::command(prefix_command, owners_only, hide_in_help)]
pub async fn shutdown(ctx: Context<'_>) -> Result<(), Error> {
    info!("Shutdown command received from owner: {}", ctx.author().name);
    ctx.say("👋 Shutting down...").await?;
    let flushed = ctx.data().logs.try_flush().await;
    info!("Flushed {} pending log records before shutdown", flushed);
    ctx.framework().shard_manager().shutdown_all().await;
    Ok(())
}
