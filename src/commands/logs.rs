use crate::discord_text::preview;
use crate::{Context, Error};
use poise::serenity_prelude as serenity;

/// Database statistics for this server (Administrator only)
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn db_stats(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?.get();

    let stats = ctx
        .data()
        .db
        .run_blocking(move |db| db.server_stats(guild_id))
        .await?;

    let Some(stats) = stats else {
        ctx.say("No statistics found for this server.").await?;
        return Ok(());
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("Database Stats for {}", stats.name))
        .field("Channels", stats.channel_count.to_string(), true)
        .field("Users", stats.user_count.to_string(), true)
        .field("Messages", stats.message_count.to_string(), true)
        .color(0x00ff00);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Recent Discord events logged for this server (Administrator only)
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn recent_logs(ctx: Context<'_>, limit: Option<usize>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be run in a guild")?.get();
    let limit = limit.unwrap_or(10).clamp(1, 100);

    let logs = ctx
        .data()
        .db
        .run_blocking(move |db| db.discord_logs(limit, Some(guild_id)))
        .await?;

    if logs.is_empty() {
        ctx.say("No recent logs found for this server.").await?;
        return Ok(());
    }

    // Embeds get unwieldy past a handful of fields
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("Recent Discord Logs ({})", logs.len()))
        .color(0x0099ff);
    for log in logs.iter().take(5) {
        embed = embed.field(
            format!("{} - {}", log.level, log.event_type),
            preview(&log.message, 100),
            false,
        );
    }
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
