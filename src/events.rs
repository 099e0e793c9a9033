//! Gateway events: keeps the entity tables current and records each event in
//! the log pipeline under a `discord_*` event type.

use poise::serenity_prelude as serenity;
use tracing::{debug, info, warn};

use crate::db::{
    ChannelKind, ChannelSnapshot, Database, GuildSnapshot, MemberSnapshot, ObservedMessage,
};
use crate::discord_text::preview;
use crate::{Data, Error};

pub async fn handle(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "Logged in as {} (ID: {})",
                data_about_bot.user.name, data_about_bot.user.id
            );
        }
        serenity::FullEvent::CacheReady { guilds } => {
            let snapshots: Vec<GuildSnapshot> = guilds
                .iter()
                .filter_map(|id| ctx.cache.guild(*id).map(|guild| guild_snapshot(&guild)))
                .collect();
            let count = snapshots.len();
            persist(&data.db, "resync guilds", move |db| {
                for snapshot in &snapshots {
                    db.sync_guild(snapshot)?;
                }
                Ok(())
            })
            .await;
            info!("Synced {} guilds into the database", count);
        }
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            let snapshot = guild_snapshot(guild);
            persist(&data.db, "sync guild", move |db| db.sync_guild(&snapshot)).await;
            if is_new.unwrap_or(false) {
                info!(
                    event_type = "discord_guild_join",
                    server_id = guild.id.get(),
                    "Bot joined server: {}",
                    guild.name
                );
            } else {
                debug!("Guild available: {}", guild.name);
            }
        }
        serenity::FullEvent::GuildDelete { incomplete, full } => {
            if !incomplete.unavailable {
                let name = full.as_ref().map(|g| g.name.as_str()).unwrap_or("unknown");
                warn!(
                    event_type = "discord_guild_leave",
                    server_id = incomplete.id.get(),
                    "Bot left server: {}",
                    name
                );
            }
        }
        serenity::FullEvent::ChannelCreate { channel } => {
            if let Some(kind) = channel_kind(channel.kind) {
                let (channel_id, server_id, name) =
                    (channel.id.get(), channel.guild_id.get(), channel.name.clone());
                persist(&data.db, "store channel", move |db| {
                    db.upsert_channel(channel_id, Some(server_id), Some(&name), kind)
                })
                .await;
            }
            info!(
                event_type = "discord_channel_create",
                server_id = channel.guild_id.get(),
                channel_id = channel.id.get(),
                "Channel created: #{}",
                channel.name
            );
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            warn!(
                event_type = "discord_channel_delete",
                server_id = channel.guild_id.get(),
                channel_id = channel.id.get(),
                "Channel deleted: #{}",
                channel.name
            );
        }
        serenity::FullEvent::Message { new_message } => {
            if new_message.author.bot {
                return Ok(());
            }
            let observed = observed_message(ctx, new_message);
            persist(&data.db, "store message", move |db| {
                db.record_message(&observed).map(|_| ())
            })
            .await;
            info!(
                event_type = "discord_message",
                server_id = new_message.guild_id.map(|id| id.get()),
                channel_id = new_message.channel_id.get(),
                user_id = new_message.author.id.get(),
                "{}: {}",
                new_message.author.name,
                preview(&new_message.content, 100)
            );
        }
        serenity::FullEvent::MessageUpdate {
            old_if_available,
            event,
            ..
        } => {
            let Some(author) = &event.author else {
                return Ok(());
            };
            if author.bot {
                return Ok(());
            }
            let before = old_if_available
                .as_ref()
                .map(|m| preview(&m.content, 50))
                .unwrap_or_else(|| "?".to_string());
            let after = event
                .content
                .as_deref()
                .map(|c| preview(c, 50))
                .unwrap_or_else(|| "?".to_string());
            info!(
                event_type = "discord_message_edit",
                server_id = event.guild_id.map(|id| id.get()),
                channel_id = event.channel_id.get(),
                user_id = author.id.get(),
                "{} edited message: {} -> {}",
                author.name,
                before,
                after
            );
        }
        serenity::FullEvent::MessageDelete {
            channel_id,
            deleted_message_id,
            guild_id,
        } => {
            let cached = ctx
                .cache
                .message(*channel_id, *deleted_message_id)
                .map(|m| (m.author.id.get(), m.author.name.clone(), preview(&m.content, 100)));
            match cached {
                Some((user_id, author, content)) => warn!(
                    event_type = "discord_message_delete",
                    server_id = guild_id.map(|id| id.get()),
                    channel_id = channel_id.get(),
                    user_id,
                    "{} deleted message: {}",
                    author,
                    content
                ),
                None => warn!(
                    event_type = "discord_message_delete",
                    server_id = guild_id.map(|id| id.get()),
                    channel_id = channel_id.get(),
                    "Message {} deleted",
                    deleted_message_id
                ),
            }
        }
        serenity::FullEvent::ReactionAdd { add_reaction } => {
            debug!(
                event_type = "discord_reaction_add",
                server_id = add_reaction.guild_id.map(|id| id.get()),
                channel_id = add_reaction.channel_id.get(),
                user_id = add_reaction.user_id.map(|id| id.get()),
                "Reaction {} added to message {}",
                add_reaction.emoji,
                add_reaction.message_id
            );
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            let member = member_snapshot(new_member);
            persist(&data.db, "store member", move |db| {
                db.upsert_user(member.user_id, &member.username, member.display_name.as_deref())
            })
            .await;
            info!(
                event_type = "discord_member_join",
                server_id = new_member.guild_id.get(),
                user_id = new_member.user.id.get(),
                "{} joined the server",
                new_member.user.name
            );
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            warn!(
                event_type = "discord_member_leave",
                server_id = guild_id.get(),
                user_id = user.id.get(),
                "{} left the server",
                user.name
            );
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            event,
            ..
        } => {
            let user_id = event.user.id.get();
            let username = event.user.name.clone();
            let display_name = event.nick.clone().or_else(|| event.user.global_name.clone());
            let before = old_if_available
                .as_ref()
                .map(|m| m.display_name().to_string())
                .unwrap_or_else(|| "?".to_string());
            let after = display_name.clone().unwrap_or_else(|| username.clone());

            persist(&data.db, "update member", {
                let username = username.clone();
                move |db| db.upsert_user(user_id, &username, display_name.as_deref())
            })
            .await;
            info!(
                event_type = "discord_member_update",
                server_id = event.guild_id.get(),
                user_id,
                "{} changed profile (nickname: {} -> {})",
                username,
                before,
                after
            );
        }
        _ => {}
    }
    Ok(())
}

/// Runs a write on the blocking pool. Failures are logged and swallowed so
/// one bad row never stops event handling.
async fn persist<F>(db: &Database, what: &str, f: F)
where
    F: FnOnce(&Database) -> anyhow::Result<()> + Send + 'static,
{
    if let Err(e) = db.run_blocking(f).await {
        warn!("Failed to {}: {:#}", what, e);
    }
}

fn channel_kind(kind: serenity::ChannelType) -> Option<ChannelKind> {
    match kind {
        serenity::ChannelType::Voice | serenity::ChannelType::Stage => Some(ChannelKind::Voice),
        serenity::ChannelType::Private => Some(ChannelKind::Direct),
        serenity::ChannelType::Category => None,
        _ => Some(ChannelKind::Text),
    }
}

fn member_snapshot(member: &serenity::Member) -> MemberSnapshot {
    MemberSnapshot {
        user_id: member.user.id.get(),
        username: member.user.name.clone(),
        display_name: Some(member.display_name().to_string()),
    }
}

fn guild_snapshot(guild: &serenity::Guild) -> GuildSnapshot {
    GuildSnapshot {
        server_id: guild.id.get(),
        name: guild.name.clone(),
        region: None,
        channels: guild
            .channels
            .values()
            .filter_map(|channel| {
                channel_kind(channel.kind).map(|kind| ChannelSnapshot {
                    channel_id: channel.id.get(),
                    name: channel.name.clone(),
                    kind,
                })
            })
            .collect(),
        members: guild.members.values().map(member_snapshot).collect(),
    }
}

fn observed_message(ctx: &serenity::Context, message: &serenity::Message) -> ObservedMessage {
    let (server, channel_name) = match message.guild_id {
        Some(guild_id) => {
            let cached = ctx.cache.guild(guild_id).map(|guild| {
                (
                    guild.name.clone(),
                    guild.channels.get(&message.channel_id).map(|c| c.name.clone()),
                )
            });
            match cached {
                Some((name, channel_name)) => (Some((guild_id.get(), Some(name))), channel_name),
                None => (Some((guild_id.get(), None)), None),
            }
        }
        None => (None, None),
    };

    let channel_kind = if server.is_some() {
        ChannelKind::Text
    } else {
        ChannelKind::Direct
    };

    ObservedMessage {
        discord_message_id: Some(message.id.get()),
        content: message.content.clone(),
        user_id: message.author.id.get(),
        username: message.author.name.clone(),
        display_name: message
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .or_else(|| message.author.global_name.clone()),
        server,
        channel_id: message.channel_id.get(),
        channel_name,
        channel_kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_kind_mapping() {
        assert_eq!(
            channel_kind(serenity::ChannelType::Text),
            Some(ChannelKind::Text)
        );
        assert_eq!(
            channel_kind(serenity::ChannelType::News),
            Some(ChannelKind::Text)
        );
        assert_eq!(
            channel_kind(serenity::ChannelType::Stage),
            Some(ChannelKind::Voice)
        );
        assert_eq!(
            channel_kind(serenity::ChannelType::Private),
            Some(ChannelKind::Direct)
        );
        assert_eq!(channel_kind(serenity::ChannelType::Category), None);
    }
}
