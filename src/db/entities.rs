//! Chat entities and log rows.
//!
//! Servers, users and channels are identity rows keyed by their Discord ids
//! and refreshed with last-write-wins upserts. Messages and log records are
//! append-only.

use rusqlite::{params, Row, ToSql};
use serde::Serialize;

use super::Database;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelKind {
    Text,
    Voice,
    Direct,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Text => "text",
            ChannelKind::Voice => "voice",
            ChannelKind::Direct => "DM",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    pub name: String,
    pub channel_count: i64,
    pub user_count: i64,
    pub message_count: i64,
}

/// A log record waiting to be written to the `Logs` table.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub timestamp: String,
    pub level: String,
    pub logger_name: String,
    pub event_type: String,
    pub message: String,
    pub server_id: Option<u64>,
    pub user_id: Option<u64>,
    pub channel_id: Option<u64>,
    pub module: Option<String>,
    pub function_name: Option<String>,
    pub line_number: Option<u32>,
    pub extra_data: Option<String>,
}

impl NewLogEntry {
    /// Entry stamped with the current local time and no provenance.
    pub fn now(level: &str, logger_name: &str, event_type: &str, message: &str) -> Self {
        Self {
            timestamp: chrono::Local::now().to_rfc3339(),
            level: level.to_string(),
            logger_name: logger_name.to_string(),
            event_type: event_type.to_string(),
            message: message.to_string(),
            server_id: None,
            user_id: None,
            channel_id: None,
            module: None,
            function_name: None,
            line_number: None,
            extra_data: None,
        }
    }
}

/// A stored log record joined with the names of what it references.
#[derive(Debug, Clone, Serialize)]
pub struct LogRow {
    pub log_id: i64,
    pub timestamp: String,
    pub level: String,
    pub logger_name: String,
    pub event_type: String,
    pub message: String,
    pub server_id: Option<u64>,
    pub user_id: Option<u64>,
    pub channel_id: Option<u64>,
    pub module: Option<String>,
    pub function_name: Option<String>,
    pub line_number: Option<i64>,
    pub extra_data: Option<String>,
    pub created_at: String,
    pub server_name: Option<String>,
    pub username: Option<String>,
    pub channel_name: Option<String>,
}

impl LogRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            log_id: row.get("log_id")?,
            timestamp: row.get("timestamp")?,
            level: row.get("level")?,
            logger_name: row.get("logger_name")?,
            event_type: row.get("event_type")?,
            message: row.get("message")?,
            server_id: row.get("server_id")?,
            user_id: row.get("user_id")?,
            channel_id: row.get("channel_id")?,
            module: row.get("module")?,
            function_name: row.get("function_name")?,
            line_number: row.get("line_number")?,
            extra_data: row.get("extra_data")?,
            created_at: row.get("created_at")?,
            server_name: row.get("server_name")?,
            username: row.get("username")?,
            channel_name: row.get("channel_name")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub channel_id: u64,
    pub name: String,
    pub kind: ChannelKind,
}

#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub user_id: u64,
    pub username: String,
    pub display_name: Option<String>,
}

/// Everything known about one server at a point in time.
#[derive(Debug, Clone)]
pub struct GuildSnapshot {
    pub server_id: u64,
    pub name: String,
    pub region: Option<String>,
    pub channels: Vec<ChannelSnapshot>,
    pub members: Vec<MemberSnapshot>,
}

/// A chat message as seen by the bot, with enough context to refresh the
/// identity rows it depends on.
#[derive(Debug, Clone)]
pub struct ObservedMessage {
    pub discord_message_id: Option<u64>,
    pub content: String,
    pub user_id: u64,
    pub username: String,
    pub display_name: Option<String>,
    /// `(server_id, server_name)`; `None` for direct messages. The name is
    /// `None` when the guild was not cached, which leaves a stored name alone.
    pub server: Option<(u64, Option<String>)>,
    pub channel_id: u64,
    pub channel_name: Option<String>,
    pub channel_kind: ChannelKind,
}

const UPSERT_SERVER: &str = "
    INSERT INTO Servers (server_id, server_name, region, created_at)
    VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
    ON CONFLICT(server_id) DO UPDATE SET
        server_name = excluded.server_name,
        region = excluded.region";

const UPSERT_USER: &str = "
    INSERT INTO Users (user_id, username, display_name, created_at)
    VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
    ON CONFLICT(user_id) DO UPDATE SET
        username = excluded.username,
        display_name = excluded.display_name";

const UPSERT_CHANNEL: &str = "
    INSERT INTO Channels (channel_id, server_id, channel_name, channel_type, created_at)
    VALUES (?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)
    ON CONFLICT(channel_id) DO UPDATE SET
        server_id = excluded.server_id,
        channel_name = excluded.channel_name,
        channel_type = excluded.channel_type";

const INSERT_MESSAGE: &str = "
    INSERT INTO Messages (discord_message_id, channel_id, user_id, content, sent_at)
    VALUES (?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)";

// References to servers/users/channels that were never stored resolve to
// NULL so one stray id cannot fail a whole batch on a foreign key.
const INSERT_LOG: &str = "
    INSERT INTO Logs (timestamp, level, logger_name, event_type, message,
                      server_id, user_id, channel_id,
                      module, function_name, line_number, extra_data)
    VALUES (?1, ?2, ?3, ?4, ?5,
            (SELECT server_id FROM Servers WHERE server_id = ?6),
            (SELECT user_id FROM Users WHERE user_id = ?7),
            (SELECT channel_id FROM Channels WHERE channel_id = ?8),
            ?9, ?10, ?11, ?12)";

const SELECT_LOGS: &str = "
    SELECT l.*, s.server_name, u.username, c.channel_name
    FROM Logs l
    LEFT JOIN Servers s ON l.server_id = s.server_id
    LEFT JOIN Users u ON l.user_id = u.user_id
    LEFT JOIN Channels c ON l.channel_id = c.channel_id";

impl Database {
    pub fn upsert_server(
        &self,
        server_id: u64,
        name: &str,
        region: Option<&str>,
    ) -> anyhow::Result<()> {
        self.execute(UPSERT_SERVER, params![server_id, name, region])?;
        Ok(())
    }

    pub fn upsert_user(
        &self,
        user_id: u64,
        username: &str,
        display_name: Option<&str>,
    ) -> anyhow::Result<()> {
        self.execute(UPSERT_USER, params![user_id, username, display_name])?;
        Ok(())
    }

    pub fn upsert_channel(
        &self,
        channel_id: u64,
        server_id: Option<u64>,
        name: Option<&str>,
        kind: ChannelKind,
    ) -> anyhow::Result<()> {
        self.execute(
            UPSERT_CHANNEL,
            params![channel_id, server_id, name, kind.as_str()],
        )?;
        Ok(())
    }

    /// Appends a message and returns its generated id.
    pub fn insert_message(
        &self,
        channel_id: u64,
        user_id: u64,
        content: &str,
        discord_message_id: Option<u64>,
    ) -> anyhow::Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                INSERT_MESSAGE,
                params![discord_message_id, channel_id, user_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Refreshes the author, server and channel of a message, then stores it.
    pub fn record_message(&self, message: &ObservedMessage) -> anyhow::Result<i64> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                UPSERT_USER,
                params![message.user_id, message.username, message.display_name],
            )?;
            let server_id = match &message.server {
                Some((id, Some(name))) => {
                    tx.execute(
                        "INSERT INTO Servers (server_id, server_name, created_at)
                         VALUES (?1, ?2, CURRENT_TIMESTAMP)
                         ON CONFLICT(server_id) DO UPDATE SET server_name = excluded.server_name",
                        params![id, name],
                    )?;
                    Some(*id)
                }
                Some((id, None)) => {
                    // Placeholder name, only used if the server was never seen
                    tx.execute(
                        "INSERT INTO Servers (server_id, server_name, created_at)
                         VALUES (?1, ?2, CURRENT_TIMESTAMP)
                         ON CONFLICT(server_id) DO NOTHING",
                        params![id, id.to_string()],
                    )?;
                    Some(*id)
                }
                None => None,
            };
            tx.execute(
                UPSERT_CHANNEL,
                params![
                    message.channel_id,
                    server_id,
                    message.channel_name,
                    message.channel_kind.as_str()
                ],
            )?;
            tx.execute(
                INSERT_MESSAGE,
                params![
                    message.discord_message_id,
                    message.channel_id,
                    message.user_id,
                    message.content
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(id)
        })
    }

    /// Upserts a server together with all of its channels and members.
    pub fn sync_guild(&self, guild: &GuildSnapshot) -> anyhow::Result<()> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                UPSERT_SERVER,
                params![guild.server_id, guild.name, guild.region],
            )?;
            for channel in &guild.channels {
                tx.execute(
                    UPSERT_CHANNEL,
                    params![
                        channel.channel_id,
                        guild.server_id,
                        channel.name,
                        channel.kind.as_str()
                    ],
                )?;
            }
            for member in &guild.members {
                tx.execute(
                    UPSERT_USER,
                    params![member.user_id, member.username, member.display_name],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Channel, user and message counts for one server, or `None` if the
    /// server was never stored.
    pub fn server_stats(&self, server_id: u64) -> anyhow::Result<Option<ServerStats>> {
        self.fetch_one(
            "SELECT s.server_name,
                    COUNT(DISTINCT c.channel_id) AS channel_count,
                    COUNT(DISTINCT u.user_id) AS user_count,
                    COUNT(m.message_id) AS message_count
             FROM Servers s
             LEFT JOIN Channels c ON s.server_id = c.server_id
             LEFT JOIN Messages m ON c.channel_id = m.channel_id
             LEFT JOIN Users u ON m.user_id = u.user_id
             WHERE s.server_id = ?1
             GROUP BY s.server_id, s.server_name",
            [server_id],
            |row| {
                Ok(ServerStats {
                    name: row.get(0)?,
                    channel_count: row.get(1)?,
                    user_count: row.get(2)?,
                    message_count: row.get(3)?,
                })
            },
        )
    }

    pub fn insert_event_log(&self, entry: &NewLogEntry) -> anyhow::Result<()> {
        self.insert_log_batch(std::slice::from_ref(entry))?;
        Ok(())
    }

    /// Writes a batch of log records in one transaction.
    pub fn insert_log_batch(&self, entries: &[NewLogEntry]) -> anyhow::Result<usize> {
        self.execute_many(
            INSERT_LOG,
            entries.iter().map(|e| {
                (
                    &e.timestamp,
                    &e.level,
                    &e.logger_name,
                    &e.event_type,
                    &e.message,
                    e.server_id,
                    e.user_id,
                    e.channel_id,
                    &e.module,
                    &e.function_name,
                    e.line_number,
                    &e.extra_data,
                )
            }),
        )
    }

    /// Newest log rows first, optionally filtered by event type and level.
    pub fn recent_logs(
        &self,
        limit: usize,
        event_type: Option<&str>,
        level: Option<&str>,
    ) -> anyhow::Result<Vec<LogRow>> {
        let mut sql = String::from(SELECT_LOGS);
        let mut conditions = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        if let Some(event_type) = &event_type {
            conditions.push("l.event_type = ?");
            params.push(event_type);
        }
        if let Some(level) = &level {
            conditions.push("l.level = ?");
            params.push(level);
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY l.created_at DESC, l.log_id DESC LIMIT ?");
        params.push(&limit);

        self.fetch_many(&sql, &params[..], LogRow::from_row)
    }

    /// Newest Discord event rows (`discord_*` event types), optionally for one server.
    pub fn discord_logs(&self, limit: usize, server_id: Option<u64>) -> anyhow::Result<Vec<LogRow>> {
        let mut sql = format!("{} WHERE l.event_type LIKE 'discord_%'", SELECT_LOGS);
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if let Some(server_id) = &server_id {
            sql.push_str(" AND l.server_id = ?");
            params.push(server_id);
        }
        sql.push_str(" ORDER BY l.created_at DESC, l.log_id DESC LIMIT ?");
        params.push(&limit);

        self.fetch_many(&sql, &params[..], LogRow::from_row)
    }

    pub fn app_logs(&self, limit: usize, level: Option<&str>) -> anyhow::Result<Vec<LogRow>> {
        self.recent_logs(limit, Some("app_log"), level)
    }

    /// Deletes log rows created more than `days_to_keep` days ago.
    pub fn cleanup_old_logs(&self, days_to_keep: u64) -> anyhow::Result<usize> {
        let deleted = self.execute(
            "DELETE FROM Logs WHERE created_at < datetime('now', ?1)",
            [format!("-{} days", days_to_keep)],
        )?;
        tracing::info!(
            "Database: removed {} log rows older than {} days",
            deleted,
            days_to_keep
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_db() -> Database {
        let db = Database::open(":memory:").unwrap();
        db.setup().unwrap();
        db
    }

    fn count(db: &Database, sql: &str) -> i64 {
        db.fetch_one(sql, [], |row| row.get(0)).unwrap().unwrap()
    }

    fn observed(id: u64, user_id: u64, channel_id: u64, server: Option<(u64, &str)>) -> ObservedMessage {
        ObservedMessage {
            discord_message_id: Some(id),
            content: format!("message {}", id),
            user_id,
            username: format!("user{}", user_id),
            display_name: None,
            server: server.map(|(id, name)| (id, Some(name.to_string()))),
            channel_id,
            channel_name: Some("general".to_string()),
            channel_kind: if server.is_some() {
                ChannelKind::Text
            } else {
                ChannelKind::Direct
            },
        }
    }

    #[test]
    fn test_upsert_server_last_write_wins() {
        let db = memory_db();
        db.upsert_server(10, "old name", Some("eu")).unwrap();
        let created: String = db
            .fetch_one("SELECT created_at FROM Servers WHERE server_id = 10", [], |r| r.get(0))
            .unwrap()
            .unwrap();

        db.upsert_server(10, "new name", None).unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM Servers"), 1);
        let (name, region, created_again): (String, Option<String>, String) = db
            .fetch_one(
                "SELECT server_name, region, created_at FROM Servers WHERE server_id = 10",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap()
            .unwrap();
        assert_eq!(name, "new name");
        assert_eq!(region, None);
        assert_eq!(created, created_again);
    }

    #[test]
    fn test_upsert_user_and_channel_overwrite_fields() {
        let db = memory_db();
        db.upsert_server(1, "guild", None).unwrap();
        db.upsert_user(5, "alice", Some("Alice")).unwrap();
        db.upsert_user(5, "alice2", None).unwrap();
        db.upsert_channel(9, Some(1), Some("general"), ChannelKind::Text)
            .unwrap();
        db.upsert_channel(9, None, Some("lounge"), ChannelKind::Voice)
            .unwrap();

        let user: (String, Option<String>) = db
            .fetch_one("SELECT username, display_name FROM Users WHERE user_id = 5", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap()
            .unwrap();
        assert_eq!(user, ("alice2".to_string(), None));

        let channel: (Option<u64>, String, String) = db
            .fetch_one(
                "SELECT server_id, channel_name, channel_type FROM Channels WHERE channel_id = 9",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap()
            .unwrap();
        assert_eq!(channel, (None, "lounge".to_string(), "voice".to_string()));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Users"), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Channels"), 1);
    }

    #[test]
    fn test_message_requires_channel_and_user() {
        let db = memory_db();
        assert!(db.insert_message(1, 1, "orphan", None).is_err());

        db.upsert_user(1, "alice", None).unwrap();
        db.upsert_channel(1, None, None, ChannelKind::Direct).unwrap();
        let first = db.insert_message(1, 1, "hello", Some(100)).unwrap();
        let second = db.insert_message(1, 1, "again", None).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_record_message_populates_entities() {
        let db = memory_db();
        db.record_message(&observed(1, 5, 20, Some((3, "guild")))).unwrap();
        db.record_message(&observed(2, 6, 21, None)).unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM Servers"), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Users"), 2);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Channels"), 2);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Messages"), 2);
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM Channels WHERE server_id IS NULL AND channel_type = 'DM'"),
            1
        );
    }

    #[test]
    fn test_uncached_server_name_keeps_stored_name() {
        let db = memory_db();
        db.upsert_server(3, "guild", Some("eu")).unwrap();

        let mut message = observed(1, 5, 20, None);
        message.server = Some((3, None));
        message.channel_kind = ChannelKind::Text;
        db.record_message(&message).unwrap();

        let mut unseen = observed(2, 5, 21, None);
        unseen.server = Some((9, None));
        unseen.channel_kind = ChannelKind::Text;
        db.record_message(&unseen).unwrap();

        let names: Vec<(u64, String, Option<String>)> = db
            .fetch_many(
                "SELECT server_id, server_name, region FROM Servers ORDER BY server_id",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(
            names,
            vec![
                (3, "guild".to_string(), Some("eu".to_string())),
                (9, "9".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_deletes_cascade_and_null_log_references() {
        let db = memory_db();
        db.record_message(&observed(1, 5, 20, Some((3, "guild")))).unwrap();
        let mut entry = NewLogEntry::now("INFO", "discord", "discord_message", "hi");
        entry.server_id = Some(3);
        entry.channel_id = Some(20);
        entry.user_id = Some(5);
        db.insert_event_log(&entry).unwrap();

        db.execute("DELETE FROM Servers WHERE server_id = 3", []).unwrap();

        assert_eq!(count(&db, "SELECT COUNT(*) FROM Channels"), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Messages"), 0);
        let refs: (Option<u64>, Option<u64>, Option<u64>) = db
            .fetch_one("SELECT server_id, channel_id, user_id FROM Logs", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap()
            .unwrap();
        assert_eq!(refs, (None, None, Some(5)));
    }

    #[test]
    fn test_sync_guild_and_stats() {
        let db = memory_db();
        db.sync_guild(&GuildSnapshot {
            server_id: 1,
            name: "guild".to_string(),
            region: None,
            channels: vec![
                ChannelSnapshot {
                    channel_id: 10,
                    name: "general".to_string(),
                    kind: ChannelKind::Text,
                },
                ChannelSnapshot {
                    channel_id: 11,
                    name: "voice".to_string(),
                    kind: ChannelKind::Voice,
                },
            ],
            members: vec![
                MemberSnapshot {
                    user_id: 100,
                    username: "alice".to_string(),
                    display_name: Some("Alice".to_string()),
                },
                MemberSnapshot {
                    user_id: 101,
                    username: "bob".to_string(),
                    display_name: None,
                },
            ],
        })
        .unwrap();

        db.insert_message(10, 100, "one", None).unwrap();
        db.insert_message(10, 100, "two", None).unwrap();
        db.insert_message(10, 101, "three", None).unwrap();

        let stats = db.server_stats(1).unwrap().unwrap();
        assert_eq!(
            stats,
            ServerStats {
                name: "guild".to_string(),
                channel_count: 2,
                user_count: 2,
                message_count: 3,
            }
        );
        assert!(db.server_stats(999).unwrap().is_none());
    }

    #[test]
    fn test_log_batch_nulls_unknown_references() {
        let db = memory_db();
        db.upsert_user(5, "alice", None).unwrap();
        let mut entry = NewLogEntry::now("INFO", "relaybot", "app_log", "hello");
        entry.user_id = Some(5);
        entry.server_id = Some(404);

        assert_eq!(db.insert_log_batch(&[entry.clone(), entry]).unwrap(), 2);

        let rows = db.recent_logs(10, None, None).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.server_id.is_none()));
        assert!(rows.iter().all(|r| r.username.as_deref() == Some("alice")));
    }

    #[test]
    fn test_log_batch_stores_every_column() {
        let db = memory_db();
        let mut first = NewLogEntry::now("DEBUG", "relaybot::events", "discord_reaction_add", "first");
        first.module = Some("relaybot::events".to_string());
        first.function_name = Some("handle".to_string());
        first.line_number = Some(42);
        first.extra_data = Some(r#"{"emoji":"👍"}"#.to_string());
        let second = NewLogEntry::now("INFO", "relaybot", "app_log", "second");

        assert_eq!(db.insert_log_batch(&[first, second]).unwrap(), 2);

        let rows = db
            .fetch_many(
                "SELECT l.*, NULL AS server_name, NULL AS username, NULL AS channel_name
                 FROM Logs l ORDER BY log_id",
                [],
                LogRow::from_row,
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].message, "first");
        assert_eq!(rows[0].level, "DEBUG");
        assert_eq!(rows[0].module.as_deref(), Some("relaybot::events"));
        assert_eq!(rows[0].function_name.as_deref(), Some("handle"));
        assert_eq!(rows[0].line_number, Some(42));
        assert_eq!(rows[0].extra_data.as_deref(), Some(r#"{"emoji":"👍"}"#));
        assert_eq!(rows[1].message, "second");
        assert_eq!(rows[1].module, None);
    }

    #[test]
    fn test_log_queries_filter_by_type_level_and_server() {
        let db = memory_db();
        db.upsert_server(1, "guild", None).unwrap();

        let mut joined = NewLogEntry::now("INFO", "discord", "discord_member_join", "joined");
        joined.server_id = Some(1);
        let mut elsewhere = NewLogEntry::now("WARNING", "discord", "discord_message_delete", "gone");
        elsewhere.server_id = None;
        let app = NewLogEntry::now("ERROR", "relaybot::api", "app_log", "boom");
        db.insert_log_batch(&[joined, elsewhere, app]).unwrap();

        assert_eq!(db.discord_logs(10, None).unwrap().len(), 2);
        let for_server = db.discord_logs(10, Some(1)).unwrap();
        assert_eq!(for_server.len(), 1);
        assert_eq!(for_server[0].server_name.as_deref(), Some("guild"));

        assert_eq!(db.app_logs(10, None).unwrap().len(), 1);
        assert_eq!(db.app_logs(10, Some("INFO")).unwrap().len(), 0);
        assert_eq!(db.recent_logs(10, None, Some("WARNING")).unwrap().len(), 1);
        assert_eq!(db.recent_logs(1, None, None).unwrap().len(), 1);

        let newest = db.recent_logs(10, None, None).unwrap();
        assert_eq!(newest[0].message, "boom");
    }

    #[test]
    fn test_cleanup_removes_only_expired_logs() {
        let db = memory_db();
        for (message, age) in [("ancient", "-40 days"), ("old", "-31 days"), ("recent", "-29 days")] {
            db.execute(
                "INSERT INTO Logs (timestamp, level, logger_name, event_type, message, created_at)
                 VALUES ('t', 'INFO', 'test', 'app_log', ?1, datetime('now', ?2))",
                [message, age],
            )
            .unwrap();
        }
        db.insert_event_log(&NewLogEntry::now("INFO", "test", "app_log", "now"))
            .unwrap();

        assert_eq!(db.cleanup_old_logs(30).unwrap(), 2);

        let remaining: Vec<String> = db
            .fetch_many("SELECT message FROM Logs ORDER BY log_id", [], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, vec!["recent".to_string(), "now".to_string()]);
    }
}
