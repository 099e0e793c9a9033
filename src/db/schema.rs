//! SQL for the persisted chat and log schema.

/// Tables every healthy database must contain.
pub const EXPECTED_TABLES: [&str; 5] = ["Servers", "Users", "Channels", "Messages", "Logs"];

/// Creates the schema if it is absent. Safe to run on every boot.
pub const CREATE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Servers (
    server_id   INTEGER  NOT NULL PRIMARY KEY,
    server_name TEXT     NOT NULL,
    region      TEXT     NULL,
    created_at  DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS Users (
    user_id      INTEGER  NOT NULL PRIMARY KEY,
    username     TEXT     NOT NULL,
    display_name TEXT     NULL,
    created_at   DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS Channels (
    channel_id   INTEGER  NOT NULL PRIMARY KEY,
    server_id    INTEGER  NULL,
    channel_name TEXT     NULL,
    channel_type TEXT     NOT NULL CHECK (channel_type IN ('text', 'voice', 'DM')),
    created_at   DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (server_id) REFERENCES Servers (server_id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS IX_Channels_Server ON Channels (server_id);

CREATE TABLE IF NOT EXISTS Messages (
    message_id         INTEGER  PRIMARY KEY AUTOINCREMENT,
    discord_message_id INTEGER  NULL,
    channel_id         INTEGER  NOT NULL,
    user_id            INTEGER  NOT NULL,
    content            TEXT     NOT NULL,
    sent_at            DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (channel_id) REFERENCES Channels (channel_id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES Users (user_id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS IX_Messages_Channel ON Messages (channel_id);
CREATE INDEX IF NOT EXISTS IX_Messages_User ON Messages (user_id);
CREATE INDEX IF NOT EXISTS IX_Messages_Discord ON Messages (discord_message_id);

-- Discord events and application logs share one table, told apart by event_type.
CREATE TABLE IF NOT EXISTS Logs (
    log_id        INTEGER  PRIMARY KEY AUTOINCREMENT,
    timestamp     TEXT     NOT NULL,
    level         TEXT     NOT NULL,
    logger_name   TEXT     NOT NULL,
    event_type    TEXT     NOT NULL,
    message       TEXT     NOT NULL,
    server_id     INTEGER  NULL,
    user_id       INTEGER  NULL,
    channel_id    INTEGER  NULL,
    module        TEXT     NULL,
    function_name TEXT     NULL,
    line_number   INTEGER  NULL,
    extra_data    TEXT     NULL,
    created_at    DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (channel_id) REFERENCES Channels (channel_id) ON DELETE SET NULL,
    FOREIGN KEY (server_id) REFERENCES Servers (server_id) ON DELETE SET NULL,
    FOREIGN KEY (user_id) REFERENCES Users (user_id) ON DELETE SET NULL
);
CREATE INDEX IF NOT EXISTS IX_Logs_Level ON Logs (level);
CREATE INDEX IF NOT EXISTS IX_Logs_EventType ON Logs (event_type);
CREATE INDEX IF NOT EXISTS IX_Logs_Logger ON Logs (logger_name);
CREATE INDEX IF NOT EXISTS IX_Logs_Timestamp ON Logs (timestamp DESC);
CREATE INDEX IF NOT EXISTS IX_Logs_ServerUser ON Logs (server_id, user_id);
CREATE INDEX IF NOT EXISTS IX_Logs_CreatedAt ON Logs (created_at DESC);
";

/// Drops every table, children first. Only used by an explicit reset.
pub const DROP_SCHEMA: &str = "
DROP TABLE IF EXISTS ApplicationLogs;
DROP TABLE IF EXISTS Logs;
DROP TABLE IF EXISTS Messages;
DROP TABLE IF EXISTS Channels;
DROP TABLE IF EXISTS Users;
DROP TABLE IF EXISTS Servers;
";
