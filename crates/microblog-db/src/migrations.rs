use rusqlite::Connection;
use tracing::info;

use crate::DbResult;

pub fn run(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS user (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            active      INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS post (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            title        TEXT NOT NULL,
            content      TEXT NOT NULL,
            date_posted  TEXT NOT NULL DEFAULT (datetime('now')),
            user_id      INTEGER NOT NULL REFERENCES user(id)
        );

        CREATE INDEX IF NOT EXISTS idx_post_user
            ON post(user_id, date_posted);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
