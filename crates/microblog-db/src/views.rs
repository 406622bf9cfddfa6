//! Read-only reporting views over `user` and `post`.
//!
//! Views are dropped and recreated every time the store opens. Creation is
//! best-effort: readers in [`crate::reports`] fall back to running the same
//! SELECT inline when a view is missing.

use rusqlite::Connection;
use tracing::{info, warn};

use crate::DbResult;
use crate::records::view_exists;

pub struct ViewDef {
    pub name: &'static str,
    pub select: &'static str,
}

pub const USER_STATS: ViewDef = ViewDef {
    name: "v_user_stats",
    select: "SELECT u.id, u.username, u.email, COUNT(p.id) AS post_count,
                    MAX(p.date_posted) AS last_post_date, MIN(p.date_posted) AS first_post_date
             FROM user u LEFT JOIN post p ON u.id = p.user_id
             GROUP BY u.id, u.username, u.email",
};

pub const POST_SUMMARY: ViewDef = ViewDef {
    name: "v_post_summary",
    select: "SELECT p.id, p.title, p.content, p.date_posted, p.user_id,
                    u.username AS author_username, u.email AS author_email,
                    LENGTH(p.content) AS content_length
             FROM post p JOIN user u ON p.user_id = u.id",
};

pub const RECENT_POSTS: ViewDef = ViewDef {
    name: "v_recent_posts",
    select: "SELECT p.id, p.title, SUBSTR(p.content, 1, 100) AS content_preview,
                    p.date_posted, u.username AS author, LENGTH(p.content) AS content_length
             FROM post p JOIN user u ON p.user_id = u.id
             WHERE p.date_posted >= datetime('now', '-30 days')",
};

pub const TOP_CONTRIBUTORS: ViewDef = ViewDef {
    name: "v_top_contributors",
    select: "SELECT u.id, u.username, u.email, COUNT(p.id) AS total_posts,
                    AVG(LENGTH(p.content)) AS avg_post_length, MAX(p.date_posted) AS latest_post
             FROM user u LEFT JOIN post p ON u.id = p.user_id
             GROUP BY u.id, u.username, u.email
             HAVING COUNT(p.id) > 0",
};

pub const DASHBOARD_SUMMARY: ViewDef = ViewDef {
    name: "v_dashboard_summary",
    select: "SELECT (SELECT COUNT(*) FROM user) AS total_users,
                    (SELECT COUNT(*) FROM post) AS total_posts,
                    (SELECT COUNT(*) FROM post WHERE date_posted >= datetime('now', '-7 days')) AS posts_this_week,
                    (SELECT COUNT(*) FROM post WHERE date_posted >= datetime('now', '-1 day')) AS posts_today,
                    (SELECT u.username FROM user u JOIN post p ON u.id = p.user_id
                     GROUP BY u.id ORDER BY COUNT(p.id) DESC, u.id ASC LIMIT 1) AS top_contributor",
};

pub const ALL: [&ViewDef; 5] = [
    &USER_STATS,
    &POST_SUMMARY,
    &RECENT_POSTS,
    &TOP_CONTRIBUTORS,
    &DASHBOARD_SUMMARY,
];

/// Drops and recreates every view in one transaction.
pub fn create_views(conn: &Connection) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;
    for view in ALL {
        tx.execute_batch(&format!("DROP VIEW IF EXISTS {}", view.name))?;
        tx.execute_batch(&format!("CREATE VIEW {} AS {}", view.name, view.select))?;
    }
    tx.commit()?;
    Ok(())
}

/// Like [`create_views`], but a failure is only logged.
pub fn ensure_views(conn: &Connection) -> bool {
    match create_views(conn) {
        Ok(()) => {
            info!("Created {} reporting views", ALL.len());
            true
        }
        Err(e) => {
            warn!("Could not create reporting views: {}", e);
            false
        }
    }
}

pub fn drop_views(conn: &Connection) -> DbResult<()> {
    for view in ALL {
        conn.execute_batch(&format!("DROP VIEW IF EXISTS {}", view.name))?;
    }
    Ok(())
}

/// Each view name with whether it currently exists.
pub fn status(conn: &Connection) -> DbResult<Vec<(&'static str, bool)>> {
    ALL.iter()
        .map(|view| Ok((view.name, view_exists(conn, view.name)?)))
        .collect()
}

/// True when SQLite rejected a statement because a table or view is absent.
pub(crate) fn is_missing_relation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table"))
}
