use microblog_types::models::{Post, PostWithAuthor, User};
use rusqlite::{Connection, OptionalExtension, Row, ffi};
use tracing::info;

use crate::{Database, DbError, DbResult, views};

const USER_COLUMNS: &str = "id, username, email, created_at, active";
const POST_COLUMNS: &str = "id, title, content, date_posted, user_id";

impl Database {
    // -- Users --

    /// Inserts a user. A taken username surfaces as [`DbError::Duplicate`]
    /// straight from the UNIQUE constraint.
    pub fn create_user(&self, username: &str, email: &str) -> DbResult<User> {
        self.with_conn(|conn| insert_user(conn, username, email))
    }

    pub fn get_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// The earliest registered user, used as the default post author.
    pub fn first_user(&self) -> DbResult<Option<User>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM user ORDER BY id LIMIT 1");
            Ok(conn.query_row(&sql, [], user_from_row).optional()?)
        })
    }

    pub fn list_users(&self) -> DbResult<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM user ORDER BY username"))?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Deletes a user and all of their posts. Posts go first; there is no
    /// declared cascade. Returns the number of posts removed.
    pub fn delete_user(&self, username: &str) -> DbResult<usize> {
        self.with_tx(|tx| {
            let user = query_user_by_username(tx, username)?.ok_or_else(|| DbError::NotFound {
                resource: "user",
                key: username.to_string(),
            })?;
            let posts = tx.execute("DELETE FROM post WHERE user_id = ?1", [user.id])?;
            tx.execute("DELETE FROM user WHERE id = ?1", [user.id])?;
            info!("Deleted user {} and {} posts", username, posts);
            Ok(posts)
        })
    }

    // -- Posts --

    pub fn create_post(&self, user_id: i64, title: &str, content: &str) -> DbResult<Post> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO post (title, content, user_id) VALUES (?1, ?2, ?3) RETURNING {POST_COLUMNS}"
            );
            Ok(conn.query_row(&sql, (title, content, user_id), post_from_row)?)
        })
    }

    /// Every post with its author's username, newest first.
    pub fn list_posts_with_authors(&self) -> DbResult<Vec<PostWithAuthor>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.title, p.content, p.date_posted, u.username AS author
                 FROM post p
                 JOIN user u ON p.user_id = u.id
                 ORDER BY p.date_posted DESC, p.id DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(PostWithAuthor {
                        id: row.get("id")?,
                        title: row.get("title")?,
                        content: row.get("content")?,
                        date_posted: row.get("date_posted")?,
                        author: row.get("author")?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn posts_by_user(&self, user_id: i64) -> DbResult<Vec<Post>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM post WHERE user_id = ?1 ORDER BY date_posted DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], post_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Maintenance --

    /// Empties both base tables in one transaction and makes sure the views
    /// are still in place. Returns (posts, users) deleted.
    pub fn clear_all(&self) -> DbResult<(usize, usize)> {
        let counts = self.with_tx(|tx| {
            let posts = tx.execute("DELETE FROM post", [])?;
            let users = tx.execute("DELETE FROM user", [])?;
            Ok((posts, users))
        })?;
        self.with_conn(|conn| {
            views::ensure_views(conn);
            Ok(())
        })?;
        info!("Cleared database: {} posts, {} users", counts.0, counts.1);
        Ok(counts)
    }
}

pub(crate) fn insert_user(conn: &Connection, username: &str, email: &str) -> DbResult<User> {
    let sql = format!("INSERT INTO user (username, email) VALUES (?1, ?2) RETURNING {USER_COLUMNS}");
    conn.query_row(&sql, (username, email), user_from_row)
        .map_err(|e| unique_violation(e, "username", username))
}

fn query_user_by_username(conn: &Connection, username: &str) -> DbResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM user WHERE username = ?1");
    Ok(conn.query_row(&sql, [username], user_from_row).optional()?)
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
        active: row.get("active")?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        date_posted: row.get("date_posted")?,
        user_id: row.get("user_id")?,
    })
}

fn unique_violation(err: rusqlite::Error, field: &'static str, value: &str) -> DbError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => {
            DbError::Duplicate {
                field,
                value: value.to_string(),
            }
        }
        _ => DbError::Sqlite(err),
    }
}
