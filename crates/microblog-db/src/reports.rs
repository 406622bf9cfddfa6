use microblog_types::models::{
    DashboardSummary, PostSummary, RecentPost, TopContributor, UserStats,
};
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row, params};
use tracing::warn;

use crate::records::{SortOrder, UserStatsSort};
use crate::views::{self, ViewDef, is_missing_relation};
use crate::{Database, DbResult};

const USER_STATS_COLUMNS: &str =
    "id, username, email, post_count, last_post_date, first_post_date";
const POST_SUMMARY_COLUMNS: &str =
    "id, title, content, date_posted, user_id, author_username, author_email, content_length";
const RECENT_POST_COLUMNS: &str =
    "id, title, content_preview, date_posted, author, content_length";
const TOP_CONTRIBUTOR_COLUMNS: &str =
    "id, username, email, total_posts, avg_post_length, latest_post";
const DASHBOARD_COLUMNS: &str =
    "total_users, total_posts, posts_this_week, posts_today, top_contributor";

impl Database {
    pub fn user_stats(&self, sort: UserStatsSort, order: SortOrder) -> DbResult<Vec<UserStats>> {
        let tail = format!("ORDER BY {} {}, id", sort.column(), order.sql());
        self.with_conn(|conn| {
            read_view(conn, &views::USER_STATS, USER_STATS_COLUMNS, &tail, params![], user_stats_from_row)
        })
    }

    pub fn user_stats_for(&self, username: &str) -> DbResult<Option<UserStats>> {
        self.with_conn(|conn| {
            let rows = read_view(
                conn,
                &views::USER_STATS,
                USER_STATS_COLUMNS,
                "WHERE username = ?1",
                params![username],
                user_stats_from_row,
            )?;
            Ok(rows.into_iter().next())
        })
    }

    pub fn post_summaries(&self) -> DbResult<Vec<PostSummary>> {
        self.with_conn(|conn| {
            read_view(
                conn,
                &views::POST_SUMMARY,
                POST_SUMMARY_COLUMNS,
                "ORDER BY date_posted DESC, id DESC",
                params![],
                post_summary_from_row,
            )
        })
    }

    pub fn post_summaries_for(&self, username: &str) -> DbResult<Vec<PostSummary>> {
        self.with_conn(|conn| {
            read_view(
                conn,
                &views::POST_SUMMARY,
                POST_SUMMARY_COLUMNS,
                "WHERE author_username = ?1 ORDER BY date_posted DESC, id DESC",
                params![username],
                post_summary_from_row,
            )
        })
    }

    /// Posts from the last 30 days.
    pub fn recent_posts(&self) -> DbResult<Vec<RecentPost>> {
        self.with_conn(|conn| {
            read_view(
                conn,
                &views::RECENT_POSTS,
                RECENT_POST_COLUMNS,
                "ORDER BY date_posted DESC, id DESC",
                params![],
                |row| {
                    Ok(RecentPost {
                        id: row.get("id")?,
                        title: row.get("title")?,
                        content_preview: row.get("content_preview")?,
                        date_posted: row.get("date_posted")?,
                        author: row.get("author")?,
                        content_length: row.get("content_length")?,
                    })
                },
            )
        })
    }

    pub fn top_contributors(&self) -> DbResult<Vec<TopContributor>> {
        self.with_conn(|conn| {
            read_view(
                conn,
                &views::TOP_CONTRIBUTORS,
                TOP_CONTRIBUTOR_COLUMNS,
                "ORDER BY total_posts DESC, username",
                params![],
                |row| {
                    Ok(TopContributor {
                        id: row.get("id")?,
                        username: row.get("username")?,
                        email: row.get("email")?,
                        total_posts: row.get("total_posts")?,
                        avg_post_length: row.get("avg_post_length")?,
                        latest_post: row.get("latest_post")?,
                    })
                },
            )
        })
    }

    pub fn dashboard_summary(&self) -> DbResult<DashboardSummary> {
        self.with_conn(|conn| {
            let rows = read_view(conn, &views::DASHBOARD_SUMMARY, DASHBOARD_COLUMNS, "", params![], |row| {
                Ok(DashboardSummary {
                    total_users: row.get("total_users")?,
                    total_posts: row.get("total_posts")?,
                    posts_this_week: row.get("posts_this_week")?,
                    posts_today: row.get("posts_today")?,
                    top_contributor: row.get("top_contributor")?,
                })
            })?;
            Ok(rows.into_iter().next().unwrap_or_default())
        })
    }
}

/// Selects from a view, or from its defining SELECT when the view is absent.
fn read_view<T>(
    conn: &Connection,
    view: &ViewDef,
    columns: &str,
    tail: &str,
    params: &[&dyn ToSql],
    map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
) -> DbResult<Vec<T>> {
    let sql = format!("SELECT {columns} FROM {} {tail}", view.name);
    match query_all(conn, &sql, params, &map) {
        Err(e) if is_missing_relation(&e) => {
            warn!("View {} unavailable, querying base tables", view.name);
            let sql = format!("SELECT {columns} FROM ({}) AS {} {tail}", view.select, view.name);
            Ok(query_all(conn, &sql, params, &map)?)
        }
        other => Ok(other?),
    }
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
    map: &impl Fn(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows: rusqlite::Result<Vec<T>> = stmt.query_map(params, |row| map(row))?.collect();
    rows
}

fn user_stats_from_row(row: &Row<'_>) -> rusqlite::Result<UserStats> {
    Ok(UserStats {
        id: row.get("id")?,
        username: row.get("username")?,
        email: row.get("email")?,
        post_count: row.get("post_count")?,
        last_post_date: row.get("last_post_date")?,
        first_post_date: row.get("first_post_date")?,
    })
}

fn post_summary_from_row(row: &Row<'_>) -> rusqlite::Result<PostSummary> {
    Ok(PostSummary {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        date_posted: row.get("date_posted")?,
        user_id: row.get("user_id")?,
        author_username: row.get("author_username")?,
        author_email: row.get("author_email")?,
        content_length: row.get("content_length")?,
    })
}
