use serde::{Deserialize, Serialize};

// Timestamps are kept as SQLite text ("YYYY-MM-DD HH:MM:SS", UTC) so they can
// be compared against datetime('now', ...) inside the views.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date_posted: String,
    pub user_id: i64,
}

/// A post joined with its author, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostWithAuthor {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date_posted: String,
    pub author: String,
}

// -- Report rows (one struct per view) --

/// Row of `v_user_stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub post_count: i64,
    pub last_post_date: Option<String>,
    pub first_post_date: Option<String>,
}

/// Row of `v_post_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date_posted: String,
    pub user_id: i64,
    pub author_username: String,
    pub author_email: String,
    pub content_length: i64,
}

/// Row of `v_recent_posts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPost {
    pub id: i64,
    pub title: String,
    pub content_preview: String,
    pub date_posted: String,
    pub author: String,
    pub content_length: i64,
}

/// Row of `v_top_contributors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopContributor {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub total_posts: i64,
    pub avg_post_length: f64,
    pub latest_post: Option<String>,
}

/// The single row of `v_dashboard_summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_users: i64,
    pub total_posts: i64,
    pub posts_this_week: i64,
    pub posts_today: i64,
    pub top_contributor: Option<String>,
}
