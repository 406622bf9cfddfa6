//! Read-only pages over the reporting views.

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use axum_extra::extract::cookie::CookieJar;
use microblog_db::records::{SortOrder, UserStatsSort};
use microblog_types::models::{PostSummary, UserStats};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::flash;
use crate::render::{HtmlTemplate, Layout, UserLink, or_dash};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SortQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl SortQuery {
    /// Only enumerated column and direction names are accepted.
    pub fn parse(&self) -> ApiResult<(UserStatsSort, SortOrder)> {
        let sort = match self.sort.as_deref() {
            None | Some("") => UserStatsSort::default(),
            Some(s) => s.parse().map_err(|e| ApiError::BadRequest(format!("sort: {e}")))?,
        };
        let order = match self.order.as_deref() {
            None | Some("") => SortOrder::default(),
            Some(s) => s.parse().map_err(|e| ApiError::BadRequest(format!("order: {e}")))?,
        };
        Ok((sort, order))
    }
}

const USER_COLUMNS: [(UserStatsSort, &str); 5] = [
    (UserStatsSort::Username, "Username"),
    (UserStatsSort::Email, "Email"),
    (UserStatsSort::PostCount, "Posts"),
    (UserStatsSort::FirstPost, "First Post"),
    (UserStatsSort::LastPost, "Latest Post"),
];

struct SortHeader {
    label: &'static str,
    href: String,
    marker: &'static str,
}

/// Clicking the active column flips its direction; any other column starts
/// ascending.
fn sort_headers(sort: UserStatsSort, order: SortOrder) -> Vec<SortHeader> {
    USER_COLUMNS
        .iter()
        .map(|&(column, label)| {
            let active = column == sort;
            let next = if active { order.reversed() } else { SortOrder::Asc };
            SortHeader {
                label,
                href: format!("/views/users?sort={}&order={}", column.as_str(), next.as_str()),
                marker: match (active, order) {
                    (true, SortOrder::Asc) => " \u{2191}",
                    (true, SortOrder::Desc) => " \u{2193}",
                    (false, _) => "",
                },
            }
        })
        .collect()
}

struct StatsRow {
    user: UserLink,
    email: String,
    post_count: i64,
    first_post: String,
    last_post: String,
}

impl From<UserStats> for StatsRow {
    fn from(s: UserStats) -> Self {
        Self {
            user: UserLink::new(&s.username),
            first_post: or_dash(s.first_post_date.as_deref()),
            last_post: or_dash(s.last_post_date.as_deref()),
            email: s.email,
            post_count: s.post_count,
        }
    }
}

struct PostRow {
    id: i64,
    title: String,
    author: UserLink,
    date_posted: String,
    content_length: i64,
}

impl From<PostSummary> for PostRow {
    fn from(p: PostSummary) -> Self {
        Self {
            author: UserLink::new(&p.author_username),
            id: p.id,
            title: p.title,
            date_posted: p.date_posted,
            content_length: p.content_length,
        }
    }
}

#[derive(Template)]
#[template(path = "user_stats.html")]
struct UserStatsTemplate {
    layout: Layout,
    headers: Vec<SortHeader>,
    rows: Vec<StatsRow>,
}

/// GET /views/users?sort=&order=
pub async fn users(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let (sort, order) = query.parse()?;
    let stats = state.run_db(move |db| db.user_stats(sort, order)).await?;

    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        HtmlTemplate(UserStatsTemplate {
            layout: Layout::new("User Statistics", flash),
            headers: sort_headers(sort, order),
            rows: stats.into_iter().map(StatsRow::from).collect(),
        }),
    ))
}

#[derive(Template)]
#[template(path = "posts.html")]
struct PostsTemplate {
    layout: Layout,
    posts: Vec<PostRow>,
}

/// GET /views/posts
pub async fn posts(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let posts = state.run_db(|db| db.post_summaries()).await?;

    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        HtmlTemplate(PostsTemplate {
            layout: Layout::new("Post Summary", flash),
            posts: posts.into_iter().map(PostRow::from).collect(),
        }),
    ))
}

#[derive(Template)]
#[template(path = "user_detail.html")]
struct UserDetailTemplate {
    layout: Layout,
    row: StatsRow,
    posts: Vec<PostRow>,
}

/// GET /views/user/{username}
pub async fn user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let lookup = username.clone();
    let (stats, posts) = state
        .run_db(move |db| Ok((db.user_stats_for(&lookup)?, db.post_summaries_for(&lookup)?)))
        .await?;
    let stats = stats.ok_or_else(|| ApiError::NotFound(format!("user '{username}'")))?;

    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        HtmlTemplate(UserDetailTemplate {
            layout: Layout::new(format!("Statistics for {}", stats.username), flash),
            row: StatsRow::from(stats),
            posts: posts.into_iter().map(PostRow::from).collect(),
        }),
    ))
}
