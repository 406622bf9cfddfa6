use askama::Template;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use microblog_db::DbError;
use microblog_db::records::{SortOrder, Table, UserStatsSort, count_rows};
use microblog_db::seed::SeedPlan;
use microblog_db::views;
use microblog_types::flash::Flash;
use tracing::{error, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::export::{self, CsvWriter};
use crate::flash;
use crate::render::{HtmlTemplate, Layout, UserLink};
use crate::state::AppState;

pub const USER_EXPORT_HEADER: [&str; 6] =
    ["ID", "Username", "Email", "Post Count", "First Post", "Latest Post"];

const POSTS_PER_SEED_USER: std::ops::RangeInclusive<usize> = 1..=5;

struct ViewStatus {
    name: &'static str,
    present: bool,
}

#[derive(Template)]
#[template(path = "admin.html")]
struct AdminTemplate {
    layout: Layout,
    users: i64,
    posts: i64,
    seed_users: usize,
    views: Vec<ViewStatus>,
    accounts: Vec<UserLink>,
}

/// GET /admin
pub async fn admin_dashboard(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let (users, posts, view_status, usernames) = state
        .run_db(|db| {
            let (users, posts, view_status) = db.with_conn(|conn| {
                Ok((
                    count_rows(conn, Table::User)?,
                    count_rows(conn, Table::Post)?,
                    views::status(conn)?,
                ))
            })?;
            let usernames = db.list_users()?.into_iter().map(|u| u.username).collect::<Vec<_>>();
            Ok((users, posts, view_status, usernames))
        })
        .await?;

    let accounts = usernames.iter().map(|name| UserLink::new(name)).collect();
    let view_status = view_status
        .into_iter()
        .map(|(name, present)| ViewStatus { name, present })
        .collect();

    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        HtmlTemplate(AdminTemplate {
            layout: Layout::new("Admin Dashboard", flash),
            users,
            posts,
            seed_users: state.settings.seed_users,
            views: view_status,
            accounts,
        }),
    ))
}

/// GET /admin/create_empty_db: empties both tables; the views stay.
pub async fn create_empty_db(State(state): State<AppState>, jar: CookieJar) -> Response {
    let notice = match state.run_db(|db| db.clear_all()).await {
        Ok((posts, users)) => Flash::info(format!(
            "Database cleared: removed {users} users and {posts} posts."
        )),
        Err(e) => {
            error!("Error clearing database: {}", e);
            Flash::danger(format!("Error clearing database: {e}"))
        }
    };
    flash::redirect(jar, "/admin", notice)
}

/// GET /admin/populate_db: delete-then-insert of generated sample data,
/// all in one transaction.
pub async fn populate_db(State(state): State<AppState>, jar: CookieJar) -> Response {
    let users = state.settings.seed_users;
    let result = state
        .run_db(move |db| {
            let plan = SeedPlan::generate(&mut rand::rng(), users, POSTS_PER_SEED_USER);
            db.populate(&plan)
        })
        .await;

    let notice = match result {
        Ok(report) => Flash::info(format!(
            "Database populated with new test data! ({} users, {} posts)",
            report.users, report.posts
        )),
        Err(e) => {
            error!("Error populating database: {}", e);
            Flash::danger(format!("Error populating database: {e}"))
        }
    };
    flash::redirect(jar, "/admin", notice)
}

/// GET /admin/export_users: one CSV row per user.
pub async fn export_users(State(state): State<AppState>) -> ApiResult<Response> {
    let stats = state
        .run_db(|db| db.user_stats(UserStatsSort::Username, SortOrder::Asc))
        .await?;

    let mut csv = CsvWriter::new();
    csv.record(USER_EXPORT_HEADER);
    for row in &stats {
        csv.record([
            row.id.to_string(),
            row.username.clone(),
            row.email.clone(),
            row.post_count.to_string(),
            row.first_post_date.clone().unwrap_or_default(),
            row.last_post_date.clone().unwrap_or_default(),
        ]);
    }
    info!("Exported {} users", stats.len());

    Ok(export::csv("users_export.csv", csv.finish()))
}

/// POST /admin/delete_user/{username}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    jar: CookieJar,
) -> Response {
    let target = username.clone();
    let notice = match state.run_db(move |db| db.delete_user(&target)).await {
        Ok(posts) => Flash::success(format!("Deleted user {username} and {posts} posts.")),
        Err(ApiError::Db(DbError::NotFound { .. })) => {
            warn!("Delete requested for unknown user {}", username);
            Flash::warning(format!("No user named {username}; nothing was deleted."))
        }
        Err(e) => {
            error!("Error deleting user {}: {}", username, e);
            Flash::danger(format!("Could not delete user {username}: {e}"))
        }
    };
    flash::redirect(jar, "/admin", notice)
}
