use std::fmt::Write;

use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use microblog_db::records::{SortOrder, UserStatsSort};
use microblog_types::analytics::{self, AnalyticsSummary};
use microblog_types::models::{DashboardSummary, RecentPost, TopContributor, UserStats};

use crate::error::ApiResult;
use crate::export::{self, CsvWriter};
use crate::flash;
use crate::render::{HtmlTemplate, Layout, UserLink, or_dash};
use crate::state::AppState;

pub const POST_EXPORT_HEADER: [&str; 5] = ["ID", "Title", "Author", "Date Posted", "Content Length"];

struct TopRow {
    user: UserLink,
    email: String,
    total_posts: i64,
    avg_post_length: f64,
    latest_post: String,
}

impl From<TopContributor> for TopRow {
    fn from(t: TopContributor) -> Self {
        Self {
            user: UserLink::new(&t.username),
            latest_post: or_dash(t.latest_post.as_deref()),
            email: t.email,
            total_posts: t.total_posts,
            avg_post_length: t.avg_post_length,
        }
    }
}

struct RecentRow {
    title: String,
    author: UserLink,
    date_posted: String,
    content_preview: String,
}

impl From<RecentPost> for RecentRow {
    fn from(p: RecentPost) -> Self {
        Self {
            author: UserLink::new(&p.author),
            title: p.title,
            date_posted: p.date_posted,
            content_preview: p.content_preview,
        }
    }
}

struct LongestRow {
    title: String,
    author: UserLink,
    content_length: i64,
}

#[derive(Template)]
#[template(path = "analytics.html")]
struct AnalyticsTemplate {
    layout: Layout,
    summary: DashboardSummary,
    top_contributor: Option<UserLink>,
    derived: AnalyticsSummary,
    longest: Option<LongestRow>,
    top: Vec<TopRow>,
    recent: Vec<RecentRow>,
}

/// GET /analytics/dashboard
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let (summary, top, recent, stats, posts) = state
        .run_db(|db| {
            Ok((
                db.dashboard_summary()?,
                db.top_contributors()?,
                db.recent_posts()?,
                db.user_stats(UserStatsSort::PostCount, SortOrder::Desc)?,
                db.post_summaries()?,
            ))
        })
        .await?;
    let derived = analytics::summarize(&stats, &posts);
    let longest = derived.longest_post.as_ref().map(|p| LongestRow {
        title: p.title.clone(),
        author: UserLink::new(&p.author),
        content_length: p.content_length,
    });

    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        HtmlTemplate(AnalyticsTemplate {
            layout: Layout::new("Analytics", flash),
            top_contributor: summary.top_contributor.as_deref().map(UserLink::new),
            summary,
            derived,
            longest,
            top: top.into_iter().map(TopRow::from).collect(),
            recent: recent.into_iter().map(RecentRow::from).collect(),
        }),
    ))
}

/// GET /analytics/export: the post summary view as CSV.
pub async fn export(State(state): State<AppState>) -> ApiResult<Response> {
    let posts = state.run_db(|db| db.post_summaries()).await?;

    let mut csv = CsvWriter::new();
    csv.record(POST_EXPORT_HEADER);
    for p in &posts {
        csv.record([
            p.id.to_string(),
            p.title.clone(),
            p.author_username.clone(),
            p.date_posted.clone(),
            p.content_length.to_string(),
        ]);
    }
    Ok(export::csv("post_summary.csv", csv.finish()))
}

/// GET /analytics/user_report: plain-text report, one block per user.
pub async fn user_report(State(state): State<AppState>) -> ApiResult<Response> {
    let (summary, stats, posts) = state
        .run_db(|db| {
            Ok((
                db.dashboard_summary()?,
                db.user_stats(UserStatsSort::Username, SortOrder::Asc)?,
                db.post_summaries()?,
            ))
        })
        .await?;
    let derived = analytics::summarize(&stats, &posts);

    Ok(export::text("user_report.txt", user_report_text(&summary, &derived, &stats)))
}

pub fn user_report_text(summary: &DashboardSummary, derived: &AnalyticsSummary, stats: &[UserStats]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Microblog user report");
    let _ = writeln!(out, "=====================");
    let _ = writeln!(out, "Total users:        {}", summary.total_users);
    let _ = writeln!(out, "Total posts:        {}", summary.total_posts);
    let _ = writeln!(out, "Posts this week:    {}", summary.posts_this_week);
    let _ = writeln!(out, "Posts today:        {}", summary.posts_today);
    let _ = writeln!(
        out,
        "Top contributor:    {}",
        summary.top_contributor.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "Mean posts/user:    {:.2}", derived.mean_posts_per_user);
    let _ = writeln!(out, "Median posts/user:  {:.1}", derived.median_posts_per_user);
    let _ = writeln!(out, "Mean post length:   {:.1}", derived.mean_content_length);

    for s in stats {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} <{}>", s.username, s.email);
        let _ = writeln!(out, "  posts:       {}", s.post_count);
        let _ = writeln!(out, "  first post:  {}", s.first_post_date.as_deref().unwrap_or("-"));
        let _ = writeln!(out, "  latest post: {}", s.last_post_date.as_deref().unwrap_or("-"));
    }
    out
}
