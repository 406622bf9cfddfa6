//! Aggregate statistics computed in memory from the report views.

use serde::Serialize;

use crate::models::{PostSummary, UserStats};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSummary {
    pub user_count: usize,
    pub post_count: usize,
    pub users_without_posts: usize,
    pub mean_posts_per_user: f64,
    pub median_posts_per_user: f64,
    pub max_posts_per_user: i64,
    pub mean_content_length: f64,
    pub longest_post: Option<LongestPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongestPost {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub content_length: i64,
}

pub fn summarize(users: &[UserStats], posts: &[PostSummary]) -> AnalyticsSummary {
    let mut counts: Vec<i64> = users.iter().map(|u| u.post_count).collect();
    counts.sort_unstable();

    let longest_post = posts
        .iter()
        .max_by(|a, b| a.content_length.cmp(&b.content_length).then(b.id.cmp(&a.id)))
        .map(|p| LongestPost {
            id: p.id,
            title: p.title.clone(),
            author: p.author_username.clone(),
            content_length: p.content_length,
        });

    AnalyticsSummary {
        user_count: users.len(),
        post_count: posts.len(),
        users_without_posts: counts.iter().filter(|&&c| c == 0).count(),
        mean_posts_per_user: mean(counts.iter().copied()),
        median_posts_per_user: median(&counts),
        max_posts_per_user: counts.last().copied().unwrap_or(0),
        mean_content_length: mean(posts.iter().map(|p| p.content_length)),
        longest_post,
    }
}

fn mean(values: impl ExactSizeIterator<Item = i64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.map(|v| v as f64).sum::<f64>() / n as f64
}

/// Median of an already sorted slice.
fn median(sorted: &[i64]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}
