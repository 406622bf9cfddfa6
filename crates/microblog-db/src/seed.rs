//! Sample data generation and the all-or-nothing repopulation of the store.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use chrono::{Duration, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;

use crate::queries::insert_user;
use crate::{Database, DbResult};

const FIRST_NAMES: &[&str] = &[
    "ada", "alan", "barbara", "claude", "dennis", "edsger", "frances", "grace", "guido", "hedy",
    "john", "ken", "linus", "margaret", "niklaus", "radia", "rob", "sophie", "tim", "yukihiro",
];

const LAST_NAMES: &[&str] = &[
    "allen", "backus", "hopper", "kernighan", "knuth", "lamport", "liskov", "lovelace", "perlman",
    "pike", "ritchie", "shannon", "thompson", "torvalds", "turing", "wilson", "wirth",
];

const DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];

const WORDS: &[&str] = &[
    "about", "across", "before", "bring", "build", "change", "city", "data", "early", "energy",
    "every", "field", "follow", "garden", "group", "happen", "idea", "important", "kitchen",
    "later", "learn", "light", "market", "method", "morning", "music", "network", "often", "paper",
    "people", "place", "program", "question", "reason", "record", "river", "season", "simple",
    "small", "story", "system", "table", "together", "travel", "until", "value", "window", "world",
];

/// Posts are dated anywhere in this many days before now.
const DATE_SPREAD_DAYS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPost {
    pub title: String,
    pub content: String,
    pub date_posted: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    pub posts: Vec<SeedPost>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedPlan {
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulateReport {
    pub users: usize,
    pub posts: usize,
}

impl SeedPlan {
    /// `users` accounts with unique usernames, each with a number of posts
    /// drawn from `posts_per_user`.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        users: usize,
        posts_per_user: RangeInclusive<usize>,
    ) -> Self {
        let now = Utc::now();
        let mut taken = HashSet::new();

        let users = (0..users)
            .map(|_| {
                let username = unique_username(rng, &mut taken);
                let email = format!("{}@{}", username, pick(rng, DOMAINS));
                let post_count = rng.random_range(posts_per_user.clone());
                let posts = (0..post_count)
                    .map(|_| {
                        let age = Duration::seconds(rng.random_range(0..DATE_SPREAD_DAYS * 86_400));
                        SeedPost {
                            title: sentence(rng, 3..=7),
                            content: paragraph(rng),
                            date_posted: (now - age).format("%Y-%m-%d %H:%M:%S").to_string(),
                        }
                    })
                    .collect();
                SeedUser { username, email, posts }
            })
            .collect();

        Self { users }
    }

    pub fn post_count(&self) -> usize {
        self.users.iter().map(|u| u.posts.len()).sum()
    }
}

impl Database {
    /// Replaces every user and post with `plan` in a single transaction.
    /// Any failure rolls the store back to its previous contents.
    pub fn populate(&self, plan: &SeedPlan) -> DbResult<PopulateReport> {
        let report = self.with_tx(|tx| {
            tx.execute("DELETE FROM post", [])?;
            tx.execute("DELETE FROM user", [])?;

            let mut insert_post = tx.prepare(
                "INSERT INTO post (title, content, date_posted, user_id) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut posts = 0;
            for seed in &plan.users {
                let user = insert_user(tx, &seed.username, &seed.email)?;
                for post in &seed.posts {
                    insert_post.execute((&post.title, &post.content, &post.date_posted, user.id))?;
                    posts += 1;
                }
            }

            Ok(PopulateReport {
                users: plan.users.len(),
                posts,
            })
        })?;

        info!("Populated database: {} users, {} posts", report.users, report.posts);
        Ok(report)
    }
}

/// A capitalised "First Last" display name.
pub fn full_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{} {}", capitalize(pick(rng, FIRST_NAMES)), capitalize(pick(rng, LAST_NAMES)))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

fn unique_username<R: Rng + ?Sized>(rng: &mut R, taken: &mut HashSet<String>) -> String {
    let base = format!("{}_{}", pick(rng, FIRST_NAMES), pick(rng, LAST_NAMES));
    let mut candidate = base.clone();
    let mut suffix = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{base}{suffix}");
        suffix += 1;
    }
    candidate
}

fn sentence<R: Rng + ?Sized>(rng: &mut R, words: RangeInclusive<usize>) -> String {
    let n = rng.random_range(words);
    let text = (0..n).map(|_| pick(rng, WORDS)).collect::<Vec<_>>().join(" ");
    let mut text = capitalize(&text);
    text.push('.');
    text
}

fn paragraph<R: Rng + ?Sized>(rng: &mut R) -> String {
    let n = rng.random_range(3..=6);
    (0..n)
        .map(|_| sentence(rng, 5..=12))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Table, count_rows};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn counts(db: &Database) -> (i64, i64) {
        db.with_conn(|conn| Ok((count_rows(conn, Table::User)?, count_rows(conn, Table::Post)?)))
            .unwrap()
    }

    #[test]
    fn generated_usernames_are_unique() {
        let mut rng = StdRng::seed_from_u64(7);
        // More users than first/last name pairs forces the suffix path.
        let plan = SeedPlan::generate(&mut rng, 400, 1..=5);
        let names: HashSet<_> = plan.users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names.len(), 400);
        assert!(plan.users.iter().all(|u| (1..=5).contains(&u.posts.len())));
    }

    #[test]
    fn populate_replaces_contents() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("old_user", "old@example.com").unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let plan = SeedPlan::generate(&mut rng, 10, 1..=5);
        let report = db.populate(&plan).unwrap();

        assert_eq!(report.users, 10);
        assert_eq!(report.posts, plan.post_count());
        assert_eq!(counts(&db), (10, plan.post_count() as i64));
        assert!(db.get_user_by_username("old_user").unwrap().is_none());
        assert_eq!(db.dashboard_summary().unwrap().total_posts, plan.post_count() as i64);
    }

    #[test]
    fn failed_populate_leaves_previous_state() {
        let db = Database::open_in_memory().unwrap();
        let keeper = db.create_user("keeper", "keeper@example.com").unwrap();
        db.create_post(keeper.id, "Still here", "content").unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let mut plan = SeedPlan::generate(&mut rng, 5, 1..=3);
        // A repeated username fails on the UNIQUE constraint mid-way.
        let dup = plan.users[0].clone();
        plan.users.insert(3, dup);

        assert!(db.populate(&plan).is_err());
        assert_eq!(counts(&db), (1, 1));
        assert!(db.get_user_by_username("keeper").unwrap().is_some());
    }

    #[test]
    fn full_names_are_capitalised() {
        let mut rng = StdRng::seed_from_u64(9);
        let name = full_name(&mut rng);
        let parts: Vec<&str> = name.split(' ').collect();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.chars().next().is_some_and(char::is_uppercase)));
    }

    #[test]
    fn seeded_dates_fall_inside_spread() {
        let mut rng = StdRng::seed_from_u64(3);
        let plan = SeedPlan::generate(&mut rng, 3, 2..=2);
        let oldest = (Utc::now() - Duration::days(DATE_SPREAD_DAYS + 1))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        for post in plan.users.iter().flat_map(|u| &u.posts) {
            assert!(post.date_posted > oldest);
            assert!(post.title.ends_with('.'));
        }
    }
}
