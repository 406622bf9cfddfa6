//! Name-list demo: an in-memory list of generated names that can be
//! extended, downloaded, or cleared and regenerated.

use std::sync::{Mutex, MutexGuard};

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use microblog_db::seed::full_name;
use microblog_types::flash::Flash;
use serde::Deserialize;
use tracing::{error, info};

use crate::export;
use crate::flash;
use crate::render::{HtmlTemplate, Layout};
use crate::state::AppState;

const GENERATED_NAMES: usize = 10;
const DEFAULT_FILENAME: &str = "names.txt";

pub struct NameList {
    names: Mutex<Vec<String>>,
}

impl NameList {
    pub fn new(names: Vec<String>) -> Self {
        Self { names: Mutex::new(names) }
    }

    pub fn generated() -> Self {
        Self::new(generate_names())
    }

    // The list holds no invariants a panicking writer could break.
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.names.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Appends `name` and returns the list as it stands right after, taken
    /// under the same lock.
    pub fn push(&self, name: String) -> Vec<String> {
        let mut names = self.lock();
        names.push(name);
        names.clone()
    }

    /// Replaces the list with freshly generated names and returns the old one.
    pub fn regenerate(&self) -> Vec<String> {
        std::mem::replace(&mut *self.lock(), generate_names())
    }

    pub fn to_text(names: &[String]) -> String {
        names.iter().map(|n| format!("{n}\n")).collect()
    }
}

fn generate_names() -> Vec<String> {
    let mut rng = rand::rng();
    (0..GENERATED_NAMES).map(|_| full_name(&mut rng)).collect()
}

#[derive(Template)]
#[template(path = "names.html")]
struct NamesTemplate {
    layout: Layout,
    names: Vec<String>,
    highlight_last: bool,
}

fn index_page(names: Vec<String>, highlight_last: bool, flash: Option<Flash>) -> HtmlTemplate<NamesTemplate> {
    HtmlTemplate(NamesTemplate {
        layout: Layout::new("Generated and Added User List", flash),
        names,
        highlight_last,
    })
}

/// GET /names
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    (jar, index_page(state.names.snapshot(), false, flash))
}

#[derive(Debug, Default, Deserialize)]
pub struct AddNameForm {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub new_name: String,
}

/// POST /names: `action=add` appends a non-empty name.
pub async fn add(State(state): State<AppState>, Form(form): Form<AddNameForm>) -> impl IntoResponse {
    let name = form.new_name.trim();
    if form.action == "add" && !name.is_empty() {
        index_page(state.names.push(name.to_string()), true, None)
    } else {
        index_page(state.names.snapshot(), false, None)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub filename: String,
}

/// GET /names/download?filename=
pub async fn download(State(state): State<AppState>, Query(query): Query<DownloadQuery>) -> Response {
    let filename = export::sanitize_filename(query.filename.trim(), DEFAULT_FILENAME);
    export::text(&filename, NameList::to_text(&state.names.snapshot()))
}

#[derive(Template)]
#[template(path = "confirm_clear.html")]
struct ConfirmClearTemplate {
    layout: Layout,
}

/// GET /names/confirm-clear
pub async fn confirm_clear_form() -> impl IntoResponse {
    HtmlTemplate(ConfirmClearTemplate {
        layout: Layout::new("Are you sure you want to clear the list?", None),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearForm {
    #[serde(default)]
    pub decision: String,
}

/// POST /names/confirm-clear
pub async fn confirm_clear(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<ClearForm>,
) -> Response {
    let notice = match form.decision.as_str() {
        "save_clear" => {
            let path = state.settings.names_file.clone();
            let text = NameList::to_text(&state.names.snapshot());
            match tokio::fs::write(&path, text).await {
                Ok(()) => {
                    let old = state.names.regenerate();
                    info!("Saved {} names to {} and regenerated the list", old.len(), path.display());
                    Flash::success(format!("Saved {} names to {} and generated a new list.", old.len(), path.display()))
                }
                Err(e) => {
                    error!("Failed to save name list to {}: {}", path.display(), e);
                    Flash::danger("Could not save the list; nothing was cleared.")
                }
            }
        }
        "clear_only" => {
            state.names.regenerate();
            Flash::info("List cleared and regenerated.")
        }
        "cancel" => return Redirect::to("/names").into_response(),
        // No choice made: ask again.
        _ => return confirm_clear_form().await.into_response(),
    };
    flash::redirect(jar, "/names", notice)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regenerate_returns_previous_names() {
        let list = NameList::new(vec!["Ada Lovelace".into()]);
        let after_push = list.push("Grace Hopper".into());
        assert_eq!(after_push.last().map(String::as_str), Some("Grace Hopper"));

        let old = list.regenerate();
        assert_eq!(old, vec!["Ada Lovelace".to_string(), "Grace Hopper".to_string()]);
        assert_eq!(list.snapshot().len(), GENERATED_NAMES);
    }

    #[test]
    fn text_export_is_one_name_per_line() {
        let names = vec!["A B".to_string(), "C D".to_string()];
        assert_eq!(NameList::to_text(&names), "A B\nC D\n");
    }

    #[test]
    fn concurrent_adds_each_see_their_own_name_last() {
        let list = std::sync::Arc::new(NameList::new(Vec::new()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let list = list.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .map(|j| {
                            let name = format!("Writer {i} Name {j}");
                            let after = list.push(name.clone());
                            after.last() == Some(&name)
                        })
                        .all(|own_last| own_last)
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(list.snapshot().len(), 400);
    }
}
