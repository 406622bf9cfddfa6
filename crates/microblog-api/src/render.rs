//! Askama page rendering. Templates live in `templates/`; `.html` files are
//! auto-escaped, so view models carry plain text.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use microblog_types::flash::Flash;
use microblog_types::forms::FormErrors;
use tracing::error;

pub struct HtmlTemplate<T>(pub T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => {
                error!("Failed to render template: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to render template. Error: {}", err),
                )
                    .into_response()
            }
        }
    }
}

/// What `base.html` needs from every page.
pub struct Layout {
    pub title: String,
    pub flash: Option<Flash>,
}

impl Layout {
    pub fn new(title: impl Into<String>, flash: Option<Flash>) -> Self {
        Self {
            title: title.into(),
            flash,
        }
    }
}

/// Percent-encodes one path segment.
pub fn path_segment(text: &str) -> String {
    urlencoding::encode(text).into_owned()
}

/// A username with its profile and statistics links.
pub struct UserLink {
    pub name: String,
    pub segment: String,
    pub profile: String,
    pub stats: String,
}

impl UserLink {
    pub fn new(name: &str) -> Self {
        let segment = path_segment(name);
        Self {
            name: name.to_string(),
            profile: format!("/user/{segment}"),
            stats: format!("/views/user/{segment}"),
            segment,
        }
    }
}

/// A labelled input (or textarea) with its validation messages.
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub multiline: bool,
    pub errors: Vec<String>,
}

impl Field {
    pub fn text(name: &'static str, label: &'static str, value: &str, errors: &FormErrors) -> Self {
        Self {
            name,
            label,
            value: value.to_string(),
            multiline: false,
            errors: errors.for_field(name).map(str::to_string).collect(),
        }
    }

    pub fn textarea(name: &'static str, label: &'static str, value: &str, errors: &FormErrors) -> Self {
        Self {
            multiline: true,
            ..Self::text(name, label, value, errors)
        }
    }
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub layout: Layout,
    pub message: String,
}
