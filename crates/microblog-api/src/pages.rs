use askama::Template;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use microblog_db::DbError;
use microblog_types::flash::Flash;
use microblog_types::forms::{FormErrors, PostForm, RegisterForm};
use microblog_types::models::{DashboardSummary, Post, PostWithAuthor, User};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::flash;
use crate::render::{Field, HtmlTemplate, Layout, UserLink};
use crate::state::AppState;

struct PostView {
    title: String,
    content: String,
    date_posted: String,
    author: UserLink,
}

impl From<PostWithAuthor> for PostView {
    fn from(post: PostWithAuthor) -> Self {
        Self {
            author: UserLink::new(&post.author),
            title: post.title,
            content: post.content,
            date_posted: post.date_posted,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    layout: Layout,
    summary: DashboardSummary,
    posts: Vec<PostView>,
}

/// GET / and /dashboard: every post, newest first, plus headline counts.
pub async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let (posts, summary) = state
        .run_db(|db| Ok((db.list_posts_with_authors()?, db.dashboard_summary()?)))
        .await?;

    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        HtmlTemplate(DashboardTemplate {
            layout: Layout::new("Dashboard", flash),
            summary,
            posts: posts.into_iter().map(PostView::from).collect(),
        }),
    ))
}

/// Shared by the registration and new-post pages.
#[derive(Template)]
#[template(path = "form.html")]
struct FormTemplate {
    layout: Layout,
    action: &'static str,
    fields: Vec<Field>,
    hint: Option<&'static str>,
    submit: &'static str,
}

// -- Registration --

fn register_page(form: &RegisterForm, errors: &FormErrors, flash: Option<Flash>) -> HtmlTemplate<FormTemplate> {
    HtmlTemplate(FormTemplate {
        layout: Layout::new("Register", flash),
        action: "/register",
        fields: vec![
            Field::text("username", "Username", &form.username, errors),
            Field::text("email", "Email", &form.email, errors),
        ],
        hint: None,
        submit: "Sign Up",
    })
}

pub async fn register_form(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    (jar, register_page(&RegisterForm::default(), &FormErrors::default(), flash))
}

/// POST /register. A taken username is reported by the store's UNIQUE
/// constraint; there is no separate lookup first.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut form): Form<RegisterForm>,
) -> ApiResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, register_page(&form, &errors, None)).into_response());
    }

    let (username, email) = (form.username.clone(), form.email.clone());
    match state.run_db(move |db| db.create_user(&username, &email)).await {
        Ok(user) => {
            info!("Registered user {} (id {})", user.username, user.id);
            Ok(flash::redirect(
                jar,
                "/dashboard",
                Flash::success(format!("Account created for {}! You can now create posts.", user.username)),
            ))
        }
        Err(ApiError::Db(DbError::Duplicate { .. })) => {
            let mut errors = FormErrors::default();
            errors.push("username", "That username is taken. Please choose a different one.");
            Ok((StatusCode::CONFLICT, register_page(&form, &errors, None)).into_response())
        }
        Err(e) => Err(e),
    }
}

// -- Posts --

fn post_page(form: &PostForm, errors: &FormErrors, flash: Option<Flash>) -> HtmlTemplate<FormTemplate> {
    HtmlTemplate(FormTemplate {
        layout: Layout::new("New Post", flash),
        action: "/post/new",
        fields: vec![
            Field::text("title", "Title", &form.title, errors),
            Field::textarea("content", "Content", &form.content, errors),
            Field::text("author", "Author (username)", &form.author, errors),
        ],
        hint: Some("Leave the author empty to post as the first registered user."),
        submit: "Post",
    })
}

pub async fn new_post_form(jar: CookieJar) -> impl IntoResponse {
    let (jar, flash) = flash::take(jar);
    (jar, post_page(&PostForm::default(), &FormErrors::default(), flash))
}

pub async fn new_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut form): Form<PostForm>,
) -> ApiResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, post_page(&form, &errors, None)).into_response());
    }

    let requested = form.author().map(str::to_string);
    let author = state
        .run_db(move |db| match requested {
            Some(username) => db.get_user_by_username(&username),
            None => db.first_user(),
        })
        .await?;

    let Some(author) = author else {
        if form.author().is_some() {
            let mut errors = FormErrors::default();
            errors.push("author", "No user with that username.");
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, post_page(&form, &errors, None)).into_response());
        }
        warn!("Post submitted with no registered users");
        let notice = Flash::danger("No user found to associate with the post. Please register a user first.");
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            post_page(&form, &FormErrors::default(), Some(notice)),
        )
            .into_response());
    };

    let (title, content) = (form.title.clone(), form.content.clone());
    let post = state
        .run_db(move |db| db.create_post(author.id, &title, &content))
        .await?;
    info!("Post {} created", post.id);

    Ok(flash::redirect(jar, "/dashboard", Flash::success("Your post has been created!")))
}

// -- Profiles --

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate {
    layout: Layout,
    link: UserLink,
    user: User,
    posts: Vec<Post>,
}

/// GET /user/{username}
pub async fn user_profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    let lookup = username.clone();
    let (user, posts) = state
        .run_db(move |db| {
            let Some(user) = db.get_user_by_username(&lookup)? else {
                return Ok((None, Vec::new()));
            };
            let posts = db.posts_by_user(user.id)?;
            Ok((Some(user), posts))
        })
        .await?;
    let user = user.ok_or_else(|| ApiError::NotFound(format!("user '{username}'")))?;

    let (jar, flash) = flash::take(jar);
    Ok((
        jar,
        HtmlTemplate(ProfileTemplate {
            layout: Layout::new(user.username.clone(), flash),
            link: UserLink::new(&user.username),
            user,
            posts,
        }),
    ))
}
