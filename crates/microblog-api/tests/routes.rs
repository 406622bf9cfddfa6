use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

use microblog_api::router;
use microblog_api::state::{AppState, Settings};
use microblog_db::Database;
use microblog_db::records::{Table, count_rows};
use microblog_db::views;

fn test_app(names_file: PathBuf) -> (Router, Arc<Database>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state = AppState::new(
        db.clone(),
        Settings {
            names_file,
            seed_users: 10,
        },
    );
    (router(state), db)
}

fn app() -> (Router, Arc<Database>) {
    test_app(PathBuf::from("unused_names.txt"))
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_form(app: &Router, uri: &str, form: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers().get(name).unwrap().to_str().unwrap()
}

fn counts(db: &Database) -> (i64, i64) {
    db.with_conn(|conn| Ok((count_rows(conn, Table::User)?, count_rows(conn, Table::Post)?)))
        .unwrap()
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let (app, db) = app();

    let response = post_form(&app, "/register", "username=alice&email=alice%40example.com").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(header_str(&response, header::LOCATION), "/dashboard");

    let response = post_form(&app, "/register", "username=alice&email=other%40example.com").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_text(response).await.contains("That username is taken"));

    assert_eq!(counts(&db), (1, 0));
}

#[tokio::test]
async fn invalid_registration_rerenders_form() {
    let (app, db) = app();

    let response = post_form(&app, "/register", "username=a&email=nope").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_text(response).await;
    assert!(body.contains("Invalid email address."));
    assert!(body.contains("value=\"nope\""));
    assert_eq!(counts(&db), (0, 0));
}

#[tokio::test]
async fn flash_is_shown_once_after_redirect() {
    let (app, _db) = app();

    let response = post_form(&app, "/register", "username=ada&email=ada%40example.com").await;
    let cookie = header_str(&response, header::SET_COOKIE)
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/dashboard")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // The page clears the cookie it just displayed.
    assert!(header_str(&response, header::SET_COOKIE).starts_with("flash="));
    assert!(body_text(response).await.contains("Account created for ada!"));
}

#[tokio::test]
async fn new_post_needs_a_user() {
    let (app, db) = app();

    let response = post_form(&app, "/post/new", "title=Hello&content=World").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("No user found to associate with the post"));

    db.create_user("grace", "grace@example.com").unwrap();
    let response = post_form(&app, "/post/new", "title=Hello&content=World").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = post_form(&app, "/post/new", "title=Hi&content=There&author=nobody").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_text(get(&app, "/user/grace").await).await;
    assert!(body.contains("Hello"));
    assert_eq!(counts(&db), (1, 1));
}

#[tokio::test]
async fn populate_then_export_users() {
    let (app, db) = app();
    db.create_user("before", "before@example.com").unwrap();

    let response = get(&app, "/admin/populate_db").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(header_str(&response, header::LOCATION), "/admin");

    let (users, posts) = counts(&db);
    assert_eq!(users, 10);
    let per_user: i64 = db
        .user_stats(Default::default(), Default::default())
        .unwrap()
        .iter()
        .map(|s| s.post_count)
        .sum();
    assert_eq!(posts, per_user);

    let summary = db.dashboard_summary().unwrap();
    assert_eq!((summary.total_users, summary.total_posts), (users, posts));

    let response = get(&app, "/admin/export_users").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(header_str(&response, header::CONTENT_TYPE).starts_with("text/csv"));
    assert!(header_str(&response, header::CONTENT_DISPOSITION).contains("users_export.csv"));
    let csv = body_text(response).await;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "ID,Username,Email,Post Count,First Post,Latest Post");
    assert_eq!(lines.len() as i64 - 1, users);
}

#[tokio::test]
async fn clearing_keeps_views_queryable() {
    let (app, db) = app();
    get(&app, "/admin/populate_db").await;

    let response = get(&app, "/admin/create_empty_db").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(counts(&db), (0, 0));

    for uri in ["/views/users", "/views/posts", "/analytics/dashboard", "/dashboard"] {
        assert_eq!(get(&app, uri).await.status(), StatusCode::OK, "{uri}");
    }
    let summary = db.dashboard_summary().unwrap();
    assert_eq!((summary.total_users, summary.total_posts), (0, 0));
    assert!(summary.top_contributor.is_none());
}

#[tokio::test]
async fn report_pages_survive_missing_views() {
    let (app, db) = app();
    let user = db.create_user("linus", "linus@example.com").unwrap();
    db.create_post(user.id, "Kernel", "Just a hobby").unwrap();
    db.with_conn(|conn| views::drop_views(conn)).unwrap();

    let body = body_text(get(&app, "/views/user/linus").await).await;
    assert!(body.contains("Kernel"));
    assert_eq!(get(&app, "/analytics/dashboard").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn user_views_sort_by_enumerated_columns_only() {
    let (app, db) = app();
    db.create_user("zed", "zed@example.com").unwrap();
    db.create_user("amy", "amy@example.com").unwrap();

    let body = body_text(get(&app, "/views/users?sort=username&order=desc").await).await;
    let zed = body.find(">zed<").unwrap();
    let amy = body.find(">amy<").unwrap();
    assert!(zed < amy);

    let response = get(&app, "/views/users?sort=id%3BDROP%20TABLE%20user").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get(&app, "/views/users?order=sideways").await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_users_are_not_found() {
    let (app, _db) = app();
    assert_eq!(get(&app, "/user/nobody").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/views/user/nobody").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_user_removes_posts() {
    let (app, db) = app();
    let user = db.create_user("temp", "temp@example.com").unwrap();
    db.create_post(user.id, "a", "b").unwrap();

    let response = post_form(&app, "/admin/delete_user/temp", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(counts(&db), (0, 0));

    let response = post_form(&app, "/admin/delete_user/temp", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = header_str(&response, header::SET_COOKIE).split(';').next().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("flash-warning"));
    assert!(body.contains("No user named temp"));
}

#[tokio::test]
async fn admin_page_reports_view_status() {
    let (app, db) = app();
    let body = body_text(get(&app, "/admin").await).await;
    assert!(body.contains("v_dashboard_summary: present"));

    db.with_conn(|conn| views::drop_views(conn)).unwrap();
    let body = body_text(get(&app, "/admin").await).await;
    assert!(body.contains("v_dashboard_summary: missing"));
}

#[tokio::test]
async fn user_content_is_escaped() {
    let (app, db) = app();
    let user = db.create_user("mallory", "mallory@example.com").unwrap();
    db.create_post(user.id, "<script>alert(1)</script>", "a & b").unwrap();

    for uri in ["/dashboard", "/views/posts", "/user/mallory"] {
        let body = body_text(get(&app, uri).await).await;
        assert!(!body.contains("<script>"), "{uri}");
    }
}

#[tokio::test]
async fn analytics_downloads() {
    let (app, db) = app();
    let user = db.create_user("ken", "ken@example.com").unwrap();
    db.create_post(user.id, "Hello, world", "main() {}").unwrap();

    let response = get(&app, "/analytics/export").await;
    assert!(header_str(&response, header::CONTENT_DISPOSITION).contains("post_summary.csv"));
    let csv = body_text(response).await;
    assert!(csv.starts_with("ID,Title,Author,Date Posted,Content Length\r\n"));
    assert!(csv.contains("\"Hello, world\",ken,"));

    let response = get(&app, "/analytics/user_report").await;
    assert!(header_str(&response, header::CONTENT_TYPE).starts_with("text/plain"));
    let text = body_text(response).await;
    assert!(text.contains("ken <ken@example.com>"));
    assert!(text.contains("Top contributor:    ken"));
}

#[tokio::test]
async fn name_list_add_download_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let names_file = dir.path().join("names.txt");
    let (app, _db) = test_app(names_file.clone());

    let body = body_text(post_form(&app, "/names", "action=add&new_name=Zed+Shaw").await).await;
    assert!(body.contains("<strong>Zed Shaw</strong>"));

    let response = get(&app, "/names/download?filename=../my%20names.txt").await;
    assert_eq!(
        header_str(&response, header::CONTENT_DISPOSITION),
        "attachment; filename=\"mynames.txt\""
    );
    let text = body_text(response).await;
    assert_eq!(text.lines().count(), 11);
    assert!(text.ends_with("Zed Shaw\n"));

    let response = post_form(&app, "/names/confirm-clear", "decision=save_clear").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let saved = std::fs::read_to_string(&names_file).unwrap();
    assert!(saved.ends_with("Zed Shaw\n"));

    let body = body_text(get(&app, "/names").await).await;
    assert!(!body.contains("Zed Shaw"));

}

#[tokio::test]
async fn clear_without_a_decision_asks_again() {
    let (app, _db) = app();
    let before = body_text(get(&app, "/names").await).await;

    for form in ["", "decision=", "decision=explode"] {
        let response = post_form(&app, "/names/confirm-clear", form).await;
        assert_eq!(response.status(), StatusCode::OK, "{form:?}");
        assert!(body_text(response).await.contains("Are you sure you want to clear the list?"));
    }

    // Nothing was regenerated.
    assert_eq!(body_text(get(&app, "/names").await).await, before);
}

#[tokio::test]
async fn health_reports_ready_database() {
    let (app, _db) = app();
    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["database_ready"], true);
    assert_eq!(body["status"], "ok");
}
