use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;
use tracing::info;

use crate::{
    auth,
    error::AppError,
    model::{CurrentUser, SessionToken},
    schema::{CreateTodoSchema, CredentialsSchema, UpdateTodoSchema},
    session::SESSION_COOKIE,
    todo, AppState,
};

// Handler for the health checker route
pub async fn health_checker_handler() -> impl IntoResponse {
    const MESSAGE: &str = "Multi-user todo service with Rust, SQLx, SQLite, and Axum";

    Json(json!({
        "status": "success",
        "message": MESSAGE
    }))
}

pub async fn register(
    State(data): State<Arc<AppState>>,
    body: Result<Json<CredentialsSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    auth::register(&data.db, &body.username, &body.password).await?;

    Ok(Json(json!({ "message": "Registration successful" })))
}

pub async fn login(
    State(data): State<Arc<AppState>>,
    jar: CookieJar,
    body: Result<Json<CredentialsSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let user = auth::login(&data.db, &body.username, &body.password).await?;
    let token = data.sessions.create(user.id).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(json!({ "message": "Login successful" })),
    ))
}

pub async fn logout(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    jar: CookieJar,
) -> impl IntoResponse {
    data.sessions.revoke(&token).await;
    let active_sessions = data.sessions.len().await;
    info!(user_id = user.id, active_sessions, "user logged out");

    let mut cookie = Cookie::named(SESSION_COOKIE);
    cookie.set_path("/");

    (
        jar.remove(cookie),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

// Handler for getting the caller's Todo items
pub async fn get_todos(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let todos = todo::list_todos(&data.db, &user).await?;
    Ok(Json(todos))
}

// Handler for creating a new Todo
pub async fn create_todo(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<CreateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body?;
    let todo = todo::create_todo(&data.db, &user, body.title).await?;
    Ok(Json(todo))
}

// Handler for updating a Todo by ID
pub async fn update_todo(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    let Json(body) = body?;
    let todo = todo::update_todo(&data.db, &user, id, body).await?;
    Ok(Json(todo))
}

// Handler for deleting a Todo by ID
pub async fn delete_todo(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Path(id) = id?;
    todo::delete_todo(&data.db, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
