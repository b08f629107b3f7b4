use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        Method,
    },
    middleware::from_fn_with_state,
    routing::{get, get_service, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};

use crate::{config::Config, handler::*, middleware::mw_require_auth, AppState};

pub fn create_router(app_state: Arc<AppState>, config: &Config) -> Router {
    let app = Router::new()
        .route("/todos", get(get_todos).post(create_todo))
        .route("/todos/:id", put(update_todo).delete(delete_todo))
        .route("/logout", get(logout))
        .route_layer(from_fn_with_state(app_state.clone(), mw_require_auth))
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/health", get(health_checker_handler))
        .route("/", get_service(ServeFile::new(&config.index_file)))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    match &config.cors_origin {
        Some(origin) => app.layer(
            CorsLayer::new()
                .allow_origin(origin.clone())
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_credentials(true)
                .allow_headers([ACCEPT, CONTENT_TYPE]),
        ),
        None => app,
    }
}
