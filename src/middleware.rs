use std::sync::Arc;

use axum::{extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::{
    auth,
    error::AppError,
    model::{CurrentUser, SessionToken},
    session::SESSION_COOKIE,
    AppState,
};

/// Guard for protected routes: resolves the session cookie to a user and
/// hands it to the handler as `Extension<CurrentUser>`.
pub async fn mw_require_auth<B>(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned()) else {
        debug!(path = %request.uri().path(), "request without session cookie");
        return Err(AppError::Unauthenticated);
    };

    let Some(user_id) = state.sessions.resolve(&token).await else {
        debug!(path = %request.uri().path(), "unknown or expired session");
        return Err(AppError::Unauthenticated);
    };

    // The session may outlive its user row.
    let user = auth::find_user_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    request.extensions_mut().insert(CurrentUser::from(user));
    request.extensions_mut().insert(SessionToken(token));

    Ok(next.run(request).await)
}
