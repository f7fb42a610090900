//! Login guard for protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use common::AppError;
use domain::User;

use super::session::SessionHandle;
use crate::routes::LOGIN_PATH;
use crate::state::AppState;

/// Authenticated user loaded by [`require_login`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Redirect anonymous visitors to the login page, otherwise load the user
/// into request extensions.
///
/// A session naming a user that no longer exists is cleared.
pub async fn require_login(
    State(state): State<AppState>,
    session: SessionHandle,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user_id) = session.user_id() else {
        debug!(path = %request.uri().path(), "Anonymous request to protected route");
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let Some(user) = state.accounts.get_user(user_id).await? else {
        session.logout();
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
