//! HTTP request handlers.

mod auth_handler;
mod dashboard_handler;
mod health_handler;
mod profile_handler;

pub use auth_handler::{login, login_form, logout, signup, signup_form};
pub use dashboard_handler::{dashboard, doctor_dashboard, patient_dashboard};
pub use health_handler::{health_check, health_routes};
pub use profile_handler::{edit_profile, edit_profile_form};

use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;

use common::AppResult;
use domain::User;

use crate::middleware::SessionHandle;
use crate::state::AppState;
use crate::views::{Page, PageContext, UserView};

/// Render a page, draining the session's flash queue into it.
pub(crate) fn render_page<T: Serialize>(
    state: &AppState,
    session: &SessionHandle,
    page: Page,
    user: Option<&User>,
    body: &T,
) -> AppResult<Response> {
    let context = PageContext {
        title: page.title(),
        user: user.map(|u| UserView::new(u, &state.media)),
        flashes: session.take_flashes(),
        body,
    };

    let html = state.views.render(page, &context)?;
    Ok(Html(html).into_response())
}
