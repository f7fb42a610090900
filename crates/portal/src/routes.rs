//! Route configuration.

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower_http::services::ServeDir;

use domain::UserRole;

use crate::handlers::{
    dashboard, doctor_dashboard, edit_profile, edit_profile_form, health_routes, login,
    login_form, logout, patient_dashboard, signup, signup_form,
};
use crate::media::MEDIA_URL;
use crate::middleware::{require_login, session_middleware};
use crate::state::AppState;

pub const SIGNUP_PATH: &str = "/signup/";
pub const LOGIN_PATH: &str = "/login/";
pub const LOGOUT_PATH: &str = "/logout/";
pub const DASHBOARD_PATH: &str = "/dashboard/";
pub const DOCTOR_DASHBOARD_PATH: &str = "/doctor_dashboard/";
pub const PATIENT_DASHBOARD_PATH: &str = "/patient_dashboard/";
pub const PROFILE_EDIT_PATH: &str = "/profile/edit/";

/// Landing page for a role.
pub fn dashboard_for(role: UserRole) -> &'static str {
    match role {
        UserRole::Doctor => DOCTOR_DASHBOARD_PATH,
        UserRole::Patient => PATIENT_DASHBOARD_PATH,
    }
}

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    // Login required
    let protected = Router::new()
        .route(DASHBOARD_PATH, get(dashboard))
        .route(DOCTOR_DASHBOARD_PATH, get(doctor_dashboard))
        .route(PATIENT_DASHBOARD_PATH, get(patient_dashboard))
        .route(PROFILE_EDIT_PATH, get(edit_profile_form).post(edit_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .route(SIGNUP_PATH, get(signup_form).post(signup))
        .route(LOGIN_PATH, get(login_form).post(login))
        .route(LOGOUT_PATH, get(logout))
        .merge(protected)
        .nest("/health", health_routes())
        .nest_service(MEDIA_URL, ServeDir::new(state.media.root()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.media.max_upload_bytes))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_for_each_role() {
        assert_eq!(dashboard_for(UserRole::Doctor), "/doctor_dashboard/");
        assert_eq!(dashboard_for(UserRole::Patient), "/patient_dashboard/");
    }
}
