//! Role dashboards.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use common::AppResult;
use domain::recent_activities;

use super::render_page;
use crate::middleware::{CurrentUser, SessionHandle};
use crate::routes::{dashboard_for, PATIENT_DASHBOARD_PATH};
use crate::state::AppState;
use crate::views::{DashboardPage, Page};

/// GET /dashboard/ - redirect only
pub async fn dashboard(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Redirect {
    Redirect::to(dashboard_for(user.role))
}

/// GET /doctor_dashboard/
pub async fn doctor_dashboard(
    State(state): State<AppState>,
    session: SessionHandle,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Response> {
    if !user.is_doctor() {
        return Ok(Redirect::to(PATIENT_DASHBOARD_PATH).into_response());
    }

    let body = DashboardPage {
        address: user.formatted_address(),
        activities: recent_activities(user.role),
    };
    render_page(&state, &session, Page::DoctorDashboard, Some(&user), &body)
}

/// GET /patient_dashboard/ - open to any signed-in role
pub async fn patient_dashboard(
    State(state): State<AppState>,
    session: SessionHandle,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Response> {
    let body = DashboardPage {
        address: user.formatted_address(),
        activities: recent_activities(user.role),
    };
    render_page(&state, &session, Page::PatientDashboard, Some(&user), &body)
}
