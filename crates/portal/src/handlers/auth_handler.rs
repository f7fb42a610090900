//! Signup, login and logout handlers.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use tracing::info;

use common::{AppError, AppResult};
use domain::{FormErrors, LoginForm, SignupForm};

use super::render_page;
use crate::extractors::FormData;
use crate::middleware::{FlashLevel, SessionHandle};
use crate::routes::{dashboard_for, LOGIN_PATH};
use crate::state::AppState;
use crate::views::{FormPage, FormView, Page};

fn render_signup(
    state: &AppState,
    session: &SessionHandle,
    form: &SignupForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    let body = FormPage {
        form: FormView::new(form, errors),
    };
    render_page(state, session, Page::Signup, None, &body)
}

fn render_login(
    state: &AppState,
    session: &SessionHandle,
    form: &LoginForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    let body = FormPage {
        form: FormView::new(form, errors),
    };
    render_page(state, session, Page::Login, None, &body)
}

/// Push one error notification per problem and re-render the signup form.
fn reject_signup(
    state: &AppState,
    session: &SessionHandle,
    form: &SignupForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    for line in errors.notifications() {
        session.flash(FlashLevel::Error, line);
    }
    render_signup(state, session, form, errors)
}

/// GET /signup/
pub async fn signup_form(
    State(state): State<AppState>,
    session: SessionHandle,
) -> AppResult<Response> {
    render_signup(&state, &session, &SignupForm::default(), &FormErrors::new())
}

/// POST /signup/
pub async fn signup(
    State(state): State<AppState>,
    session: SessionHandle,
    data: FormData,
) -> AppResult<Response> {
    let mut form: SignupForm = data.parse()?;
    let mut errors = state.accounts.check_signup(&mut form).await?;

    let picture = match data.file("profile_picture") {
        Some(file) => match state.media.inspect(file).await {
            Ok(format) => Some((file, format)),
            Err(picture_errors) => {
                errors.extend(picture_errors);
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return reject_signup(&state, &session, &form, &errors);
    }

    let picture_path = match picture {
        Some((file, format)) => Some(state.media.save(file, format).await?),
        None => None,
    };

    let result = state
        .accounts
        .register(form.clone(), picture_path.clone())
        .await;
    if let (Err(_), Some(path)) = (&result, &picture_path) {
        state.media.remove(path).await;
    }

    match result {
        Ok(user) => {
            session.login(user.id, user.role);
            session.flash(FlashLevel::Success, "Account created successfully!");
            info!(user_id = %user.id, "User signed up");
            Ok(Redirect::to(dashboard_for(user.role)).into_response())
        }
        Err(AppError::Form(errors)) => reject_signup(&state, &session, &form, &errors),
        Err(e) => Err(e),
    }
}

/// GET /login/
pub async fn login_form(
    State(state): State<AppState>,
    session: SessionHandle,
) -> AppResult<Response> {
    if let Some(role) = session.role() {
        return Ok(Redirect::to(dashboard_for(role)).into_response());
    }
    render_login(&state, &session, &LoginForm::default(), &FormErrors::new())
}

/// POST /login/
pub async fn login(
    State(state): State<AppState>,
    session: SessionHandle,
    data: FormData,
) -> AppResult<Response> {
    if let Some(role) = session.role() {
        return Ok(Redirect::to(dashboard_for(role)).into_response());
    }

    let mut form: LoginForm = data.parse()?;
    let errors = form.clean();
    if !errors.is_empty() {
        return render_login(&state, &session, &form, &errors);
    }

    match state.accounts.authenticate(&form).await {
        Ok(user) => {
            session.login(user.id, user.role);
            session.flash(
                FlashLevel::Success,
                format!("Welcome back, {}!", user.full_name()),
            );
            info!(user_id = %user.id, "User logged in");
            Ok(Redirect::to(dashboard_for(user.role)).into_response())
        }
        Err(AppError::InvalidCredentials) => {
            session.flash(FlashLevel::Error, AppError::InvalidCredentials.to_string());
            render_login(&state, &session, &form, &FormErrors::new())
        }
        Err(e) => Err(e),
    }
}

/// GET /logout/
pub async fn logout(session: SessionHandle) -> Redirect {
    if let Some(user_id) = session.user_id() {
        info!(user_id = %user_id, "User logged out");
    }
    session.logout();
    session.flash(FlashLevel::Success, "You have been logged out successfully.");
    Redirect::to(LOGIN_PATH)
}
