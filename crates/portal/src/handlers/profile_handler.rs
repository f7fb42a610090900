//! Profile editing.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use common::{AppError, AppResult};
use domain::{FormErrors, PictureChange, ProfileForm, User, MSG_PICTURE_CONFLICT};

use super::render_page;
use crate::extractors::FormData;
use crate::middleware::{CurrentUser, FlashLevel, SessionHandle};
use crate::routes::DASHBOARD_PATH;
use crate::state::AppState;
use crate::views::{FormPage, FormView, Page};

fn render_edit(
    state: &AppState,
    session: &SessionHandle,
    user: &User,
    form: &ProfileForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    let body = FormPage {
        form: FormView::new(form, errors),
    };
    render_page(state, session, Page::EditProfile, Some(user), &body)
}

/// GET /profile/edit/
pub async fn edit_profile_form(
    State(state): State<AppState>,
    session: SessionHandle,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Response> {
    render_edit(
        &state,
        &session,
        &user,
        &ProfileForm::from(&user),
        &FormErrors::new(),
    )
}

/// POST /profile/edit/
pub async fn edit_profile(
    State(state): State<AppState>,
    session: SessionHandle,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    data: FormData,
) -> AppResult<Response> {
    let mut form: ProfileForm = data.parse()?;
    let mut errors = state.accounts.check_profile(user.id, &mut form).await?;

    let upload = data.file("profile_picture");
    let mut inspected = None;
    match upload {
        Some(_) if form.wants_clear() => errors.add("profile_picture", MSG_PICTURE_CONFLICT),
        Some(file) => match state.media.inspect(file).await {
            Ok(format) => inspected = Some((file, format)),
            Err(picture_errors) => errors.extend(picture_errors),
        },
        None => {}
    }

    if !errors.is_empty() {
        return render_edit(&state, &session, &user, &form, &errors);
    }

    let picture = match inspected {
        Some((file, format)) => PictureChange::Replace(state.media.save(file, format).await?),
        None if form.wants_clear() => PictureChange::Clear,
        None => PictureChange::Keep,
    };
    let stored = match &picture {
        PictureChange::Replace(path) => Some(path.clone()),
        _ => None,
    };

    let result = state
        .accounts
        .update_profile(user.id, form.clone(), picture)
        .await;
    if let (Err(_), Some(path)) = (&result, &stored) {
        state.media.remove(path).await;
    }

    match result {
        Ok(_) => {
            session.flash(
                FlashLevel::Success,
                "Your profile has been updated successfully!",
            );
            Ok(Redirect::to(DASHBOARD_PATH).into_response())
        }
        Err(AppError::Form(errors)) => render_edit(&state, &session, &user, &form, &errors),
        Err(e) => Err(e),
    }
}
