//! Cookie-backed sessions with a one-shot flash queue.
//!
//! `session_middleware` loads the session named by the cookie, exposes it to
//! handlers as a [`SessionHandle`] request extension and, once the handler
//! has run, persists any change and updates the cookie.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use common::AppError;
use domain::UserRole;

use crate::state::AppState;

/// Severity of a flash message, used as a CSS class by templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A notification shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Persisted session payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Option<Uuid>,
    pub role: Option<UserRole>,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

impl SessionData {
    fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.flashes.is_empty()
    }
}

#[derive(Debug, Default)]
struct SessionInner {
    /// Cookie value of the loaded session; `None` once rotated or when new
    id: Option<String>,
    data: SessionData,
    dirty: bool,
    /// Session ids to remove from the store when the request finishes
    retired: Vec<String>,
}

/// Per-request view of the session. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionInner>>,
}

impl SessionHandle {
    fn new(id: Option<String>, data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                id,
                data,
                ..SessionInner::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Authenticated user id, if any
    pub fn user_id(&self) -> Option<Uuid> {
        self.lock().data.user_id
    }

    /// Role recorded at login, if any
    pub fn role(&self) -> Option<UserRole> {
        self.lock().data.role
    }

    /// Bind the session to a user under a fresh id. Pending flashes survive.
    pub fn login(&self, user_id: Uuid, role: UserRole) {
        let mut inner = self.lock();
        if let Some(old) = inner.id.take() {
            inner.retired.push(old);
        }
        inner.data.user_id = Some(user_id);
        inner.data.role = Some(role);
        inner.dirty = true;
    }

    /// Drop all session data and rotate the id.
    pub fn logout(&self) {
        let mut inner = self.lock();
        if let Some(old) = inner.id.take() {
            inner.retired.push(old);
        }
        inner.data = SessionData::default();
        inner.dirty = true;
    }

    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) {
        let mut inner = self.lock();
        inner.data.flashes.push(Flash {
            level,
            message: message.into(),
        });
        inner.dirty = true;
    }

    /// Drain the flash queue for rendering.
    pub fn take_flashes(&self) -> Vec<Flash> {
        let mut inner = self.lock();
        if inner.data.flashes.is_empty() {
            return Vec::new();
        }
        inner.dirty = true;
        std::mem::take(&mut inner.data.flashes)
    }

    fn finish(&self) -> SessionInner {
        std::mem::take(&mut *self.lock())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionHandle
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionHandle>()
            .cloned()
            .ok_or_else(|| AppError::internal("session middleware not installed"))
    }
}

fn session_cookie(name: String, id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Load the session before the handler runs and persist it afterwards.
///
/// Sessions loaded from a cookie are only ever updated in place, so a request
/// that outlives a concurrent logout cannot bring the old session back.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.config.session.cookie_name.clone();
    let existing = jar.get(&cookie_name).map(|c| c.value().to_string());

    let loaded = match &existing {
        Some(id) => match state.sessions.load(id).await {
            Ok(data) => data.map(|data| (id.clone(), data)),
            Err(e) => {
                error!("Failed to load session: {}", e);
                None
            }
        },
        None => None,
    };

    let handle = match loaded {
        Some((id, data)) => SessionHandle::new(Some(id), data),
        None => SessionHandle::default(),
    };
    request.extensions_mut().insert(handle.clone());

    let response = next.run(request).await;

    let SessionInner {
        id,
        data,
        dirty,
        retired,
    } = handle.finish();

    for old in &retired {
        if let Err(e) = state.sessions.destroy(old).await {
            error!("Failed to destroy session: {}", e);
        }
    }

    let jar = if data.is_empty() {
        if let Some(id) = &id {
            if dirty {
                if let Err(e) = state.sessions.destroy(id).await {
                    error!("Failed to destroy session: {}", e);
                }
            }
        }
        if existing.is_some() && (dirty || id.is_none()) {
            jar.remove(Cookie::build(cookie_name).path("/"))
        } else {
            jar
        }
    } else {
        let ttl = state.config.session.ttl_seconds;
        let secure = state.config.session.cookie_secure;
        match id {
            Some(_) if !dirty => jar,
            Some(id) => match state.sessions.update(&id, &data, ttl).await {
                Ok(true) => {
                    debug!("Session saved");
                    jar.add(session_cookie(cookie_name, id, secure))
                }
                Ok(false) => {
                    // Destroyed while this request ran, most likely by logout
                    debug!("Session ended mid-request, dropping write");
                    jar.remove(Cookie::build(cookie_name).path("/"))
                }
                Err(e) => {
                    error!("Failed to save session: {}", e);
                    return AppError::internal("session could not be saved").into_response();
                }
            },
            None => {
                let id = Uuid::new_v4().simple().to_string();
                match state.sessions.create(&id, &data, ttl).await {
                    Ok(true) => {
                        debug!("Session created");
                        jar.add(session_cookie(cookie_name, id, secure))
                    }
                    Ok(false) => {
                        error!("Session id collision");
                        return AppError::internal("session could not be saved").into_response();
                    }
                    Err(e) => {
                        error!("Failed to create session: {}", e);
                        return AppError::internal("session could not be saved").into_response();
                    }
                }
            }
        }
    };

    (jar, response).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_rotates_id_and_keeps_flashes() {
        let handle = SessionHandle::new(Some("old".to_string()), SessionData::default());
        handle.flash(FlashLevel::Success, "hello");
        handle.login(Uuid::new_v4(), UserRole::Doctor);

        let inner = handle.finish();
        assert!(inner.id.is_none());
        assert_eq!(inner.retired, vec!["old".to_string()]);
        assert_eq!(inner.data.role, Some(UserRole::Doctor));
        assert_eq!(inner.data.flashes.len(), 1);
    }

    #[test]
    fn test_logout_clears_everything() {
        let data = SessionData {
            user_id: Some(Uuid::new_v4()),
            role: Some(UserRole::Patient),
            flashes: vec![Flash {
                level: FlashLevel::Error,
                message: "stale".to_string(),
            }],
        };
        let handle = SessionHandle::new(Some("old".to_string()), data);
        handle.logout();

        assert!(handle.user_id().is_none());
        assert!(handle.take_flashes().is_empty());
        assert!(handle.finish().dirty);
    }

    #[test]
    fn test_take_flashes_drains_once() {
        let handle = SessionHandle::default();
        handle.flash(FlashLevel::Success, "done");

        assert_eq!(handle.take_flashes().len(), 1);
        assert!(handle.take_flashes().is_empty());
    }

    #[test]
    fn test_untouched_session_is_clean() {
        let handle = SessionHandle::new(Some("id".to_string()), SessionData::default());
        let _ = handle.user_id();
        assert!(!handle.finish().dirty);
    }
}
