//! Application state for dependency injection.

use std::sync::Arc;

use user_service_lib::service::AccountService;

use crate::config::PortalConfig;
use crate::media::MediaStore;
use crate::middleware::SessionStore;
use crate::views::Views;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountService>,
    pub sessions: Arc<dyn SessionStore>,
    pub views: Arc<Views>,
    pub media: Arc<MediaStore>,
    pub config: PortalConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        accounts: Arc<dyn AccountService>,
        sessions: Arc<dyn SessionStore>,
        views: Arc<Views>,
        media: Arc<MediaStore>,
        config: PortalConfig,
    ) -> Self {
        Self {
            accounts,
            sessions,
            views,
            media,
            config,
        }
    }
}
