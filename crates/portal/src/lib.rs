//! Health Portal Library
//!
//! Server-rendered web front end: signup, login, role dashboards and
//! profile editing for doctors and patients.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use common::SessionBackend;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use user_service_lib::infra::Database;
use user_service_lib::repository::UserStore;
use user_service_lib::service::AccountManager;

use crate::config::PortalConfig;
use crate::media::MediaStore;
use crate::middleware::{Cache, MemorySessionStore, RedisSessionStore, SessionStore};
use crate::routes::create_router;
use crate::state::AppState;
use crate::views::Views;

/// Run the HTTP server with the given configuration.
pub async fn run(config: PortalConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Accounts
    let db = Database::connect(&config.database).await?;
    let repo = Arc::new(UserStore::new(db.get_connection()));
    let accounts = Arc::new(AccountManager::new(repo));

    // Sessions
    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            let cache = Cache::connect(&config.cache.url).await?;
            Arc::new(RedisSessionStore::new(cache))
        }
        SessionBackend::Memory => {
            warn!("Using in-memory sessions; they are lost on restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let views = Arc::new(Views::new()?);
    let media = Arc::new(MediaStore::new(&config.media.root));
    media.ensure_dirs().await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(accounts, sessions, views, media, config);

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    info!("Portal listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
