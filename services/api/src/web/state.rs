//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::auth::AuthService;
use perfumery_core::ports::ProductStore;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub auth: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the auth service from the configuration around the chosen store.
    pub fn new(config: Arc<Config>, store: Arc<dyn ProductStore>) -> Self {
        let auth = Arc::new(AuthService::new(&config));
        Self {
            store,
            auth,
            config,
        }
    }
}
