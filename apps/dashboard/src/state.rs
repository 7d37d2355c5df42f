use crate::config::Config;
use crate::hooks::Hooks;

/// Shared application state injected into all page handlers via Axum extractors.
#[derive(Debug, Clone)]
pub struct AppState {
    pub hooks: Hooks,
    pub config: Config,
}
