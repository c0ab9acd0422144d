use std::sync::Arc;

use auth::AuthService;
use storage::CollectionStore;

/// Application state shared across all handlers
pub struct AppState {
    pub store: Arc<dyn CollectionStore>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(store: Arc<dyn CollectionStore>, auth: AuthService) -> Self {
        Self { store, auth }
    }
}
