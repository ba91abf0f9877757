use std::sync::Arc;

use crate::config::Config;
use crate::service::UserService;
use crate::store::UserStore;
use crate::utils::hash::PasswordHasher;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub config: Config,
}

impl AppState {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        config: Config,
    ) -> Self {
        Self {
            users: UserService::new(store, hasher),
            config,
        }
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
