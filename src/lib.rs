pub mod chat;
pub mod config;
pub mod contacts;
pub mod error;
pub mod events;
pub mod fanout;
pub mod registry;
pub mod store;
pub mod ws;

use std::sync::Arc;

use axum::extract::FromRef;

pub use error::{AppError, AppResult};

use registry::Registry;
use store::ContactStore;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub registry: Registry,
}

impl AppState {
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self {
            store,
            registry: Registry::new(),
        }
    }
}
