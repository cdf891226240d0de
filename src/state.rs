use std::sync::Arc;

use crate::{config::AppConfig, db::OrmConn, notify::Notifier, storage::LocalStorage};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub notifier: Arc<dyn Notifier>,
    pub storage: LocalStorage,
}
