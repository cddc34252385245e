pub mod appresult;
pub mod db;
pub mod id;
pub mod rooms;
pub mod setting;
pub mod store;
pub mod users;

use std::sync::Arc;

pub use appresult::{AppError, AppResult};

use db::SqliteStore;
use rooms::Rooms;
use setting::Settings;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub rooms: Rooms,
}

impl AppState {
    /// Opens the configured database, migrating it if needed.
    pub async fn connect(settings: Settings) -> AppResult<Self> {
        let settings = Arc::new(settings);
        let store = SqliteStore::connect(&settings).await?;

        Ok(Self {
            rooms: Rooms::new(Arc::new(store), settings.clone()),
            settings,
        })
    }
}
