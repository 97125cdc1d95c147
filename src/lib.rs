use std::sync::Arc;

use config::Config;
use location::Freshness;
use store::{LocationStore, ProfileStore};

pub mod config;
pub mod discovery;
pub mod error;
pub mod geo;
pub mod location;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod store;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub locations: Arc<dyn LocationStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub freshness: Freshness,
}

impl AppState {
    pub fn new(
        config: Config,
        locations: Arc<dyn LocationStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let freshness = config.freshness();
        Self {
            config,
            locations,
            profiles,
            freshness,
        }
    }
}
