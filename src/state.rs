// src/state.rs
use std::sync::Arc;

use crate::config::Config;
use crate::services::feedback::FeedbackStore;
use crate::services::metrics_manager::MetricsManager;
use crate::services::relay::RelayClient;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub relay: RelayClient,
    pub feedback: FeedbackStore,
    pub metrics: MetricsManager,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        Ok(Self {
            relay: RelayClient::new(&config)?,
            feedback: FeedbackStore::new(config.feedback_path.clone()),
            metrics: MetricsManager::new(),
            config,
        })
    }
}
