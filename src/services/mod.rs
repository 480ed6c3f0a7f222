pub mod conversation;
pub mod feedback;
pub mod metrics_manager;
pub mod relay;
