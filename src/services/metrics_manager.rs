use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default, Clone, Serialize)]
pub struct MetricsData {
    pub chat_requests: u64,
    pub replies: u64,
    pub errors: HashMap<String, u64>,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct MetricsManager {
    inner: Arc<RwLock<MetricsData>>,
}

impl Default for MetricsManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsManager {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MetricsData::default())),
        }
    }

    pub async fn record_request(&self) {
        let mut data = self.inner.write().await;
        data.chat_requests += 1;
    }

    /// Count a delivered reply and add whatever token usage the upstream reported.
    pub async fn record_reply(&self, usage: Option<&Value>) {
        let tokens = |field: &str| {
            usage
                .and_then(|u| u.get(field))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };
        let (prompt, completion) = (tokens("prompt_tokens"), tokens("completion_tokens"));

        let mut data = self.inner.write().await;
        data.replies += 1;
        data.prompt_tokens = data.prompt_tokens.saturating_add(prompt);
        data.completion_tokens = data.completion_tokens.saturating_add(completion);
    }

    pub async fn record_error(&self, kind: &str) {
        let mut data = self.inner.write().await;
        *data.errors.entry(kind.to_string()).or_insert(0) += 1;
    }

    pub async fn get_metrics(&self) -> MetricsData {
        self.inner.read().await.clone()
    }
}
