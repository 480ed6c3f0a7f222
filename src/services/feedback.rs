// src/services/feedback.rs
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::message::Feedback;

#[derive(Debug, Serialize)]
struct FeedbackRecord<'a> {
    id: &'a str,
    received_at: u64,
    #[serde(flatten)]
    feedback: &'a Feedback,
}

/// Trim the text fields and check them. Returns the cleaned-up feedback.
pub fn validate(feedback: Feedback) -> Result<Feedback, AppError> {
    let name = feedback.name.trim().to_string();
    let email = feedback.email.trim().to_string();
    let message = feedback.message.trim().to_string();

    if name.is_empty() {
        return Err(AppError::InvalidFeedback("Name cannot be empty".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::InvalidFeedback("Email address is not valid".to_string()));
    }
    if message.is_empty() {
        return Err(AppError::InvalidFeedback("Message cannot be empty".to_string()));
    }
    if !(1..=5).contains(&feedback.rating) {
        return Err(AppError::InvalidFeedback(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    Ok(Feedback { name, email, message, rating: feedback.rating })
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

/// Appends feedback as JSON lines to a single file.
#[derive(Debug, Clone)]
pub struct FeedbackStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist one entry, returning its id.
    pub async fn save(&self, feedback: &Feedback) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        let received_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let mut line = serde_json::to_string(&FeedbackRecord { id: &id, received_at, feedback })
            .map_err(|e| AppError::Internal(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to open feedback file: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AppError::Internal(format!("failed to write feedback: {e}")))?;

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Feedback {
        Feedback {
            name: "  Ramesh Kumar ".into(),
            email: "ramesh@example.in".into(),
            message: "The UPI tutorial was very clear.".into(),
            rating: 5,
        }
    }

    #[test]
    fn validate_trims_and_accepts() {
        let fb = validate(sample()).unwrap();
        assert_eq!(fb.name, "Ramesh Kumar");
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let cases = [
            Feedback { name: "   ".into(), ..sample() },
            Feedback { email: "ramesh.example.in".into(), ..sample() },
            Feedback { email: "@example.in".into(), ..sample() },
            Feedback { message: "".into(), ..sample() },
            Feedback { rating: 0, ..sample() },
            Feedback { rating: 6, ..sample() },
        ];
        for case in cases {
            let err = validate(case.clone()).unwrap_err();
            assert!(matches!(err, AppError::InvalidFeedback(_)), "case: {case:?}");
        }
    }

    #[tokio::test]
    async fn save_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("feedback.jsonl"));

        let first = store.save(&validate(sample()).unwrap()).await.unwrap();
        let second = store.save(&validate(sample()).unwrap()).await.unwrap();
        assert_ne!(first, second);

        let content = tokio::fs::read_to_string(store.path()).await.unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], first.as_str());
        assert_eq!(lines[0]["name"], "Ramesh Kumar");
        assert_eq!(lines[1]["rating"], 5);
    }
}
