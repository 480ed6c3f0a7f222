// src/services/conversation.rs
//! Caller side of the relay: one transcript, at most one request in flight.

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};

use reqwest::Client;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

use crate::message::{ChatRequest, ChatResponse, ErrorBody, Message, Role};

pub const ERROR_PREFIX: &str = "Sorry, I encountered an error: ";
pub const NETWORK_ERROR_REPLY: &str =
    "Sorry, I couldn't reach DigiSathi right now. Please check your connection and try again.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("a reply is already on its way")]
    Busy,
    #[error("message cannot be empty")]
    EmptyMessage,
}

pub struct Conversation {
    http: Client,
    endpoint: String,
    transcript: RwLock<Vec<Message>>,
    awaiting_reply: AtomicBool,
}

impl Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("endpoint", &self.endpoint)
            .field("awaiting_reply", &self.is_awaiting_reply())
            .finish()
    }
}

// Clears the busy flag however `send` exits, including cancellation.
struct AwaitingReply<'a>(&'a AtomicBool);

impl Drop for AwaitingReply<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Conversation {
    /// `endpoint` is the full chat URL, e.g. `http://localhost:5000/api/chat`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    pub fn with_client(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            transcript: RwLock::new(Vec::new()),
            awaiting_reply: AtomicBool::new(false),
        }
    }

    /// True while a reply is pending; drives the "typing" indicator.
    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply.load(Ordering::Acquire)
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.transcript.read().await.clone()
    }

    /// Send a user turn and append the assistant's answer.
    ///
    /// Relay and network failures do not surface as `Err`: they become an
    /// assistant message so the conversation keeps flowing. Only misuse
    /// (empty input, a send while another is pending) is rejected.
    pub async fn send(&self, text: &str) -> Result<Message, ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyMessage);
        }
        if self.awaiting_reply.swap(true, Ordering::AcqRel) {
            return Err(ConversationError::Busy);
        }
        let _busy = AwaitingReply(&self.awaiting_reply);

        // The user turn only lands in the transcript together with its reply.
        let user = Message::user(text);
        let messages = {
            let transcript = self.transcript.read().await;
            transcript
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned()
                .chain(std::iter::once(user.clone()))
                .collect()
        };

        let reply = Message::assistant(self.request_reply(ChatRequest { messages }).await);
        let mut transcript = self.transcript.write().await;
        transcript.push(user);
        transcript.push(reply.clone());
        Ok(reply)
    }

    async fn request_reply(&self, request: ChatRequest) -> String {
        let resp = match self.http.post(&self.endpoint).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "chat request failed");
                return NETWORK_ERROR_REPLY.to_string();
            }
        };

        let status = resp.status();
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "chat response body unreadable");
                return NETWORK_ERROR_REPLY.to_string();
            }
        };

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .map(|body| if body.details.is_empty() { body.error } else { body.details })
                .unwrap_or_else(|| format!("Server responded with status {}", status.as_u16()));
            return format!("{ERROR_PREFIX}{detail}");
        }

        match serde_json::from_slice::<ChatResponse>(&bytes) {
            Ok(body) => body.reply,
            Err(_) => format!("{ERROR_PREFIX}Received an unreadable response from server"),
        }
    }
}
