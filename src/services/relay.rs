// src/services/relay.rs
//! Chat relay: validates a transcript, forwards it to the completions API
//! behind a fixed persona, and reshapes the reply.

use axum::http::StatusCode;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::message::{Message, Role};

pub const MODEL: &str = "gpt-3.5-turbo";
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 500;

pub const SYSTEM_PROMPT: &str = "You are DigiSathi, a helpful guide for digital India initiatives. \
Provide concise, accurate answers about government programs, digital services, and citizen benefits.";

/// Outbound body for the upstream completions endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionPayload {
    pub model: &'static str,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// What a successful upstream exchange boils down to.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub reply: String,
    pub usage: Option<Value>,
}

/// Decoded upstream outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamReply {
    Success(Completion),
    Failure { status: StatusCode, message: String },
}

/// Pulls the transcript out of a raw request body.
///
/// The body must be an object with a `messages` array; each element needs a
/// known `role` and a string `content`.
pub fn parse_transcript(body: &Value) -> Result<Vec<Message>, AppError> {
    let items = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::BadRequest("Messages array is required".to_string()))?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let role = item
                .get("role")
                .and_then(Value::as_str)
                .and_then(Role::parse)
                .ok_or_else(|| {
                    AppError::BadRequest(format!(
                        "messages[{idx}].role must be one of system, user, assistant"
                    ))
                })?;
            let content = item.get("content").and_then(Value::as_str).ok_or_else(|| {
                AppError::BadRequest(format!("messages[{idx}].content must be a string"))
            })?;
            Ok(Message::new(role, content))
        })
        .collect()
}

/// Fixed persona first, then the caller's turns with any system messages dropped.
pub fn build_payload(transcript: Vec<Message>) -> CompletionPayload {
    let before = transcript.len();
    let mut messages = Vec::with_capacity(before + 1);
    messages.push(Message::system(SYSTEM_PROMPT));
    messages.extend(transcript.into_iter().filter(|m| m.role != Role::System));

    let dropped = before + 1 - messages.len();
    if dropped > 0 {
        debug!(dropped, "dropped caller-supplied system messages");
    }

    CompletionPayload {
        model: MODEL,
        messages,
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Decode an upstream response field by field. The upstream schema is not ours,
/// so nothing here assumes more than it checks.
pub fn decode_upstream(status: StatusCode, body: Option<&Value>) -> Result<UpstreamReply, AppError> {
    if !status.is_success() {
        let message = body
            .and_then(|b| b.pointer("/error/message"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Ok(UpstreamReply::Failure { status, message });
    }

    let body = body.ok_or_else(|| {
        AppError::MalformedUpstreamResponse("OpenAI response was not valid JSON".to_string())
    })?;

    let reply = body
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            AppError::MalformedUpstreamResponse("No content in OpenAI response".to_string())
        })?;

    let usage = body.get("usage").filter(|u| !u.is_null()).cloned();

    Ok(UpstreamReply::Success(Completion {
        reply: reply.to_string(),
        usage,
    }))
}

/// HTTP client for the upstream completions API.
#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    url: String,
    api_key: String,
}

impl RelayClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.upstream_timeout).build()?;
        Ok(Self {
            http,
            url: config.completions_url(),
            api_key: config.api_key.clone(),
        })
    }

    /// `handleChat`: one stateless request/response translation.
    pub async fn handle_chat(&self, body: &Value) -> Result<Completion, AppError> {
        let transcript = parse_transcript(body)?;
        let payload = build_payload(transcript);
        self.complete(&payload).await
    }

    pub async fn complete(&self, payload: &CompletionPayload) -> Result<Completion, AppError> {
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(unavailable)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(unavailable)?;
        let body: Option<Value> = serde_json::from_slice(&bytes).ok();

        match decode_upstream(status, body.as_ref())? {
            UpstreamReply::Success(completion) => Ok(completion),
            UpstreamReply::Failure { status, message } => {
                warn!(%status, %message, "OpenAI API error");
                Err(AppError::Upstream { status, message })
            }
        }
    }
}

fn unavailable(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::UpstreamUnavailable("OpenAI request timed out".to_string())
    } else {
        AppError::UpstreamUnavailable(e.to_string())
    }
}
