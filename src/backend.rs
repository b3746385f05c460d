use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Returned when the backend answers 2xx but the envelope has no usable text.
const EMPTY_REPLY_FALLBACK: &str = "No response from BCN Art Compass.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    user_id: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    response: Option<String>,
    /// Backend-side tracing id; carried in the envelope but unused here.
    #[serde(default)]
    #[allow(dead_code)]
    correlation_id: Option<String>,
}

/// HTTP client for the BCN Art Compass `/chat` endpoint.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client for `base_url` with a 60 second total timeout.
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }

    /// Forward one message to the backend and return its reply text.
    ///
    /// A 2xx response with a missing or empty `response` field yields a
    /// fixed fallback string. Network errors, timeouts, non-2xx statuses
    /// and malformed bodies are returned as errors; the caller decides
    /// what the user sees. Single best-effort attempt, no retries.
    pub async fn chat(&self, user_id: &str, message: &str) -> Result<String> {
        let url = self.chat_url();

        debug!("Sending request to BCN Art Compass: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { user_id, message })
            .send()
            .await
            .context("Failed to send request to BCN Art Compass")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("BCN Art Compass API error ({}): {}", status, error_body);
        }

        let reply: ChatResponse = response
            .json()
            .await
            .context("Failed to parse BCN Art Compass response")?;

        Ok(reply_text(reply))
    }
}

fn reply_text(reply: ChatResponse) -> String {
    match reply.response {
        Some(text) if !text.is_empty() => text,
        _ => EMPTY_REPLY_FALLBACK.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ChatResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn reply_text_returns_response_field() {
        let reply = parse(r#"{"response": "Visit MACBA.", "correlation_id": "abc"}"#);
        assert_eq!(reply_text(reply), "Visit MACBA.");
    }

    #[test]
    fn reply_text_falls_back_when_response_missing() {
        let reply = parse(r#"{"correlation_id": "abc"}"#);
        assert_eq!(reply_text(reply), "No response from BCN Art Compass.");
    }

    #[test]
    fn reply_text_falls_back_when_response_empty() {
        let reply = parse(r#"{"response": "", "correlation_id": "abc"}"#);
        assert_eq!(reply_text(reply), "No response from BCN Art Compass.");
    }

    #[test]
    fn envelope_tolerates_missing_correlation_id() {
        let reply = parse(r#"{"response": "ok"}"#);
        assert_eq!(reply_text(reply), "ok");
    }

    #[test]
    fn chat_url_appends_path() {
        let client = BackendClient::new("http://localhost:8000").unwrap();
        assert_eq!(client.chat_url(), "http://localhost:8000/chat");
    }

    #[test]
    fn chat_url_strips_trailing_slashes() {
        let client = BackendClient::new("http://localhost:8000//").unwrap();
        assert_eq!(client.chat_url(), "http://localhost:8000/chat");
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(ChatRequest {
            user_id: "tg_alice",
            message: "hola",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"user_id": "tg_alice", "message": "hola"})
        );
    }
}
