// src/client.rs

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, redirect};
use secrecy::ExposeSecret;
use serde_json::Value;
use std::time::{Duration, Instant};

use crate::config::{AUTH_HEADER, ClientSettings, EndpointConfig};
use crate::errors::{HarnessError, Result};
use crate::payload::EvaluationPayload;

/// What came back from one call to the evaluation endpoint.
#[derive(Debug)]
pub enum CallOutcome {
    Success { body: Value, elapsed_seconds: f64 },
    Failure { error: HarnessError, elapsed_seconds: f64 },
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }

    pub fn elapsed_seconds(&self) -> f64 {
        match self {
            CallOutcome::Success { elapsed_seconds, .. } | CallOutcome::Failure { elapsed_seconds, .. } => {
                *elapsed_seconds
            }
        }
    }

    /// One-line description of a failure; `None` on success.
    pub fn error_detail(&self) -> Option<String> {
        match self {
            CallOutcome::Success { .. } => None,
            CallOutcome::Failure { error, .. } => Some(error.to_string()),
        }
    }
}

/// Sends payloads to the evaluation endpoint.
pub struct EvalClient {
    client: Client,
    endpoint: EndpointConfig,
    timeout: Option<Duration>,
}

impl EvalClient {
    pub fn new(endpoint: EndpointConfig, settings: ClientSettings) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(settings.user_agent)
            .redirect(same_origin_redirects());
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HarnessError::Config(format!("could not build HTTP client: {}", e)))?;

        Ok(Self { client, endpoint, timeout: settings.timeout })
    }

    /// POSTs the payload once and classifies the result. Transport and HTTP
    /// errors come back as `CallOutcome::Failure`; nothing is retried.
    pub async fn invoke(&self, payload: &EvaluationPayload) -> CallOutcome {
        log::info!(
            "POST {} ({}: {})",
            self.endpoint.url,
            AUTH_HEADER,
            self.endpoint.redacted_key()
        );

        let start = Instant::now();
        let result = self.send(payload).await;
        let elapsed_seconds = start.elapsed().as_secs_f64();

        match result {
            Ok(body) => CallOutcome::Success { body, elapsed_seconds },
            Err(error) => {
                let error = self.scrub(error);
                log::warn!("Evaluation call failed after {:.2}s: {}", elapsed_seconds, error);
                CallOutcome::Failure { error, elapsed_seconds }
            }
        }
    }

    async fn send(&self, payload: &EvaluationPayload) -> Result<Value> {
        let mut key = HeaderValue::from_str(self.endpoint.auth_key().expose_secret())
            .map_err(|_| HarnessError::Config("auth key is not a valid header value".to_string()))?;
        key.set_sensitive(true);

        let resp = self
            .client
            .post(self.endpoint.url.clone())
            .header(AUTH_HEADER, key)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.raw().to_string())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        log::info!("Evaluation endpoint responded with status {}", status);

        if status.as_u16() >= 400 {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(HarnessError::ServerError {
                status: status.as_u16(),
                body: error_body,
            });
        }

        let text = resp.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&text).map_err(|e| {
            HarnessError::InvalidResponse(format!(
                "status {} with a body that is not JSON ({}): {}",
                status,
                e,
                preview(&text)
            ))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> HarnessError {
        if e.is_timeout() {
            if let Some(bound) = self.timeout {
                return HarnessError::Timeout(bound);
            }
        }
        let kind = if e.is_connect() {
            "connection failed"
        } else if e.is_body() || e.is_decode() {
            "malformed response"
        } else if e.is_request() {
            "request failed"
        } else {
            "transport error"
        };
        HarnessError::Network(format!("{}: {}", kind, error_chain(&e)))
    }

    /// Replaces any occurrence of the auth key in error text.
    fn scrub(&self, error: HarnessError) -> HarnessError {
        let key = self.endpoint.auth_key().expose_secret();
        let mask = |s: String| if s.contains(key) { s.replace(key, &self.endpoint.redacted_key()) } else { s };
        match error {
            HarnessError::Network(msg) => HarnessError::Network(mask(msg)),
            HarnessError::ServerError { status, body } => HarnessError::ServerError { status, body: mask(body) },
            HarnessError::InvalidResponse(msg) => HarnessError::InvalidResponse(mask(msg)),
            other => other,
        }
    }
}

/// Follows redirects only while they stay on the origin the key was sent to.
/// A redirect elsewhere is not followed and its response is classified as is.
fn same_origin_redirects() -> redirect::Policy {
    const MAX_REDIRECTS: usize = 10;
    redirect::Policy::custom(|attempt| {
        let same_origin = attempt
            .previous()
            .first()
            .is_some_and(|first| first.origin() == attempt.url().origin());
        if !same_origin {
            log::warn!("Not following redirect to {}", attempt.url());
            attempt.stop()
        } else if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else {
            attempt.follow()
        }
    })
}

/// Joins an error with its chain of sources.
fn error_chain(e: &(dyn std::error::Error + 'static)) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 200;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{}...", head)
    }
}
