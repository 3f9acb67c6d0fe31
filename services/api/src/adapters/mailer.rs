//! services/api/src/adapters/mailer.rs
//!
//! This module contains the adapter for the transactional email API. It
//! implements the `Mailer` port from the `core` crate.

use async_trait::async_trait;
use serde::Serialize;
use tutoring_core::domain::EmailMessage;
use tutoring_core::ports::{Mailer, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `Mailer` port by posting to a
/// transactional email HTTP API with a bearer key.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    /// Creates a new `HttpMailer`.
    pub fn new(client: reqwest::Client, api_url: String, api_key: String, from: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            from,
        }
    }
}

//=========================================================================================
// `Mailer` Trait Implementation
//=========================================================================================

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> PortResult<()> {
        let request = SendRequest {
            from: &self.from,
            to: &message.to,
            reply_to: message.reply_to.as_deref(),
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "email delivery failed with {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}
