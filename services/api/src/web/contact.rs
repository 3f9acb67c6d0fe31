//! services/api/src/web/contact.rs
//!
//! The contact-form endpoint: validate the submission, then relay it to the
//! tutor's inbox through the mailer port with reply-to set to the sender.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutoring_core::domain::{ContactMessage, EmailMessage, Locale};
use tutoring_core::validation::validate_contact;
use utoipa::ToSchema;

use crate::web::forms::validation_response;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
    #[serde(default)]
    #[schema(value_type = String, example = "en")]
    pub locale: Locale,
}

#[derive(Serialize, ToSchema)]
pub struct ContactResponse {
    pub sent: bool,
}

fn relay_email(inbox: &str, message: &ContactMessage) -> EmailMessage {
    EmailMessage {
        to: inbox.to_string(),
        reply_to: Some(message.email.clone()),
        subject: format!("Website enquiry from {}", message.name),
        body: format!(
            "From: {} <{}>\nLocale: {}\n\n{}",
            message.name,
            message.email,
            message.locale.as_str(),
            message.message
        ),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /contact - Relay a contact-form submission to the tutor's inbox.
#[utoipa::path(
    post,
    path = "/contact",
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message relayed", body = ContactResponse),
        (status = 400, description = "Validation failed, field errors in body"),
        (status = 502, description = "Email delivery failed")
    )
)]
pub async fn contact_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ContactRequest>,
) -> Result<impl IntoResponse, axum::response::Response> {
    let message = ContactMessage {
        name: req.name,
        email: req.email,
        message: req.message,
        locale: req.locale,
    };

    // 1. Validate, returning every failing field at once
    if let Err(errors) = validate_contact(&message) {
        return Err(validation_response(message.locale, errors).into_response());
    }

    // 2. Relay via the mailer; an upstream failure is logged and surfaced
    //    as a generic message, never the provider's error text
    let email = relay_email(&state.config.contact_inbox, &message);
    if let Err(e) = state.mailer.send(&email).await {
        error!("Failed to relay contact message: {:?}", e);
        return Err((
            StatusCode::BAD_GATEWAY,
            "Your message could not be sent. Please try again later.".to_string(),
        )
            .into_response());
    }

    Ok(Json(ContactResponse { sent: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_email_targets_the_inbox_and_replies_to_the_sender() {
        let message = ContactMessage {
            name: "Marta".to_string(),
            email: "marta@example.com".to_string(),
            message: "I would like to book a trial lesson.".to_string(),
            locale: Locale::En,
        };
        let email = relay_email("tutor@example.com", &message);
        assert_eq!(email.to, "tutor@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("marta@example.com"));
        assert!(email.subject.contains("Marta"));
        assert!(email.body.contains("trial lesson"));
    }
}
