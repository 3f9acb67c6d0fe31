//! services/api/src/web/webhook.rs
//!
//! The payment provider's webhook receiver. This is the only place a paid
//! booking is ever written: the checkout endpoint sends the booking through
//! the provider as session metadata, and this handler persists it once the
//! provider confirms payment.
//!
//! Signature verification runs against the raw body before anything is
//! parsed; a mismatch is a 400 and nothing is persisted. Confirmation
//! emails are fire-and-forget: a delivery failure is logged but the event
//! is still acknowledged, because the provider would otherwise redeliver a
//! payment we have already recorded.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use tutoring_core::domain::{Booking, BookingRequest, EmailMessage, LessonType, Locale};
use tutoring_core::pricing::{price_cents, CURRENCY};
use uuid::Uuid;

use crate::adapters::stripe::{verify_signature, WebhookEvent};
use crate::web::state::AppState;

const SIGNATURE_HEADER: &str = "Stripe-Signature";
const COMPLETED_EVENT: &str = "checkout.session.completed";

//=========================================================================================
// Confirmation Emails
//=========================================================================================

fn lesson_label(lesson_type: LessonType, locale: Locale) -> &'static str {
    match (lesson_type, locale) {
        (LessonType::GeneralEnglish, Locale::En) => "General English",
        (LessonType::GeneralEnglish, Locale::De) => "Allgemeines Englisch",
        (LessonType::BusinessEnglish, _) => "Business English",
        (LessonType::ExamPrep, Locale::En) => "Exam preparation",
        (LessonType::ExamPrep, Locale::De) => "Prüfungsvorbereitung",
        (LessonType::Conversation, Locale::En) => "Conversation practice",
        (LessonType::Conversation, Locale::De) => "Konversationstraining",
    }
}

/// The confirmation sent to the student, in the locale they booked in.
fn student_confirmation(request: &BookingRequest, booking: &Booking) -> EmailMessage {
    let lesson = lesson_label(request.lesson_type, request.locale);
    let when = booking.starts_at.format("%Y-%m-%d %H:%M UTC");
    let price = format!("{:.2} EUR", booking.amount_cents as f64 / 100.0);
    let meeting = booking.meeting_url.as_deref().unwrap_or("-");

    let (subject, body) = match request.locale {
        Locale::En => (
            "Your lesson is booked".to_string(),
            format!(
                "Hi {},\n\nYour booking is confirmed.\n\n\
                 Lesson: {} ({} min)\nDate: {}\nPrice: {}\nMeeting link: {}\n\n\
                 See you in class!",
                request.student_name,
                lesson,
                request.duration.minutes(),
                when,
                price,
                meeting
            ),
        ),
        Locale::De => (
            "Ihre Unterrichtsstunde ist gebucht".to_string(),
            format!(
                "Hallo {},\n\nIhre Buchung ist bestätigt.\n\n\
                 Unterricht: {} ({} Min.)\nDatum: {}\nPreis: {}\nMeeting-Link: {}\n\n\
                 Bis bald im Unterricht!",
                request.student_name,
                lesson,
                request.duration.minutes(),
                when,
                price,
                meeting
            ),
        ),
    };

    EmailMessage {
        to: request.student_email.clone(),
        reply_to: None,
        subject,
        body,
    }
}

/// The heads-up sent to the tutor's inbox for every paid booking.
fn tutor_notification(inbox: &str, request: &BookingRequest, booking: &Booking) -> EmailMessage {
    EmailMessage {
        to: inbox.to_string(),
        reply_to: Some(request.student_email.clone()),
        subject: format!(
            "New booking: {} ({} min) on {}",
            request.lesson_type.as_str(),
            request.duration.minutes(),
            booking.starts_at.format("%Y-%m-%d %H:%M")
        ),
        body: format!(
            "Student: {} <{}>\nLesson: {} ({} min)\nStarts: {}\nPaid: {:.2} {}\nMeeting: {}",
            request.student_name,
            request.student_email,
            request.lesson_type.as_str(),
            request.duration.minutes(),
            booking.starts_at.to_rfc3339(),
            booking.amount_cents as f64 / 100.0,
            booking.currency.to_uppercase(),
            booking.meeting_url.as_deref().unwrap_or("-"),
        ),
    }
}

//=========================================================================================
// Handler
//=========================================================================================

/// POST /webhooks/payment - Receive payment events from the provider.
#[utoipa::path(
    post,
    path = "/webhooks/payment",
    responses(
        (status = 200, description = "Event acknowledged"),
        (status = 400, description = "Missing or invalid signature")
    )
)]
pub async fn payment_webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Verify the signature against the raw body before touching it
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::BAD_REQUEST, "Missing signature".to_string()))?;

    if let Err(e) = verify_signature(
        &state.config.stripe_webhook_secret,
        signature,
        &body,
        Utc::now(),
    ) {
        warn!("Rejected webhook delivery: {}", e);
        return Err((StatusCode::BAD_REQUEST, "Invalid signature".to_string()));
    }

    // 2. Parse the event
    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Unparseable event".to_string()))?;

    if event.event_type != COMPLETED_EVENT {
        info!("Ignoring webhook event {} of type {}", event.id, event.event_type);
        return Ok(Json(json!({ "received": true })));
    }

    let session = event.data.object;

    // 3. Rebuild the booking request from the session metadata. The metadata
    //    is written by our own checkout endpoint, so a parse failure is a bug
    //    on our side; redelivery cannot fix it, so acknowledge and log.
    let request = match session.booking_request() {
        Ok(request) => request,
        Err(reason) => {
            error!(
                "Webhook event {} had unusable metadata ({}); acknowledged without booking",
                event.id, reason
            );
            return Ok(Json(json!({ "received": true })));
        }
    };

    let amount_cents = session
        .amount_total
        .unwrap_or_else(|| price_cents(request.lesson_type, request.duration));
    let currency = session.currency.clone().unwrap_or_else(|| CURRENCY.to_string());

    // 4. Persist exactly once, keyed by the checkout session id
    let booking_id = Uuid::new_v4();
    let meeting_url = state.config.meeting_url_for(booking_id);
    let inserted = state
        .db
        .insert_paid_booking(
            booking_id,
            &request,
            amount_cents,
            &currency,
            &session.id,
            &meeting_url,
        )
        .await
        .map_err(|e| {
            // A database failure is the one case where we want redelivery.
            error!("Failed to persist booking for session {}: {:?}", session.id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Storage failure".to_string())
        })?;

    let Some(booking) = inserted else {
        info!(
            "Duplicate webhook delivery for session {}; booking already recorded",
            session.id
        );
        return Ok(Json(json!({ "received": true, "duplicate": true })));
    };

    info!(
        "Recorded booking {} for session {} ({} / {} min)",
        booking.id,
        session.id,
        request.lesson_type.as_str(),
        request.duration.minutes()
    );

    // 5. Notifications are fire-and-forget: log failures, never fail the ack
    if let Err(e) = state.mailer.send(&student_confirmation(&request, &booking)).await {
        error!("Failed to send confirmation email for booking {}: {:?}", booking.id, e);
    }
    let notification = tutor_notification(&state.config.contact_inbox, &request, &booking);
    if let Err(e) = state.mailer.send(&notification).await {
        error!("Failed to notify tutor for booking {}: {:?}", booking.id, e);
    }

    Ok(Json(json!({ "received": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tutoring_core::domain::LessonDuration;

    fn request(locale: Locale) -> BookingRequest {
        BookingRequest {
            lesson_type: LessonType::ExamPrep,
            duration: LessonDuration::Min60,
            starts_at: Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap(),
            student_name: "Marta".to_string(),
            student_email: "marta@example.com".to_string(),
            locale,
            user_id: None,
        }
    }

    fn booking(request: &BookingRequest) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user_id: None,
            lesson_type: request.lesson_type,
            duration: request.duration,
            starts_at: request.starts_at,
            ends_at: request.ends_at(),
            student_name: request.student_name.clone(),
            student_email: request.student_email.clone(),
            amount_cents: 4000,
            currency: "eur".to_string(),
            checkout_session_id: Some("cs_1".to_string()),
            meeting_url: Some("https://meet.example.com/rooms/abc".to_string()),
            created_at: request.starts_at,
        }
    }

    #[test]
    fn student_confirmation_is_localized_and_carries_the_meeting_link() {
        let request_de = request(Locale::De);
        let email = student_confirmation(&request_de, &booking(&request_de));
        assert_eq!(email.to, "marta@example.com");
        assert!(email.subject.contains("gebucht"));
        assert!(email.body.contains("https://meet.example.com/rooms/abc"));
        assert!(email.body.contains("Prüfungsvorbereitung"));

        let request_en = request(Locale::En);
        let email = student_confirmation(&request_en, &booking(&request_en));
        assert!(email.subject.contains("booked"));
        assert!(email.body.contains("40.00 EUR"));
    }

    #[test]
    fn tutor_notification_goes_to_the_inbox_with_reply_to_student() {
        let request = request(Locale::En);
        let email = tutor_notification("tutor@example.com", &request, &booking(&request));
        assert_eq!(email.to, "tutor@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("marta@example.com"));
        assert!(email.subject.contains("exam-prep"));
    }
}
