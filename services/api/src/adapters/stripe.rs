//! services/api/src/adapters/stripe.rs
//!
//! This module contains the adapter for the Stripe payment gateway. It
//! implements the `PaymentGateway` port for creating hosted checkout
//! sessions, and holds the signature verification and event parsing used
//! by the webhook handler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tutoring_core::domain::{BookingRequest, LessonDuration, LessonType, Locale};
use tutoring_core::ports::{CheckoutSession, PaymentGateway, PortError, PortResult};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// How far a webhook timestamp may drift from our clock before the event
/// is rejected as a possible replay.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `PaymentGateway` port using Stripe
/// Checkout. The API base is configurable so tests can point it at a stub.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: String,
}

impl StripeGateway {
    /// Creates a new `StripeGateway`.
    pub fn new(
        client: reqwest::Client,
        secret_key: String,
        api_base: String,
        success_url: String,
        cancel_url: String,
    ) -> Self {
        Self {
            client,
            secret_key,
            api_base,
            success_url,
            cancel_url,
        }
    }
}

/// The human-readable line item shown on the hosted checkout page.
fn line_item_name(request: &BookingRequest) -> String {
    let lesson = match request.lesson_type {
        LessonType::GeneralEnglish => "General English lesson",
        LessonType::BusinessEnglish => "Business English lesson",
        LessonType::ExamPrep => "Exam preparation lesson",
        LessonType::Conversation => "Conversation practice",
    };
    format!("{} ({} min)", lesson, request.duration.minutes())
}

//=========================================================================================
// `PaymentGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl PaymentGateway for StripeGateway {
    /// Creates a checkout session whose metadata carries the whole booking
    /// request. The webhook reads the metadata back; nothing is persisted
    /// here.
    async fn create_checkout_session(
        &self,
        request: &BookingRequest,
        amount_cents: i64,
        currency: &str,
    ) -> PortResult<CheckoutSession> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), self.success_url.clone()),
            ("cancel_url".into(), self.cancel_url.clone()),
            ("customer_email".into(), request.student_email.clone()),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                "line_items[0][price_data][currency]".into(),
                currency.to_string(),
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                line_item_name(request),
            ),
        ];
        for (key, value) in booking_metadata(request) {
            form.push((format!("metadata[{}]", key), value));
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "checkout session creation failed with {}: {}",
                status, body
            )));
        }

        let session: CheckoutSessionResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }
}

/// The metadata pairs that carry a booking request through the payment
/// provider and back in on the webhook.
pub fn booking_metadata(request: &BookingRequest) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("lesson_type", request.lesson_type.as_str().to_string()),
        ("duration_min", request.duration.minutes().to_string()),
        ("starts_at", request.starts_at.to_rfc3339()),
        ("student_name", request.student_name.clone()),
        ("student_email", request.student_email.clone()),
        ("locale", request.locale.as_str().to_string()),
    ];
    if let Some(user_id) = request.user_id {
        pairs.push(("user_id", user_id.to_string()));
    }
    pairs
}

//=========================================================================================
// Webhook Signature Verification
//=========================================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("malformed signature header")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    StaleTimestamp,
    #[error("no signature matched the payload")]
    NoMatch,
}

/// Verifies a `Stripe-Signature` header (`t=<unix ts>,v1=<hex hmac>`)
/// against the raw request body.
///
/// The signed payload is `"{t}.{body}"`; the signature is HMAC-SHA256 under
/// the endpoint secret. Comparison goes through `Mac::verify_slice`, which
/// is constant-time. `now` is passed in so the tolerance check is testable.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<Vec<u8>> = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::Malformed);
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => {
                let bytes = hex::decode(value).map_err(|_| SignatureError::Malformed)?;
                candidates.push(bytes);
            }
            // Unknown schemes (v0, ...) are ignored, as the provider documents.
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let age = now.timestamp() - timestamp;
    if age.abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    for candidate in &candidates {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| SignatureError::Malformed)?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        if mac.verify_slice(candidate).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::NoMatch)
}

//=========================================================================================
// Webhook Event Parsing
//=========================================================================================

/// The slice of a webhook event this service cares about.
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: CheckoutSessionObject,
}

/// The checkout session object embedded in a completed-checkout event.
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: std::collections::HashMap<String, String>,
}

impl CheckoutSessionObject {
    /// Reconstructs the booking request from the session metadata. Returns
    /// an error naming the first missing or unparseable field; the webhook
    /// logs it and acknowledges without persisting anything.
    pub fn booking_request(&self) -> Result<BookingRequest, String> {
        let get = |key: &str| -> Result<&str, String> {
            self.metadata
                .get(key)
                .map(String::as_str)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("missing metadata field {}", key))
        };

        let lesson_type = LessonType::parse(get("lesson_type")?)
            .ok_or_else(|| "unknown lesson_type in metadata".to_string())?;
        let duration_min: u32 = get("duration_min")?
            .parse()
            .map_err(|_| "unparseable duration_min in metadata".to_string())?;
        let duration = LessonDuration::from_minutes(duration_min)
            .ok_or_else(|| "unknown duration_min in metadata".to_string())?;
        let starts_at = DateTime::parse_from_rfc3339(get("starts_at")?)
            .map_err(|_| "unparseable starts_at in metadata".to_string())?
            .with_timezone(&Utc);
        let locale = Locale::parse(get("locale")?).unwrap_or_default();
        let user_id = match self.metadata.get("user_id") {
            Some(raw) if !raw.is_empty() => Some(
                Uuid::parse_str(raw).map_err(|_| "unparseable user_id in metadata".to_string())?,
            ),
            _ => None,
        };

        Ok(BookingRequest {
            lesson_type,
            duration,
            starts_at,
            student_name: get("student_name")?.to_string(),
            student_email: get("student_email")?.to_string(),
            locale,
            user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const SECRET: &str = "whsec_test_secret";

    fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn accepts_a_valid_signature() {
        let payload = br#"{"id":"evt_1"}"#;
        let t = now().timestamp();
        let header = format!("t={},v1={}", t, sign(SECRET, t, payload));
        assert_eq!(verify_signature(SECRET, &header, payload, now()), Ok(()));
    }

    #[test]
    fn rejects_a_signature_under_the_wrong_secret() {
        let payload = br#"{"id":"evt_1"}"#;
        let t = now().timestamp();
        let header = format!("t={},v1={}", t, sign("whsec_other", t, payload));
        assert_eq!(
            verify_signature(SECRET, &header, payload, now()),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn rejects_a_tampered_body() {
        let payload = br#"{"id":"evt_1"}"#;
        let t = now().timestamp();
        let header = format!("t={},v1={}", t, sign(SECRET, t, payload));
        assert_eq!(
            verify_signature(SECRET, &header, br#"{"id":"evt_2"}"#, now()),
            Err(SignatureError::NoMatch)
        );
    }

    #[test]
    fn rejects_a_stale_timestamp() {
        let payload = br#"{"id":"evt_1"}"#;
        let t = (now() - Duration::minutes(10)).timestamp();
        let header = format!("t={},v1={}", t, sign(SECRET, t, payload));
        assert_eq!(
            verify_signature(SECRET, &header, payload, now()),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        let payload = b"{}";
        for header in ["", "t=123", "v1=abcd", "t=123,v1=nothex", "garbage"] {
            assert!(
                verify_signature(SECRET, header, payload, now()).is_err(),
                "{header:?} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_when_any_v1_candidate_matches() {
        // During secret rotation the provider sends two v1 entries.
        let payload = br#"{"id":"evt_1"}"#;
        let t = now().timestamp();
        let header = format!(
            "t={},v1={},v1={}",
            t,
            sign("whsec_old", t, payload),
            sign(SECRET, t, payload)
        );
        assert_eq!(verify_signature(SECRET, &header, payload, now()), Ok(()));
    }

    #[test]
    fn parses_a_completed_checkout_event() {
        let body = r#"{
            "id": "evt_123",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_test_789",
                "amount_total": 4200,
                "currency": "eur",
                "metadata": {
                    "lesson_type": "business-english",
                    "duration_min": "60",
                    "starts_at": "2025-04-01T09:00:00+00:00",
                    "student_name": "Marta Kowalska",
                    "student_email": "marta@example.com",
                    "locale": "de"
                }
            }}
        }"#;
        let event: WebhookEvent = serde_json::from_str(body).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        assert_eq!(event.data.object.id, "cs_test_789");
        assert_eq!(event.data.object.amount_total, Some(4200));

        let request = event.data.object.booking_request().unwrap();
        assert_eq!(request.lesson_type, LessonType::BusinessEnglish);
        assert_eq!(request.duration, LessonDuration::Min60);
        assert_eq!(request.locale, Locale::De);
        assert_eq!(request.user_id, None);
        assert_eq!(request.student_email, "marta@example.com");
    }

    #[test]
    fn reports_missing_metadata_fields() {
        let object = CheckoutSessionObject {
            id: "cs_1".to_string(),
            amount_total: Some(2800),
            currency: Some("eur".to_string()),
            metadata: [("lesson_type".to_string(), "conversation".to_string())]
                .into_iter()
                .collect(),
        };
        let err = object.booking_request().unwrap_err();
        assert!(err.contains("duration_min"), "{err}");
    }

    #[test]
    fn metadata_round_trips_through_the_session_object() {
        let request = BookingRequest {
            lesson_type: LessonType::ExamPrep,
            duration: LessonDuration::Min90,
            starts_at: Utc.with_ymd_and_hms(2025, 5, 2, 15, 30, 0).unwrap(),
            student_name: "Jonas Weber".to_string(),
            student_email: "jonas@example.com".to_string(),
            locale: Locale::De,
            user_id: Some(Uuid::new_v4()),
        };
        let object = CheckoutSessionObject {
            id: "cs_1".to_string(),
            amount_total: Some(5700),
            currency: Some("eur".to_string()),
            metadata: booking_metadata(&request)
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        };
        let parsed = object.booking_request().unwrap();
        assert_eq!(parsed.lesson_type, request.lesson_type);
        assert_eq!(parsed.duration, request.duration);
        assert_eq!(parsed.starts_at, request.starts_at);
        assert_eq!(parsed.user_id, request.user_id);
    }
}
