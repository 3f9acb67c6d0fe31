//! services/api/src/web/checkout.rs
//!
//! The checkout endpoint at the end of the booking wizard. It validates the
//! collected booking details, prices them from the published table, and
//! creates a provider-hosted checkout session. No booking row is written
//! here: the booking exists only once the payment webhook confirms it.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutoring_core::domain::{BookingRequest, LessonDuration, LessonType, Locale};
use tutoring_core::pricing::{price_cents, CURRENCY};
use tutoring_core::validation::validate_booking;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::forms::validation_response;
use crate::web::middleware::session_id_from_cookies;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CheckoutRequest {
    #[schema(value_type = String, example = "business-english")]
    pub lesson_type: LessonType,
    #[schema(value_type = u32, example = 60)]
    pub duration: LessonDuration,
    pub starts_at: DateTime<Utc>,
    pub student_name: String,
    pub student_email: String,
    #[serde(default)]
    #[schema(value_type = String, example = "en")]
    pub locale: Locale,
}

#[derive(Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: String,
    pub amount_cents: i64,
    pub currency: String,
}

/// What the success page polls after the provider redirects back: the
/// webhook may land a moment after the student does.
#[derive(Serialize, ToSchema)]
pub struct CheckoutStatusResponse {
    pub status: &'static str,
    pub meeting_url: Option<String>,
}

/// Resolves the signed-in user, if any. Checkout is a public flow, so a
/// missing or invalid cookie just means an anonymous booking.
async fn optional_user_id(state: &AppState, headers: &HeaderMap) -> Option<Uuid> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let session_id = session_id_from_cookies(cookie_header)?;
    state.db.validate_auth_session(session_id).await.ok()
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /checkout/sessions - Create a payment session for a booking request.
#[utoipa::path(
    post,
    path = "/checkout/sessions",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Checkout session created", body = CheckoutResponse),
        (status = 400, description = "Validation failed, field errors in body"),
        (status = 502, description = "Payment provider unavailable")
    )
)]
pub async fn create_checkout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, axum::response::Response> {
    // 1. Validate the student details and start time
    if let Err(errors) = validate_booking(
        &req.student_name,
        &req.student_email,
        req.starts_at,
        Utc::now(),
    ) {
        return Err(validation_response(req.locale, errors).into_response());
    }

    // 2. Price from the published table - never from the client
    let amount_cents = price_cents(req.lesson_type, req.duration);

    let booking_request = BookingRequest {
        lesson_type: req.lesson_type,
        duration: req.duration,
        starts_at: req.starts_at,
        student_name: req.student_name.trim().to_string(),
        student_email: req.student_email.trim().to_string(),
        locale: req.locale,
        user_id: optional_user_id(&state, &headers).await,
    };

    // 3. Create the provider session; the booking travels in its metadata
    let session = match state
        .payments
        .create_checkout_session(&booking_request, amount_cents, CURRENCY)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to create checkout session: {:?}", e);
            return Err((
                StatusCode::BAD_GATEWAY,
                "Payment could not be started. Please try again later.".to_string(),
            )
                .into_response());
        }
    };

    Ok(Json(CheckoutResponse {
        session_id: session.id,
        url: session.url,
        amount_cents,
        currency: CURRENCY.to_string(),
    }))
}

/// GET /checkout/sessions/{session_id} - Whether a paid booking has landed
/// for this checkout session yet.
#[utoipa::path(
    get,
    path = "/checkout/sessions/{session_id}",
    params(("session_id" = String, Path, description = "The provider checkout session id")),
    responses(
        (status = 200, description = "Session status", body = CheckoutStatusResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn checkout_status_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let booking = state
        .db
        .get_booking_by_checkout_session(&session_id)
        .await
        .map_err(|e| {
            error!("Failed to look up session {}: {:?}", session_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string())
        })?;

    let response = match booking {
        Some(booking) => CheckoutStatusResponse {
            status: "confirmed",
            meeting_url: booking.meeting_url,
        },
        None => CheckoutStatusResponse {
            status: "pending",
            meeting_url: None,
        },
    };
    Ok(Json(response))
}
