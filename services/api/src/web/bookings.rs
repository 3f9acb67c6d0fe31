//! services/api/src/web/bookings.rs
//!
//! Dashboard endpoints for signed-in users: their booking list, direct
//! creation of trial lessons, and the current-user lookup. Paid bookings
//! never enter through here; those are written by the payment webhook.

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutoring_core::domain::{Booking, BookingRequest, LessonDuration, LessonType, Locale};
use tutoring_core::validation::validate_booking;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::forms::validation_response;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct TrialBookingRequest {
    #[schema(value_type = String, example = "conversation")]
    pub lesson_type: LessonType,
    #[schema(value_type = u32, example = 60)]
    pub duration: LessonDuration,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    #[schema(value_type = String, example = "en")]
    pub locale: Locale,
}

#[derive(Serialize, ToSchema)]
pub struct BookingBody {
    pub id: Uuid,
    pub lesson_type: String,
    pub duration_min: u32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub amount_cents: i64,
    pub currency: String,
    pub paid: bool,
    pub meeting_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingBody {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            lesson_type: b.lesson_type.as_str().to_string(),
            duration_min: b.duration.minutes(),
            starts_at: b.starts_at,
            ends_at: b.ends_at,
            amount_cents: b.amount_cents,
            currency: b.currency,
            paid: b.checkout_session_id.is_some(),
            meeting_url: b.meeting_url,
            created_at: b.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MeResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /bookings - The signed-in user's bookings, newest first.
#[utoipa::path(
    get,
    path = "/bookings",
    responses(
        (status = 200, description = "The user's bookings", body = [BookingBody]),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_bookings_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let bookings = state.db.get_bookings_by_user(user_id).await.map_err(|e| {
        error!("Failed to list bookings for {}: {:?}", user_id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load bookings".to_string())
    })?;

    let body: Vec<BookingBody> = bookings.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// POST /bookings - Book a free trial or manually-arranged lesson.
#[utoipa::path(
    post,
    path = "/bookings",
    request_body = TrialBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingBody),
        (status = 400, description = "Validation failed, field errors in body"),
        (status = 401, description = "Not signed in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<TrialBookingRequest>,
) -> Result<impl IntoResponse, axum::response::Response> {
    // 1. The student details come from the account, not the request
    let user = match state.db.get_user_by_id(user_id).await {
        Ok(user) => user,
        Err(e) => {
            error!("Failed to load user {}: {:?}", user_id, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create booking".to_string(),
            )
                .into_response());
        }
    };
    let email = user.email.unwrap_or_default();

    // 2. Validate the lesson slot
    if let Err(errors) = validate_booking(&user.name, &email, req.starts_at, Utc::now()) {
        return Err(validation_response(req.locale, errors).into_response());
    }

    let request = BookingRequest {
        lesson_type: req.lesson_type,
        duration: req.duration,
        starts_at: req.starts_at,
        student_name: user.name,
        student_email: email,
        locale: req.locale,
        user_id: Some(user_id),
    };

    // 3. Persist with no payment reference
    let booking = match state.db.insert_trial_booking(&request).await {
        Ok(booking) => booking,
        Err(e) => {
            error!("Failed to create trial booking: {:?}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create booking".to_string(),
            )
                .into_response());
        }
    };

    Ok((StatusCode::CREATED, Json(BookingBody::from(booking))))
}

/// GET /me - The signed-in user, for the dashboard shell.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The signed-in user", body = MeResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state.db.get_user_by_id(user_id).await.map_err(|e| {
        error!("Failed to load user {}: {:?}", user_id, e);
        (StatusCode::UNAUTHORIZED, "Unknown user".to_string())
    })?;

    Ok(Json(MeResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
    }))
}
