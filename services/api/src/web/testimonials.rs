//! services/api/src/web/testimonials.rs
//!
//! Testimonial submission and listing. Submissions land in the headless
//! content store unapproved; the public listing only ever sees documents an
//! administrator has approved in the studio.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutoring_core::domain::{Locale, NewTestimonial, Testimonial};
use tutoring_core::validation::validate_testimonial;
use utoipa::ToSchema;

use crate::web::forms::validation_response;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SubmitTestimonialRequest {
    pub author_name: String,
    pub author_email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub quote_en: String,
    #[serde(default)]
    pub quote_de: String,
    pub rating: u8,
    #[serde(default)]
    #[schema(value_type = String, example = "en")]
    pub locale: Locale,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitTestimonialResponse {
    pub id: String,
}

/// A testimonial as shown on the marketing site. The author's email never
/// leaves the content store.
#[derive(Serialize, ToSchema)]
pub struct TestimonialBody {
    pub id: String,
    pub author_name: String,
    pub role: String,
    pub quote_en: String,
    pub quote_de: String,
    pub rating: u8,
    pub submitted_at: DateTime<Utc>,
}

impl From<Testimonial> for TestimonialBody {
    fn from(t: Testimonial) -> Self {
        Self {
            id: t.id,
            author_name: t.author_name,
            role: t.role,
            quote_en: t.quote_en,
            quote_de: t.quote_de,
            rating: t.rating,
            submitted_at: t.submitted_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /testimonials - Submit a testimonial for review.
#[utoipa::path(
    post,
    path = "/testimonials",
    request_body = SubmitTestimonialRequest,
    responses(
        (status = 201, description = "Testimonial stored for review", body = SubmitTestimonialResponse),
        (status = 400, description = "Validation failed, field errors in body"),
        (status = 502, description = "Content store unavailable")
    )
)]
pub async fn submit_testimonial_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitTestimonialRequest>,
) -> Result<impl IntoResponse, axum::response::Response> {
    let testimonial = NewTestimonial {
        author_name: req.author_name,
        author_email: req.author_email,
        role: req.role,
        quote_en: req.quote_en,
        quote_de: req.quote_de,
        rating: req.rating,
    };

    // 1. Validate
    if let Err(errors) = validate_testimonial(&testimonial) {
        return Err(validation_response(req.locale, errors).into_response());
    }

    // 2. Store unapproved; approval happens in the content studio
    let id = match state.content.create_testimonial(&testimonial).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to store testimonial: {:?}", e);
            return Err((
                StatusCode::BAD_GATEWAY,
                "Your testimonial could not be submitted. Please try again later.".to_string(),
            )
                .into_response());
        }
    };

    Ok((StatusCode::CREATED, Json(SubmitTestimonialResponse { id })))
}

/// GET /testimonials - List approved testimonials, newest first.
#[utoipa::path(
    get,
    path = "/testimonials",
    responses(
        (status = 200, description = "Approved testimonials", body = [TestimonialBody]),
        (status = 502, description = "Content store unavailable")
    )
)]
pub async fn list_testimonials_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let testimonials = state
        .content
        .list_approved_testimonials()
        .await
        .map_err(|e| {
            error!("Failed to list testimonials: {:?}", e);
            (
                StatusCode::BAD_GATEWAY,
                "Testimonials are unavailable right now.".to_string(),
            )
        })?;

    let body: Vec<TestimonialBody> = testimonials.into_iter().map(Into::into).collect();
    Ok(Json(body))
}
