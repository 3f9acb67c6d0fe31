//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, plus the health
//! endpoint. The feature handlers live in their own modules under `web/`.

use axum::{response::IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::web::{auth, bookings, checkout, contact, forms, testimonials, webhook};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        contact::contact_handler,
        testimonials::submit_testimonial_handler,
        testimonials::list_testimonials_handler,
        checkout::create_checkout_handler,
        checkout::checkout_status_handler,
        webhook::payment_webhook_handler,
        bookings::list_bookings_handler,
        bookings::create_booking_handler,
        bookings::me_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            contact::ContactRequest,
            contact::ContactResponse,
            testimonials::SubmitTestimonialRequest,
            testimonials::SubmitTestimonialResponse,
            testimonials::TestimonialBody,
            checkout::CheckoutRequest,
            checkout::CheckoutResponse,
            checkout::CheckoutStatusResponse,
            bookings::TrialBookingRequest,
            bookings::BookingBody,
            bookings::MeResponse,
            forms::FieldErrorBody,
            forms::ValidationErrorBody,
        )
    ),
    tags(
        (name = "Tutoring API", description = "Booking, payment and content endpoints for the tutoring site.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Health
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
}

/// GET /health - Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
