//! crates/tutoring_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the database,
//! the payment provider, the mail service, or the content store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Booking, BookingRequest, EmailMessage, NewTestimonial, Testimonial, User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Bookings ---

    /// Inserts a booking confirmed by the payment provider, keyed by the
    /// checkout session id. Returns `None` when a booking for that session
    /// already exists, so a re-delivered webhook cannot create a second row.
    /// The caller supplies the id because the meeting link is derived from it
    /// before the insert.
    async fn insert_paid_booking(
        &self,
        id: Uuid,
        request: &BookingRequest,
        amount_cents: i64,
        currency: &str,
        checkout_session_id: &str,
        meeting_url: &str,
    ) -> PortResult<Option<Booking>>;

    /// Inserts a trial or manually-arranged booking with no payment reference.
    async fn insert_trial_booking(&self, request: &BookingRequest) -> PortResult<Booking>;

    async fn get_bookings_by_user(&self, user_id: Uuid) -> PortResult<Vec<Booking>>;

    async fn get_booking_by_checkout_session(
        &self,
        checkout_session_id: &str,
    ) -> PortResult<Option<Booking>>;
}

/// A checkout session created at the payment provider. The student is
/// redirected to `url`; the session id comes back in the webhook.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a provider-hosted checkout session for the given booking
    /// request at the given price. The booking fields travel inside the
    /// session metadata; no booking is persisted until the provider
    /// confirms payment through the webhook.
    async fn create_checkout_session(
        &self,
        request: &BookingRequest,
        amount_cents: i64,
        currency: &str,
    ) -> PortResult<CheckoutSession>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one email. Callers decide whether a failure is fatal:
    /// the contact relay surfaces it, the webhook only logs it.
    async fn send(&self, message: &EmailMessage) -> PortResult<()>;
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stores a submitted testimonial, unapproved, and returns its id.
    async fn create_testimonial(&self, testimonial: &NewTestimonial) -> PortResult<String>;

    /// Lists testimonials an administrator has approved, newest first.
    async fn list_approved_testimonials(&self) -> PortResult<Vec<Testimonial>>;
}
