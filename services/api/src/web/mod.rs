pub mod auth;
pub mod bookings;
pub mod checkout;
pub mod contact;
pub mod forms;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod testimonials;
pub mod webhook;

// Re-export the handlers the binary wires into the router.
pub use bookings::{create_booking_handler, list_bookings_handler, me_handler};
pub use checkout::{checkout_status_handler, create_checkout_handler};
pub use contact::contact_handler;
pub use middleware::require_auth;
pub use testimonials::{list_testimonials_handler, submit_testimonial_handler};
pub use webhook::payment_webhook_handler;
