pub mod domain;
pub mod ports;
pub mod pricing;
pub mod validation;

pub use domain::{
    AuthSession, Booking, BookingRequest, ContactMessage, EmailMessage, LessonDuration,
    LessonType, Locale, NewTestimonial, Testimonial, User, UserCredentials,
};
pub use ports::{
    CheckoutSession, ContentStore, DatabaseService, Mailer, PaymentGateway, PortError, PortResult,
};
pub use pricing::{price_cents, CURRENCY};
pub use validation::{validate_booking, validate_contact, validate_testimonial, FieldError};
