//! crates/tutoring_core/src/validation.rs
//!
//! Field-level validation for the public forms (contact, booking,
//! testimonial). Validators return every failing field at once so the web
//! layer can render inline errors, and each error code carries a localized
//! message for the two site locales.

use chrono::{DateTime, Utc};

use crate::domain::{ContactMessage, Locale, NewTestimonial};

/// Minimum length of a contact-form message, after trimming.
pub const MIN_MESSAGE_LEN: usize = 20;

/// A stable, machine-readable reason a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Required,
    InvalidEmail,
    MessageTooShort,
    RatingOutOfRange,
    StartNotInFuture,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Required => "required",
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::MessageTooShort => "message_too_short",
            ErrorCode::RatingOutOfRange => "rating_out_of_range",
            ErrorCode::StartNotInFuture => "start_not_in_future",
        }
    }

    /// The user-facing message for this code in the given locale.
    pub fn message(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (ErrorCode::Required, Locale::En) => "This field is required.",
            (ErrorCode::Required, Locale::De) => "Dieses Feld ist erforderlich.",
            (ErrorCode::InvalidEmail, Locale::En) => "Please enter a valid email address.",
            (ErrorCode::InvalidEmail, Locale::De) => {
                "Bitte geben Sie eine gültige E-Mail-Adresse ein."
            }
            (ErrorCode::MessageTooShort, Locale::En) => {
                "Your message must be at least 20 characters long."
            }
            (ErrorCode::MessageTooShort, Locale::De) => {
                "Ihre Nachricht muss mindestens 20 Zeichen lang sein."
            }
            (ErrorCode::RatingOutOfRange, Locale::En) => "Rating must be between 1 and 5.",
            (ErrorCode::RatingOutOfRange, Locale::De) => {
                "Die Bewertung muss zwischen 1 und 5 liegen."
            }
            (ErrorCode::StartNotInFuture, Locale::En) => "The lesson time must be in the future.",
            (ErrorCode::StartNotInFuture, Locale::De) => {
                "Der Unterrichtstermin muss in der Zukunft liegen."
            }
        }
    }
}

/// One rejected field, as surfaced in a 400 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub code: ErrorCode,
}

impl FieldError {
    fn new(field: &'static str, code: ErrorCode) -> Self {
        Self { field, code }
    }
}

/// Structural email check: one `@`, a non-empty local part, and a domain
/// containing a dot. Deliverability is the mail provider's problem.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

/// Validates a contact-form submission.
pub fn validate_contact(message: &ContactMessage) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if message.name.trim().is_empty() {
        errors.push(FieldError::new("name", ErrorCode::Required));
    }
    if message.email.trim().is_empty() {
        errors.push(FieldError::new("email", ErrorCode::Required));
    } else if !is_valid_email(&message.email) {
        errors.push(FieldError::new("email", ErrorCode::InvalidEmail));
    }
    if message.message.trim().is_empty() {
        errors.push(FieldError::new("message", ErrorCode::Required));
    } else if message.message.trim().chars().count() < MIN_MESSAGE_LEN {
        errors.push(FieldError::new("message", ErrorCode::MessageTooShort));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the student details and start time of a booking request.
/// Lesson type and duration are enforced by their types before this runs.
pub fn validate_booking(
    student_name: &str,
    student_email: &str,
    starts_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if student_name.trim().is_empty() {
        errors.push(FieldError::new("student_name", ErrorCode::Required));
    }
    if student_email.trim().is_empty() {
        errors.push(FieldError::new("student_email", ErrorCode::Required));
    } else if !is_valid_email(student_email) {
        errors.push(FieldError::new("student_email", ErrorCode::InvalidEmail));
    }
    if starts_at <= now {
        errors.push(FieldError::new("starts_at", ErrorCode::StartNotInFuture));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a testimonial submission. At least one quote language must be
/// present; the other may stay empty.
pub fn validate_testimonial(testimonial: &NewTestimonial) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if testimonial.author_name.trim().is_empty() {
        errors.push(FieldError::new("author_name", ErrorCode::Required));
    }
    if testimonial.author_email.trim().is_empty() {
        errors.push(FieldError::new("author_email", ErrorCode::Required));
    } else if !is_valid_email(&testimonial.author_email) {
        errors.push(FieldError::new("author_email", ErrorCode::InvalidEmail));
    }
    if testimonial.quote_en.trim().is_empty() && testimonial.quote_de.trim().is_empty() {
        errors.push(FieldError::new("quote", ErrorCode::Required));
    }
    if !(1..=5).contains(&testimonial.rating) {
        errors.push(FieldError::new("rating", ErrorCode::RatingOutOfRange));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn contact(name: &str, email: &str, message: &str) -> ContactMessage {
        ContactMessage {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            locale: Locale::En,
        }
    }

    #[test]
    fn accepts_a_complete_contact_submission() {
        let message = contact(
            "Marta Kowalska",
            "marta@example.com",
            "I would like to prepare for the IELTS exam in June.",
        );
        assert!(validate_contact(&message).is_ok());
    }

    #[test]
    fn rejects_empty_name() {
        let message = contact("  ", "marta@example.com", &"x".repeat(MIN_MESSAGE_LEN));
        let errors = validate_contact(&message).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("name", ErrorCode::Required)]);
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["plainaddress", "two@@signs.com", "@nolocal.com", "user@", "user@nodot", "sp ace@mail.com"] {
            assert!(!is_valid_email(bad), "{bad} should be rejected");
        }
        for good in ["user@example.com", "a.b+tag@sub.domain.org"] {
            assert!(is_valid_email(good), "{good} should be accepted");
        }
    }

    #[test]
    fn rejects_message_under_minimum_length() {
        let message = contact("Marta", "marta@example.com", "Too short.");
        let errors = validate_contact(&message).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("message", ErrorCode::MessageTooShort)]
        );
    }

    #[test]
    fn collects_every_failing_field_at_once() {
        let message = contact("", "not-an-email", "hi");
        let errors = validate_contact(&message).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "email", "message"]);
    }

    #[test]
    fn error_messages_exist_for_both_locales() {
        let codes = [
            ErrorCode::Required,
            ErrorCode::InvalidEmail,
            ErrorCode::MessageTooShort,
            ErrorCode::RatingOutOfRange,
            ErrorCode::StartNotInFuture,
        ];
        for code in codes {
            assert!(!code.message(Locale::En).is_empty());
            assert!(!code.message(Locale::De).is_empty());
            assert_ne!(code.message(Locale::En), code.message(Locale::De));
        }
    }

    #[test]
    fn booking_start_must_be_in_the_future() {
        let now = Utc::now();
        let errors =
            validate_booking("Ada", "ada@example.com", now - Duration::hours(1), now).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("starts_at", ErrorCode::StartNotInFuture)]
        );
        assert!(validate_booking("Ada", "ada@example.com", now + Duration::hours(1), now).is_ok());
    }

    #[test]
    fn testimonial_needs_a_quote_in_at_least_one_language() {
        let mut testimonial = NewTestimonial {
            author_name: "Jonas".to_string(),
            author_email: "jonas@example.com".to_string(),
            role: "Business client".to_string(),
            quote_en: String::new(),
            quote_de: String::new(),
            rating: 5,
        };
        let errors = validate_testimonial(&testimonial).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("quote", ErrorCode::Required)]);

        testimonial.quote_de = "Sehr empfehlenswert.".to_string();
        assert!(validate_testimonial(&testimonial).is_ok());
    }

    #[test]
    fn testimonial_rating_bounds() {
        let testimonial = NewTestimonial {
            author_name: "Jonas".to_string(),
            author_email: "jonas@example.com".to_string(),
            role: String::new(),
            quote_en: "Great lessons.".to_string(),
            quote_de: String::new(),
            rating: 6,
        };
        let errors = validate_testimonial(&testimonial).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("rating", ErrorCode::RatingOutOfRange)]
        );
    }
}
