//! services/api/src/web/forms.rs
//!
//! The common 400 response body for form validation failures. Every form
//! endpoint returns the same shape so the client can render inline errors.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tutoring_core::domain::Locale;
use tutoring_core::validation::FieldError;
use utoipa::ToSchema;

/// One rejected field with its localized message.
#[derive(Serialize, ToSchema)]
pub struct FieldErrorBody {
    pub field: String,
    pub code: String,
    pub message: String,
}

/// The body of every validation-failure response.
#[derive(Serialize, ToSchema)]
pub struct ValidationErrorBody {
    pub errors: Vec<FieldErrorBody>,
}

/// Renders field errors as a 400 response in the submitter's locale.
pub fn validation_response(
    locale: Locale,
    errors: Vec<FieldError>,
) -> (StatusCode, Json<ValidationErrorBody>) {
    let errors = errors
        .into_iter()
        .map(|e| FieldErrorBody {
            field: e.field.to_string(),
            code: e.code.as_str().to_string(),
            message: e.code.message(locale).to_string(),
        })
        .collect();
    (StatusCode::BAD_REQUEST, Json(ValidationErrorBody { errors }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutoring_core::validation::ErrorCode;

    #[test]
    fn renders_localized_messages() {
        let errors = vec![FieldError {
            field: "email",
            code: ErrorCode::InvalidEmail,
        }];
        let (status, Json(body)) = validation_response(Locale::De, errors);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.errors[0].field, "email");
        assert_eq!(body.errors[0].code, "invalid_email");
        assert!(body.errors[0].message.contains("E-Mail"));
    }
}
