//! crates/tutoring_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except for the wire-facing enums which carry serde renames so the web
//! layer and the payment metadata agree on spellings.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The lesson formats the business sells. The price table is keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LessonType {
    GeneralEnglish,
    BusinessEnglish,
    ExamPrep,
    Conversation,
}

impl LessonType {
    pub const ALL: [LessonType; 4] = [
        LessonType::GeneralEnglish,
        LessonType::BusinessEnglish,
        LessonType::ExamPrep,
        LessonType::Conversation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LessonType::GeneralEnglish => "general-english",
            LessonType::BusinessEnglish => "business-english",
            LessonType::ExamPrep => "exam-prep",
            LessonType::Conversation => "conversation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "general-english" => Some(LessonType::GeneralEnglish),
            "business-english" => Some(LessonType::BusinessEnglish),
            "exam-prep" => Some(LessonType::ExamPrep),
            "conversation" => Some(LessonType::Conversation),
            _ => None,
        }
    }
}

/// The fixed set of lesson lengths offered on the booking form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LessonDuration {
    Min45,
    Min60,
    Min90,
}

impl LessonDuration {
    pub const ALL: [LessonDuration; 3] = [
        LessonDuration::Min45,
        LessonDuration::Min60,
        LessonDuration::Min90,
    ];

    pub fn minutes(&self) -> u32 {
        match self {
            LessonDuration::Min45 => 45,
            LessonDuration::Min60 => 60,
            LessonDuration::Min90 => 90,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        match minutes {
            45 => Some(LessonDuration::Min45),
            60 => Some(LessonDuration::Min60),
            90 => Some(LessonDuration::Min90),
            _ => None,
        }
    }
}

impl TryFrom<u32> for LessonDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        LessonDuration::from_minutes(minutes)
            .ok_or_else(|| format!("{} is not an offered lesson duration", minutes))
    }
}

impl From<LessonDuration> for u32 {
    fn from(duration: LessonDuration) -> u32 {
        duration.minutes()
    }
}

/// The locales the booking and contact forms are served in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    De,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::De => "de",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Locale::En),
            "de" => Some(Locale::De),
            _ => None,
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A confirmed lesson booking.
///
/// Paid bookings are written exactly once, by the payment webhook, and carry
/// the provider's checkout session id. Trial bookings created from the
/// dashboard have no payment reference.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub lesson_type: LessonType,
    pub duration: LessonDuration,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub student_name: String,
    pub student_email: String,
    pub amount_cents: i64,
    pub currency: String,
    pub checkout_session_id: Option<String>,
    pub meeting_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The booking details collected across the multi-step form, before any
/// payment or persistence has happened.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub lesson_type: LessonType,
    pub duration: LessonDuration,
    pub starts_at: DateTime<Utc>,
    pub student_name: String,
    pub student_email: String,
    pub locale: Locale,
    pub user_id: Option<Uuid>,
}

impl BookingRequest {
    /// The lesson end time implied by the chosen duration.
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.starts_at + Duration::minutes(self.duration.minutes() as i64)
    }
}

/// A testimonial as stored in the headless content store.
///
/// Quotes are bilingual; one side may be empty when the author only wrote
/// one language. `approved` is flipped by an administrator in the content
/// studio, never through this API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: String,
    pub author_name: String,
    pub role: String,
    pub quote_en: String,
    pub quote_de: String,
    pub rating: u8,
    pub approved: bool,
    pub submitted_at: DateTime<Utc>,
}

/// A testimonial submission before it has been given an id by the store.
#[derive(Debug, Clone)]
pub struct NewTestimonial {
    pub author_name: String,
    pub author_email: String,
    pub role: String,
    pub quote_en: String,
    pub quote_de: String,
    pub rating: u8,
}

/// A contact-form submission relayed to the tutor's inbox.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
    pub locale: Locale,
}

/// An outbound email handed to the mailer port.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lesson_type_round_trips_through_wire_spelling() {
        for lesson_type in LessonType::ALL {
            assert_eq!(LessonType::parse(lesson_type.as_str()), Some(lesson_type));
        }
        assert_eq!(LessonType::parse("karaoke"), None);
    }

    #[test]
    fn duration_only_accepts_offered_lengths() {
        assert_eq!(LessonDuration::from_minutes(60), Some(LessonDuration::Min60));
        assert_eq!(LessonDuration::from_minutes(15), None);
        assert_eq!(LessonDuration::from_minutes(0), None);
    }

    #[test]
    fn booking_request_derives_end_time_from_duration() {
        let starts_at = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let request = BookingRequest {
            lesson_type: LessonType::Conversation,
            duration: LessonDuration::Min90,
            starts_at,
            student_name: "Ada".to_string(),
            student_email: "ada@example.com".to_string(),
            locale: Locale::En,
            user_id: None,
        };
        assert_eq!(request.ends_at() - starts_at, Duration::minutes(90));
    }
}
