//! crates/tutoring_core/src/pricing.rs
//!
//! The published lesson price table. Pricing is a pure lookup on
//! (lesson type, duration); nothing downstream is allowed to compute a
//! price any other way.

use crate::domain::{LessonDuration, LessonType};

/// The currency every price on the site is quoted in.
pub const CURRENCY: &str = "eur";

/// Returns the price in euro cents for one lesson of the given type and
/// duration, exactly as published on the pricing page.
pub fn price_cents(lesson_type: LessonType, duration: LessonDuration) -> i64 {
    match (lesson_type, duration) {
        (LessonType::GeneralEnglish, LessonDuration::Min45) => 2800,
        (LessonType::GeneralEnglish, LessonDuration::Min60) => 3500,
        (LessonType::GeneralEnglish, LessonDuration::Min90) => 5000,

        (LessonType::BusinessEnglish, LessonDuration::Min45) => 3400,
        (LessonType::BusinessEnglish, LessonDuration::Min60) => 4200,
        (LessonType::BusinessEnglish, LessonDuration::Min90) => 6000,

        (LessonType::ExamPrep, LessonDuration::Min45) => 3200,
        (LessonType::ExamPrep, LessonDuration::Min60) => 4000,
        (LessonType::ExamPrep, LessonDuration::Min90) => 5700,

        (LessonType::Conversation, LessonDuration::Min45) => 2400,
        (LessonType::Conversation, LessonDuration::Min60) => 3000,
        (LessonType::Conversation, LessonDuration::Min90) => 4300,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_table_matches_published_rates() {
        // One assertion per published cell. If marketing changes the page,
        // this table changes with it.
        let expected: [(LessonType, [i64; 3]); 4] = [
            (LessonType::GeneralEnglish, [2800, 3500, 5000]),
            (LessonType::BusinessEnglish, [3400, 4200, 6000]),
            (LessonType::ExamPrep, [3200, 4000, 5700]),
            (LessonType::Conversation, [2400, 3000, 4300]),
        ];

        for (lesson_type, prices) in expected {
            for (duration, expected_cents) in LessonDuration::ALL.into_iter().zip(prices) {
                assert_eq!(
                    price_cents(lesson_type, duration),
                    expected_cents,
                    "{} / {} min",
                    lesson_type.as_str(),
                    duration.minutes()
                );
            }
        }
    }

    #[test]
    fn every_combination_has_a_positive_price() {
        for lesson_type in LessonType::ALL {
            for duration in LessonDuration::ALL {
                assert!(price_cents(lesson_type, duration) > 0);
            }
        }
    }
}
