//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tutoring_core::domain::{
    Booking, BookingRequest, LessonDuration, LessonType, User, UserCredentials,
};
use tutoring_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: Some(self.email),
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct BookingRecord {
    id: Uuid,
    user_id: Option<Uuid>,
    lesson_type: String,
    duration_min: i32,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    student_name: String,
    student_email: String,
    amount_cents: i64,
    currency: String,
    checkout_session_id: Option<String>,
    meeting_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Maps the stored row back to the domain type. Unknown lesson types or
    /// durations mean the row predates the current catalogue and is treated
    /// as corrupt rather than silently coerced.
    fn to_domain(self) -> PortResult<Booking> {
        let lesson_type = LessonType::parse(&self.lesson_type).ok_or_else(|| {
            PortError::Unexpected(format!("unknown lesson type in row: {}", self.lesson_type))
        })?;
        let duration = LessonDuration::from_minutes(self.duration_min as u32).ok_or_else(|| {
            PortError::Unexpected(format!("unknown duration in row: {}", self.duration_min))
        })?;
        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            lesson_type,
            duration,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            student_name: self.student_name,
            student_email: self.student_email,
            amount_cents: self.amount_cents,
            currency: self.currency,
            checkout_session_id: self.checkout_session_id,
            meeting_url: self.meeting_url,
            created_at: self.created_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "id, user_id, lesson_type, duration_min, starts_at, ends_at, \
     student_name, student_email, amount_cents, currency, checkout_session_id, meeting_url, \
     created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                PortError::Conflict(format!("an account for {} already exists", email))
            }
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT id, name, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("No account for {}", email)),
            _ => unexpected(e),
        })?;

        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(|(user_id,)| user_id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn insert_paid_booking(
        &self,
        id: Uuid,
        request: &BookingRequest,
        amount_cents: i64,
        currency: &str,
        checkout_session_id: &str,
        meeting_url: &str,
    ) -> PortResult<Option<Booking>> {
        // ON CONFLICT DO NOTHING against the unique checkout-session index:
        // a redelivered webhook event inserts nothing and gets back None.
        let sql = format!(
            "INSERT INTO bookings (id, user_id, lesson_type, duration_min, starts_at, ends_at, \
             student_name, student_email, amount_cents, currency, checkout_session_id, meeting_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (checkout_session_id) WHERE checkout_session_id IS NOT NULL DO NOTHING \
             RETURNING {BOOKING_COLUMNS}"
        );
        let record = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(id)
            .bind(request.user_id)
            .bind(request.lesson_type.as_str())
            .bind(request.duration.minutes() as i32)
            .bind(request.starts_at)
            .bind(request.ends_at())
            .bind(&request.student_name)
            .bind(&request.student_email)
            .bind(amount_cents)
            .bind(currency)
            .bind(checkout_session_id)
            .bind(meeting_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        record.map(BookingRecord::to_domain).transpose()
    }

    async fn insert_trial_booking(&self, request: &BookingRequest) -> PortResult<Booking> {
        let sql = format!(
            "INSERT INTO bookings (id, user_id, lesson_type, duration_min, starts_at, ends_at, \
             student_name, student_email, amount_cents, currency) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9) \
             RETURNING {BOOKING_COLUMNS}"
        );
        let record = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(request.user_id)
            .bind(request.lesson_type.as_str())
            .bind(request.duration.minutes() as i32)
            .bind(request.starts_at)
            .bind(request.ends_at())
            .bind(&request.student_name)
            .bind(&request.student_email)
            .bind(tutoring_core::pricing::CURRENCY)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        record.to_domain()
    }

    async fn get_bookings_by_user(&self, user_id: Uuid) -> PortResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY starts_at DESC"
        );
        let records = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(BookingRecord::to_domain).collect()
    }

    async fn get_booking_by_checkout_session(
        &self,
        checkout_session_id: &str,
    ) -> PortResult<Option<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE checkout_session_id = $1"
        );
        let record = sqlx::query_as::<_, BookingRecord>(&sql)
            .bind(checkout_session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?;

        record.map(BookingRecord::to_domain).transpose()
    }
}
