//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for user signup, login, and logout.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use tutoring_core::ports::PortError;
use tutoring_core::validation::is_valid_email;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::state::AppState;

const SESSION_DAYS: i64 = 30;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

fn session_cookie(session_id: &str, max_age_seconds: i64) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        session_id, max_age_seconds
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create a new user account
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "An account with that email already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate input
    if req.name.trim().is_empty() || !is_valid_email(&req.email) {
        return Err((StatusCode::BAD_REQUEST, "Invalid name or email".to_string()));
    }
    if req.password.len() < 8 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password must be at least 8 characters".to_string(),
        ));
    }

    // 2. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })?
        .to_string();

    // 3. Create user in database
    let user = state
        .db
        .create_user(req.name.trim(), req.email.trim(), &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => (
                StatusCode::CONFLICT,
                "An account with that email already exists".to_string(),
            ),
            other => {
                error!("Failed to create user: {:?}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create user".to_string())
            }
        })?;

    // 4. Create auth session in database
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);
    state
        .db
        .create_auth_session(&auth_session_id, user.id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
        })?;

    // 5. Return response with session cookie
    let cookie = session_cookie(&auth_session_id, Duration::days(SESSION_DAYS).num_seconds());
    let response = AuthResponse {
        user_id: user.id,
        name: user.name,
        email: user.email.unwrap_or_default(),
    };

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Get user by email
    let user_creds = state
        .db
        .get_user_by_email(req.email.trim())
        .await
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()))?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.password_hash).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()));
    }

    // 3. Create auth session in database
    let auth_session_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_DAYS);
    state
        .db
        .create_auth_session(&auth_session_id, user_creds.id, expires_at)
        .await
        .map_err(|e| {
            error!("Failed to create auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session".to_string())
        })?;

    // 4. Return response with session cookie
    let cookie = session_cookie(&auth_session_id, Duration::days(SESSION_DAYS).num_seconds());
    let response = AuthResponse {
        user_id: user_creds.id,
        name: user_creds.name,
        email: user_creds.email,
    };

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Extract session cookie
    let cookie_header = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 2. Parse session ID from cookie
    let auth_session_id = crate::web::middleware::session_id_from_cookies(cookie_header)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    // 3. Delete auth session from database
    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
        })?;

    // 4. Clear cookie
    let cookie = session_cookie("", 0);

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}
