//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, HttpMailer, SanityStore, StripeGateway},
    config::Config,
    error::ApiError,
    web::{
        auth::{login_handler, logout_handler, signup_handler},
        checkout_status_handler, contact_handler, create_booking_handler, create_checkout_handler,
        list_bookings_handler, list_testimonials_handler, me_handler, payment_webhook_handler,
        require_auth,
        rest::{health_handler, ApiDoc},
        state::AppState,
        submit_testimonial_handler,
    },
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let http_client = reqwest::Client::new();

    let payment_adapter = Arc::new(StripeGateway::new(
        http_client.clone(),
        config.stripe_secret_key.clone(),
        config.stripe_api_base.clone(),
        config.checkout_success_url.clone(),
        config.checkout_cancel_url.clone(),
    ));

    let mailer_adapter = Arc::new(HttpMailer::new(
        http_client.clone(),
        config.email_api_url.clone(),
        config.email_api_key.clone(),
        config.email_from.clone(),
    ));

    let content_adapter = Arc::new(SanityStore::new(
        http_client,
        config.cms_api_base.clone(),
        config.cms_dataset.clone(),
        config.cms_token.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        db: db_adapter,
        payments: payment_adapter,
        mailer: mailer_adapter,
        content: content_adapter,
        config: config.clone(),
    });

    let cors_origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/contact", post(contact_handler))
        .route(
            "/testimonials",
            get(list_testimonials_handler).post(submit_testimonial_handler),
        )
        .route("/checkout/sessions", post(create_checkout_handler))
        .route("/checkout/sessions/{session_id}", get(checkout_status_handler))
        .route("/webhooks/payment", post(payment_webhook_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route(
            "/bookings",
            get(list_bookings_handler).post(create_booking_handler),
        )
        .route("/me", get(me_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
