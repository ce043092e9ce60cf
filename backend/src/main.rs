use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use motorlot_backend::{
    config::Config,
    db::connection::{create_pool, DbPool},
    docs::ApiDoc,
    handlers,
    middleware as auth_middleware,
    state::AppState,
};

// Multipart bodies carry up to ten images of 5 MiB each.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motorlot_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        jwt_secret = %mask_secret(&config.jwt_secret),
        jwt_expiration_hours = config.jwt_expiration_hours,
        upload_root = %config.upload_root.display(),
        reset_token_ttl_minutes = config.reset_token_ttl_minutes,
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool: DbPool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&*pool).await?;

    let upload_root = config.upload_root.clone();
    let state = AppState::new(pool, config);

    // Build public routes (no auth)
    let public_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .route("/api/cars", get(handlers::cars::list_cars))
        .route("/api/cars/{id}", get(handlers::cars::car_details));

    // Build user-protected routes (auth required)
    let user_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth::auth,
        ));

    // Build admin-protected routes (auth + admin role)
    let admin_routes = Router::new()
        .route("/api/admin/cars", post(handlers::admin::create_car))
        .route(
            "/api/admin/cars/{id}",
            put(handlers::admin::update_car).delete(handlers::admin::delete_car),
        )
        .route(
            "/api/admin/cars/{id}/images",
            post(handlers::admin::upload_images),
        )
        .route(
            "/api/admin/cars/{id}/images/{image_id}",
            delete(handlers::admin::delete_image),
        )
        .route(
            "/api/admin/cars/{id}/images/{image_id}/primary",
            put(handlers::admin::set_primary_image),
        )
        .route("/api/admin/users", post(handlers::admin::register_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::auth::auth_admin,
        ));

    // Compose app with shared layers (CORS/Trace) and shared state
    let app = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/uploads", ServeDir::new(upload_root.join("uploads")))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS,
                        ])
                        .allow_headers(Any)
                        .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
                ),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
