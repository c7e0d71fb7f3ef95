use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware as axum_middleware;
use axum::routing::{delete, get, put};
use axum::Router;
use persistence::store::Store;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::metrics::{metrics_handler, metrics_middleware};
use crate::middleware::security_headers::security_headers_middleware;
use crate::middleware::trace_id::trace_id_middleware;
use crate::middleware::user_auth::{require_admin, require_staff};
use crate::routes;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<Config>,
}

/// Builds the full router. Three groups: public endpoints, staff
/// endpoints behind token auth, and admin endpoints behind token auth
/// plus the role gate.
pub fn create_app(config: Arc<Config>, store: Store) -> Router {
    let state = AppState {
        store,
        config: config.clone(),
    };

    let cors = build_cors(&config);

    let public_routes = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/health/live", get(routes::health::liveness))
        .route("/api/health/ready", get(routes::health::readiness))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/login", axum::routing::post(routes::auth::login))
        .route(
            "/api/v1/auth/refresh",
            axum::routing::post(routes::auth::refresh),
        );

    let staff_routes = Router::new()
        .route("/api/v1/auth/me", get(routes::auth::me))
        .route(
            "/api/v1/orders",
            get(routes::orders::list_orders).post(routes::orders::create_order),
        )
        .route(
            "/api/v1/orders/:id",
            get(routes::orders::get_order).put(routes::orders::update_order),
        )
        .route("/api/v1/orders/:id/status", put(routes::orders::change_status))
        .route("/api/v1/orders/:id/history", get(routes::orders::order_history))
        .route("/api/v1/dashboard/stats", get(routes::dashboard::stats))
        .route(
            "/api/v1/orders/:id/messages",
            get(routes::chat::list_messages).post(routes::chat::post_message),
        )
        .route(
            "/api/v1/messages/:id",
            put(routes::chat::update_message).delete(routes::chat::delete_message),
        )
        .route(
            "/api/v1/orders/:id/files",
            get(routes::files::list_order_files).post(routes::files::upload_order_file),
        )
        .route(
            "/api/v1/files",
            get(routes::files::list_general_files).post(routes::files::upload_general_file),
        )
        .route(
            "/api/v1/files/:id",
            get(routes::files::download_file).delete(routes::files::delete_file),
        )
        .route(
            "/api/v1/orders/:id/follow",
            put(routes::followers::follow_order).delete(routes::followers::unfollow_order),
        )
        .route(
            "/api/v1/orders/:id/follow/notifications",
            put(routes::followers::toggle_notifications),
        )
        .route(
            "/api/v1/orders/:id/followers",
            get(routes::followers::list_followers),
        )
        .route(
            "/api/v1/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/v1/notifications/read-all",
            put(routes::notifications::mark_all_read),
        )
        .route(
            "/api/v1/notifications/:id/read",
            put(routes::notifications::mark_read),
        )
        .route(
            "/api/v1/notifications/:id",
            delete(routes::notifications::delete_notification),
        )
        .route("/api/v1/clients", get(routes::clients::list_clients))
        .route("/api/v1/statuses", get(routes::statuses::list_statuses))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_staff,
        ));

    // Admin gate runs after the staff gate has loaded the account.
    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/clients",
            axum::routing::post(routes::clients::create_client),
        )
        .route(
            "/api/v1/admin/clients/:id",
            put(routes::clients::update_client).delete(routes::clients::deactivate_client),
        )
        .route(
            "/api/v1/admin/statuses",
            axum::routing::post(routes::statuses::create_status),
        )
        .route(
            "/api/v1/admin/statuses/:id",
            put(routes::statuses::update_status).delete(routes::statuses::deactivate_status),
        )
        .route(
            "/api/v1/admin/users",
            get(routes::admin_users::list_users).post(routes::admin_users::create_user),
        )
        .route(
            "/api/v1/admin/users/:id",
            put(routes::admin_users::update_user),
        )
        .route(
            "/api/v1/admin/users/:id/password",
            put(routes::admin_users::rotate_password),
        )
        .route_layer(axum_middleware::from_fn(require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_staff,
        ));

    Router::new()
        .merge(public_routes)
        .merge(staff_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(trace_id_middleware))
        .layer(cors)
        .with_state(state)
}

fn build_cors(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
    }
}
