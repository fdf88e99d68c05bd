//! Router assembly.
//!
//! Reads are public. Catalog writes and account management sit behind
//! [`session_auth`] followed by [`require_admin`]. `/logout` needs only a
//! session.

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::middleware as axum_mw;
use axum::Router;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::middleware::{require_admin, session_auth};
use crate::routes;
use crate::state::AppState;

/// Maximum in-flight requests across the password-hashing routes combined.
const CREDENTIAL_CONCURRENCY: usize = 16;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_origin: Option<&str>) -> Router {
    let admin_routes = Router::new()
        .merge(routes::acts::admin_router())
        .merge(routes::groups::admin_router())
        .merge(routes::sections::admin_router())
        .merge(routes::accounts::admin_router())
        .route_layer(axum_mw::from_fn(require_admin))
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&state),
            session_auth,
        ));

    let session_routes = routes::accounts::session_router().route_layer(
        axum_mw::from_fn_with_state(Arc::clone(&state), session_auth),
    );

    let credential_routes =
        share_concurrency_limit(routes::accounts::router(), CREDENTIAL_CONCURRENCY);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::acts::router())
        .merge(routes::groups::router())
        .merge(routes::sections::router())
        .merge(routes::search::router())
        .merge(credential_routes)
        .merge(session_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

/// Put every route of `router` under one in-flight budget.
///
/// `Router::layer` clones the layer for each route. All clones of a
/// `GlobalConcurrencyLimitLayer` draw on the same semaphore.
fn share_concurrency_limit<S>(router: Router<S>, limit: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(GlobalConcurrencyLimitLayer::new(limit))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let allow_origin = match origin.map(HeaderValue::from_str) {
        None => AllowOrigin::from(Any),
        Some(Ok(value)) => AllowOrigin::exact(value),
        Some(Err(e)) => {
            warn!(error = %e, "invalid KAYDA_CORS_ORIGIN, allowing any origin");
            AllowOrigin::from(Any)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
