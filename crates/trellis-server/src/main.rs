//! Reference server: every request falls through to the file-based
//! resolver, plus a couple of diagnostic endpoints under `/__trellis/`.
//!
//! The server returns a matched handler file's contents as the response
//! body and exposes bound parameters as `x-trellis-param-*` headers. A
//! real deployment would execute the handler instead; this binary exists
//! to exercise the resolver end to end.

use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderValue, Method as HttpMethod, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use trellis_router::{RouteRequest, Router as RouteEngine, RouterConfig};

struct AppState {
    engine: RouteEngine,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config_path = std::env::var("TRELLIS_CONFIG").ok().map(PathBuf::from);
    let config = RouterConfig::load(config_path.as_deref());
    info!(
        routes_dir = %config.routes_dir.display(),
        use_cache = config.use_cache,
        "starting trellis server"
    );

    let engine = RouteEngine::new(config)?;
    let state = Arc::new(AppState { engine });

    let app = Router::new()
        .route("/__trellis/routes", get(routes_handler))
        .route("/__trellis/cache", get(cache_handler))
        .fallback(resolve_handler)
        .with_state(state);

    let addr = std::env::var("TRELLIS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}

async fn routes_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.engine.list_routes())
}

async fn cache_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.engine.cache_info()).into_response()
}

async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    method: HttpMethod,
    uri: Uri,
) -> Response {
    let Some(request) = RouteRequest::parse(method.as_str(), uri.path()) else {
        return not_found();
    };

    let found = match state.engine.resolve(&request) {
        Ok(found) => found,
        Err(err) => {
            error!(%err, "route resolution failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let Some(found) = found else {
        return not_found();
    };

    let body = match tokio::fs::read(&found.handler_path).await {
        Ok(body) => body,
        Err(err) => {
            error!(path = %found.handler_path.display(), %err, "handler file unreadable");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut response = Response::new(body.into());
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    for (name, value) in &found.params {
        let header_name = format!("x-trellis-param-{name}");
        if let (Ok(name), Ok(value)) = (
            header_name.parse::<header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
    response
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}
