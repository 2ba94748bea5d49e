use axum::{
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::Json,
    routing::get,
    Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

mod codec;
mod confetti;
mod config;
mod errors;
mod generator;
mod handlers;
mod models;
mod sessions;
#[cfg(test)]
mod test_support;

use config::Config;
use generator::{GeminiGenerator, MessageGenerator};
use handlers::{sessions as session_routes, sharing, wish};
use sessions::SessionStore;

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionStore>,
    pub generator: Arc<dyn MessageGenerator>,
    pub limiter: Arc<DefaultDirectRateLimiter>,
}

impl AppState {
    pub fn new(config: Config, generator: Arc<dyn MessageGenerator>) -> Self {
        let per_minute = NonZeroU32::new(config.generations_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            sessions: Arc::new(SessionStore::new(config.session_ttl, config.max_sessions)),
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            generator,
            config: Arc::new(config),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("valentine_wish_backend=info,tower_http=info,info")),
        )
        .init();

    let config = Config::from_env();

    if config.gemini.api_key.is_none() {
        warn!("⚠️ No GEMINI_API_KEY set, AI suggestions will use the fallback message");
    }

    let generator = Arc::new(GeminiGenerator::new(&config.gemini)?);
    let state = AppState::new(config.clone(), generator);

    spawn_session_cleanup(Arc::clone(&state.sessions));

    let app = app(state).layer(build_cors(&config));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server starting on http://{}", addr);
    info!("🔗 Share links point at {}{}", config.public_origin, config.share_path);

    axum::serve(listener, app).await?;

    Ok(())
}

/// All routes with tracing, minus CORS (which depends on deployment).
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/wish", wish::router())
        .nest("/api/sessions", session_routes::router())
        .merge(sharing::router(&state.config.share_path));

    if let Some(dir) = &state.config.static_dir {
        info!("📁 Serving static assets from {}", dir.display());
        router = router.nest_service("/assets", ServeDir::new(dir));
    }

    router
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors(config: &Config) -> CorsLayer {
    let cors = if config.debug_mode {
        info!("🔓 Development mode: Using permissive CORS");
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("⚠️ Ignoring invalid origin '{}': {}", origin, e);
                    None
                }
            })
            .collect();

        info!("🔒 CORS configured for origins: {}", config.allowed_origins.join(","));
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([
        axum::http::header::CONTENT_TYPE,
        axum::http::header::ACCEPT,
        axum::http::header::ORIGIN,
    ])
}

fn spawn_session_cleanup(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_CLEANUP_INTERVAL);
        loop {
            ticker.tick().await;
            sessions.cleanup_expired();
        }
    });
}

async fn health_check(State(state): State<AppState>) -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "service": "valentine-wish-backend",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "active_sessions": state.sessions.len(),
        "endpoints": {
            "wish": "/api/wish",
            "sessions": "/api/sessions",
            "health": "/api/health"
        }
    })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{send, test_app};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn health_reports_sessions() {
        let app = test_app();
        send(&app, Method::POST, "/api/sessions", None).await;

        let (status, body) = send(&app, Method::GET, "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["active_sessions"], 1);
    }

    #[tokio::test]
    async fn lists_tones() {
        let app = test_app();
        let (_, body) = send(&app, Method::GET, "/api/wish/tones", None).await;
        assert_eq!(
            body,
            serde_json::json!(["Romantic", "Funny", "Poetic", "Casual"])
        );
    }
}
