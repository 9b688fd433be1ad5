// Router assembly and shared request state
use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use mockable::{Clock, DefaultClock};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{JwtError, JwtKeys};
use crate::config::AppConfig;
use crate::database::{DbContext, Storage};
use crate::handlers;
use crate::middleware::jwt_auth_middleware;
use crate::observer::ObserverPipeline;
use crate::services::{LogMailer, Mailer};

/// Handles shared by every request. Each request builds its own
/// `DbContext` from these.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn Storage>,
    pub pipeline: Arc<ObserverPipeline>,
    pub jwt: JwtKeys,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn Storage>) -> Result<Self, JwtError> {
        let jwt = JwtKeys::from_config(&config.jwt)?;
        let mailer = Arc::new(LogMailer::new(config.registration.confirmation_url.clone()));

        Ok(Self {
            config: Arc::new(config),
            storage,
            pipeline: Arc::new(ObserverPipeline::with_defaults(Arc::new(DefaultClock))),
            jwt,
            mailer,
        })
    }

    /// Replace the clock used to stamp audit fields and registration expiry
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.pipeline = Arc::new(ObserverPipeline::with_defaults(clock));
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// A fresh unit of work for one request
    pub fn db(&self) -> DbContext {
        DbContext::new(self.storage.clone(), self.pipeline.clone())
    }
}

pub fn app(state: AppState) -> Router {
    let request_logging = state.config.api.enable_request_logging;
    let cors = cors_layer(&state.config.security.cors_origins);

    let router = Router::new()
        // Public
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .with_state(state)
        .layer(cors);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/register/confirm", post(auth::confirm))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{article, user};

    Router::new()
        .route("/api/user", post(user::create))
        .route("/api/user/me", get(user::me))
        .route("/api/user/id/:id", get(user::get_by_id))
        .route("/api/user/email/:email", get(user::get_by_email))
        .route("/api/user/:id", put(user::update))
        .route("/api/article", post(article::create))
        .route(
            "/api/article/:id",
            get(article::get).put(article::update).delete(article::delete),
        )
        .route("/api/article/user/:user_id/all", get(article::list_by_owner))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
