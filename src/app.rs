use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::{AppConfig, ServerConfig};
use crate::database::AdminStore;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, timeout_as_json};

/// Everything a handler may touch. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AdminStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn AdminStore>) -> Self {
        let tokens = TokenService::from_config(&config.security);
        Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let server = &state.config.server;
    let timeout = Duration::from_secs(server.request_timeout_secs);
    let cors = cors_layer(server);
    let static_dir = server.static_dir.clone();

    let protected = protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    Router::new()
        .merge(public_routes())
        .merge(protected)
        .nest_service("/static", ServeDir::new(static_dir.join("static")))
        .route_service("/favicon.ico", ServeFile::new(static_dir.join("favicon.ico")))
        .route_service("/logo192.png", ServeFile::new(static_dir.join("logo192.png")))
        // Client-side routing of the frontend
        .fallback_service(ServeFile::new(static_dir.join("index.html")))
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(timeout_as_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(public::health))
        .route("/api/login.json", post(public::login_post))
}

fn protected_routes() -> Router<AppState> {
    use protected::{accounts, auth, datasets, memberships, tenants};

    Router::new()
        // Accounts
        .route("/api/accounts.json", get(accounts::list))
        .route("/api/add_account.json", post(accounts::add))
        .route("/api/del_account.json", post(accounts::delete))
        .route("/api/set_account_password.json", post(accounts::set_password))
        // Tenants
        .route("/api/tenants.json", get(tenants::list))
        .route("/api/add_tenant.json", post(tenants::add))
        // Datasets
        .route("/api/datasets.json", get(datasets::list))
        .route("/api/add_dataset.json", post(datasets::add))
        .route("/api/list_dataset_tenant.json", get(datasets::list_by_tenant))
        .route("/api/add_dataset_tenant.json", post(datasets::attach))
        .route("/api/del_dataset_tenant.json", post(datasets::detach))
        // Memberships
        .route("/api/list_tenant_account.json", get(memberships::list))
        .route("/api/list_tenant_account_by_account.json", get(memberships::list_by_account))
        .route("/api/list_tenant_account_by_tenant.json", get(memberships::list_by_tenant))
        .route("/api/add_tenant_account.json", post(memberships::add))
        .route("/api/del_tenant_account.json", post(memberships::delete))
        .route("/api/update_tenant_account_role.json", post(memberships::update_role))
        // Session
        .route("/api/whoami.json", get(auth::whoami))
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
}
