/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use todo_api::{app::{build_router, AppState}, config::Config};
/// use todo_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let state = AppState::new(Arc::new(MemoryStore::new()), Config::for_memory_store());
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use todo_shared::{auth::middleware::authenticate_headers, store::Store};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET    /health             # public
/// ├── POST   /auth/register      # public
/// ├── POST   /auth/login         # public
/// ├── POST   /auth/logout        # bearer
/// ├── GET    /user               # bearer
/// ├── GET    /todos              # bearer
/// ├── POST   /todos              # bearer
/// ├── GET    /todos/:id          # bearer
/// ├── PATCH  /todos/:id          # bearer
/// ├── PUT    /todos/:id          # bearer
/// └── DELETE /todos/:id          # bearer
/// ```
///
/// Bearer routes are wrapped in [`bearer_auth_layer`], so no handler runs for
/// an unauthenticated request.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(routes::auth::logout))
        .route("/user", get(routes::user::current_user))
        .route(
            "/todos",
            get(routes::todos::list_todos).post(routes::todos::create_todo),
        )
        .route(
            "/todos/:id",
            get(routes::todos::show_todo)
                .patch(routes::todos::update_todo)
                .put(routes::todos::update_todo)
                .delete(routes::todos::delete_todo),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_layer,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

/// CORS for the single-page front end
///
/// `*` outside production is fully permissive. In production, `*` allows any
/// origin without credentials, and an explicit list allows exactly those
/// origins.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() && !config.api.production {
        return CorsLayer::permissive();
    }

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600));

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    layer.allow_origin(origins).allow_credentials(true)
}

/// Bearer authentication middleware layer
///
/// Resolves `Authorization: Bearer <token>` to an `AuthContext` and inserts it
/// into request extensions. Any failure short of a store error is a 401.
async fn bearer_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate_headers(state.store.as_ref(), req.headers()).await?;

    tracing::debug!(user_id = %auth.user_id, "Authenticated request");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_builds_for_each_mode() {
        let mut config = Config::for_memory_store();
        let _ = cors_layer(&config);

        config.api.production = true;
        let _ = cors_layer(&config);

        config.api.cors_origins = vec!["https://app.example.com".to_string()];
        let _ = cors_layer(&config);
    }
}
