//! Application startup and lifecycle management.

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::error::AppError;
use crate::handlers;
use crate::services::{
    DeviceStore, FcmProvider, MemoryDeviceStore, MockPushProvider, PushProvider, RtdbStore,
    TokenSource,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DeviceStore>,
    pub push: Arc<dyn PushProvider>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::api_root))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/requestChildData", post(handlers::request_child_data))
        .route(
            "/checkInternetStatus",
            post(handlers::check_internet_status),
        )
        .route(
            "/updateInternetStatus",
            post(handlers::update_internet_status),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build with collaborators chosen from configuration: the Firebase
    /// store and FCM provider when enabled, in-memory fallbacks otherwise.
    pub async fn build(config: RelayConfig) -> Result<Self, AppError> {
        let (store, push): (Arc<dyn DeviceStore>, Arc<dyn PushProvider>) =
            if config.firebase.enabled {
                let key = config.firebase.credentials.clone().ok_or_else(|| {
                    AppError::Config(anyhow::anyhow!(
                        "Firebase is enabled but no service account key was loaded"
                    ))
                })?;
                let project_id = key.project_id.clone();
                let auth = Arc::new(TokenSource::new(key).map_err(|e| {
                    AppError::Config(anyhow::anyhow!("failed to build token source: {}", e))
                })?);

                tracing::info!(project_id = %project_id, "Firebase store and FCM provider initialized");
                (
                    Arc::new(RtdbStore::new(&config.firebase.database_url, auth.clone()))
                        as Arc<dyn DeviceStore>,
                    Arc::new(FcmProvider::new(project_id, auth)) as Arc<dyn PushProvider>,
                )
            } else {
                tracing::info!("Firebase disabled, using in-memory store and mock push provider");
                (
                    Arc::new(MemoryDeviceStore::default()) as Arc<dyn DeviceStore>,
                    Arc::new(MockPushProvider::default()) as Arc<dyn PushProvider>,
                )
            };

        Self::build_with(config, store, push).await
    }

    /// Build with explicit collaborators. Tests use this to inject the
    /// in-memory store and mock provider while keeping handles to them.
    pub async fn build_with(
        config: RelayConfig,
        store: Arc<dyn DeviceStore>,
        push: Arc<dyn PushProvider>,
    ) -> Result<Self, AppError> {
        // Port 0 means a random port, used by the test harness.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Relay service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state: AppState { store, push },
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);
        axum::serve(self.listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(MemoryDeviceStore::default()),
            push: Arc::new(MockPushProvider::default()),
        }
    }

    #[tokio::test]
    async fn root_route_serves_banner() {
        let app = build_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
