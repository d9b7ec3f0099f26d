//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the infrastructure handlers
//! - Wire up the observability pipeline around every route and the fallback
//! - Bind server to listener with peer-address connect info
//! - Flip readiness and drain on shutdown

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;
use tower_http::timeout::TimeoutLayer;

use crate::config::{ServiceConfig, ServiceInfo};
use crate::health::{AvailabilityChange, AvailabilityEvents, Liveness, Readiness, ReadinessState};
use crate::http::handlers;
use crate::http::middleware::{observe_middleware, recovery_layer, RequestObserver};
use crate::http::request::request_id_middleware;
use crate::lifecycle::Shutdown;
use crate::observability::access_log::{AccessLogSink, AccessLogger, TracingSink};
use crate::observability::metrics::{MetricsError, MetricsRegistry};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Metrics(#[from] MetricsError),

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),

    #[error("in-flight requests did not drain within {0:?}")]
    ShutdownTimeout(Duration),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ServiceInfo>,
    pub metrics: Arc<MetricsRegistry>,
    pub readiness: Arc<Readiness>,
    pub liveness: Arc<Liveness>,
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    config: Arc<ServiceConfig>,
    metrics: Arc<MetricsRegistry>,
    events: AvailabilityEvents,
}

impl HttpServer {
    /// Create a server that writes access logs through `tracing`.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    /// Create a server with a custom access log destination.
    pub fn with_sink(config: ServiceConfig, sink: Arc<dyn AccessLogSink>) -> Result<Self, ServerError> {
        let metrics = Arc::new(MetricsRegistry::new(&config.service)?);
        let events = AvailabilityEvents::default();

        let state = AppState {
            service: Arc::new(config.service.clone()),
            metrics: metrics.clone(),
            readiness: events.readiness().clone(),
            liveness: events.liveness().clone(),
        };
        let observer = Arc::new(RequestObserver::new(
            metrics.clone(),
            AccessLogger::new(&config.service, sink),
        ));

        let router = Self::build_router(state, observer, config.timeouts.request());
        Ok(Self {
            router,
            config: Arc::new(config),
            metrics,
            events,
        })
    }

    /// The request timeout is a transport concern layered under the
    /// pipeline, so a 408 is still observed.
    #[allow(deprecated)]
    fn build_router(state: AppState, observer: Arc<RequestObserver>, request_timeout: Duration) -> Router {
        let routes = Router::new()
            .route(handlers::ROOT_PATH, get(handlers::root))
            .route(handlers::LIVENESS_PATH, get(handlers::liveness))
            .route(handlers::READINESS_PATH, get(handlers::readiness))
            .route(handlers::INFO_PATH, get(handlers::info))
            .route(handlers::METRICS_PATH, get(handlers::metrics))
            .fallback(handlers::not_found)
            .with_state(state)
            .layer(TimeoutLayer::new(request_timeout));

        instrument(routes, observer)
    }

    /// The fully layered router, for in-process serving.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Availability feed consulted by `/health` and `/ready`.
    pub fn events(&self) -> &AvailabilityEvents {
        &self.events
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serve on `listener` until `signal` resolves, then refuse traffic and
    /// drain within `timeouts.shutdown_secs`.
    pub async fn run<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            version = %self.config.service.version,
            "starting_server"
        );

        let shutdown = Shutdown::new();
        let drained = shutdown.triggered();
        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app).with_graceful_shutdown(drained).await
        });

        tokio::select! {
            joined = &mut server => {
                // Only reachable if serving failed before any shutdown signal.
                return joined?.map_err(ServerError::from);
            }
            _ = signal => {}
        }

        self.events
            .publish(AvailabilityChange::Readiness(ReadinessState::RefusingTraffic));
        shutdown.trigger();

        let deadline = self.config.timeouts.shutdown();
        match tokio::time::timeout(deadline, &mut server).await {
            Ok(joined) => joined??,
            Err(_) => {
                server.abort();
                tracing::error!(deadline = ?deadline, "server_forced_shutdown");
                return Err(ServerError::ShutdownTimeout(deadline));
            }
        }

        tracing::info!("server_shutdown_complete");
        Ok(())
    }
}

/// Wrap `router` in the observability pipeline.
///
/// Outermost first: correlation id, panic recovery, observe (timing,
/// metrics, access log). Apply after all routes, the fallback and any
/// transport layers (timeouts) have been added.
pub fn instrument(router: Router, observer: Arc<RequestObserver>) -> Router {
    router
        .layer(middleware::from_fn_with_state(observer, observe_middleware))
        .layer(recovery_layer())
        .layer(middleware::from_fn(request_id_middleware))
}
