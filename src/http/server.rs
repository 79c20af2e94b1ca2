//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single dispatching fallback handler
//! - Wire up middleware (tracing, timeout, request ID, panic recovery)
//! - Bind server to listener and shut down gracefully
//! - Swap in new route tables when the configuration changes
//! - Observability (metrics, request IDs in logs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ConfigError, RouterConfig};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response;
use crate::http::table::RouteTable;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::Resolution;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ArcSwap<RouteTable>>,
}

/// HTTP server dispatching every request through the route table.
pub struct HttpServer {
    router: Router,
    routes: Arc<ArcSwap<RouteTable>>,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a new HTTP server, compiling the configured routes.
    pub fn new(config: RouterConfig) -> Result<Self, ConfigError> {
        let table = config.compile()?;
        metrics::record_route_count(table.route_count());

        let routes = Arc::new(ArcSwap::from_pointee(table));
        let state = AppState {
            routes: routes.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            routes,
            config,
        })
    }

    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        let dispatch = Router::new().fallback(dispatch_handler).with_state(state);
        with_layers(
            dispatch,
            Duration::from_secs(config.listener.request_timeout_secs),
        )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations received on `config_updates` replace the route table;
    /// the listener settings of a reloaded configuration are ignored.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.load().route_count(),
            "HTTP server starting"
        );

        let routes = self.routes.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                if let Err(e) = reload(&routes, &config) {
                    tracing::error!(error = %e, "Rejected new routes, keeping current table");
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Handle to the live route table.
    pub fn routes(&self) -> Arc<ArcSwap<RouteTable>> {
        self.routes.clone()
    }

    /// Get a reference to the config the server was started with.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

/// Wrap `router` in the middleware stack. A panicking endpoint answers 500
/// and the connection stays usable.
#[allow(deprecated)]
fn with_layers(router: Router, timeout: Duration) -> Router {
    router
        .layer(CatchPanicLayer::custom(response::panic_response))
        .layer(TimeoutLayer::new(timeout))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

/// Compile `config` and publish it. Requests already dispatched keep the
/// table they loaded.
pub fn reload(routes: &ArcSwap<RouteTable>, config: &RouterConfig) -> Result<(), ConfigError> {
    let table = match config.compile() {
        Ok(table) => table,
        Err(e) => {
            metrics::record_reload(false);
            return Err(e);
        }
    };

    let count = table.route_count();
    routes.store(Arc::new(table));
    metrics::record_reload(true);
    metrics::record_route_count(count);
    tracing::info!(routes = count, "Route table reloaded");
    Ok(())
}

/// Resolve every request against the current route table.
async fn dispatch_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start = Instant::now();
    let table = state.routes.load_full();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request.request_id().unwrap_or("unknown").to_owned();

    let resolution = table.resolve(&method, &path);
    let outcome = resolution.outcome();

    let response = match resolution {
        Resolution::Found(found) => {
            tracing::debug!(
                request_id = %request_id,
                route = %found.handler.name,
                pattern = %found.pattern,
                "Route matched"
            );
            let target = Arc::clone(found.handler);
            request
                .extensions_mut()
                .insert(found.params.to_owned_params());
            target.respond(request).await
        }
        Resolution::Redirect { location, status } => {
            tracing::debug!(
                request_id = %request_id,
                path = %path,
                location = %location,
                status = status.as_u16(),
                "Redirecting"
            );
            response::redirect(status, &location, request.uri().query())
        }
        Resolution::MethodNotAllowed { allowed } => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Method not allowed"
            );
            response::method_not_allowed(&allowed)
        }
        Resolution::NotFound => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "No route matched"
            );
            response::not_found()
        }
    };

    metrics::record_dispatch(method.as_str(), outcome, start.elapsed());
    response
}
