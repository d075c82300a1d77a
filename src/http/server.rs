//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compose the application: supplied routes, context, middleware
//! - Register error responders (token validation errors render themselves)
//! - Apply the cross-origin policy
//! - Tie the engine lifecycle to the serving loop

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, middleware, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{validation::validate_config, ConfigError, ServeConfig};
use crate::engine::EngineConnector;
use crate::http::cors::cors_layer;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::{map_errors, token_validation_response, ErrorHandlers, ErrorKind};
use crate::http::state::AppContext;
use crate::lifecycle::{Lifespan, LifecycleError, Phase};
use crate::observability::metrics;

/// Errors returned by [`App::serve`].
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A configured, not yet running, server instance.
pub struct App {
    router: Router,
    context: AppContext,
    connector: Arc<dyn EngineConnector>,
    shutdown_timeout: Option<Duration>,
}

/// Assemble a server instance around an engine connector and a route table.
///
/// Nothing is started here: the connector's `start` runs inside [`App::serve`].
/// `config` is validated first, so configs built in code get the same checks
/// as ones loaded from a file.
pub fn create_app(
    connector: Arc<dyn EngineConnector>,
    routes: Router<AppContext>,
    config: &ServeConfig,
) -> Result<App, ConfigError> {
    validate_config(config).map_err(ConfigError::Validation)?;
    if config.cors.is_wide_open() {
        tracing::warn!(
            "CORS allows credentialed requests from any origin; restrict cors.allowed_origins in production"
        );
    }

    let handlers =
        ErrorHandlers::new().register(ErrorKind::TokenValidation, token_validation_response);
    let context = AppContext::new();
    let router = build_router(routes, context.clone(), handlers, config)?;

    let shutdown_timeout = match config.lifecycle.shutdown_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    Ok(App {
        router,
        context,
        connector,
        shutdown_timeout,
    })
}

fn make_span(request: &Request<Body>) -> tracing::Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request.request_id(),
    )
}

/// Mount the routes and wrap them in the middleware stack.
///
/// Outermost first: CORS, request ID, tracing, timeout, metrics, error mapping.
#[allow(deprecated)]
fn build_router(
    routes: Router<AppContext>,
    context: AppContext,
    handlers: ErrorHandlers,
    config: &ServeConfig,
) -> Result<Router, ConfigError> {
    let cors = cors_layer(&config.cors).map_err(|e| ConfigError::Validation(vec![e]))?;

    Ok(routes
        .layer(middleware::from_fn_with_state(Arc::new(handlers), map_errors))
        .layer(middleware::from_fn(metrics::track_metrics))
        .with_state(context)
        .layer(TimeoutLayer::new(Duration::from_secs(config.listener.request_timeout_secs)))
        .layer(TraceLayer::new_for_http().make_span_with(make_span))
        .layer(propagate_request_id_layer())
        .layer(set_request_id_layer())
        .layer(cors))
}

impl App {
    /// The context handed to every handler.
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Run the full lifecycle on `listener` until `signal` resolves.
    ///
    /// The engine is started before the first connection is accepted and
    /// stopped once after in-flight requests have drained. If the engine fails
    /// to start, nothing is served.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let App {
            router,
            context,
            connector,
            shutdown_timeout,
        } = self;
        let phase = context.phase().clone();

        phase.advance(Phase::Starting);
        let _teardown = Teardown {
            context: context.clone(),
        };
        let lifespan = match Lifespan::start(connector, shutdown_timeout).await {
            Ok(lifespan) => lifespan,
            Err(e) => {
                tracing::error!(error = %e, "Startup aborted, no requests will be served");
                phase.advance(Phase::Stopped);
                return Err(e.into());
            }
        };

        if let Some(connector) = lifespan.connector() {
            context.publish(Arc::clone(connector));
        }
        phase.advance(Phase::Serving);

        let served = accept_until(listener, router, signal).await;

        phase.advance(Phase::Stopping);
        context.retract();
        let stopped = lifespan.stop().await;
        phase.advance(Phase::Stopped);

        match (served, stopped) {
            (Ok(()), Ok(())) => {
                tracing::info!("HTTP server stopped");
                Ok(())
            }
            (Ok(()), Err(e)) => Err(e.into()),
            (Err(e), _) => {
                tracing::error!(error = %e, "HTTP server failed");
                Err(e.into())
            }
        }
    }
}

/// Retracts the connector and finishes the phase machine if `serve` is
/// dropped mid-flight. The engine itself is released by the dropped [`Lifespan`].
struct Teardown {
    context: AppContext,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        let phase = self.context.phase();
        if phase.current() == Phase::Stopped {
            return;
        }

        tracing::warn!(phase = %phase.current(), "Serve dropped before shutdown completed");
        self.context.retract();
        if phase.current() == Phase::Serving {
            phase.advance(Phase::Stopping);
        }
        phase.advance(Phase::Stopped);
    }
}

async fn accept_until<F>(listener: TcpListener, router: Router, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "HTTP server accepting connections");

    axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .await
}
