//! Scoped ownership of a running engine.
//!
//! A [`Lifespan`] exists only while the engine is started. Calling
//! [`Lifespan::stop`] consumes it; if it is dropped instead (cancelled serve
//! future, panic in a later startup step) the stop is spawned onto the runtime
//! so the engine is still released exactly once.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::engine::{EngineConnector, EngineError};

/// Errors raised while starting or stopping the engine.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("engine startup failed: {0}")]
    Startup(#[source] EngineError),

    #[error("engine shutdown failed: {0}")]
    Shutdown(#[source] EngineError),

    #[error("engine did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

/// Guard over a started engine connector.
pub struct Lifespan {
    connector: Option<Arc<dyn EngineConnector>>,
    shutdown_timeout: Option<Duration>,
}

impl Lifespan {
    /// Start the connector. On failure nothing is held and `stop` is never called.
    pub async fn start(
        connector: Arc<dyn EngineConnector>,
        shutdown_timeout: Option<Duration>,
    ) -> Result<Self, LifecycleError> {
        tracing::info!(model = %connector.model_id(), "Starting engine");
        connector.start().await.map_err(LifecycleError::Startup)?;
        tracing::info!(model = %connector.model_id(), "Engine started");

        Ok(Self {
            connector: Some(connector),
            shutdown_timeout,
        })
    }

    /// The started connector.
    pub fn connector(&self) -> Option<&Arc<dyn EngineConnector>> {
        self.connector.as_ref()
    }

    /// Stop the connector, honouring the shutdown deadline if one is set.
    pub async fn stop(mut self) -> Result<(), LifecycleError> {
        let Some(connector) = self.connector.take() else {
            return Ok(());
        };

        tracing::info!(model = %connector.model_id(), "Stopping engine");
        let outcome = match self.shutdown_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, connector.stop()).await {
                Ok(result) => result.map_err(LifecycleError::Shutdown),
                Err(_) => Err(LifecycleError::ShutdownTimeout(deadline)),
            },
            None => connector.stop().await.map_err(LifecycleError::Shutdown),
        };

        match &outcome {
            Ok(()) => tracing::info!(model = %connector.model_id(), "Engine stopped"),
            Err(e) => tracing::error!(model = %connector.model_id(), error = %e, "Engine stop failed"),
        }
        outcome
    }
}

impl Drop for Lifespan {
    fn drop(&mut self) {
        let Some(connector) = self.connector.take() else {
            return;
        };

        tracing::warn!(
            model = %connector.model_id(),
            "Lifespan dropped without an orderly stop, stopping engine in background"
        );
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = connector.stop().await {
                        tracing::error!(error = %e, "Background engine stop failed");
                    }
                });
            }
            Err(_) => {
                tracing::error!("No runtime available, engine was not stopped");
            }
        }
    }
}
