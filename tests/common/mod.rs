//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use futures_util::future::{BoxFuture, FutureExt};
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use mlc_serve::config::{EngineConfig, ServeConfig};
use mlc_serve::engine::{
    EchoConnector, EngineConnector, EngineError, GenerationOutput, GenerationRequest,
};
use mlc_serve::lifecycle::Phase;
use mlc_serve::{create_app, AppContext, ServeError, Shutdown};

/// Ordered record of lifecycle and request events.
pub type EventLog = Arc<Mutex<Vec<&'static str>>>;

/// Connector that records its lifecycle calls and can be told to misbehave.
#[derive(Default)]
#[allow(dead_code)]
pub struct RecordingConnector {
    pub events: EventLog,
    pub start_gate: Option<Arc<Notify>>,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub stop_delay: Option<Duration>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
}

#[allow(dead_code)]
impl RecordingConnector {
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl EngineConnector for RecordingConnector {
    fn start(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        async move {
            if let Some(gate) = &self.start_gate {
                gate.notified().await;
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("start");
            if self.fail_start {
                Err(EngineError::Start("model weights missing".into()))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn stop(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        async move {
            if let Some(delay) = self.stop_delay {
                tokio::time::sleep(delay).await;
            }
            self.stops.fetch_add(1, Ordering::SeqCst);
            self.events.lock().unwrap().push("stop");
            if self.fail_stop {
                Err(EngineError::Stop("device still busy".into()))
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    fn model_id(&self) -> &str {
        "recording"
    }

    fn generate(
        &self,
        _request: GenerationRequest,
    ) -> BoxFuture<'_, Result<GenerationOutput, EngineError>> {
        async move { Err(EngineError::Generation("recording connector cannot generate".into())) }
            .boxed()
    }
}

/// A server running on an ephemeral port.
#[allow(dead_code)]
pub struct RunningApp {
    pub addr: SocketAddr,
    pub context: AppContext,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServeError>>,
}

#[allow(dead_code)]
impl RunningApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Wait until the server is serving; panics if it stops first.
    pub async fn ready(&self) {
        let serving = tokio::time::timeout(
            Duration::from_secs(5),
            self.context.phase().wait_for(Phase::Serving),
        )
        .await
        .expect("server did not start in time");
        assert!(serving, "server stopped before serving");
    }

    /// Trigger shutdown and return the result of `serve`.
    pub async fn stop(self) -> Result<(), ServeError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not shut down in time")
            .expect("serve task panicked")
    }
}

/// Build and spawn an app; the engine lifecycle starts immediately.
pub async fn spawn_app(
    connector: Arc<dyn EngineConnector>,
    routes: Router<AppContext>,
    config: ServeConfig,
) -> RunningApp {
    let app = create_app(connector, routes, &config).expect("valid app config");
    let context = app.context().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(app.serve(listener, shutdown.signalled()));

    RunningApp {
        addr,
        context,
        shutdown,
        handle,
    }
}

/// Echo engine with a small context window.
#[allow(dead_code)]
pub fn echo_connector(max_context_length: usize) -> Arc<EchoConnector> {
    Arc::new(EchoConnector::new(&EngineConfig {
        model_id: "echo-test".into(),
        max_context_length,
    }))
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
