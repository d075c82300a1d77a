//! Engine lifecycle around the serving loop.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tokio::sync::Notify;

use mlc_serve::config::ServeConfig;
use mlc_serve::engine::{EngineConnector, EngineError};
use mlc_serve::lifecycle::{LifecycleError, Phase};
use mlc_serve::{api, AppContext, ServeError};

mod common;

use common::{client, spawn_app, RecordingConnector};

#[tokio::test]
async fn requests_wait_for_engine_start() {
    let gate = Arc::new(Notify::new());
    let connector = Arc::new(RecordingConnector {
        start_gate: Some(gate.clone()),
        ..Default::default()
    });
    let app = spawn_app(connector.clone(), api::router(), ServeConfig::default()).await;

    let url = app.url("/health");
    let pending = tokio::spawn(async move { client().get(url).send().await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!pending.is_finished(), "request answered before engine start");
    assert_eq!(app.context.current_phase(), Phase::Starting);
    assert!(app.context.connector().is_none());

    gate.notify_one();
    let response = pending.await.unwrap().expect("request served after start");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["phase"], "serving");
    assert_eq!(body["model"], "recording");

    app.stop().await.unwrap();
    assert_eq!(connector.events(), vec!["start", "stop"]);
}

#[tokio::test]
async fn failed_start_never_serves() {
    let connector = Arc::new(RecordingConnector {
        fail_start: true,
        ..Default::default()
    });
    let app = spawn_app(connector.clone(), api::router(), ServeConfig::default()).await;
    let url = app.url("/health");
    let context = app.context.clone();

    let result = tokio::time::timeout(Duration::from_secs(5), app.handle)
        .await
        .expect("serve returns after a failed start")
        .unwrap();
    assert!(matches!(
        result,
        Err(ServeError::Lifecycle(LifecycleError::Startup(EngineError::Start(_))))
    ));

    assert_eq!(context.current_phase(), Phase::Stopped);
    assert!(context.connector().is_none());
    assert_eq!(connector.events(), vec!["start"]);
    assert!(client().get(url).send().await.is_err(), "listener must be closed");
}

#[tokio::test]
async fn context_holds_the_connector_that_was_passed_in() {
    let connector: Arc<dyn EngineConnector> = Arc::new(RecordingConnector::default());
    let app = spawn_app(connector.clone(), api::router(), ServeConfig::default()).await;
    app.ready().await;

    let published = app.context.connector().expect("connector published while serving");
    assert!(Arc::ptr_eq(&published, &connector));

    let context = app.context.clone();
    app.stop().await.unwrap();
    assert!(context.connector().is_none());
    assert_eq!(context.current_phase(), Phase::Stopped);
}

#[tokio::test]
async fn stop_runs_once_after_in_flight_requests() {
    let connector = Arc::new(RecordingConnector::default());
    let log = connector.events.clone();
    let routes = Router::<AppContext>::new().route(
        "/slow",
        get(move || {
            let log = log.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(400)).await;
                log.lock().unwrap().push("request");
                "done"
            }
        }),
    );
    let app = spawn_app(connector.clone(), routes, ServeConfig::default()).await;
    app.ready().await;

    let url = app.url("/slow");
    let in_flight = tokio::spawn(async move { client().get(url).send().await });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let shutdown = tokio::spawn(app.stop());
    let response = in_flight.await.unwrap().expect("in-flight request completes");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "done");

    shutdown.await.unwrap().unwrap();
    assert_eq!(connector.events(), vec!["start", "request", "stop"]);
    assert_eq!(connector.stops(), 1);
}

#[tokio::test]
async fn stop_failure_is_reported_after_shutdown_completes() {
    let connector = Arc::new(RecordingConnector {
        fail_stop: true,
        ..Default::default()
    });
    let app = spawn_app(connector.clone(), api::router(), ServeConfig::default()).await;
    app.ready().await;
    let context = app.context.clone();

    let result = app.stop().await;
    assert!(matches!(
        result,
        Err(ServeError::Lifecycle(LifecycleError::Shutdown(EngineError::Stop(_))))
    ));
    assert_eq!(context.current_phase(), Phase::Stopped);
    assert_eq!(connector.stops(), 1);
}

#[tokio::test]
async fn slow_stop_is_a_timeout_error() {
    let connector = Arc::new(RecordingConnector {
        stop_delay: Some(Duration::from_secs(5)),
        ..Default::default()
    });
    let mut config = ServeConfig::default();
    config.lifecycle.shutdown_timeout_secs = 1;

    let app = spawn_app(connector, api::router(), config).await;
    app.ready().await;

    let result = app.stop().await;
    assert!(matches!(
        result,
        Err(ServeError::Lifecycle(LifecycleError::ShutdownTimeout(d))) if d == Duration::from_secs(1)
    ));
}

#[tokio::test]
async fn cancelled_serve_retracts_connector_and_stops_engine() {
    let connector = Arc::new(RecordingConnector::default());
    let app = spawn_app(connector.clone(), api::router(), ServeConfig::default()).await;
    app.ready().await;
    let context = app.context.clone();

    app.handle.abort();
    assert!(app.handle.await.unwrap_err().is_cancelled());

    assert!(context.connector().is_none());
    assert_eq!(context.current_phase(), Phase::Stopped);

    tokio::time::timeout(Duration::from_secs(5), async {
        while connector.stops() == 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("engine stopped in background");
    assert_eq!(connector.stops(), 1);
}
