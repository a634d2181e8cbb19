//! Contract tests for the adapter capability interface and registry.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use aerofetch_core::{
    Adapter, AdapterRegistry, BatchAdapter, BatchFuture, FetchContext, FetchErrorKind, HttpClient,
    HttpError, HttpRequest, HttpResponse, NoopHttpClient, RetryConfig, Scheduler, SchedulerConfig,
    Source,
};
use serde_json::json;

fn offline_config() -> SchedulerConfig {
    SchedulerConfig {
        retry: RetryConfig::no_retry(),
        request_timeout: Duration::from_secs(5),
        source_timeout: Duration::from_secs(10),
        ..SchedulerConfig::default()
    }
}

#[test]
fn builtin_registry_exposes_the_reference_adapters() {
    let registry = AdapterRegistry::with_builtins();
    assert_eq!(registry.names(), vec!["json-api", "static", "static-stream"]);
}

#[test]
fn resolving_an_unknown_adapter_is_a_fatal_contract_error() {
    let registry = AdapterRegistry::with_builtins();
    let source = Source::named("kosovo", "kosovo-scraper");

    let error = registry.resolve(&source).expect_err("must fail");
    assert_eq!(error.kind(), FetchErrorKind::AdapterNotRegistered);
    assert!(error.fatal());
    assert!(!error.retryable());
    assert_eq!(error.source_name(), Some("kosovo"));
}

#[test]
fn an_adapter_declares_exactly_one_capability() {
    // The capability is carried by the enum variant itself; dispatching
    // on it is the only way to invoke an adapter.
    let registry = AdapterRegistry::with_builtins();
    match registry.get("static").expect("registered") {
        Adapter::Batch(adapter) => assert_eq!(adapter.name(), "static"),
        Adapter::Stream(_) => panic!("static adapter must be the batch variant"),
    }
    match registry.get("static-stream").expect("registered") {
        Adapter::Stream(adapter) => assert_eq!(adapter.name(), "static-stream"),
        Adapter::Batch(_) => panic!("static-stream adapter must be the stream variant"),
    }
}

#[test]
fn the_last_registration_for_a_name_wins() {
    struct Replacement;

    impl BatchAdapter for Replacement {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch_batch<'a>(&'a self, _source: &'a Source, _cx: &'a FetchContext) -> BatchFuture<'a> {
            Box::pin(async move { Ok(vec![json!({ "parameter": "pm25" })]) })
        }
    }

    let mut registry = AdapterRegistry::with_builtins();
    let before = registry.len();
    registry.register(Adapter::batch(Replacement));
    assert_eq!(registry.len(), before);
}

// =============================================================================
// End to end through a custom HTTP-backed adapter
// =============================================================================

struct CannedJsonClient {
    body: &'static str,
}

impl HttpClient for CannedJsonClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let body = self.body;
        Box::pin(async move { Ok(HttpResponse::ok_json(body)) })
    }
}

#[tokio::test]
async fn json_api_source_flows_from_http_body_to_canonical_measurements() {
    // Given: a provider answering with a measurement envelope
    let body = r#"{
        "measurements": [
            {
                "parameter": "PM2.5",
                "value": "31.0",
                "unit": "ug/m3",
                "date": { "utc": "2024-03-01T10:00:00Z", "local": "2024-03-01T15:30:00+05:30" },
                "location": "Anand Vihar",
                "city": "Delhi",
                "attribution": [{ "name": "CPCB", "url": "https://cpcb.nic.in/" }],
                "averagingPeriod": { "value": 0.25, "unit": "hours" }
            }
        ]
    }"#;

    let source = Source::named("caaqm", "json-api")
        .with_url("https://example.test/api")
        .with_country("IN");
    let scheduler = Scheduler::new(AdapterRegistry::with_builtins(), offline_config())
        .with_http_client(Arc::new(CannedJsonClient { body }));

    // When
    let summary = scheduler.run(&[source]).await.expect("run should complete");

    // Then: the provider spelling and unit variants come out canonical
    let result = summary
        .outcome_for("caaqm")
        .and_then(|outcome| outcome.result.as_ref())
        .expect("result present");
    assert_eq!(result.measurements.len(), 1);

    let measurement = &result.measurements[0];
    assert_eq!(measurement.parameter.as_str(), "pm25");
    assert_eq!(measurement.unit.as_str(), "µg/m³");
    assert_eq!(measurement.value, 31.0);
    assert_eq!(measurement.country.as_deref(), Some("IN"));

    let wire = serde_json::to_value(measurement).expect("serializes");
    assert_eq!(wire["date"]["local"], "2024-03-01T15:30:00+05:30");
    assert_eq!(wire["averagingPeriod"]["unit"], "hours");
}

#[tokio::test]
async fn json_api_parse_failure_marks_the_source_failed_without_retry() {
    let source = Source::named("dashboard", "json-api").with_url("https://example.test/api");
    let scheduler = Scheduler::new(AdapterRegistry::with_builtins(), offline_config())
        .with_http_client(Arc::new(CannedJsonClient {
            body: "<html><body>scheduled maintenance</body></html>",
        }));

    let summary = scheduler.run(&[source]).await.expect("run should complete");

    let outcome = summary.outcome_for("dashboard").expect("outcome present");
    assert!(!outcome.succeeded());
    assert_eq!(outcome.attempts, 1);
    assert_eq!(
        outcome.error.as_ref().expect("error present").kind(),
        FetchErrorKind::Parse
    );
}

#[tokio::test]
async fn adapters_receive_the_context_not_a_global_client() {
    // A custom adapter sees only the FetchContext it is handed; the
    // scheduler builds one per source run with that source's gate.
    struct ContextProbe;

    impl BatchAdapter for ContextProbe {
        fn name(&self) -> &str {
            "probe"
        }

        fn fetch_batch<'a>(&'a self, _source: &'a Source, cx: &'a FetchContext) -> BatchFuture<'a> {
            Box::pin(async move {
                assert!(!cx.gate().is_limited());
                assert_eq!(cx.request_timeout(), Duration::from_secs(5));
                Ok(Vec::new())
            })
        }
    }

    let mut registry = AdapterRegistry::new();
    registry.register(Adapter::batch(ContextProbe));
    let scheduler = Scheduler::new(registry, offline_config())
        .with_http_client(Arc::new(NoopHttpClient));

    let summary = scheduler
        .run(&[Source::named("probe-source", "probe")])
        .await
        .expect("run should complete");
    assert!(summary.outcome_for("probe-source").expect("outcome present").succeeded());
}
