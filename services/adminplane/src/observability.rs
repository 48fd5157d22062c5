//! Tracing, trace-context propagation and the Prometheus metrics endpoint.
//!
//! Initialization is guarded by `OnceLock` so tests can call it repeatedly.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static SUBSCRIBER_INIT: OnceLock<()> = OnceLock::new();
static PROPAGATOR_INIT: OnceLock<()> = OnceLock::new();

pub fn init_observability(service_name: &str) -> PrometheusHandle {
    install_propagator();
    SUBSCRIBER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let otel_layer = build_tracer_provider(service_name).map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()))
        });
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .with(otel_layer)
            .try_init();
    });

    let handle = install_metrics_recorder();
    describe_metrics();
    handle
}

fn install_propagator() {
    PROPAGATOR_INIT.get_or_init(|| global::set_text_map_propagator(TraceContextPropagator::new()));
}

// No provider when the OTLP exporter cannot be built; logs still go to stdout.
fn build_tracer_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    let resource = Resource::builder_empty()
        .with_attributes(resource_attributes(service_name))
        .build();
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn resource_attributes(service_name: &str) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new("service.name", service_name.to_string())];
    if let Ok(value) =
        std::env::var("LUMEN_SERVICE_INSTANCE_ID").or_else(|_| std::env::var("HOSTNAME"))
    {
        attrs.push(KeyValue::new("service.instance.id", value));
    }
    attrs
}

fn describe_metrics() {
    metrics::describe_counter!(
        "lumen_config_changes_total",
        "Committed configuration object changes, by op"
    );
    metrics::describe_counter!(
        "lumen_config_rejections_total",
        "Rejected configuration requests, by error code"
    );
    metrics::describe_counter!("lumen_restarts_total", "Server restarts requested");
    metrics::describe_gauge!(
        "lumen_config_objects",
        "Committed configuration objects, by type"
    );
    metrics::describe_gauge!(
        "lumen_restart_pending",
        "1 while committed changes wait for a restart"
    );
}

/// W3C trace context carried by an incoming request, if any.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|prop| prop.extract(&HeaderMapExtractor(headers)))
}

struct HeaderMapExtractor<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics listening");
    serve_metrics_with_listener(handle, listener).await
}

async fn serve_metrics_with_listener(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
) -> std::io::Result<()> {
    let app = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    );
    axum::serve(listener, app.into_make_service()).await
}

// A recorder installed elsewhere in the process leaves us with a detached
// handle: metrics still work, only this endpoint renders nothing.
fn install_metrics_recorder() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(error = %err, "metrics recorder already installed");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvGuard;
    use opentelemetry::trace::{TraceContextExt, TraceId};
    use serial_test::serial;
    use std::time::Duration;

    #[test]
    #[serial]
    fn instance_id_prefers_lumen_variable() {
        let _g1 = EnvGuard::set("LUMEN_SERVICE_INSTANCE_ID", "instance-1");
        let _g2 = EnvGuard::set("HOSTNAME", "host-1");
        let attrs = resource_attributes("adminplane");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].value.to_string(), "adminplane");
        assert_eq!(attrs[1].key.as_str(), "service.instance.id");
        assert_eq!(attrs[1].value.to_string(), "instance-1");
    }

    #[test]
    fn trace_context_extracts_span_context() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"
                .parse()
                .unwrap(),
        );
        let context = trace_context_from_headers(&headers);
        let span = context.span();
        let span_ctx = span.span_context();
        assert!(span_ctx.is_valid());
        assert_eq!(
            span_ctx.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    #[serial]
    async fn serve_metrics_renders_lumen_metrics() {
        let handle = init_observability("adminplane-test");
        let _ = init_observability("adminplane-test");
        metrics::counter!("lumen_restarts_total").increment(1);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let server = tokio::spawn(serve_metrics_with_listener(handle, listener));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .no_proxy()
            .build()
            .expect("build test client");
        let body = client
            .get(format!("http://{addr}/metrics"))
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .expect("GET /metrics")
            .text()
            .await
            .expect("body");
        assert!(body.contains("lumen_restarts_total"));
        server.abort();
    }
}
