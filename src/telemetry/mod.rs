mod correlation;

pub use correlation::{CorrelationContext, CorrelationPropagator, BAGGAGE, TRACEPARENT};

use opentelemetry::trace::{Status, TraceContextExt, TraceError, TraceResult, Tracer, TracerProvider as _};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::trace::{self as sdktrace, Sampler, Span, SpanProcessor, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const INSTRUMENTATION_NAME: &str = "cep-weather";
const DEFAULT_COLLECTOR_SCHEME: &str = "http://";
const EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP span exporter for {endpoint}: {source}")]
    Exporter {
        endpoint: String,
        #[source]
        source: TraceError,
    },
}

/// Writes finished spans into the process log. Used when no collector is configured or the
/// exporter cannot be built.
#[derive(Debug, Default)]
pub struct LogSpanProcessor {
    ended: AtomicU64,
}

impl SpanProcessor for LogSpanProcessor {
    fn on_start(&self, _span: &mut Span, _cx: &Context) {}

    fn on_end(&self, span: SpanData) {
        self.ended.fetch_add(1, Ordering::Relaxed);
        let elapsed_ms = span
            .end_time
            .duration_since(span.start_time)
            .unwrap_or_default()
            .as_secs_f64()
            * 1_000.0;
        let trace_id = span.span_context.trace_id();
        let span_id = span.span_context.span_id();

        match &span.status {
            Status::Error { description } => tracing::warn!(
                %trace_id, %span_id, parent_id=%span.parent_span_id, %elapsed_ms, error=%description,
                "span failed: {}", span.name
            ),
            _ => tracing::info!(
                %trace_id, %span_id, parent_id=%span.parent_span_id, %elapsed_ms,
                "span ended: {}", span.name
            ),
        }
    }

    fn force_flush(&self) -> TraceResult<()> {
        Ok(())
    }

    fn shutdown(&mut self) -> TraceResult<()> {
        tracing::info!(spans=%self.ended.load(Ordering::Relaxed), "span log shut down");
        Ok(())
    }
}

/// Explicitly constructed telemetry handle around its own tracer provider. Created once per
/// process, cloned into whatever emits spans, and shut down on exit. Never installed globally.
#[derive(Clone)]
pub struct Telemetry {
    service: Arc<str>,
    provider: TracerProvider,
    tracer: sdktrace::Tracer,
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry").field("service", &self.service).finish()
    }
}

impl Telemetry {
    fn trace_config(service: &str) -> sdktrace::Config {
        sdktrace::config()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_resource(Resource::new(vec![KeyValue::new("service.name", service.to_string())]))
    }

    fn from_provider(service: &str, provider: TracerProvider) -> Self {
        let tracer = provider.tracer(INSTRUMENTATION_NAME);
        Self { service: service.into(), provider, tracer }
    }

    /// Telemetry handing every span to `processor` as it ends.
    pub fn new(service: &str, processor: impl SpanProcessor + 'static) -> Self {
        let provider = TracerProvider::builder()
            .with_config(Self::trace_config(service))
            .with_span_processor(processor)
            .build();
        Self::from_provider(service, provider)
    }

    /// Telemetry writing spans to the log only.
    pub fn logging(service: &str) -> Self {
        Self::new(service, LogSpanProcessor::default())
    }

    /// Telemetry batching spans to an OTLP/gRPC collector. Must be called within a tokio runtime.
    pub fn otlp(service: &str, collector_endpoint: &str) -> Result<Self, TelemetryError> {
        let endpoint = if collector_endpoint.contains("://") {
            collector_endpoint.to_string()
        } else {
            format!("{DEFAULT_COLLECTOR_SCHEME}{collector_endpoint}")
        };

        let exporter = opentelemetry_otlp::SpanExporterBuilder::from(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint.clone())
                .with_timeout(EXPORT_TIMEOUT),
        )
        .build_span_exporter()
        .map_err(|source| TelemetryError::Exporter { endpoint: endpoint.clone(), source })?;

        let provider = TracerProvider::builder()
            .with_config(Self::trace_config(service))
            .with_batch_exporter(exporter, runtime::Tokio)
            .build();

        tracing::info!(%service, collector=%endpoint, "exporting spans over OTLP");
        Ok(Self::from_provider(service, provider))
    }

    /// OTLP export to `collector_endpoint`, or log-only telemetry when none is configured or the
    /// exporter cannot be built.
    pub fn for_collector(service: &str, collector_endpoint: &str) -> Self {
        if collector_endpoint.trim().is_empty() {
            tracing::warn!(%service, "no telemetry collector configured; spans go to the log");
            return Self::logging(service);
        }

        Self::otlp(service, collector_endpoint.trim()).unwrap_or_else(|error| {
            tracing::error!(?error, %service, "falling back to logging spans");
            Self::logging(service)
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Open a span under `parent`, or at the root of a new trace when `parent` names no span.
    /// Baggage on `parent` carries over to the new span's context.
    pub fn start_span(&self, name: &'static str, parent: &CorrelationContext) -> TelemetrySpan {
        let span = self.tracer.start_with_context(name, parent.as_context());
        let context = parent.as_context().with_span(span);
        TelemetrySpan { context: CorrelationContext::new(context) }
    }

    /// Flushes pending spans and releases the provider. The batch exporter blocks while
    /// flushing, so the work runs off the async workers.
    pub async fn shutdown(self) {
        let service = self.service.clone();
        let flushed = tokio::task::spawn_blocking(move || {
            let results = self.provider.force_flush();
            drop(self);
            results
        })
        .await;

        match flushed {
            Ok(results) => {
                for error in results.into_iter().filter_map(Result::err) {
                    tracing::warn!(%service, ?error, "failed to flush spans on shutdown");
                }
                tracing::info!(%service, "telemetry shut down");
            },
            Err(error) => tracing::error!(%service, ?error, "telemetry shutdown task failed"),
        }
    }
}

/// An open span. Ends once, either explicitly or when dropped.
#[derive(Debug)]
pub struct TelemetrySpan {
    context: CorrelationContext,
}

impl TelemetrySpan {
    /// The context that outbound calls and nested spans made under this span carry.
    pub const fn context(&self) -> &CorrelationContext {
        &self.context
    }

    pub fn record_error(&mut self, error: &dyn fmt::Display) {
        self.context.as_context().span().set_status(Status::error(error.to_string()));
    }

    pub fn end(self) {}
}

impl Drop for TelemetrySpan {
    fn drop(&mut self) {
        self.context.as_context().span().end();
    }
}
