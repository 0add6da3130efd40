use axum::http::header::HeaderMap;
use opentelemetry::baggage::BaggageExt;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceId};
use opentelemetry::Context;
use opentelemetry_http::{HeaderExtractor, HeaderInjector};
use opentelemetry_sdk::propagation::{BaggagePropagator, TextMapCompositePropagator, TraceContextPropagator};

/// W3C trace-context header carrying the correlation context across hops.
pub const TRACEPARENT: &str = "traceparent";

/// W3C baggage header, carried alongside `traceparent`.
pub const BAGGAGE: &str = "baggage";

/// Opaque token tying every span of one logical request together. Business logic only ever
/// passes it along; the telemetry layer and the propagator are the only readers.
#[derive(Debug, Clone, Default)]
pub struct CorrelationContext(Context);

impl CorrelationContext {
    pub(crate) const fn new(context: Context) -> Self {
        Self(context)
    }

    pub(crate) const fn as_context(&self) -> &Context {
        &self.0
    }

    fn span_context(&self) -> SpanContext {
        self.0.span().span_context().clone()
    }

    pub fn trace_id(&self) -> TraceId {
        self.span_context().trace_id()
    }

    pub fn span_id(&self) -> SpanId {
        self.span_context().span_id()
    }

    pub fn is_sampled(&self) -> bool {
        self.span_context().is_sampled()
    }

    /// Whether this context names a span; a context without one starts a new trace.
    pub fn has_span(&self) -> bool {
        self.span_context().is_valid()
    }

    pub fn baggage_item(&self, key: &str) -> Option<String> {
        self.0.baggage().get(key.to_owned()).map(ToString::to_string)
    }
}

/// Moves a [`CorrelationContext`] on and off HTTP headers, as W3C trace context plus baggage.
#[derive(Debug, Copy, Clone, Default)]
pub struct CorrelationPropagator;

impl CorrelationPropagator {
    fn propagator() -> TextMapCompositePropagator {
        TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ])
    }

    /// The inherited context. Missing or malformed headers yield a context without a span.
    pub fn extract(headers: &HeaderMap) -> CorrelationContext {
        let context = Self::propagator().extract(&HeaderExtractor(headers));
        if !context.span().span_context().is_valid() && headers.contains_key(TRACEPARENT) {
            tracing::debug!(traceparent=?headers.get(TRACEPARENT), "ignoring malformed trace context");
        }
        CorrelationContext::new(context)
    }

    pub fn inject(context: &CorrelationContext, headers: &mut HeaderMap) {
        Self::propagator().inject_context(context.as_context(), &mut HeaderInjector(headers));
    }

    /// Headers carrying only the trace context, for an outbound call.
    pub fn headers_for(context: &CorrelationContext) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(2);
        Self::inject(context, &mut headers);
        headers
    }
}
