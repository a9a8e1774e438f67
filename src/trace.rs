use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
	metrics::{
		reader::{DefaultAggregationSelector, DefaultTemporalitySelector},
		Aggregation, Instrument, MeterProviderBuilder, PeriodicReader, SdkMeterProvider, Stream,
	},
	runtime,
	trace::{BatchConfig, Sampler, Tracer},
	Resource,
};
use opentelemetry_semantic_conventions::{
	resource::{DEPLOYMENT_ENVIRONMENT, SERVICE_NAME, SERVICE_VERSION},
	SCHEMA_URL,
};
use std::time::Duration;

use axum::http::Response;
use tower_http::trace::OnResponse;
use tracing::Span;
use tracing_opentelemetry::MetricsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("metrics exporter error: {0}")]
	Metrics(#[from] opentelemetry::metrics::MetricsError),
	#[error("trace exporter error: {0}")]
	Trace(#[from] opentelemetry::trace::TraceError),
}

/// Constructs a [`Resource`] which describes the service.
fn resource() -> Resource {
	Resource::from_schema_url(
		[
			KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
			KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
			KeyValue::new(
				DEPLOYMENT_ENVIRONMENT,
				if cfg!(debug_assertions) {
					"development"
				} else {
					"production"
				},
			),
		],
		SCHEMA_URL,
	)
}

/// Constructs an [`SdkMeterProvider`] with a custom view for request latency.
fn init_meter_provider(endpoint: &str) -> Result<SdkMeterProvider, Error> {
	let exporter = opentelemetry_otlp::new_exporter()
		.tonic()
		.with_endpoint(endpoint)
		.build_metrics_exporter(
			Box::new(DefaultAggregationSelector::new()),
			Box::new(DefaultTemporalitySelector::new()),
		)?;

	let reader = PeriodicReader::builder(exporter, runtime::Tokio)
		.with_interval(std::time::Duration::from_secs(5))
		.build();

	// For debugging in development
	#[cfg(debug_assertions)]
	let stdout_reader = PeriodicReader::builder(
		opentelemetry_stdout::MetricsExporter::default(),
		runtime::Tokio,
	)
	.build();

	let view_latency = |instrument: &Instrument| -> Option<Stream> {
		if instrument.name == "latency_ms" {
			Some(
				Stream::new()
					.name("latency_ms")
					.aggregation(Aggregation::Default),
			)
		} else {
			None
		}
	};

	let meter_provider = MeterProviderBuilder::default();
	#[cfg(debug_assertions)]
	let meter_provider = meter_provider.with_reader(stdout_reader);

	let meter_provider = meter_provider
		.with_resource(resource())
		.with_reader(reader)
		.with_view(view_latency)
		.build();

	global::set_meter_provider(meter_provider.clone());

	Ok(meter_provider)
}

/// Constructs a [`Tracer`] that exports every span to `endpoint`.
fn init_tracer(endpoint: &str) -> Result<Tracer, Error> {
	let tracer = opentelemetry_otlp::new_pipeline()
		.tracing()
		.with_trace_config(
			opentelemetry_sdk::trace::Config::default()
				.with_sampler(Sampler::TraceIdRatioBased(1.0))
				.with_resource(resource()),
		)
		.with_batch_config(BatchConfig::default())
		.with_exporter(
			opentelemetry_otlp::new_exporter()
				.tonic()
				.with_endpoint(endpoint),
		)
		.install_batch(runtime::Tokio)?;

	Ok(tracer)
}

/// Initializes the tracing subscriber.
///
/// Log levels are taken from `RUST_LOG` (default `info`). With an OTLP endpoint
/// configured, traces and metrics are exported too, and the returned guard cleans
/// up the global tracer and meter provider when dropped.
pub fn init_tracing_subscriber(config: &Config) -> Result<Option<OtelGuard>, Error> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let fmt = tracing_subscriber::fmt::layer().with_ansi(true);

	let Some(endpoint) = config.otlp_endpoint.as_deref() else {
		tracing_subscriber::registry().with(filter).with(fmt).init();

		return Ok(None);
	};

	let meter_provider = init_meter_provider(endpoint)?;

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt)
		.with(MetricsLayer::new(meter_provider.clone()))
		.with(tracing_opentelemetry::layer().with_tracer(init_tracer(endpoint)?))
		.init();

	Ok(Some(OtelGuard { meter_provider }))
}

/// Logs every response and records its latency in the `latency_ms` histogram.
#[derive(Debug, Clone, Copy)]
pub struct RecordLatency;

impl<B> OnResponse<B> for RecordLatency {
	fn on_response(self, response: &Response<B>, latency: Duration, _span: &Span) {
		let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

		tracing::info!(
			histogram.latency_ms = latency_ms,
			status = response.status().as_u16(),
			"finished processing request"
		);
	}
}

pub struct OtelGuard {
	meter_provider: SdkMeterProvider,
}

impl Drop for OtelGuard {
	fn drop(&mut self) {
		if let Err(err) = self.meter_provider.shutdown() {
			eprintln!("{err:?}");
		}

		opentelemetry::global::shutdown_tracer_provider();
	}
}

#[cfg(test)]
mod test {
	use std::sync::{Arc, Mutex};

	use tracing::field::{Field, Visit};
	use tracing_subscriber::{layer::Context, Layer};

	use super::*;

	/// Collects the `u64` fields of every event.
	#[derive(Clone, Default)]
	struct Fields(Arc<Mutex<Vec<(String, u64)>>>);

	impl Visit for Fields {
		fn record_u64(&mut self, field: &Field, value: u64) {
			self.0.lock().unwrap().push((field.name().into(), value));
		}

		fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
	}

	impl<S: tracing::Subscriber> Layer<S> for Fields {
		fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
			event.record(&mut self.clone());
		}
	}

	#[test]
	fn test_record_latency() {
		let fields = Fields::default();
		let subscriber = tracing_subscriber::registry().with(fields.clone());

		tracing::subscriber::with_default(subscriber, || {
			RecordLatency.on_response(&Response::new(()), Duration::from_millis(12), &Span::none());
		});

		let fields = fields.0.lock().unwrap();

		assert!(fields.contains(&("histogram.latency_ms".into(), 12)));
		assert!(fields.contains(&("status".into(), 200)));
	}
}
