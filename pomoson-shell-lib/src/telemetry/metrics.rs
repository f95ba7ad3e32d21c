use opentelemetry::global;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::sync::Arc;

pub mod labels {
    pub const OUTCOME: &str = "outcome";
    pub const SOURCE: &str = "source";
    pub const STATUS_CODE: &str = "status_code";
    pub const ERROR_TYPE: &str = "error_type";
    pub const REASON: &str = "reason";
    pub const VERSION: &str = "version";
    pub const RUST_VERSION: &str = "rust_version";
}

pub mod values {
    pub const OUTCOME_REWRITTEN: &str = "rewritten";
    pub const OUTCOME_PASSTHROUGH: &str = "passthrough";
    pub const SOURCE_BRIDGE: &str = "bridge";
    pub const SOURCE_IPC: &str = "ipc";
    pub const REASON_UNAUTHORIZED: &str = "unauthorized";
    pub const REASON_NON_LOOPBACK: &str = "non_loopback";
    pub const REASON_MALFORMED: &str = "malformed";
    pub const REASON_UNKNOWN_CHANNEL: &str = "unknown_channel";
    pub const ERROR_TIMEOUT: &str = "timeout";
    pub const ERROR_CONNECT: &str = "connect";
    pub const ERROR_OTHER: &str = "other";
}

#[derive(Clone)]
pub struct Metrics {
    // Interceptor
    pub requests_total: Counter<u64>,
    pub interceptor_faults_total: Counter<u64>,

    // Control channel
    pub origin_updates_total: Counter<u64>,
    pub control_rejected_total: Counter<u64>,

    // Upstream traffic sent through the session
    pub upstream_requests_total: Counter<u64>,
    pub upstream_errors_total: Counter<u64>,
    pub upstream_duration_seconds: Histogram<f64>,

    // Build info
    pub build_info: Gauge<u64>,
}

impl Metrics {
    pub fn new(meter: Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("pomoson_requests_total")
                .with_description("Outbound requests seen by the interceptor, by outcome")
                .build(),
            interceptor_faults_total: meter
                .u64_counter("pomoson_interceptor_faults_total")
                .with_description("Matching requests passed through because the rewrite could not be built")
                .build(),

            origin_updates_total: meter
                .u64_counter("pomoson_origin_updates_total")
                .with_description("Origin updates applied through the control channel")
                .build(),
            control_rejected_total: meter
                .u64_counter("pomoson_control_rejected_total")
                .with_description("Control endpoint requests rejected before reaching the channel")
                .build(),

            upstream_requests_total: meter
                .u64_counter("pomoson_upstream_requests_total")
                .with_description("Requests completed by the network session")
                .build(),
            upstream_errors_total: meter
                .u64_counter("pomoson_upstream_errors_total")
                .with_description("Requests the network session failed to complete")
                .build(),
            upstream_duration_seconds: meter
                .f64_histogram("pomoson_upstream_duration_seconds")
                .with_description("Upstream request duration in seconds")
                .build(),

            build_info: meter
                .u64_gauge("pomoson_build_info")
                .with_description("Build information (version, rust version)")
                .build(),
        }
    }

    /// Set build info metric with version labels
    pub fn set_build_info(&self) {
        let version = env!("CARGO_PKG_VERSION");
        let rust_version = env!("CARGO_PKG_RUST_VERSION");

        self.build_info.record(
            1,
            &[
                KeyValue::new(labels::VERSION, version),
                KeyValue::new(labels::RUST_VERSION, rust_version),
            ],
        );
    }

    pub fn record_intercepted(&self, rewritten: bool) {
        let outcome = if rewritten {
            values::OUTCOME_REWRITTEN
        } else {
            values::OUTCOME_PASSTHROUGH
        };
        self.requests_total
            .add(1, &[KeyValue::new(labels::OUTCOME, outcome)]);
    }

    pub fn record_interceptor_fault(&self) {
        self.interceptor_faults_total.add(1, &[]);
    }

    pub fn record_origin_update(&self, source: &'static str) {
        self.origin_updates_total
            .add(1, &[KeyValue::new(labels::SOURCE, source)]);
    }

    pub fn record_control_rejected(&self, reason: &'static str) {
        self.control_rejected_total
            .add(1, &[KeyValue::new(labels::REASON, reason)]);
    }

    pub fn record_upstream(&self, status_code: u16, duration_secs: f64) {
        let attrs = &[KeyValue::new(labels::STATUS_CODE, status_code.to_string())];
        self.upstream_requests_total.add(1, attrs);
        self.upstream_duration_seconds.record(duration_secs, attrs);
    }

    pub fn record_upstream_error(&self, error_type: &'static str) {
        self.upstream_errors_total
            .add(1, &[KeyValue::new(labels::ERROR_TYPE, error_type)]);
    }
}

pub fn init_metrics() -> Result<(Arc<Metrics>, Registry), Box<dyn std::error::Error + Send + Sync>>
{
    let registry = Registry::default();

    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;

    let meter_provider = SdkMeterProvider::builder().with_reader(exporter).build();

    global::set_meter_provider(meter_provider);

    let meter = global::meter("pomoson-shell");
    let metrics = Arc::new(Metrics::new(meter));

    metrics.set_build_info();

    Ok((metrics, registry))
}
