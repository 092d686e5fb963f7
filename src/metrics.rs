use crate::{email_client::EmailKind, state::AppState};
use anyhow::Context;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use http::StatusCode;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Counters describing how the waitlist is doing.
pub struct Metrics {
    registry: Registry,
    signups: IntCounter,
    rejected_submissions: IntCounter,
    delivery_failures: IntCounterVec,
}

impl Metrics {
    /// Create and register all the waitlist counters on a fresh `Registry`.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let signups = IntCounter::new("waitlist_signups_total", "Accepted waitlist signups")
            .context("Failed to create `waitlist_signups_total` counter")?;
        registry
            .register(Box::new(signups.clone()))
            .context("Failed to register `waitlist_signups_total` metric")?;

        let rejected_submissions = IntCounter::new(
            "waitlist_rejected_submissions_total",
            "Waitlist submissions rejected because of an invalid email",
        )
        .context("Failed to create `waitlist_rejected_submissions_total` counter")?;
        registry
            .register(Box::new(rejected_submissions.clone()))
            .context("Failed to register `waitlist_rejected_submissions_total` metric")?;

        let delivery_failures = IntCounterVec::new(
            Opts::new(
                "waitlist_email_delivery_failures_total",
                "Waitlist emails the provider failed to accept",
            ),
            &["message"],
        )
        .context("Failed to create `waitlist_email_delivery_failures_total` counter")?;
        registry
            .register(Box::new(delivery_failures.clone()))
            .context("Failed to register `waitlist_email_delivery_failures_total` metric")?;

        Ok(Self {
            registry,
            signups,
            rejected_submissions,
            delivery_failures,
        })
    }

    pub fn record_signup(&self) {
        self.signups.inc();
    }

    pub fn record_rejected_submission(&self) {
        self.rejected_submissions.inc();
    }

    pub fn record_delivery_failure(&self, kind: EmailKind) {
        self.delivery_failures
            .with_label_values(&[kind.as_str()])
            .inc();
    }

    /// Encode all metrics in the Prometheus text format.
    fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = vec![];
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;

        String::from_utf8(buffer).context("Failed to convert metrics to a valid string")
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_endpoint))
}

/// Expose the waitlist counters for Prometheus to scrape.
#[tracing::instrument(skip(metrics))]
#[utoipa::path(
    get,
    path = "/metrics",
    responses((status = 200, description = "Metrics in the Prometheus text format", body = String))
)]
pub async fn metrics_endpoint(State(metrics): State<Arc<Metrics>>) -> Result<String, MetricsError> {
    metrics.encode().map_err(MetricsError::UnexpectedError)
}

#[derive(thiserror::Error)]
pub enum MetricsError {
    #[error("Unexpected error when generating metrics")]
    UnexpectedError(#[source] anyhow::Error),
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        tracing::error!("{self:?}");
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
