//! Prometheus metrics for the service.
//!
//! - `http_requests_total{path}`: requests seen by the data routes
//! - `http_request_duration_seconds{path}`: wall-clock handler time
//! - `db_query_duration_seconds{query}`: successful query latency
//! - `db_active_connections`: checked-out pool connections
//! - `db_migrations_total`: migrations applied by this process

mod middleware;

pub use middleware::track_requests;

use std::time::Duration;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Owns a private registry so each instance (and each test) is isolated.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration: HistogramVec,
    db_query_duration: HistogramVec,
    db_active_connections: IntGauge,
    db_migrations_total: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["path"],
        )?;
        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            ),
            &["path"],
        )?;
        let db_query_duration = HistogramVec::new(
            HistogramOpts::new(
                "db_query_duration_seconds",
                "Duration of database queries in seconds",
            ),
            &["query"],
        )?;
        let db_active_connections = IntGauge::new(
            "db_active_connections",
            "Number of active database connections",
        )?;
        let db_migrations_total =
            IntCounter::new("db_migrations_total", "Total number of database migrations")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;
        registry.register(Box::new(db_query_duration.clone()))?;
        registry.register(Box::new(db_active_connections.clone()))?;
        registry.register(Box::new(db_migrations_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration,
            db_query_duration,
            db_active_connections,
            db_migrations_total,
        })
    }

    pub fn observe_request(&self, path: &str, elapsed: Duration) {
        self.http_requests_total.with_label_values(&[path]).inc();
        self.http_request_duration
            .with_label_values(&[path])
            .observe(elapsed.as_secs_f64());
    }

    pub fn observe_query(&self, query: &str, elapsed: Duration) {
        self.db_query_duration
            .with_label_values(&[query])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_migrations(&self, applied: u64) {
        self.db_migrations_total.inc_by(applied);
    }

    pub fn set_active_connections(&self, active: i64) {
        self.db_active_connections.set(active);
    }

    /// Text exposition of everything in the registry.
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
impl Metrics {
    pub fn request_count(&self, path: &str) -> u64 {
        self.http_requests_total.with_label_values(&[path]).get()
    }

    pub fn query_sample_count(&self, query: &str) -> u64 {
        self.db_query_duration
            .with_label_values(&[query])
            .get_sample_count()
    }

    pub fn migrations_applied(&self) -> u64 {
        self.db_migrations_total.get()
    }
}
