#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-wide statement instruments on the global meter provider
#[cfg(feature = "metrics")]
pub static METRICS: Lazy<RowfoldMetrics> = Lazy::new(RowfoldMetrics::init);

#[cfg(feature = "metrics")]
pub struct RowfoldMetrics {
    pub queries_total: Counter<u64>,
    pub query_errors_total: Counter<u64>,
    pub query_duration: Histogram<f64>,
}

#[cfg(feature = "metrics")]
impl RowfoldMetrics {
    pub fn init() -> Self {
        let meter = global::meter("rowfold");

        let queries_total = meter
            .u64_counter("rowfold_queries_total")
            .with_description("Total statements sent to the driver")
            .build();

        let query_errors_total = meter
            .u64_counter("rowfold_query_errors_total")
            .with_description("Statements the driver rejected")
            .build();

        let query_duration = meter
            .f64_histogram("rowfold_query_duration_seconds")
            .with_description("Duration of statements")
            .build();

        Self {
            queries_total,
            query_errors_total,
            query_duration,
        }
    }

    pub fn record_query(&self, elapsed: Duration) {
        self.queries_total.add(1, &[]);
        self.query_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_query_error(&self) {
        self.query_errors_total.add(1, &[]);
    }
}

/// Query counters of one [`Database`](crate::Database)
#[derive(Debug, Default)]
pub struct QueryStats {
    queries: AtomicU64,
    failures: AtomicU64,
    elapsed_micros: AtomicU64,
}

/// Point-in-time copy of [`QueryStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryStatsSnapshot {
    pub queries: u64,
    pub failures: u64,
    pub elapsed: Duration,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one statement here and, with the `metrics` feature, on [`METRICS`]
    pub fn record_query(&self, elapsed: Duration, ok: bool) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.failures.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.elapsed_micros.fetch_add(micros, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        {
            METRICS.record_query(elapsed);
            if !ok {
                METRICS.record_query_error();
            }
        }
    }

    /// Number of statements sent to the driver
    pub fn count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Cumulative time spent in the driver
    pub fn elapsed(&self) -> Duration {
        Duration::from_micros(self.elapsed_micros.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> QueryStatsSnapshot {
        QueryStatsSnapshot {
            queries: self.count(),
            failures: self.failures.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
        }
    }

    pub fn reset(&self) {
        self.queries.store(0, Ordering::Relaxed);
        self.failures.store(0, Ordering::Relaxed);
        self.elapsed_micros.store(0, Ordering::Relaxed);
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{span, Level, Span};

    pub fn execute_query_span(sql: &str) -> Span {
        span!(Level::DEBUG, "rowfold.execute_query", sql = %sql)
    }

    pub fn hydrate_span(entity: &str, rows: usize) -> Span {
        span!(Level::DEBUG, "rowfold.hydrate", entity = %entity, rows = rows)
    }
}
