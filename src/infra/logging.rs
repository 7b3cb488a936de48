pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // Logs go to stderr: in stdio mode stdout carries MCP frames.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log a metric line and feed the `metrics` facade (no-op without a recorder).
/// `*_total` metrics are counters; everything else is a histogram sample.
pub fn log_metric(operation: &'static str, metric: &'static str, value: f64) {
    tracing::info!(operation = operation, metric = metric, value = value, "metric");
    if is_counter(metric) {
        metrics::counter!(metric, "operation" => operation).increment(value.max(0.0) as u64);
    } else {
        metrics::histogram!(metric, "operation" => operation).record(value);
    }
}

fn is_counter(metric: &str) -> bool {
    metric.ends_with("_total")
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_is_idempotent() {
        super::init();
        super::init();
    }

    #[test]
    fn log_metric_without_recorder_is_harmless() {
        super::log_metric("user.show", "remote_latency_ms", 12.5);
        super::log_metric("user.show", "remote_error_total", 1.0);
    }

    #[test]
    fn total_metrics_are_counters() {
        assert!(super::is_counter("remote_error_total"));
        assert!(!super::is_counter("remote_latency_ms"));
    }
}
