use tracing::trace;

// Lightweight metrics helpers that stay off the metrics macros so the
// Prometheus recorder remains the only hard dependency.

pub fn inc_requests(route: &'static str) {
    trace!(
        target = "zahara.metrics",
        route = route,
        "requests_total_inc"
    );
}

pub fn upstream_elapsed(source: &'static str, elapsed_ms: u128) {
    trace!(
        target = "zahara.metrics",
        source = source,
        elapsed_ms = elapsed_ms as u64,
        "upstream_elapsed"
    );
}
