use tracing::trace;

// Trace-based counters; the Prometheus recorder renders whatever the
// exporter collects at `/metrics`.

pub fn inc_requests(route: &'static str) {
    trace!(target = "seo.metrics", route = route, "requests_total_inc");
}

pub fn stage_elapsed(stage: &'static str, elapsed_ms: u128) {
    trace!(
        target = "seo.metrics",
        stage = stage,
        elapsed_ms = elapsed_ms as u64,
        "stage_elapsed"
    );
}

pub fn fetch_outcome(source: &'static str, outcome: &'static str) {
    trace!(
        target = "seo.metrics",
        source = source,
        outcome = outcome,
        "fetch_outcome_total_inc"
    );
}
