use core::time::Duration;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::LazyLock;

// Metric names
const OPTIMIZE_REQUESTS: &str = "fee.router.optimize_requests";
const CACHE_HITS: &str = "fee.router.cache_hits";
const QUOTES: &str = "fee.router.quotes";
const QUOTE_RETRY_ATTEMPTS: &str = "fee.router.quote_retry_attempts";
const OPTIMIZE_DURATION_SECONDS: &str = "fee.router.optimize_duration_seconds";

/// Force evaluation to register all metric descriptions with the exporter.
pub(crate) static DESCRIPTIONS: LazyLock<()> = LazyLock::new(|| {
    describe_counter!(OPTIMIZE_REQUESTS, "Optimization requests that missed the cache");
    describe_counter!(CACHE_HITS, "Optimization requests served from the result cache");
    describe_counter!(QUOTES, "Per-chain quotes produced (label: origin = live / fallback)");
    describe_counter!(
        QUOTE_RETRY_ATTEMPTS,
        "Transient quote API errors that triggered a retry (label: chain)"
    );
    describe_histogram!(OPTIMIZE_DURATION_SECONDS, "Duration of each uncached optimization");
});

/// Where a per-chain quote came from.
pub(crate) enum QuoteOrigin {
    Live,
    Fallback,
}

impl QuoteOrigin {
    pub(crate) const fn as_str(&self) -> &'static str {
        match self {
            QuoteOrigin::Live => "live",
            QuoteOrigin::Fallback => "fallback",
        }
    }
}

/// Increment the uncached optimization request counter.
pub(crate) fn record_optimize_request() {
    counter!(OPTIMIZE_REQUESTS).increment(1);
}

/// Record an optimization request served from the cache.
pub(crate) fn record_cache_hit() {
    counter!(CACHE_HITS).increment(1);
}

/// Record a produced quote and its origin.
pub(crate) fn record_quote(origin: QuoteOrigin) {
    counter!(QUOTES, "origin" => origin.as_str()).increment(1);
}

/// Record a quote API retry attempt for the given chain.
pub(crate) fn record_quote_retry(chain: &'static str) {
    counter!(QUOTE_RETRY_ATTEMPTS, "chain" => chain).increment(1);
}

/// Record the duration of an uncached optimization.
pub(crate) fn record_optimize_duration(elapsed: Duration) {
    histogram!(OPTIMIZE_DURATION_SECONDS).record(elapsed.as_secs_f64());
}
