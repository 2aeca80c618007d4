use crate::{
    chains::{self, ChainSpec},
    metrics::{self, QuoteOrigin},
    quote::GasPriceSource,
};
use futures_util::future::join_all;
use init4_bin_base::deps::tracing::{instrument, trace, warn};
use lru::LruCache;
use serde::Serialize;
use std::{num::NonZeroUsize, sync::Mutex};
use tokio::time::{Duration, Instant};

const RESULT_CACHE_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// A priced quote for executing a simple USDC transfer on one chain.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainQuote {
    /// Numeric chain identifier.
    pub chain_id: u64,
    /// Human-readable chain name.
    pub chain_name: &'static str,
    /// Gas price in gwei.
    pub gas_price_gwei: f64,
    /// Symbol of the chain's native gas token.
    pub native_currency: &'static str,
    /// Estimated USD cost of the transfer.
    pub estimated_cost_usd: f64,
}

/// The outcome of a fee optimization over a set of candidate chains.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    /// Chain id of the cheapest quote.
    pub recommended_chain_id: u64,
    /// USD saved by the cheapest quote relative to the most expensive one.
    pub savings_usd: f64,
    /// Savings as a percentage of the most expensive quote.
    pub savings_percent: f64,
    /// All quotes, sorted ascending by USD cost (ties broken by chain id).
    pub all_quotes: Vec<ChainQuote>,
}

/// Validation errors for optimization requests.
///
/// Upstream quote failures never surface here; they degrade to fallback data per chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OptimizeError {
    /// The candidate chain list is empty.
    #[error("no candidate chains provided")]
    NoChains,
    /// A candidate chain id is not in the supported set.
    #[error("unsupported chain id: {0}")]
    UnsupportedChain(u64),
}

type CacheKey = (u64, Vec<u64>);

/// Recommends the cheapest chain for a USDC transfer among a set of candidates.
///
/// Holds its own quote source and result cache; construct one per service instead of sharing
/// ambient state. Results are cached by `(amount, chain set)` for a fixed TTL to avoid redundant
/// oracle fan-out.
pub struct FeeOptimizer<S> {
    source: S,
    cache: Mutex<LruCache<CacheKey, (Instant, OptimizationResult)>>,
    cache_ttl: Duration,
}

impl<S: GasPriceSource> FeeOptimizer<S> {
    /// Create a new [`FeeOptimizer`] over `source` with the given cache TTL.
    pub fn new(source: S, cache_ttl: Duration) -> Self {
        Self { source, cache: Mutex::new(LruCache::new(RESULT_CACHE_SIZE)), cache_ttl }
    }

    /// Produce an [`OptimizationResult`] for the given candidate chains.
    ///
    /// `amount` is the transfer amount in micro-USDC. It does not affect gas price lookups but
    /// participates in the cache key. Duplicate chain ids are collapsed; the result always covers
    /// the full input set, substituting static fallback data for any chain whose live quote
    /// fails.
    #[instrument(skip(self))]
    pub async fn optimize(
        &self,
        chain_ids: &[u64],
        amount: u64,
    ) -> Result<OptimizationResult, OptimizeError> {
        let chains = resolve_chains(chain_ids)?;
        let key = (amount, chains.iter().map(|chain| chain.chain_id).collect::<Vec<_>>());

        if let Some(result) = self.cached(&key) {
            metrics::record_cache_hit();
            trace!(amount, "serving cached optimization result");
            return Ok(result);
        }

        metrics::record_optimize_request();
        let started = Instant::now();

        let mut quotes: Vec<ChainQuote> =
            join_all(chains.iter().map(|&chain| self.quote_chain(chain))).await;
        quotes.sort_by(|a, b| {
            a.estimated_cost_usd
                .total_cmp(&b.estimated_cost_usd)
                .then(a.chain_id.cmp(&b.chain_id))
        });

        // resolve_chains guarantees a non-empty list.
        let cheapest = quotes.first().expect("non-empty quote list");
        let most_expensive_cost =
            quotes.last().expect("non-empty quote list").estimated_cost_usd;
        let savings_usd = most_expensive_cost - cheapest.estimated_cost_usd;
        let savings_percent = if most_expensive_cost > 0.0 {
            savings_usd / most_expensive_cost * 100.0
        } else {
            0.0
        };

        let result = OptimizationResult {
            recommended_chain_id: cheapest.chain_id,
            savings_usd,
            savings_percent,
            all_quotes: quotes,
        };

        trace!(
            recommended_chain_id = result.recommended_chain_id,
            savings_usd = result.savings_usd,
            num_chains = result.all_quotes.len(),
            "computed optimization result"
        );
        metrics::record_optimize_duration(started.elapsed());

        self.cache.lock().unwrap().put(key, (Instant::now(), result.clone()));
        Ok(result)
    }

    /// Quote a single chain, substituting the registry fallback on any source error.
    async fn quote_chain(&self, chain: &'static ChainSpec) -> ChainQuote {
        match self.source.estimate(chain).await {
            Ok(estimate) => {
                metrics::record_quote(QuoteOrigin::Live);
                ChainQuote {
                    chain_id: chain.chain_id,
                    chain_name: chain.name,
                    gas_price_gwei: estimate.gas_price_gwei,
                    native_currency: chain.native_currency,
                    estimated_cost_usd: estimate.estimated_cost_usd,
                }
            }
            Err(error) => {
                metrics::record_quote(QuoteOrigin::Fallback);
                warn!(
                    chain_id = chain.chain_id,
                    error = %error,
                    "gas estimate failed, substituting static fallback"
                );
                fallback_quote(chain)
            }
        }
    }

    /// Return the cached result for `key` if present and still fresh.
    fn cached(&self, key: &CacheKey) -> Option<OptimizationResult> {
        let mut cache = self.cache.lock().unwrap();
        match cache.get(key) {
            Some((inserted, result)) if inserted.elapsed() < self.cache_ttl => {
                Some(result.clone())
            }
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }
}

/// Build the fallback quote for a chain from the registry's static table.
fn fallback_quote(chain: &'static ChainSpec) -> ChainQuote {
    ChainQuote {
        chain_id: chain.chain_id,
        chain_name: chain.name,
        gas_price_gwei: chain.fallback.gas_price_gwei,
        native_currency: chain.native_currency,
        estimated_cost_usd: chain.fallback.estimated_cost_usd,
    }
}

/// Validate and resolve candidate chain ids, collapsing duplicates.
fn resolve_chains(chain_ids: &[u64]) -> Result<Vec<&'static ChainSpec>, OptimizeError> {
    if chain_ids.is_empty() {
        return Err(OptimizeError::NoChains);
    }
    let mut ids = chain_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids.into_iter()
        .map(|id| chains::chain_spec(id).ok_or(OptimizeError::UnsupportedChain(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::{QuoteEstimate, StaticGasPriceSource};
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
    };

    const EPSILON: f64 = 1e-9;

    #[derive(Debug, thiserror::Error)]
    #[error("no quote available")]
    struct NoQuote;

    /// Source with a fixed cost per chain id; errors on chains it has no entry for.
    struct MapSource {
        costs: HashMap<u64, f64>,
    }

    impl MapSource {
        fn new(costs: &[(u64, f64)]) -> Self {
            Self { costs: costs.iter().copied().collect() }
        }
    }

    impl GasPriceSource for MapSource {
        type Error = NoQuote;

        async fn estimate(&self, chain: &'static ChainSpec) -> Result<QuoteEstimate, NoQuote> {
            let cost = *self.costs.get(&chain.chain_id).ok_or(NoQuote)?;
            Ok(QuoteEstimate { gas_price_gwei: 1.0, estimated_cost_usd: cost })
        }
    }

    /// Source that always fails, forcing the fallback path.
    struct FailingSource;

    impl GasPriceSource for FailingSource {
        type Error = NoQuote;

        async fn estimate(&self, _chain: &'static ChainSpec) -> Result<QuoteEstimate, NoQuote> {
            Err(NoQuote)
        }
    }

    /// Source that counts estimate calls and delegates to the static table.
    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl GasPriceSource for CountingSource {
        type Error = core::convert::Infallible;

        async fn estimate(
            &self,
            chain: &'static ChainSpec,
        ) -> Result<QuoteEstimate, Self::Error> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            StaticGasPriceSource.estimate(chain).await
        }
    }

    fn optimizer<S: GasPriceSource>(source: S) -> FeeOptimizer<S> {
        FeeOptimizer::new(source, Duration::from_secs(30))
    }

    #[tokio::test]
    async fn ranks_chains_ascending_by_usd_cost() {
        let source = MapSource::new(&[(1, 5.0), (137, 0.02), (42161, 0.3)]);
        let result = optimizer(source).optimize(&[1, 137, 42161], 1_000_000).await.unwrap();

        let order: Vec<u64> = result.all_quotes.iter().map(|quote| quote.chain_id).collect();
        assert_eq!(order, vec![137, 42161, 1]);
        assert_eq!(result.recommended_chain_id, 137);
        for pair in result.all_quotes.windows(2) {
            assert!(pair[0].estimated_cost_usd <= pair[1].estimated_cost_usd);
        }
        assert!((result.savings_usd - 4.98).abs() < EPSILON);
        assert!((result.savings_percent - 99.6).abs() < EPSILON);
    }

    #[tokio::test]
    async fn result_covers_the_input_set() {
        let source = MapSource::new(&[(1, 5.0), (137, 0.02)]);
        let result = optimizer(source).optimize(&[1, 137, 1, 137], 0).await.unwrap();
        assert_eq!(result.all_quotes.len(), 2);
    }

    #[tokio::test]
    async fn all_failing_source_falls_back_to_static_table() {
        let result =
            optimizer(FailingSource).optimize(&[1, 137, 42161], 1_000_000).await.unwrap();

        let order: Vec<u64> = result.all_quotes.iter().map(|quote| quote.chain_id).collect();
        assert_eq!(order, vec![137, 42161, 1]);
        assert_eq!(result.recommended_chain_id, 137);
        assert!((result.all_quotes[0].estimated_cost_usd - 0.03).abs() < EPSILON);
        assert!((result.all_quotes[1].estimated_cost_usd - 0.24).abs() < EPSILON);
        assert!((result.all_quotes[2].estimated_cost_usd - 6.00).abs() < EPSILON);
        assert!((result.savings_usd - 5.97).abs() < EPSILON);
    }

    #[tokio::test]
    async fn partial_failure_mixes_live_and_fallback_quotes() {
        // Live data for Polygon only; Ethereum and Arbitrum fall back to 6.00 and 0.24.
        let source = MapSource::new(&[(137, 1.0)]);
        let result = optimizer(source).optimize(&[1, 137, 42161], 0).await.unwrap();

        let order: Vec<u64> = result.all_quotes.iter().map(|quote| quote.chain_id).collect();
        assert_eq!(order, vec![42161, 137, 1]);
        assert_eq!(result.all_quotes.len(), 3);
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let result = optimizer(FailingSource).optimize(&[], 0).await;
        assert_eq!(result.unwrap_err(), OptimizeError::NoChains);
    }

    #[tokio::test]
    async fn unknown_chain_is_rejected() {
        let result = optimizer(FailingSource).optimize(&[1, 999], 0).await;
        assert_eq!(result.unwrap_err(), OptimizeError::UnsupportedChain(999));
    }

    #[tokio::test]
    async fn equal_costs_tie_break_by_chain_id() {
        let source = MapSource::new(&[(10, 0.5), (42161, 0.5)]);
        let result = optimizer(source).optimize(&[42161, 10], 0).await.unwrap();

        let order: Vec<u64> = result.all_quotes.iter().map(|quote| quote.chain_id).collect();
        assert_eq!(order, vec![10, 42161]);
        assert!(result.savings_usd.abs() < EPSILON);
    }

    #[tokio::test]
    async fn zero_cost_everywhere_reports_zero_savings_percent() {
        let source = MapSource::new(&[(10, 0.0), (42161, 0.0)]);
        let result = optimizer(source).optimize(&[10, 42161], 0).await.unwrap();
        assert_eq!(result.savings_percent, 0.0);
        assert_eq!(result.savings_usd, 0.0);
    }

    #[tokio::test]
    async fn repeated_requests_are_served_from_cache() {
        let optimizer = optimizer(CountingSource::default());
        optimizer.optimize(&[1, 137], 1_000_000).await.unwrap();
        optimizer.optimize(&[1, 137], 1_000_000).await.unwrap();
        assert_eq!(optimizer.source.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn different_amounts_are_cached_separately() {
        let optimizer = optimizer(CountingSource::default());
        optimizer.optimize(&[1, 137], 1_000_000).await.unwrap();
        optimizer.optimize(&[1, 137], 2_000_000).await.unwrap();
        assert_eq!(optimizer.source.calls.load(Ordering::Relaxed), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_entries_expire_after_ttl() {
        let ttl = Duration::from_secs(30);
        let optimizer = FeeOptimizer::new(CountingSource::default(), ttl);

        optimizer.optimize(&[1, 137], 0).await.unwrap();
        tokio::time::advance(ttl + Duration::from_millis(1)).await;
        optimizer.optimize(&[1, 137], 0).await.unwrap();

        assert_eq!(optimizer.source.calls.load(Ordering::Relaxed), 4);
    }
}
