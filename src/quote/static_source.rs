use super::{GasPriceSource, QuoteEstimate};
use crate::chains::ChainSpec;
use init4_bin_base::deps::tracing::trace;

/// Gas price source that serves the static fallback table.
///
/// Every estimate comes straight from the chain registry, so this source never fails. Useful for
/// offline operation and as a deterministic source in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticGasPriceSource;

impl GasPriceSource for StaticGasPriceSource {
    type Error = core::convert::Infallible;

    async fn estimate(&self, chain: &'static ChainSpec) -> Result<QuoteEstimate, Self::Error> {
        trace!(
            chain_id = chain.chain_id,
            gas_price_gwei = chain.fallback.gas_price_gwei,
            cost_usd = chain.fallback.estimated_cost_usd,
            "serving static gas estimate"
        );
        Ok(QuoteEstimate {
            gas_price_gwei: chain.fallback.gas_price_gwei,
            estimated_cost_usd: chain.fallback.estimated_cost_usd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::chain_spec;

    #[tokio::test]
    async fn serves_registry_fallback_values() {
        let source = StaticGasPriceSource;
        let chain = chain_spec(137).unwrap();
        let estimate = source.estimate(chain).await.unwrap();

        assert_eq!(estimate.gas_price_gwei, chain.fallback.gas_price_gwei);
        assert_eq!(estimate.estimated_cost_usd, chain.fallback.estimated_cost_usd);
    }
}
