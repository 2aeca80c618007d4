/// Static fallback pricing for a chain, used whenever the live price oracle is unavailable.
///
/// The USD cost is authoritative for fallback quotes; the gas price is carried alongside for
/// display and is not required to reproduce the cost under the live cost model.
#[derive(Debug, Clone, Copy)]
pub struct FallbackQuote {
    /// Gas price in gwei.
    pub gas_price_gwei: f64,
    /// Estimated USD cost of a simple transfer.
    pub estimated_cost_usd: f64,
}

/// A supported chain with its native-currency metadata and fallback pricing.
#[derive(Debug, Clone, Copy)]
pub struct ChainSpec {
    /// Numeric chain identifier.
    pub chain_id: u64,
    /// Human-readable chain name.
    pub name: &'static str,
    /// Symbol of the chain's native gas token.
    pub native_currency: &'static str,
    /// Fixed USD price of one unit of the native token.
    pub native_usd_price: f64,
    /// Static substitute quote for when the live oracle fails.
    pub fallback: FallbackQuote,
}

/// All chains the router can quote, ordered by chain id.
pub static SUPPORTED_CHAINS: [ChainSpec; 6] = [
    ChainSpec {
        chain_id: 1,
        name: "Ethereum",
        native_currency: "ETH",
        native_usd_price: 2400.0,
        fallback: FallbackQuote { gas_price_gwei: 25.0, estimated_cost_usd: 6.00 },
    },
    ChainSpec {
        chain_id: 10,
        name: "Optimism",
        native_currency: "ETH",
        native_usd_price: 2400.0,
        fallback: FallbackQuote { gas_price_gwei: 0.001, estimated_cost_usd: 0.05 },
    },
    ChainSpec {
        chain_id: 56,
        name: "BSC",
        native_currency: "BNB",
        native_usd_price: 300.0,
        fallback: FallbackQuote { gas_price_gwei: 5.0, estimated_cost_usd: 0.09 },
    },
    ChainSpec {
        chain_id: 137,
        name: "Polygon",
        native_currency: "MATIC",
        native_usd_price: 1.0,
        fallback: FallbackQuote { gas_price_gwei: 30.0, estimated_cost_usd: 0.03 },
    },
    ChainSpec {
        chain_id: 42161,
        name: "Arbitrum",
        native_currency: "ETH",
        native_usd_price: 2400.0,
        fallback: FallbackQuote { gas_price_gwei: 0.1, estimated_cost_usd: 0.24 },
    },
    ChainSpec {
        chain_id: 43114,
        name: "Avalanche",
        native_currency: "AVAX",
        native_usd_price: 35.0,
        fallback: FallbackQuote { gas_price_gwei: 25.0, estimated_cost_usd: 0.33 },
    },
];

/// Look up a supported chain by id.
pub fn chain_spec(chain_id: u64) -> Option<&'static ChainSpec> {
    SUPPORTED_CHAINS.iter().find(|chain| chain.chain_id == chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_chain_id() {
        let chain = chain_spec(137).unwrap();
        assert_eq!(chain.name, "Polygon");
        assert_eq!(chain.native_currency, "MATIC");
    }

    #[test]
    fn unknown_chain_is_none() {
        assert!(chain_spec(999).is_none());
    }

    #[test]
    fn registry_is_ordered_by_chain_id() {
        let ids: Vec<u64> = SUPPORTED_CHAINS.iter().map(|chain| chain.chain_id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
