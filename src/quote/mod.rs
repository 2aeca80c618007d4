mod lifi;
mod static_source;

pub use lifi::{LiFiClient, LiFiError};
pub use static_source::StaticGasPriceSource;

use crate::chains::ChainSpec;
use core::future::Future;

/// A priced gas estimate for a simple transfer on one chain.
#[derive(Debug, Clone, Copy)]
pub struct QuoteEstimate {
    /// Gas price in gwei.
    pub gas_price_gwei: f64,
    /// Estimated USD cost of the transfer.
    pub estimated_cost_usd: f64,
}

/// Supplies per-chain gas price estimates for fee optimization.
pub trait GasPriceSource: Send + Sync {
    /// Error type returned by quote operations.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Estimate the gas price and transfer cost on `chain`.
    fn estimate(
        &self,
        chain: &'static ChainSpec,
    ) -> impl Future<Output = Result<QuoteEstimate, Self::Error>> + Send;
}
