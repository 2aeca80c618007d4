use super::{GasPriceSource, QuoteEstimate};
use crate::{chains::ChainSpec, metrics};
use backon::{ExponentialBuilder, Retryable};
use init4_bin_base::deps::tracing::{debug, instrument, trace, warn};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// Placeholder USDC token address sent with same-chain probe quotes. The oracle prices the gas
/// leg of the quote regardless of the token pair.
const PROBE_TOKEN: &str = "0xA0b86a33E6441b8435b662f0E2d0B8A0E4B5B8B0";

/// Neutral sender address for probe quotes.
const PROBE_SENDER: &str = "0x0000000000000000000000000000000000000000";

const INTEGRATOR_HEADER: &str = "x-lifi-integrator";
const API_KEY_HEADER: &str = "x-lifi-api-key";

/// Gas price source backed by the hosted LI.FI quote API.
///
/// Requests a same-chain USDC self-quote per chain and derives the gas price from the quote's gas
/// cost entry. Transient transport errors are retried a bounded number of times; all other
/// failures surface to the caller, which substitutes fallback data.
#[derive(Debug, Clone)]
pub struct LiFiClient {
    client: reqwest::Client,
    base_url: String,
    integrator_id: String,
    api_key: Option<String>,
    gas_limit: u64,
    probe_amount: u64,
    request_timeout: Duration,
}

/// Quote request body for the LI.FI quote endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequest<'a> {
    from_chain: u64,
    to_chain: u64,
    from_token: &'a str,
    to_token: &'a str,
    from_amount: String,
    from_address: &'a str,
}

/// Quote response from the LI.FI quote endpoint, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    estimate: Estimate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Estimate {
    gas_costs: Vec<GasCost>,
}

#[derive(Debug, Deserialize)]
struct GasCost {
    /// Raw amount in the token's smallest unit.
    amount: String,
    token: GasToken,
}

#[derive(Debug, Deserialize)]
struct GasToken {
    symbol: String,
    decimals: u8,
}

/// Error response body from the LI.FI API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Errors that can occur when querying the LI.FI quote API.
#[derive(Debug, thiserror::Error)]
pub enum LiFiError {
    /// HTTP request to the quote API failed.
    #[error("quote API request failed: {0:?}")]
    RequestFailed(#[source] reqwest::Error),
    /// The quote API returned an error response.
    #[error("quote API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Human-readable error message.
        message: String,
    },
    /// Failed to parse the quote response.
    #[error("invalid quote response: {0}")]
    InvalidResponse(Box<dyn core::error::Error + Send + Sync>),
    /// The quote response carries no gas cost entries.
    #[error("quote response has no gas cost entries")]
    NoGasCosts,
    /// The gas cost token does not match the chain's native currency.
    #[error("gas cost token {symbol} does not match native currency {expected}")]
    CurrencyMismatch {
        /// Symbol reported by the oracle.
        symbol: String,
        /// Native currency of the chain being quoted.
        expected: &'static str,
    },
}

impl LiFiClient {
    /// Create a new [`LiFiClient`].
    pub fn new(
        base_url: String,
        integrator_id: String,
        api_key: Option<String>,
        gas_limit: u64,
        probe_amount: u64,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            integrator_id,
            api_key,
            gas_limit,
            probe_amount,
            request_timeout,
        }
    }

    /// Request a same-chain probe quote for the given chain.
    async fn request_quote(&self, chain: &ChainSpec) -> Result<QuoteResponse, LiFiError> {
        let url = format!("{}/quote", self.base_url);
        let body = QuoteRequest {
            from_chain: chain.chain_id,
            to_chain: chain.chain_id,
            from_token: PROBE_TOKEN,
            to_token: PROBE_TOKEN,
            from_amount: self.probe_amount.to_string(),
            from_address: PROBE_SENDER,
        };

        debug!(chain_id = chain.chain_id, amount = self.probe_amount, "requesting probe quote");

        let mut request = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .header(INTEGRATOR_HEADER, &self.integrator_id)
            .json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request.send().await.map_err(LiFiError::RequestFailed)?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            return Err(match response.json::<ErrorResponse>().await {
                Ok(body) => LiFiError::ApiError { status: status_code, message: body.message },
                Err(_) => LiFiError::ApiError {
                    status: status_code,
                    message: format!("HTTP {status_code}"),
                },
            });
        }

        response.json().await.map_err(|error| LiFiError::InvalidResponse(Box::new(error)))
    }

    /// Convert a quote response into a [`QuoteEstimate`] for `chain`.
    ///
    /// The gas cost entry carries a raw native-token amount for the whole transfer; the gwei gas
    /// price is recovered from it under the configured gas limit, so
    /// `cost_usd == gas_price_gwei * gas_limit * 1e-9 * native_usd_price` holds by construction.
    fn convert(
        &self,
        chain: &ChainSpec,
        response: QuoteResponse,
    ) -> Result<QuoteEstimate, LiFiError> {
        let gas_cost = response.estimate.gas_costs.first().ok_or(LiFiError::NoGasCosts)?;
        if gas_cost.token.symbol != chain.native_currency {
            return Err(LiFiError::CurrencyMismatch {
                symbol: gas_cost.token.symbol.clone(),
                expected: chain.native_currency,
            });
        }

        let raw_amount: u128 = gas_cost
            .amount
            .parse()
            .map_err(|error| LiFiError::InvalidResponse(Box::new(error)))?;
        let gas_amount_native = raw_amount as f64 / 10f64.powi(i32::from(gas_cost.token.decimals));
        let estimated_cost_usd = gas_amount_native * chain.native_usd_price;
        let gas_price_gwei = gas_amount_native / self.gas_limit as f64 * 1e9;

        trace!(
            chain_id = chain.chain_id,
            gas_amount_native,
            gas_price_gwei,
            estimated_cost_usd,
            "converted probe quote"
        );

        Ok(QuoteEstimate { gas_price_gwei, estimated_cost_usd })
    }
}

fn backoff() -> ExponentialBuilder {
    ExponentialBuilder::new()
        .with_factor(1.5)
        .with_min_delay(Duration::from_millis(100))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(2)
}

fn is_transient(error: &LiFiError) -> bool {
    match error {
        LiFiError::RequestFailed(error) => {
            error.is_timeout() || error.is_connect() || error.is_request()
        }
        LiFiError::ApiError { status, .. } => {
            *status >= 500 || *status == reqwest::StatusCode::TOO_MANY_REQUESTS.as_u16()
        }
        LiFiError::InvalidResponse(_)
        | LiFiError::NoGasCosts
        | LiFiError::CurrencyMismatch { .. } => false,
    }
}

impl GasPriceSource for LiFiClient {
    type Error = LiFiError;

    #[instrument(skip_all, fields(chain_id = chain.chain_id))]
    async fn estimate(&self, chain: &'static ChainSpec) -> Result<QuoteEstimate, LiFiError> {
        let fetch = || self.request_quote(chain);
        let response = fetch
            .retry(backoff())
            .when(is_transient)
            .notify(|error, duration| {
                metrics::record_quote_retry(chain.name);
                warn!(
                    chain_id = chain.chain_id,
                    error = %error,
                    retry_in_ms = duration.as_millis(),
                    "transient quote API error"
                );
            })
            .await?;

        self.convert(chain, response)
    }
}
