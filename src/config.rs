use eyre::{Result, WrapErr};
use init4_bin_base::utils::from_env::FromEnv;
use itertools::Itertools;
use std::time::Duration;

const DEFAULT_QUOTE_API_URL: &str = "https://li.quest/v1";
const DEFAULT_INTEGRATOR_ID: &str = "usdc-payment-scheduler";
const DEFAULT_GAS_LIMIT: u64 = 21_000;
const DEFAULT_AMOUNT_MICRO_USDC: u64 = 1_000_000;
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
const DEFAULT_QUOTE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PORT: u16 = 8080;

/// Internal configuration loaded directly from environment variables.
#[derive(Debug, FromEnv)]
struct ConfigInner {
    #[from_env(
        var = "FEE_ROUTER_QUOTE_API_URL",
        desc = "Base URL of the quote API [default: https://li.quest/v1]",
        optional
    )]
    quote_api_url: Option<String>,

    #[from_env(
        var = "FEE_ROUTER_INTEGRATOR_ID",
        desc = "Integrator id sent with every quote API request [default: usdc-payment-scheduler]",
        optional
    )]
    integrator_id: Option<String>,

    #[from_env(
        var = "FEE_ROUTER_QUOTE_API_KEY",
        desc = "API key for the quote API. Unauthenticated when unset",
        optional
    )]
    quote_api_key: Option<String>,

    #[from_env(
        var = "FEE_ROUTER_GAS_LIMIT",
        desc = "Gas limit assumed for a simple transfer [default: 21000]",
        optional
    )]
    gas_limit: Option<u64>,

    #[from_env(
        var = "FEE_ROUTER_DEFAULT_AMOUNT",
        desc = "Default transfer amount in micro-USDC [default: 1000000]",
        optional
    )]
    default_amount: Option<u64>,

    #[from_env(
        var = "FEE_ROUTER_CACHE_TTL_MS",
        desc = "How long optimization results stay cached, in milliseconds [default: 30000]",
        optional
    )]
    cache_ttl_ms: Option<u64>,

    #[from_env(
        var = "FEE_ROUTER_QUOTE_TIMEOUT_MS",
        desc = "Per-request timeout for quote API calls, in milliseconds [default: 5000]",
        optional
    )]
    quote_timeout_ms: Option<u64>,

    #[from_env(
        var = "FEE_ROUTER_PORT",
        desc = "Port for the HTTP API server [default: 8080]",
        optional
    )]
    port: Option<u16>,
}

/// Configuration for the fee router service.
///
/// Load from environment variables using [`config_from_env`]. Use `--help` to see the full list of
/// supported environment variables.
#[derive(Debug)]
pub struct Config {
    quote_api_url: String,
    integrator_id: String,
    quote_api_key: Option<String>,
    gas_limit: u64,
    default_amount: u64,
    cache_ttl: Duration,
    quote_timeout: Duration,
    port: u16,
}

impl Config {
    /// Base URL of the quote API.
    pub fn quote_api_url(&self) -> &str {
        &self.quote_api_url
    }

    /// Integrator id sent with every quote API request.
    pub fn integrator_id(&self) -> &str {
        &self.integrator_id
    }

    /// Optional API key for the quote API.
    pub fn quote_api_key(&self) -> Option<&str> {
        self.quote_api_key.as_deref()
    }

    /// Gas limit assumed for a simple transfer.
    pub const fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Default transfer amount in micro-USDC.
    pub const fn default_amount(&self) -> u64 {
        self.default_amount
    }

    /// How long optimization results stay cached.
    pub const fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Per-request timeout for quote API calls.
    pub const fn quote_timeout(&self) -> Duration {
        self.quote_timeout
    }

    /// Port for the HTTP API server.
    pub const fn port(&self) -> u16 {
        self.port
    }

    fn from_env() -> Result<Self> {
        let ConfigInner {
            quote_api_url,
            integrator_id,
            quote_api_key,
            gas_limit,
            default_amount,
            cache_ttl_ms,
            quote_timeout_ms,
            port,
        } = ConfigInner::from_env()?;

        Ok(Config {
            quote_api_url: quote_api_url.unwrap_or(DEFAULT_QUOTE_API_URL.to_string()),
            integrator_id: integrator_id.unwrap_or(DEFAULT_INTEGRATOR_ID.to_string()),
            quote_api_key,
            gas_limit: gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
            default_amount: default_amount.unwrap_or(DEFAULT_AMOUNT_MICRO_USDC),
            cache_ttl: cache_ttl_ms.map(Duration::from_millis).unwrap_or(DEFAULT_CACHE_TTL),
            quote_timeout: quote_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_QUOTE_TIMEOUT),
            port: port.unwrap_or(DEFAULT_PORT),
        })
    }
}

/// Get a list of the env vars used to configure the app.
pub fn env_var_info() -> String {
    let inventory = ConfigInner::inventory();
    let max_width = inventory.iter().map(|env_item| env_item.var.len()).max().unwrap_or(0);
    inventory
        .iter()
        .map(|env_item| {
            format!(
                "  {:width$}  {}{}",
                env_item.var,
                env_item.description,
                if env_item.optional { " [optional]" } else { "" },
                width = max_width
            )
        })
        .join("\n")
}

/// Load configuration from environment variables.
pub fn config_from_env() -> Result<Config> {
    Config::from_env()
        .wrap_err("failed to configure fee router (run with '--help' to see all required env vars)")
}
