use fee_router::{FeeOptimizer, config_from_env, env_var_info, quote::LiFiClient, serve_api};
use init4_bin_base::deps::tracing::debug;
use std::sync::Arc;

fn should_print_help() -> bool {
    std::env::args().any(|arg| {
        let lowercase_arg = arg.to_ascii_lowercase();
        lowercase_arg == "-h" || lowercase_arg == "--help"
    })
}

fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    let env_vars = env_var_info();
    println!(
        r#"Fee router service v{version}

Run with no args. The process will run until it receives a SIGTERM or SIGINT signal.

Configuration is via the following environment variables:
{env_vars}
"#
    )
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> eyre::Result<()> {
    if should_print_help() {
        print_help();
        return Ok(());
    }

    let _guard = init4_bin_base::init4();
    let config = config_from_env()?;
    debug!(port = config.port(), quote_api_url = config.quote_api_url(), "starting fee router");

    let cancellation_token = fee_router::handle_signals()?;

    let client = LiFiClient::new(
        config.quote_api_url().to_string(),
        config.integrator_id().to_string(),
        config.quote_api_key().map(str::to_string),
        config.gas_limit(),
        config.default_amount(),
        config.quote_timeout(),
    );
    let optimizer = Arc::new(FeeOptimizer::new(client, config.cache_ttl()));

    serve_api(config.port(), optimizer, config.default_amount(), cancellation_token).await
}
