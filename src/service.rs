use crate::{
    chains,
    metrics,
    optimizer::FeeOptimizer,
    quote::GasPriceSource,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use eyre::{Report, Result, WrapErr, bail};
use init4_bin_base::deps::tracing::debug;
use serde::Deserialize;
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, LazyLock},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Shared state for the API handlers.
struct ApiState<S> {
    optimizer: Arc<FeeOptimizer<S>>,
    default_amount: u64,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self { optimizer: Arc::clone(&self.optimizer), default_amount: self.default_amount }
    }
}

async fn return_404() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

async fn return_200() -> Response {
    (StatusCode::OK, "ok").into_response()
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Ranked quotes for every supported chain at the default amount.
async fn get_gas_prices<S>(State(state): State<ApiState<S>>) -> Response
where
    S: GasPriceSource + 'static,
{
    let chain_ids: Vec<u64> = chains::SUPPORTED_CHAINS.iter().map(|chain| chain.chain_id).collect();
    match state.optimizer.optimize(&chain_ids, state.default_amount).await {
        Ok(result) => Json(result.all_quotes).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OptimizeRequest {
    chains: Vec<u64>,
    /// Transfer amount in USDC. Informational; defaults to the configured amount.
    amount_usdc: Option<f64>,
}

/// Full optimization over a caller-supplied candidate set.
async fn post_optimize<S>(
    State(state): State<ApiState<S>>,
    Json(request): Json<OptimizeRequest>,
) -> Response
where
    S: GasPriceSource + 'static,
{
    let amount = match request.amount_usdc {
        None => state.default_amount,
        Some(value) if value.is_finite() && value >= 0.0 => (value * 1e6).round() as u64,
        Some(value) => {
            return error_response(StatusCode::BAD_REQUEST, format!("invalid amountUsdc: {value}"));
        }
    };

    match state.optimizer.optimize(&request.chains, amount).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(error) => error_response(StatusCode::BAD_REQUEST, error.to_string()),
    }
}

fn api_router<S>(state: ApiState<S>) -> Router
where
    S: GasPriceSource + 'static,
{
    Router::new()
        .route("/healthcheck", get(return_200))
        .route("/v1/gas-prices", get(get_gas_prices::<S>))
        .route("/v1/optimize", post(post_optimize::<S>))
        .fallback(return_404)
        .with_state(state)
}

/// Serve the fee router HTTP API on the given port until cancelled or failure.
///
/// Returns `Ok(())` on graceful cancellation or an error if the server exits
/// unexpectedly.
pub async fn serve_api<S>(
    port: u16,
    optimizer: Arc<FeeOptimizer<S>>,
    default_amount: u64,
    cancellation_token: CancellationToken,
) -> Result<()>
where
    S: GasPriceSource + 'static,
{
    LazyLock::force(&metrics::DESCRIPTIONS);

    let state = ApiState { optimizer, default_amount };
    let handle = do_serve_api(port, state, cancellation_token.clone());
    let result = handle.await;
    if cancellation_token.is_cancelled() {
        return Ok(());
    }
    cancellation_token.cancel();
    match result {
        Ok(Ok(())) => bail!("api server exited without cancellation"),
        Ok(error) => error,
        Err(error) if error.is_panic() => {
            Err(Report::new(error).wrap_err("panic in api server"))
        }
        Err(_) => bail!("api server task cancelled unexpectedly"),
    }
}

fn do_serve_api<S>(
    port: u16,
    state: ApiState<S>,
    cancel_token: CancellationToken,
) -> JoinHandle<Result<()>>
where
    S: GasPriceSource + 'static,
{
    let router = api_router(state);
    let socket_address = SocketAddr::from(([0, 0, 0, 0], port));
    tokio::spawn(async move {
        let listener = TcpListener::bind(socket_address)
            .await
            .wrap_err_with(|| format!("failed to bind to api address on port {port}"))?;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                debug!("api server cancelled");
            })
            .await
            .wrap_err("failed serving api")
    })
}
