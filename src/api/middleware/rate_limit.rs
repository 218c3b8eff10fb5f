//! Per-client fixed-window rate limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::{Ipv4Addr, SocketAddr};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_ip::client_ip;

/// Admits a request only if its client is under quota.
///
/// The client key is the peer IP, or the forwarded client IP when
/// `behind_proxy` is set. Throttled requests get `429 Too Many Requests`
/// with `Retry-After`. If the counter store is unreachable the request is
/// rejected with `503`.
///
/// # Example
///
/// ```rust,ignore
/// let limited = Router::new()
///     .route("/shorten", post(shorten_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Without ConnectInfo (e.g. in-process test transports) all such
    // requests share one bucket.
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr)
        .unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)));

    let client = client_ip(req.headers(), peer, st.behind_proxy).to_string();

    st.rate_limiter.enforce(&client).await?;

    Ok(next.run(req).await)
}
