//! Client identity extraction for rate limiting.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Determines the rate-limit key for a request.
///
/// When `behind_proxy` is false the socket peer address is authoritative and
/// forwarding headers are ignored, since any client can set them. Behind a
/// trusted proxy the left-most `X-Forwarded-For` entry wins, then
/// `X-Real-IP`, then the peer address.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
///
/// let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();
/// assert_eq!(client_ip(&headers, peer, true).to_string(), "203.0.113.7");
/// assert_eq!(client_ip(&headers, peer, false).to_string(), "10.0.0.1");
/// ```
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> IpAddr {
    if behind_proxy {
        if let Some(ip) = header_ip(headers, X_FORWARDED_FOR, |v| v.split(',').next()) {
            return ip;
        }
        if let Some(ip) = header_ip(headers, X_REAL_IP, |v| Some(v)) {
            return ip;
        }
    }

    peer.ip()
}

fn header_ip(
    headers: &HeaderMap,
    name: &str,
    pick: impl FnOnce(&str) -> Option<&str>,
) -> Option<IpAddr> {
    let value = headers.get(name)?.to_str().ok()?;
    pick(value)?.trim().parse().ok()
}
