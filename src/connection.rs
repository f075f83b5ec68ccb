//! Local and remote endpoint capture for the connection a request arrived on.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts, connect_info::Connected},
    http::{HeaderMap, request::Parts},
    serve::IncomingStream,
};
use tokio::net::TcpListener;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Socket addresses of an accepted TCP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub local: Option<SocketAddr>,
    pub remote: SocketAddr,
}

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        Self {
            local: stream.io().local_addr().ok(),
            remote: *stream.remote_addr(),
        }
    }
}

/// Network metadata recorded on every written visit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub local_ip: String,
    pub local_port: i32,
    pub remote_ip: String,
    pub remote_port: i32,
}

impl Endpoints {
    /// Resolve endpoints from the connection and, for the remote side, the
    /// first `X-Forwarded-For` entry when the request went through a proxy.
    pub fn resolve(connection: Option<&ConnectionInfo>, headers: &HeaderMap) -> Self {
        let (local_ip, local_port) = connection
            .and_then(|c| c.local)
            .map(|addr| (addr.ip().to_string(), i32::from(addr.port())))
            .unwrap_or_default();

        let connection_remote = connection.map(|c| c.remote);
        let (remote_ip, remote_port) = match forwarded_for(headers) {
            Some((ip, port)) => (
                ip,
                port.or_else(|| connection_remote.map(|addr| addr.port()))
                    .map(i32::from)
                    .unwrap_or_default(),
            ),
            None => connection_remote
                .map(|addr| (addr.ip().to_string(), i32::from(addr.port())))
                .unwrap_or_default(),
        };

        Self {
            local_ip,
            local_port,
            remote_ip,
            remote_port,
        }
    }
}

/// Parse the client entry of `X-Forwarded-For`. Accepts `ip`, `ip:port` and
/// `[v6]:port`; anything else is split on the first `:`.
fn forwarded_for(headers: &HeaderMap) -> Option<(String, Option<u16>)> {
    let value = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let client = value.split(',').next()?.trim();
    if client.is_empty() {
        return None;
    }

    if let Ok(ip) = client.parse::<IpAddr>() {
        return Some((ip.to_string(), None));
    }
    if let Ok(addr) = client.parse::<SocketAddr>() {
        return Some((addr.ip().to_string(), Some(addr.port())));
    }

    let mut parts = client.splitn(2, ':');
    let ip = parts.next().unwrap_or_default().to_string();
    let port = parts.next().and_then(|p| p.trim().parse().ok());
    Some((ip, port))
}

/// Extractor yielding the [`Endpoints`] of the current request.
///
/// Missing connection info (e.g. when the router is driven without a
/// listener) yields empty addresses and zero ports rather than a rejection.
pub struct ClientEndpoint(pub Endpoints);

impl<S> FromRequestParts<S> for ClientEndpoint
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let connection = parts
            .extensions
            .get::<ConnectInfo<ConnectionInfo>>()
            .map(|ConnectInfo(info)| info);
        Ok(ClientEndpoint(Endpoints::resolve(connection, &parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn connection() -> ConnectionInfo {
        ConnectionInfo {
            local: Some("10.1.0.5:8080".parse().unwrap()),
            remote: "192.168.1.20:40000".parse().unwrap(),
        }
    }

    fn headers(forwarded: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR, HeaderValue::from_str(forwarded).unwrap());
        headers
    }

    #[test]
    fn falls_back_to_connection_addresses() {
        let endpoints = Endpoints::resolve(Some(&connection()), &HeaderMap::new());
        assert_eq!(endpoints.local_ip, "10.1.0.5");
        assert_eq!(endpoints.local_port, 8080);
        assert_eq!(endpoints.remote_ip, "192.168.1.20");
        assert_eq!(endpoints.remote_port, 40000);
    }

    #[test]
    fn forwarded_ip_and_port_win() {
        let endpoints = Endpoints::resolve(Some(&connection()), &headers("203.0.113.7:5555"));
        assert_eq!(endpoints.remote_ip, "203.0.113.7");
        assert_eq!(endpoints.remote_port, 5555);
        assert_eq!(endpoints.local_ip, "10.1.0.5");
    }

    #[test]
    fn forwarded_bare_ip_keeps_connection_port() {
        let endpoints =
            Endpoints::resolve(Some(&connection()), &headers("203.0.113.7, 10.0.0.1"));
        assert_eq!(endpoints.remote_ip, "203.0.113.7");
        assert_eq!(endpoints.remote_port, 40000);
    }

    #[test]
    fn forwarded_ipv6_forms() {
        let bracketed = Endpoints::resolve(None, &headers("[2001:db8::1]:443"));
        assert_eq!(bracketed.remote_ip, "2001:db8::1");
        assert_eq!(bracketed.remote_port, 443);

        let bare = Endpoints::resolve(None, &headers("2001:db8::2"));
        assert_eq!(bare.remote_ip, "2001:db8::2");
        assert_eq!(bare.remote_port, 0);
    }

    #[test]
    fn hostname_entry_is_split_on_colon() {
        let endpoints = Endpoints::resolve(None, &headers("proxy.internal:8443"));
        assert_eq!(endpoints.remote_ip, "proxy.internal");
        assert_eq!(endpoints.remote_port, 8443);
    }

    #[test]
    fn no_connection_no_header_is_empty() {
        assert_eq!(Endpoints::resolve(None, &HeaderMap::new()), Endpoints::default());
    }
}
