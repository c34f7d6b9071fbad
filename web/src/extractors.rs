//! Request extractors shared by handlers.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`ClientIp`]: caller address from proxy headers or the socket
//! - [`UserAgent`]: the `User-Agent` header
//! - [`PageQuery`]: `page` / `page_size` query parameters

use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, request::Parts},
};
use hotel_booking_core::pagination::Page;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use uuid::Uuid;

/// Correlation id for the current request.
///
/// Prefers the id stored by the correlation middleware so that handler logs
/// and the response header agree. Falls back to the `X-Correlation-ID` header,
/// then to a fresh UUID.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(id))
    }
}

/// Caller IP address.
///
/// Order: first entry of `X-Forwarded-For`, then `X-Real-IP`, then the socket
/// address when the server runs with `into_make_service_with_connect_info`.
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        Ok(Self(client_ip(&parts.headers, socket)))
    }
}

fn header_ip(headers: &HeaderMap, name: &str) -> Option<IpAddr> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

fn client_ip(headers: &HeaderMap, socket: Option<IpAddr>) -> IpAddr {
    header_ip(headers, "X-Forwarded-For")
        .or_else(|| header_ip(headers, "X-Real-IP"))
        .or(socket)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// `User-Agent` header, `"Unknown"` when absent.
#[derive(Debug, Clone)]
pub struct UserAgent(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for UserAgent
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        Ok(Self(user_agent))
    }
}

/// Pagination query parameters.
///
/// Endpoints with extra filters declare the two fields themselves, since
/// `serde(flatten)` does not parse numbers out of query strings.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub page_size: Option<u32>,
}

impl PageQuery {
    /// Clamp into a [`Page`].
    #[must_use]
    pub fn page(&self) -> Page {
        Page::new(self.page, self.page_size)
    }
}
