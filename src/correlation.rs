//! Correlation IDs and HTTP propagation
//!
//! A correlation ID is a lowercase hyphenated UUIDv7. Inbound requests get
//! one via [`CorrelationMiddleware`]; outbound requests carry it forward via
//! [`CorrelationTransport`]. Both store the ID in request extensions.

use std::fmt;
use std::str::FromStr;

use http::{HeaderValue, Request, Response};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::{Uuid, Version};

use crate::error::FulmenError;

pub const CORRELATION_HEADER: &str = "X-Correlation-ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// A fresh time-ordered ID
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse and validate. Anything other than a non-nil version 7 UUID in
    /// hyphenated 8-4-4-4-12 form is rejected.
    pub fn parse(input: &str) -> Result<Self, FulmenError> {
        let invalid = || FulmenError::InvalidCorrelationId(input.to_string());
        if !is_hyphenated(input) {
            return Err(invalid());
        }
        let uuid = Uuid::parse_str(input).map_err(|_| invalid())?;
        if uuid.is_nil() || uuid.get_version() != Some(Version::SortRand) {
            return Err(invalid());
        }
        Ok(Self(uuid))
    }

    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Milliseconds since the Unix epoch encoded in the ID
    pub fn timestamp_millis(&self) -> u64 {
        let bytes = self.0.as_bytes();
        bytes[..6].iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
    }

    fn header_value(&self) -> HeaderValue {
        HeaderValue::from_str(&self.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

/// `uuid` also accepts simple, braced and URN forms; only 8-4-4-4-12 is an ID.
fn is_hyphenated(input: &str) -> bool {
    input.len() == 36
        && input
            .bytes()
            .enumerate()
            .all(|(i, b)| matches!(i, 8 | 13 | 18 | 23) == (b == b'-'))
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // hyphenated Display is always lowercase
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for CorrelationId {
    type Err = FulmenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for CorrelationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CorrelationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The correlation ID stored on a request, if any
pub fn from_request<B>(req: &Request<B>) -> Option<CorrelationId> {
    req.extensions().get::<CorrelationId>().copied()
}

/// Inbound request handler
pub trait Handler<ReqBody> {
    type ResBody;

    fn handle(&self, req: Request<ReqBody>) -> Response<Self::ResBody>;
}

/// Adapts a closure into a [`Handler`]
#[derive(Debug, Clone, Copy)]
pub struct HandlerFn<F>(pub F);

impl<F, ReqBody, ResBody> Handler<ReqBody> for HandlerFn<F>
where
    F: Fn(Request<ReqBody>) -> Response<ResBody>,
{
    type ResBody = ResBody;

    fn handle(&self, req: Request<ReqBody>) -> Response<ResBody> {
        (self.0)(req)
    }
}

/// Ensures every request carries a valid correlation ID.
///
/// A valid inbound header is kept; a missing or invalid one is replaced
/// with a fresh ID rather than rejected. The ID is stored in the request
/// extensions and echoed on the response.
#[derive(Debug, Clone)]
pub struct CorrelationMiddleware<H> {
    inner: H,
}

impl<H> CorrelationMiddleware<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H, ReqBody> Handler<ReqBody> for CorrelationMiddleware<H>
where
    H: Handler<ReqBody>,
{
    type ResBody = H::ResBody;

    fn handle(&self, mut req: Request<ReqBody>) -> Response<Self::ResBody> {
        let inbound = req
            .headers()
            .get(CORRELATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(CorrelationId::parse);

        let id = match inbound {
            Some(Ok(id)) => id,
            Some(Err(err)) => {
                tracing::debug!(error = %err, "replacing invalid inbound correlation id");
                CorrelationId::generate()
            }
            None => CorrelationId::generate(),
        };

        let value = id.header_value();
        req.headers_mut().insert(CORRELATION_HEADER, value.clone());
        req.extensions_mut().insert(id);

        let mut res = self.inner.handle(req);
        res.headers_mut().insert(CORRELATION_HEADER, value);
        res
    }
}

/// Outbound HTTP client
pub trait Transport<B> {
    type Response;
    type Error;

    fn round_trip(&self, req: Request<B>) -> Result<Self::Response, Self::Error>;
}

/// Forwards the request's correlation ID as a header on outbound calls.
///
/// The caller's request is left untouched; a copy carries the header.
#[derive(Debug, Clone)]
pub struct CorrelationTransport<T> {
    inner: T,
}

impl<T> CorrelationTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn round_trip<B>(&self, req: &Request<B>) -> Result<T::Response, T::Error>
    where
        T: Transport<B>,
        B: Clone,
    {
        let mut outbound = clone_request(req);
        if let Some(id) = from_request(req) {
            outbound.headers_mut().insert(CORRELATION_HEADER, id.header_value());
        }
        self.inner.round_trip(outbound)
    }
}

fn clone_request<B: Clone>(req: &Request<B>) -> Request<B> {
    let mut out = Request::new(req.body().clone());
    *out.method_mut() = req.method().clone();
    *out.uri_mut() = req.uri().clone();
    *out.version_mut() = req.version();
    *out.headers_mut() = req.headers().clone();
    *out.extensions_mut() = req.extensions().clone();
    out
}
