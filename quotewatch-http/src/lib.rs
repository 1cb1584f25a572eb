//! quotewatch-http
//!
//! Connector that implements [`QuoteClient`] against a quote service reachable
//! over HTTP. Each call issues one `GET {endpoint}/?code=<code>` and decodes
//! the body with [`quotewatch_core::wire::decode_quotes`].
//!
//! Failure mapping:
//! - deadline elapsed: `Timeout`
//! - non-2xx status: `ServerError`
//! - body not quote-shaped: `MalformedResponse`, or `NotFound` when every
//!   record carries an error instead of data
//! - any other transport failure: `NetworkUnavailable`
#![warn(missing_docs)]

/// Builder for [`HttpQuoteClient`].
pub mod builder;

use std::time::Duration;

use async_trait::async_trait;
use quotewatch_core::wire::decode_quotes;
use quotewatch_core::{InstrumentCode, Quote, QuoteClient, QuoteError};
use url::Url;

pub use builder::HttpQuoteClientBuilder;

/// HTTP-backed quote client.
#[derive(Debug, Clone)]
pub struct HttpQuoteClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpQuoteClient {
    /// Stable connector name used in logs.
    pub const NAME: &'static str = "quotewatch-http";

    /// Build a client for `endpoint` with default transport settings.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `endpoint` is not an absolute http(s) URL.
    pub fn new(endpoint: &str) -> Result<Self, QuoteError> {
        Self::builder().endpoint(endpoint).build()
    }

    /// Start configuring a client.
    #[must_use]
    pub fn builder() -> HttpQuoteClientBuilder {
        HttpQuoteClientBuilder::new()
    }

    pub(crate) const fn from_parts(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// Normalized endpoint; its path always ends with `/`.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL requested for `code`, with the code form-encoded in the query.
    #[must_use]
    pub fn request_url(&self, code: &InstrumentCode) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().clear().append_pair("code", code.as_str());
        url
    }

    async fn fetch_inner(
        &self,
        code: &InstrumentCode,
        timeout: Duration,
    ) -> Result<Vec<Quote>, QuoteError> {
        let resp = self
            .http
            .get(self.request_url(code))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport(code, &e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(QuoteError::server(status.as_u16()));
        }

        let body = resp.bytes().await.map_err(|e| map_transport(code, &e))?;
        decode_quotes(code, &body)
    }
}

fn map_transport(code: &InstrumentCode, e: &reqwest::Error) -> QuoteError {
    if e.is_timeout() {
        QuoteError::timeout(code.as_str())
    } else if e.is_decode() {
        QuoteError::malformed(e.to_string())
    } else {
        QuoteError::network(e.to_string())
    }
}

/// Normalize a configured endpoint so the request path ends with one `/`.
pub(crate) fn normalize_endpoint(raw: &str) -> Result<Url, QuoteError> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed)
        .map_err(|e| QuoteError::InvalidArg(format!("invalid endpoint '{trimmed}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(QuoteError::InvalidArg(format!(
            "endpoint must be http or https: '{trimmed}'"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

#[async_trait]
impl QuoteClient for HttpQuoteClient {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "quotewatch_http::fetch_one",
            skip(self),
            fields(
                code = %code,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    async fn fetch_one(
        &self,
        code: &InstrumentCode,
        timeout: Duration,
    ) -> Result<Vec<Quote>, QuoteError> {
        // Outer deadline covers the body read as well as the request.
        match tokio::time::timeout(timeout, self.fetch_inner(code, timeout)).await {
            Ok(res) => res,
            Err(_) => Err(QuoteError::timeout(code.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_gets_a_single_trailing_slash() {
        let a = normalize_endpoint("https://quotes.test").unwrap();
        let b = normalize_endpoint("https://quotes.test/").unwrap();
        assert_eq!(a.as_str(), "https://quotes.test/");
        assert_eq!(a, b);

        let c = normalize_endpoint(" https://host.test/api ").unwrap();
        assert_eq!(c.as_str(), "https://host.test/api/");
    }

    #[test]
    fn endpoint_rejects_non_http() {
        assert!(matches!(
            normalize_endpoint("ftp://host.test"),
            Err(QuoteError::InvalidArg(_))
        ));
        assert!(matches!(
            normalize_endpoint("not a url"),
            Err(QuoteError::InvalidArg(_))
        ));
    }

    #[test]
    fn codes_are_query_encoded() {
        let client = HttpQuoteClient::new("http://localhost:8787").unwrap();
        let url = client.request_url(&InstrumentCode::from("USDJPY=X"));
        assert_eq!(url.as_str(), "http://localhost:8787/?code=USDJPY%3DX");
        let url = client.request_url(&InstrumentCode::from("^DJI"));
        assert_eq!(url.as_str(), "http://localhost:8787/?code=%5EDJI");
    }
}
