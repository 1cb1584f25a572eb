use std::time::Duration;

use quotewatch_core::{DEFAULT_API_ENDPOINT, QuoteError};

use crate::{HttpQuoteClient, normalize_endpoint};

/// Configures an [`HttpQuoteClient`].
///
/// Defaults to [`DEFAULT_API_ENDPOINT`] and a fresh `reqwest::Client`.
#[derive(Debug, Default)]
pub struct HttpQuoteClientBuilder {
    endpoint: Option<String>,
    user_agent: Option<String>,
    connect_timeout: Option<Duration>,
    http: Option<reqwest::Client>,
}

impl HttpQuoteClientBuilder {
    /// Returns an unconfigured builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base URL of the quote service.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// `User-Agent` header sent with each request. Ignored with [`Self::http_client`].
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// TCP connect timeout. Ignored with [`Self::http_client`].
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Use a preconfigured `reqwest::Client`.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an unusable endpoint and `NetworkUnavailable`
    /// if the underlying HTTP client cannot be initialized.
    pub fn build(self) -> Result<HttpQuoteClient, QuoteError> {
        let endpoint =
            normalize_endpoint(self.endpoint.as_deref().unwrap_or(DEFAULT_API_ENDPOINT))?;
        let http = match self.http {
            Some(http) => http,
            None => {
                let mut b = reqwest::Client::builder().user_agent(
                    self.user_agent
                        .unwrap_or_else(|| concat!("quotewatch/", env!("CARGO_PKG_VERSION")).into()),
                );
                if let Some(t) = self.connect_timeout {
                    b = b.connect_timeout(t);
                }
                b.build().map_err(|e| QuoteError::network(e.to_string()))?
            }
        };
        Ok(HttpQuoteClient::from_parts(http, endpoint))
    }
}
