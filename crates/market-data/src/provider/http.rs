//! Shared request plumbing for the HTTP adapters.

use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use solbot_resilience::SourceError;

/// Transport-level timeout. Attempts are bounded more tightly by the
/// orchestrator; this only stops sockets from hanging forever.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("solbot/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client() -> Client {
    Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Map a transport error. The URL is stripped because RPC URLs may carry
/// credentials.
pub(crate) fn transport_error(provider: &str, error: reqwest::Error) -> SourceError {
    if error.is_timeout() {
        SourceError::Timeout {
            provider: provider.to_string(),
        }
    } else if error.is_decode() {
        SourceError::Malformed {
            provider: provider.to_string(),
            message: error.without_url().to_string(),
        }
    } else {
        SourceError::Network {
            provider: provider.to_string(),
            message: error.without_url().to_string(),
        }
    }
}

/// Send a request and decode a JSON body.
///
/// 404 becomes [`SourceError::NotFound`] for `what`; other non-2xx statuses
/// go through [`SourceError::from_status`].
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
    what: &str,
) -> Result<T, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, e))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(SourceError::NotFound {
            provider: provider.to_string(),
            what: what.to_string(),
        });
    }
    if !status.is_success() {
        return Err(SourceError::from_status(provider, status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| transport_error(provider, e))?;
    serde_json::from_str(&body).map_err(|e| SourceError::Malformed {
        provider: provider.to_string(),
        message: e.to_string(),
    })
}

/// Parse a decimal that a provider sent as a string.
pub(crate) fn parse_decimal(provider: &str, field: &str, raw: &str) -> Result<Decimal, SourceError> {
    Decimal::from_str(raw.trim()).map_err(|e| SourceError::Malformed {
        provider: provider.to_string(),
        message: format!("{field}: {e}"),
    })
}

/// Convert a float a provider sent as a JSON number.
pub(crate) fn decimal_from_f64(provider: &str, field: &str, value: f64) -> Result<Decimal, SourceError> {
    Decimal::try_from(value).map_err(|e| SourceError::Malformed {
        provider: provider.to_string(),
        message: format!("{field}: {e}"),
    })
}
