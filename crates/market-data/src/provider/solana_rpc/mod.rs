//! Minimal Solana JSON-RPC adapter.
//!
//! Only the two calls the dashboard needs: `getHealth` for endpoint probing
//! and `getBalance` for the wallet panel. The endpoint URL is the candidate
//! identifier and is passed per call.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use solbot_resilience::SourceError;

use super::http::{build_client, fetch_json};

const PROVIDER_ID: &str = "SOLANA_RPC";

/// JSON-RPC "invalid params"; for getBalance this means a bad address.
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    value: u64,
}

#[derive(Clone)]
pub struct SolanaRpc {
    client: Client,
}

impl SolanaRpc {
    pub fn new() -> Self {
        Self {
            client: build_client(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: &str,
        params: Value,
    ) -> Result<T, SourceError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let request = self.client.post(endpoint).json(&body);
        let response: RpcResponse<T> = fetch_json(request, PROVIDER_ID, method).await?;

        if let Some(error) = response.error {
            return Err(if error.code == INVALID_PARAMS {
                SourceError::NotFound {
                    provider: PROVIDER_ID.to_string(),
                    what: format!("{method}: {}", error.message),
                }
            } else {
                SourceError::Rejected {
                    provider: PROVIDER_ID.to_string(),
                    message: format!("{method} error {}: {}", error.code, error.message),
                }
            });
        }
        response.result.ok_or_else(|| SourceError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: format!("{method}: neither result nor error"),
        })
    }

    /// `Ok` only when the node reports itself healthy.
    pub async fn get_health(&self, endpoint: &str) -> Result<(), SourceError> {
        let status: String = self.call(endpoint, "getHealth", json!([])).await?;
        if status == "ok" {
            Ok(())
        } else {
            Err(SourceError::Rejected {
                provider: PROVIDER_ID.to_string(),
                message: format!("getHealth: {status}"),
            })
        }
    }

    /// Balance of `address` in lamports.
    pub async fn get_balance(&self, endpoint: &str, address: &str) -> Result<u64, SourceError> {
        let balance: BalanceResult = self
            .call(endpoint, "getBalance", json!([address]))
            .await?;
        Ok(balance.value)
    }
}

impl Default for SolanaRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;

    fn method_matcher(method: &str) -> Matcher {
        Matcher::Regex(format!(r#""method"\s*:\s*"{method}""#))
    }

    #[tokio::test]
    async fn test_get_health() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(method_matcher("getHealth"))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"ok"}"#)
            .create_async()
            .await;

        let rpc = SolanaRpc::new();
        assert!(rpc.get_health(&server.url()).await.is_ok());
    }

    #[tokio::test]
    async fn test_unhealthy_node() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"Node is behind by 42 slots"}}"#)
            .create_async()
            .await;

        let err = SolanaRpc::new().get_health(&server.url()).await.unwrap_err();
        assert!(matches!(err, SourceError::Rejected { .. }));
        assert!(err.to_string().contains("behind"));
    }

    #[tokio::test]
    async fn test_get_balance() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .match_body(Matcher::AllOf(vec![
                method_matcher("getBalance"),
                Matcher::Regex("Wallet1111".to_string()),
            ]))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"context":{"slot":1},"value":2500000000}}"#)
            .create_async()
            .await;

        let balance = SolanaRpc::new()
            .get_balance(&server.url(), "Wallet1111")
            .await
            .unwrap();
        assert_eq!(balance, 2_500_000_000);
    }

    #[tokio::test]
    async fn test_invalid_address_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"Invalid param: WrongSize"}}"#)
            .create_async()
            .await;

        let err = SolanaRpc::new()
            .get_balance(&server.url(), "bad")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }
}
