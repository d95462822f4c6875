use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display metadata for an SPL token mint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usdt: Option<Decimal>,
}

impl TokenMetadata {
    pub fn new(
        mint: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        decimals: u8,
    ) -> Self {
        Self {
            mint: mint.into(),
            symbol: symbol.into(),
            name: name.into(),
            decimals,
            price_usdt: None,
        }
    }

    /// Placeholder for a mint no source could describe.
    pub fn unknown(mint: impl Into<String>) -> Self {
        Self::new(mint, "UNKNOWN", "Unknown Token", 9)
    }
}
