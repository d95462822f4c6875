use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Assets the dashboard quotes, with each provider's name for them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Sol,
    Btc,
    Eth,
    Usdc,
}

impl Asset {
    pub const ALL: [Asset; 4] = [Asset::Sol, Asset::Btc, Asset::Eth, Asset::Usdc];

    pub fn ticker(&self) -> &'static str {
        match self {
            Asset::Sol => "SOL",
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Usdc => "USDC",
        }
    }

    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Asset::Sol => "solana",
            Asset::Btc => "bitcoin",
            Asset::Eth => "ethereum",
            Asset::Usdc => "usd-coin",
        }
    }

    pub fn binance_symbol(&self) -> &'static str {
        match self {
            Asset::Sol => "SOLUSDT",
            Asset::Btc => "BTCUSDT",
            Asset::Eth => "ETHUSDT",
            Asset::Usdc => "USDCUSDT",
        }
    }

    /// Kraken still calls bitcoin XBT.
    pub fn kraken_pair(&self) -> &'static str {
        match self {
            Asset::Sol => "SOLUSD",
            Asset::Btc => "XBTUSD",
            Asset::Eth => "ETHUSD",
            Asset::Usdc => "USDCUSD",
        }
    }

    pub fn okx_instrument(&self) -> &'static str {
        match self {
            Asset::Sol => "SOL-USDT",
            Asset::Btc => "BTC-USDT",
            Asset::Eth => "ETH-USDT",
            Asset::Usdc => "USDC-USDT",
        }
    }

    /// Coinbase has no USDC-USD book; USDC is its settlement currency.
    pub fn coinbase_product(&self) -> Option<&'static str> {
        match self {
            Asset::Sol => Some("SOL-USD"),
            Asset::Btc => Some("BTC-USD"),
            Asset::Eth => Some("ETH-USD"),
            Asset::Usdc => None,
        }
    }

    /// Price used when every provider is unreachable.
    pub fn last_resort_price(&self) -> Decimal {
        match self {
            Asset::Sol => dec!(150),
            Asset::Btc => dec!(60000),
            Asset::Eth => dec!(3000),
            Asset::Usdc => dec!(1),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

/// Error for an asset name nothing maps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownAsset(pub String);

impl fmt::Display for UnknownAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown asset '{}'", self.0)
    }
}

impl std::error::Error for UnknownAsset {}

impl FromStr for Asset {
    type Err = UnknownAsset;

    /// Accepts tickers and CoinGecko ids, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Asset::ALL
            .into_iter()
            .find(|asset| {
                asset.ticker().eq_ignore_ascii_case(&lower) || asset.coingecko_id() == lower
            })
            .ok_or_else(|| UnknownAsset(s.to_string()))
    }
}
