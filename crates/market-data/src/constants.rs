//! Default endpoints and last-resort tables.

use crate::models::TokenMetadata;

/// Environment variable holding CoinGecko API keys.
pub const COINGECKO_KEYS_ENV: &str = "COINGECKO_API_KEYS";

/// Environment variable holding Solana RPC endpoint URLs.
pub const SOLANA_RPC_URLS_ENV: &str = "SOLANA_RPC_URLS";

/// Environment variable holding Jupiter token API base URLs.
pub const JUPITER_API_URLS_ENV: &str = "JUPITER_API_URLS";

/// Public mainnet endpoints used when no RPC URLs are configured.
pub const DEFAULT_SOLANA_RPC_URLS: &[&str] = &[
    "https://api.mainnet-beta.solana.com",
    "https://solana-rpc.publicnode.com",
    "https://rpc.ankr.com/solana",
    "https://solana.drpc.org",
    "https://solana-mainnet.g.alchemy.com/v2/demo",
    "https://mainnet.rpcpool.com",
];

/// Jupiter token API bases used when none are configured.
pub const DEFAULT_JUPITER_API_URLS: &[&str] =
    &["https://lite-api.jup.ag/tokens/v1", "https://tokens.jup.ag"];

pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const BINANCE_BASE_URL: &str = "https://api.binance.com";
pub const KRAKEN_BASE_URL: &str = "https://api.kraken.com";
pub const OKX_BASE_URL: &str = "https://www.okx.com";
pub const COINBASE_BASE_URL: &str = "https://api.exchange.coinbase.com";
pub const CRYPTOCOMPARE_BASE_URL: &str = "https://min-api.cryptocompare.com";
pub const JUPITER_PRICE_URL: &str = "https://lite-api.jup.ag/price/v2";
pub const SOLSCAN_BASE_URL: &str = "https://public-api.solscan.io";
pub const BIRDEYE_BASE_URL: &str = "https://public-api.birdeye.so";

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

/// Number of points a chart series is thinned to.
pub const HISTORY_POINTS: usize = 7;

/// Metadata for mints every dashboard shows, or `None`.
pub fn well_known_token(mint: &str) -> Option<TokenMetadata> {
    match mint {
        SOL_MINT => Some(TokenMetadata::new(mint, "SOL", "Wrapped SOL", 9)),
        USDC_MINT => Some(TokenMetadata::new(mint, "USDC", "USD Coin", 6)),
        USDT_MINT => Some(TokenMetadata::new(mint, "USDT", "USDT", 6)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_tokens() {
        assert_eq!(well_known_token(USDC_MINT).unwrap().decimals, 6);
        assert_eq!(well_known_token(SOL_MINT).unwrap().symbol, "SOL");
        assert!(well_known_token("not-a-mint").is_none());
    }
}
