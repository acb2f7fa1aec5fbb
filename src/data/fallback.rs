//! Bundled market snapshot
//!
//! Used only when neither the network nor the cache can supply data. Prices
//! are in USD; `fallback_coins_in` scales them for other currencies.

use super::{Currency, MarketCoin, Sparkline};

/// A static market entry
#[derive(Debug, Clone, Copy)]
pub struct FallbackCoin {
    pub id: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    /// USD price
    pub current_price: f64,
    pub price_change_percentage_24h: f64,
    /// USD market cap
    pub market_cap: f64,
    pub image: &'static str,
    pub sparkline: Option<&'static [f64]>,
}

impl FallbackCoin {
    /// Converts to a listing entry, scaling monetary values by `multiplier`
    fn to_market_coin(self, multiplier: f64) -> MarketCoin {
        MarketCoin {
            id: self.id.to_string(),
            name: self.name.to_string(),
            symbol: self.symbol.to_string(),
            current_price: self.current_price * multiplier,
            price_change_percentage_24h: Some(self.price_change_percentage_24h),
            market_cap: Some(self.market_cap * multiplier),
            image: self.image.to_string(),
            sparkline_in_7d: self.sparkline.map(|points| Sparkline {
                price: points.iter().map(|p| p * multiplier).collect(),
            }),
        }
    }
}

/// The bundled snapshot, ordered by market cap as the headline assets expect
pub static FALLBACK_COINS: [FallbackCoin; 10] = [
    FallbackCoin {
        id: "bitcoin",
        name: "Bitcoin",
        symbol: "btc",
        current_price: 95_420.0,
        price_change_percentage_24h: 1.25,
        market_cap: 1_800_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
        sparkline: Some(&[90.0, 92.0, 91.0, 95.0, 94.0, 96.0, 95.0]),
    },
    FallbackCoin {
        id: "ethereum",
        name: "Ethereum",
        symbol: "eth",
        current_price: 2_850.0,
        price_change_percentage_24h: -0.45,
        market_cap: 350_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/279/large/ethereum.png",
        sparkline: Some(&[2700.0, 2750.0, 2800.0, 2780.0, 2850.0, 2900.0, 2850.0]),
    },
    FallbackCoin {
        id: "solana",
        name: "Solana",
        symbol: "sol",
        current_price: 145.0,
        price_change_percentage_24h: 4.2,
        market_cap: 65_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/4128/large/solana.png",
        sparkline: Some(&[130.0, 135.0, 140.0, 138.0, 142.0, 148.0, 145.0]),
    },
    FallbackCoin {
        id: "binancecoin",
        name: "BNB",
        symbol: "bnb",
        current_price: 605.0,
        price_change_percentage_24h: 0.8,
        market_cap: 90_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/825/large/binance-coin-logo.png",
        sparkline: None,
    },
    FallbackCoin {
        id: "ripple",
        name: "XRP",
        symbol: "xrp",
        current_price: 0.62,
        price_change_percentage_24h: -1.5,
        market_cap: 34_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/44/large/xrp-symbol-white-128.png",
        sparkline: None,
    },
    FallbackCoin {
        id: "cardano",
        name: "Cardano",
        symbol: "ada",
        current_price: 0.45,
        price_change_percentage_24h: 2.1,
        market_cap: 16_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/975/large/cardano.png",
        sparkline: None,
    },
    FallbackCoin {
        id: "dogecoin",
        name: "Dogecoin",
        symbol: "doge",
        current_price: 0.16,
        price_change_percentage_24h: -3.2,
        market_cap: 23_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/692/large/dogecoin.png",
        sparkline: None,
    },
    FallbackCoin {
        id: "polkadot",
        name: "Polkadot",
        symbol: "dot",
        current_price: 7.20,
        price_change_percentage_24h: 1.1,
        market_cap: 10_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/12171/large/polkadot.png",
        sparkline: None,
    },
    FallbackCoin {
        id: "tron",
        name: "TRON",
        symbol: "trx",
        current_price: 0.12,
        price_change_percentage_24h: 0.5,
        market_cap: 11_000_000_000.0,
        image: "https://assets.coingecko.com/coins/images/1094/large/tron.png",
        sparkline: None,
    },
    FallbackCoin {
        id: "chainlink",
        name: "Chainlink",
        symbol: "link",
        current_price: 14.50,
        price_change_percentage_24h: -1.8,
        market_cap: 8_500_000_000.0,
        image: "https://assets.coingecko.com/coins/images/877/large/chainlink.png",
        sparkline: None,
    },
];

/// Number of headline assets shown as cards
pub const TOP_ASSET_COUNT: usize = 3;

/// The snapshot in USD
pub fn fallback_coins() -> Vec<MarketCoin> {
    fallback_coins_in(Currency::Usd)
}

/// The snapshot converted to `currency` with its fixed multiplier
pub fn fallback_coins_in(currency: Currency) -> Vec<MarketCoin> {
    let multiplier = currency.fallback_multiplier();
    FALLBACK_COINS
        .iter()
        .map(|coin| coin.to_market_coin(multiplier))
        .collect()
}

/// The headline assets of the snapshot in `currency`
pub fn fallback_top_assets(currency: Currency) -> Vec<MarketCoin> {
    fallback_coins_in(currency)
        .into_iter()
        .take(TOP_ASSET_COUNT)
        .collect()
}

/// Looks up a snapshot entry by asset id
pub fn get_fallback_by_id(id: &str) -> Option<&'static FallbackCoin> {
    FALLBACK_COINS.iter().find(|coin| coin.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_snapshot_has_ten_unique_entries() {
        let ids: HashSet<&str> = FALLBACK_COINS.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn test_top_assets_are_bitcoin_ethereum_solana_with_sparklines() {
        let top = fallback_top_assets(Currency::Usd);
        let ids: Vec<&str> = top.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["bitcoin", "ethereum", "solana"]);
        assert!(top.iter().all(|c| c.sparkline().len() == 7));
    }

    #[test]
    fn test_idr_snapshot_is_scaled() {
        let usd = fallback_coins_in(Currency::Usd);
        let idr = fallback_coins_in(Currency::Idr);
        assert!((idr[0].current_price - usd[0].current_price * 15_000.0).abs() < 1e-6);
        assert_eq!(idr[0].price_change_percentage_24h, usd[0].price_change_percentage_24h);
    }

    #[test]
    fn test_get_fallback_by_id() {
        assert_eq!(get_fallback_by_id("tron").map(|c| c.symbol), Some("trx"));
        assert!(get_fallback_by_id("unknown").is_none());
    }

    #[test]
    fn test_prices_are_positive() {
        for coin in &FALLBACK_COINS {
            assert!(coin.current_price > 0.0, "{} should have a price", coin.id);
            assert!(coin.market_cap > 0.0);
        }
    }
}
