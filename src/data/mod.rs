//! Core market data models
//!
//! Types shared by the provider client, the portfolio and the UI. Field names
//! of the provider-facing structs match the CoinGecko JSON so they decode
//! directly and round-trip through the cache unchanged.

pub mod coingecko;
pub mod fallback;
pub mod format;

pub use coingecko::MarketClient;
pub use fallback::{
    fallback_coins, fallback_coins_in, fallback_top_assets, get_fallback_by_id, FALLBACK_COINS,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Target currency for prices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// US dollar, the primary currency of the bundled dataset
    #[default]
    Usd,
    /// Indonesian rupiah
    Idr,
}

impl Currency {
    /// All supported currencies in toggle order
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Idr];

    /// Provider currency code
    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Idr => "idr",
        }
    }

    /// Prefix shown before amounts
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Idr => "Rp ",
        }
    }

    /// Fixed conversion applied to USD fallback prices
    pub fn fallback_multiplier(self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Idr => 15_000.0,
        }
    }

    /// Next currency in toggle order
    pub fn toggled(self) -> Self {
        match self {
            Currency::Usd => Currency::Idr,
            Currency::Idr => Currency::Usd,
        }
    }

    /// Parses a currency code, case-insensitively
    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "usd" | "$" => Some(Currency::Usd),
            "idr" | "rp" => Some(Currency::Idr),
            _ => None,
        }
    }
}

/// 7-day price series attached to a market listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sparkline {
    pub price: Vec<f64>,
}

/// One asset in a market listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCoin {
    /// Provider asset id (e.g. "bitcoin")
    pub id: String,
    /// Display name
    pub name: String,
    /// Ticker symbol, lowercase as delivered
    pub symbol: String,
    /// Current price in the requested currency
    pub current_price: f64,
    /// Percentage change over the last 24 hours
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    /// Market capitalisation in the requested currency
    #[serde(default)]
    pub market_cap: Option<f64>,
    /// Logo URL
    #[serde(default)]
    pub image: String,
    /// 7-day sparkline, present when requested
    #[serde(default)]
    pub sparkline_in_7d: Option<Sparkline>,
}

impl MarketCoin {
    /// 24h change, treating a missing value as flat
    pub fn change_24h(&self) -> f64 {
        self.price_change_percentage_24h.unwrap_or(0.0)
    }

    /// Whether the 24h change is non-negative
    pub fn is_up(&self) -> bool {
        self.change_24h() >= 0.0
    }

    /// Sparkline points, empty when absent
    pub fn sparkline(&self) -> &[f64] {
        self.sparkline_in_7d
            .as_ref()
            .map(|s| s.price.as_slice())
            .unwrap_or(&[])
    }
}

/// Asset id -> currency code -> price, as returned by the simple-price endpoint
pub type PriceMap = HashMap<String, HashMap<String, f64>>;

/// Builds a price map from listing entries priced in `currency`
pub fn price_map_from_coins(coins: &[MarketCoin], currency: Currency) -> PriceMap {
    coins
        .iter()
        .map(|coin| {
            let mut by_currency = HashMap::new();
            by_currency.insert(currency.code().to_string(), coin.current_price);
            (coin.id.clone(), by_currency)
        })
        .collect()
}

/// Looks up the price of `asset` in `currency`
pub fn price_for(prices: &PriceMap, asset: &str, currency: Currency) -> Option<f64> {
    prices.get(asset)?.get(currency.code()).copied()
}

/// Historical price series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketChart {
    /// `(timestamp in ms, price)` pairs in chronological order
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
}

impl MarketChart {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Keeps only points within `minutes` of the last point
    pub fn trailing(mut self, minutes: i64) -> Self {
        if let Some(&(last, _)) = self.prices.last() {
            let cutoff = last - (minutes * 60_000) as f64;
            self.prices.retain(|&(ts, _)| ts >= cutoff);
        }
        self
    }

    /// Lowest and highest price, if any
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let mut iter = self.prices.iter().map(|&(_, p)| p);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }
}

/// Range of the historical chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Timeframe {
    OneHour,
    #[default]
    OneDay,
    OneWeek,
}

impl Timeframe {
    /// Day range requested from the provider
    pub fn days(self) -> u32 {
        match self {
            Timeframe::OneHour | Timeframe::OneDay => 1,
            Timeframe::OneWeek => 7,
        }
    }

    /// Trailing window applied after fetching, if narrower than a day
    pub fn trailing_minutes(self) -> Option<i64> {
        match self {
            Timeframe::OneHour => Some(60),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::OneHour => "1H",
            Timeframe::OneDay => "1D",
            Timeframe::OneWeek => "1W",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_codes_and_symbols() {
        assert_eq!(Currency::Usd.code(), "usd");
        assert_eq!(Currency::Idr.code(), "idr");
        assert_eq!(Currency::Usd.symbol(), "$");
        assert_eq!(Currency::Idr.symbol(), "Rp ");
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("USD"), Some(Currency::Usd));
        assert_eq!(Currency::from_code(" idr "), Some(Currency::Idr));
        assert_eq!(Currency::from_code("eur"), None);
    }

    #[test]
    fn test_currency_toggle_cycles() {
        assert_eq!(Currency::Usd.toggled(), Currency::Idr);
        assert_eq!(Currency::Idr.toggled(), Currency::Usd);
    }

    #[test]
    fn test_fallback_multiplier() {
        assert_eq!(Currency::Usd.fallback_multiplier(), 1.0);
        assert_eq!(Currency::Idr.fallback_multiplier(), 15_000.0);
    }

    #[test]
    fn test_market_coin_decodes_provider_json() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
            "current_price": 95420,
            "market_cap": 1800000000000,
            "market_cap_rank": 1,
            "price_change_percentage_24h": 1.25,
            "sparkline_in_7d": { "price": [90, 92, 91] }
        }"#;
        let coin: MarketCoin = serde_json::from_str(json).unwrap();
        assert_eq!(coin.id, "bitcoin");
        assert!((coin.current_price - 95420.0).abs() < f64::EPSILON);
        assert!(coin.is_up());
        assert_eq!(coin.sparkline(), &[90.0, 92.0, 91.0]);
    }

    #[test]
    fn test_market_coin_null_change_is_flat() {
        let json = r#"{"id":"x","symbol":"x","name":"X","current_price":1.0,
                       "price_change_percentage_24h":null,"market_cap":null}"#;
        let coin: MarketCoin = serde_json::from_str(json).unwrap();
        assert_eq!(coin.change_24h(), 0.0);
        assert!(coin.is_up());
        assert!(coin.sparkline().is_empty());
    }

    #[test]
    fn test_price_map_from_coins() {
        let coins: Vec<MarketCoin> = fallback_coins().into_iter().take(2).collect();
        let map = price_map_from_coins(&coins, Currency::Usd);
        assert_eq!(price_for(&map, "bitcoin", Currency::Usd), Some(95_420.0));
        assert_eq!(price_for(&map, "bitcoin", Currency::Idr), None);
        assert_eq!(price_for(&map, "solana", Currency::Usd), None);
    }

    #[test]
    fn test_simple_price_response_decodes_into_price_map() {
        let map: PriceMap =
            serde_json::from_str(r#"{"bitcoin":{"usd":95000.5},"solana":{"usd":145}}"#).unwrap();
        assert_eq!(price_for(&map, "solana", Currency::Usd), Some(145.0));
    }

    #[test]
    fn test_market_chart_decodes_and_trails() {
        let chart: MarketChart = serde_json::from_str(
            r#"{"prices":[[0,1.0],[1800000,2.0],[3600000,3.0],[5400000,4.0]],"market_caps":[]}"#,
        )
        .unwrap();
        assert_eq!(chart.prices.len(), 4);
        assert_eq!(chart.bounds(), Some((1.0, 4.0)));

        let hour = chart.trailing(60);
        assert_eq!(hour.prices, vec![(1_800_000.0, 2.0), (3_600_000.0, 3.0), (5_400_000.0, 4.0)]);
    }

    #[test]
    fn test_empty_chart_has_no_bounds() {
        let chart = MarketChart::default();
        assert!(chart.is_empty());
        assert!(chart.bounds().is_none());
        assert!(chart.trailing(60).is_empty());
    }

    #[test]
    fn test_timeframe_days() {
        assert_eq!(Timeframe::OneHour.days(), 1);
        assert_eq!(Timeframe::OneDay.days(), 1);
        assert_eq!(Timeframe::OneWeek.days(), 7);
        assert_eq!(Timeframe::OneHour.trailing_minutes(), Some(60));
        assert_eq!(Timeframe::OneWeek.trailing_minutes(), None);
    }
}
