//! CoinGecko market-data client
//!
//! Builds provider requests and resolves them through the freshness cache.
//! Every method returns usable data: when both the network and the cache
//! are unavailable the bundled snapshot (or an empty series) is returned.

use crate::cache::{CacheKey, RemoteRequest, Resolver};

use super::fallback::{fallback_coins_in, fallback_top_assets, FALLBACK_COINS, TOP_ASSET_COUNT};
use super::{Currency, MarketChart, MarketCoin, PriceMap, Timeframe};

/// Base URL for the CoinGecko v3 API
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Rows per market table page
pub const PAGE_SIZE: u32 = 10;

/// Freshness window for listings and charts, in minutes
pub const MARKET_FRESHNESS_MINS: u64 = 5;

/// Freshness window for portfolio price lookups, in minutes
pub const PRICE_FRESHNESS_MINS: u64 = 2;

/// Asset whose history backs the main chart
pub const MAIN_CHART_ASSET: &str = "bitcoin";

/// Client for CoinGecko resources backed by the resolver
#[derive(Debug, Clone)]
pub struct MarketClient {
    resolver: Resolver,
    base_url: String,
}

impl MarketClient {
    /// Creates a client against the public API
    pub fn new(resolver: Resolver) -> Self {
        Self::with_base_url(resolver, COINGECKO_BASE_URL)
    }

    /// Creates a client against a custom base URL (mirrors, testing)
    pub fn with_base_url(resolver: Resolver, base_url: impl Into<String>) -> Self {
        Self {
            resolver,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The resolver backing this client
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Request for the headline assets with 7-day sparklines
    pub fn top_assets_request(&self, currency: Currency) -> RemoteRequest {
        let ids: Vec<&str> = FALLBACK_COINS
            .iter()
            .take(TOP_ASSET_COUNT)
            .map(|c| c.id)
            .collect();
        RemoteRequest::get(format!(
            "{}/coins/markets?vs_currency={}&ids={}&sparkline=true",
            self.base_url,
            currency.code(),
            ids.join(",")
        ))
    }

    /// Request for one page of the market table
    pub fn market_page_request(&self, currency: Currency, page: u32) -> RemoteRequest {
        RemoteRequest::get(format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={}&page={}",
            self.base_url,
            currency.code(),
            PAGE_SIZE,
            page
        ))
    }

    /// Request for the historical series of `asset`
    pub fn market_chart_request(&self, asset: &str, currency: Currency, days: u32) -> RemoteRequest {
        RemoteRequest::get(format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}",
            self.base_url,
            asset,
            currency.code(),
            days
        ))
    }

    /// Request for simple prices of `ids`
    pub fn simple_prices_request(&self, currency: Currency, ids: &[String]) -> RemoteRequest {
        RemoteRequest::get(format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            currency.code()
        ))
    }

    /// Headline assets, falling back to the bundled snapshot
    pub async fn top_assets(&self, currency: Currency) -> Vec<MarketCoin> {
        self.resolver
            .resolve_or(
                &CacheKey::TopAssets { currency },
                &self.top_assets_request(currency),
                fallback_top_assets(currency),
                Some(MARKET_FRESHNESS_MINS),
            )
            .await
    }

    /// One page of the market table, falling back to the bundled snapshot
    pub async fn market_page(&self, currency: Currency, page: u32) -> Vec<MarketCoin> {
        let page = page.max(1);
        self.resolver
            .resolve_or(
                &CacheKey::MarketPage { currency, page },
                &self.market_page_request(currency, page),
                fallback_coins_in(currency),
                Some(MARKET_FRESHNESS_MINS),
            )
            .await
    }

    /// Historical series for the main chart; empty when unavailable
    pub async fn main_chart(&self, currency: Currency, timeframe: Timeframe) -> MarketChart {
        let days = timeframe.days();
        let chart = self
            .resolver
            .resolve_or(
                &CacheKey::MainChart {
                    asset: MAIN_CHART_ASSET.to_string(),
                    currency,
                    days,
                },
                &self.market_chart_request(MAIN_CHART_ASSET, currency, days),
                MarketChart::default(),
                Some(MARKET_FRESHNESS_MINS),
            )
            .await;

        match timeframe.trailing_minutes() {
            Some(minutes) => chart.trailing(minutes),
            None => chart,
        }
    }

    /// Simple prices for `ids`; `None` when the lookup is unavailable
    pub async fn simple_prices(&self, currency: Currency, ids: &[String]) -> Option<PriceMap> {
        let key = CacheKey::simple_prices(currency, ids.iter().cloned());
        let sorted_ids = match &key {
            CacheKey::SimplePrices { ids, .. } => ids.clone(),
            _ => ids.to_vec(),
        };
        self.resolver
            .resolve(
                &key,
                &self.simple_prices_request(currency, &sorted_ids),
                None,
                Some(PRICE_FRESHNESS_MINS),
            )
            .await
    }

    /// The cached headline listing for `currency`, regardless of age
    pub fn cached_top_assets(&self, currency: Currency) -> Option<Vec<MarketCoin>> {
        self.resolver.peek_any(&CacheKey::TopAssets { currency })
    }

    /// Drops the cached listing and every cached price lookup for `currency`
    pub fn invalidate_currency(&self, currency: Currency) {
        self.resolver.invalidate(&[CacheKey::TopAssets { currency }]);
        self.resolver
            .invalidate_prefix(&CacheKey::simple_prices_prefix(currency));
    }
}
