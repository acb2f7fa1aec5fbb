//! Portfolio valuation with tiered price fallback
//!
//! Prices come from the first tier that yields a map:
//! 1. the simple-price lookup through the resolver (fresh cache or live),
//! 2. the cached headline listing for the same currency, whatever its age,
//! 3. the bundled snapshot scaled by the currency's fixed multiplier.
//!
//! Valuation never fails; an empty portfolio is worth zero.

use tracing::debug;

use crate::data::{
    fallback_coins_in, price_for, price_map_from_coins, Currency, MarketClient, PriceMap,
};

use super::Portfolio;

/// Where the prices for a valuation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    /// No prices were needed
    Empty,
    /// Simple-price lookup (fresh cache entry or live fetch)
    Live,
    /// Cached headline listing, possibly stale
    ListingCache,
    /// Bundled snapshot
    Snapshot,
}

/// Result of valuing a portfolio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    /// Total in the requested currency
    pub total: f64,
    pub currency: Currency,
    pub source: PriceSource,
}

/// Sums quantity times price for every holding with a non-zero price
pub fn total_value(portfolio: &Portfolio, prices: &PriceMap, currency: Currency) -> f64 {
    portfolio
        .iter()
        .filter_map(|(asset, qty)| {
            price_for(prices, asset, currency)
                .filter(|price| *price != 0.0 && price.is_finite())
                .map(|price| qty * price)
        })
        .sum()
}

/// Values `portfolio` in `currency`, degrading through the price tiers
pub async fn value_portfolio(
    market: &MarketClient,
    portfolio: &Portfolio,
    currency: Currency,
) -> Valuation {
    if portfolio.is_empty() {
        return Valuation {
            total: 0.0,
            currency,
            source: PriceSource::Empty,
        };
    }

    let (prices, source) = match market.simple_prices(currency, &portfolio.asset_ids()).await {
        Some(prices) => (prices, PriceSource::Live),
        None => match market.cached_top_assets(currency) {
            Some(coins) => {
                debug!(currency = currency.code(), "valuing from cached listing");
                (price_map_from_coins(&coins, currency), PriceSource::ListingCache)
            }
            None => {
                debug!(currency = currency.code(), "valuing from bundled snapshot");
                (
                    price_map_from_coins(&fallback_coins_in(currency), currency),
                    PriceSource::Snapshot,
                )
            }
        },
    };

    Valuation {
        total: total_value(portfolio, &prices, currency),
        currency,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEntry, CacheKey, KeyValueStore, MemoryStore, Reply, Resolver, ScriptedTransport};
    use chrono::Utc;
    use serde_json::json;
    use std::sync::Arc;

    fn market_with(transport: Arc<ScriptedTransport>) -> (MarketClient, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let resolver = Resolver::new(store.clone(), transport);
        (MarketClient::with_base_url(resolver, "https://example.test"), store)
    }

    fn seed_listing(store: &MemoryStore, currency: Currency, body: serde_json::Value, expiry: i64) {
        let entry = CacheEntry { data: body, expiry };
        store
            .set(
                &CacheKey::TopAssets { currency }.as_store_key(),
                &entry.to_text().unwrap(),
            )
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_portfolio_is_zero_without_lookups() {
        let transport = ScriptedTransport::json(json!({"bitcoin": {"usd": 50000.0}}));
        let (market, _store) = market_with(transport.clone());

        let valuation = value_portfolio(&market, &Portfolio::new(), Currency::Usd).await;

        assert_eq!(valuation.total, 0.0);
        assert_eq!(valuation.source, PriceSource::Empty);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_live_prices_are_used_first() {
        let transport = ScriptedTransport::json(json!({
            "bitcoin": {"usd": 50000.0},
            "ethereum": {"usd": 3000.0}
        }));
        let (market, _store) = market_with(transport);
        let portfolio: Portfolio = [("bitcoin", 2.0), ("ethereum", 1.0)].into_iter().collect();

        let valuation = value_portfolio(&market, &portfolio, Currency::Usd).await;

        assert_eq!(valuation.total, 103_000.0);
        assert_eq!(valuation.source, PriceSource::Live);
    }

    #[tokio::test]
    async fn test_failed_lookup_uses_cached_listing() {
        let (market, store) = market_with(ScriptedTransport::new(Reply::Status(429)));
        seed_listing(
            &store,
            Currency::Usd,
            json!([{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "image": "",
                    "current_price": 50000.0}]),
            Utc::now().timestamp_millis() + 60_000,
        );
        let portfolio: Portfolio = [("bitcoin", 2.0)].into_iter().collect();

        let valuation = value_portfolio(&market, &portfolio, Currency::Usd).await;

        assert_eq!(valuation.total, 100_000.0);
        assert_eq!(valuation.source, PriceSource::ListingCache);
    }

    #[tokio::test]
    async fn test_cached_listing_is_used_even_when_expired() {
        let (market, store) = market_with(ScriptedTransport::new(Reply::Unreachable));
        seed_listing(
            &store,
            Currency::Usd,
            json!([{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "image": "",
                    "current_price": 50000.0}]),
            0,
        );
        let portfolio: Portfolio = [("bitcoin", 2.0)].into_iter().collect();

        let valuation = value_portfolio(&market, &portfolio, Currency::Usd).await;

        assert_eq!(valuation.total, 100_000.0);
    }

    #[tokio::test]
    async fn test_listing_for_other_currency_is_ignored() {
        let (market, store) = market_with(ScriptedTransport::new(Reply::Unreachable));
        seed_listing(
            &store,
            Currency::Idr,
            json!([{"id": "bitcoin", "symbol": "btc", "name": "Bitcoin", "image": "",
                    "current_price": 1.0}]),
            0,
        );
        let portfolio: Portfolio = [("bitcoin", 1.0)].into_iter().collect();

        let valuation = value_portfolio(&market, &portfolio, Currency::Usd).await;

        assert_eq!(valuation.source, PriceSource::Snapshot);
        assert_eq!(valuation.total, 95_420.0);
    }

    #[tokio::test]
    async fn test_snapshot_applies_currency_multiplier() {
        let (market, _store) = market_with(ScriptedTransport::new(Reply::Unreachable));
        let portfolio: Portfolio = [("solana", 2.0)].into_iter().collect();

        let valuation = value_portfolio(&market, &portfolio, Currency::Idr).await;

        assert_eq!(valuation.source, PriceSource::Snapshot);
        assert_eq!(valuation.total, 2.0 * 145.0 * 15_000.0);
    }

    #[test]
    fn test_total_value_skips_unpriced_and_zero_priced_assets() {
        let portfolio: Portfolio = [("bitcoin", 1.0), ("mystery", 100.0), ("dust", 5.0)]
            .into_iter()
            .collect();
        let prices: PriceMap = serde_json::from_value(json!({
            "bitcoin": {"usd": 10.0},
            "dust": {"usd": 0.0}
        }))
        .unwrap();

        assert_eq!(total_value(&portfolio, &prices, Currency::Usd), 10.0);
    }
}
