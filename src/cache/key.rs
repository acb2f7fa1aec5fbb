//! Typed cache keys
//!
//! The store is keyed by plain strings, so two logically different requests
//! that render to the same string would share one cached answer. `CacheKey`
//! carries every parameter that changes the response and renders them in a
//! fixed order.

use std::fmt;

use crate::data::Currency;

/// Identifies one cacheable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Simple price lookup for a set of assets
    SimplePrices { currency: Currency, ids: Vec<String> },
    /// Headline assets shown as cards (with 7-day sparklines)
    TopAssets { currency: Currency },
    /// One page of the market table
    MarketPage { currency: Currency, page: u32 },
    /// Historical price series for one asset
    MainChart {
        asset: String,
        currency: Currency,
        days: u32,
    },
    /// The user's holdings record
    Portfolio,
}

impl CacheKey {
    /// Builds a simple-price key; ids are sorted and deduplicated
    pub fn simple_prices<I, S>(currency: Currency, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        CacheKey::SimplePrices { currency, ids }
    }

    /// Store-key prefix shared by every simple-price key in `currency`,
    /// whatever ids it was built from
    pub fn simple_prices_prefix(currency: Currency) -> String {
        format!("simple_prices_{}_", currency.code())
    }

    /// Renders the key as the string used by the store
    pub fn as_store_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::SimplePrices { currency, ids } => {
                write!(f, "simple_prices_{}_{}", currency.code(), ids.join(","))
            }
            CacheKey::TopAssets { currency } => write!(f, "top_assets_{}", currency.code()),
            CacheKey::MarketPage { currency, page } => {
                write!(f, "market_page_{}_{}", currency.code(), page)
            }
            CacheKey::MainChart {
                asset,
                currency,
                days,
            } => write!(f, "main_chart_{}_{}_{}", asset, currency.code(), days),
            CacheKey::Portfolio => f.write_str("my_portfolio"),
        }
    }
}
