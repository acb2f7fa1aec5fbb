//! Locally tracked holdings
//!
//! The portfolio maps asset ids to quantities and lives only on this device,
//! persisted in the key-value store under the `my_portfolio` key. Adding an
//! amount is additive; invalid amounts are rejected without changing state.

pub mod valuation;

pub use valuation::{total_value, value_portfolio, PriceSource, Valuation};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::cache::{CacheKey, KeyValueStore, StoreError};

/// Holdings used when nothing has been persisted yet
pub const DEFAULT_HOLDINGS: [(&str, f64); 3] = [("bitcoin", 0.1), ("ethereum", 1.2), ("solana", 5.5)];

/// Errors raised by portfolio operations
#[derive(Debug, Error)]
pub enum PortfolioError {
    /// Amount is not a finite number greater than zero
    #[error("Please enter a valid amount")]
    InvalidAmount(String),

    /// Holdings could not be persisted
    #[error("Failed to save portfolio: {0}")]
    Store(#[from] StoreError),
}

/// Asset id to quantity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio {
    holdings: BTreeMap<String, f64>,
}

impl Portfolio {
    /// An empty portfolio
    pub fn new() -> Self {
        Self::default()
    }

    /// The demo holdings
    pub fn with_defaults() -> Self {
        Self {
            holdings: DEFAULT_HOLDINGS
                .iter()
                .map(|(id, qty)| (id.to_string(), *qty))
                .collect(),
        }
    }

    /// Loads the persisted portfolio
    ///
    /// Falls back to the demo holdings when nothing is stored or the stored
    /// record cannot be read.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let Some(text) = store.get(&CacheKey::Portfolio.as_store_key()) else {
            return Self::with_defaults();
        };
        match serde_json::from_str::<Portfolio>(&text) {
            Ok(portfolio) => portfolio.sanitized(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable portfolio record");
                Self::with_defaults()
            }
        }
    }

    /// Persists the portfolio
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), PortfolioError> {
        let text = serde_json::to_string(self).map_err(StoreError::from)?;
        store.set(&CacheKey::Portfolio.as_store_key(), &text)?;
        Ok(())
    }

    /// Adds `amount` of `asset` to the existing quantity
    pub fn add(&mut self, asset: &str, amount: f64) -> Result<f64, PortfolioError> {
        validate_amount(amount)?;
        let quantity = self.holdings.entry(asset.to_string()).or_insert(0.0);
        *quantity += amount;
        Ok(*quantity)
    }

    /// Parses `input` and adds it to `asset`
    pub fn add_from_input(&mut self, asset: &str, input: &str) -> Result<f64, PortfolioError> {
        let amount = parse_amount(input)?;
        self.add(asset, amount)?;
        Ok(amount)
    }

    /// Removes every holding
    pub fn clear(&mut self) {
        self.holdings.clear();
    }

    /// Quantity held of `asset` (zero when untracked)
    pub fn quantity(&self, asset: &str) -> f64 {
        self.holdings.get(asset).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Tracked asset ids in sorted order
    pub fn asset_ids(&self) -> Vec<String> {
        self.holdings.keys().cloned().collect()
    }

    /// Iterates over `(asset id, quantity)`
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.holdings.iter().map(|(id, qty)| (id.as_str(), *qty))
    }

    /// Drops entries that are not finite, non-negative quantities
    fn sanitized(mut self) -> Self {
        self.holdings.retain(|_, qty| qty.is_finite() && *qty >= 0.0);
        self
    }
}

impl<'a> FromIterator<(&'a str, f64)> for Portfolio {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self {
            holdings: iter.into_iter().map(|(id, qty)| (id.to_string(), qty)).collect(),
        }
    }
}

/// Parses user input as an amount to add
pub fn parse_amount(input: &str) -> Result<f64, PortfolioError> {
    let amount: f64 = input
        .trim()
        .parse()
        .map_err(|_| PortfolioError::InvalidAmount(input.to_string()))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: f64) -> Result<(), PortfolioError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(PortfolioError::InvalidAmount(amount.to_string()))
    }
}
