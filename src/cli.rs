//! Command-line interface parsing for CryptoVisual
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into the startup configuration consumed by `main`.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::data::coingecko::COINGECKO_BASE_URL;
use crate::data::Currency;
use crate::refresh::RefreshConfig;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified currency code is not supported
    #[error("Invalid currency: '{0}'. Valid currencies: usd, idr")]
    InvalidCurrency(String),
}

/// CryptoVisual - Crypto prices, market listings and a local portfolio
#[derive(Parser, Debug)]
#[command(name = "cryptovisual")]
#[command(about = "Terminal dashboard for crypto prices with an offline-friendly cache")]
#[command(version)]
pub struct Cli {
    /// Currency to display prices in (usd, idr)
    #[arg(long, value_name = "CURRENCY", default_value = "usd")]
    pub currency: String,

    /// Market table page to open on
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub page: u32,

    /// Never touch the network; serve cached or bundled data only
    #[arg(long)]
    pub offline: bool,

    /// Directory for cached responses and the portfolio record
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Base URL of the market data API
    #[arg(long, value_name = "URL", default_value = COINGECKO_BASE_URL)]
    pub api_base: String,

    /// Seconds between full dashboard refreshes (0 disables auto-refresh)
    #[arg(long, value_name = "SECS", default_value_t = 180)]
    pub refresh_secs: u64,

    /// Write logs to this file instead of the cache directory
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub currency: Currency,
    /// First market table page, at least 1
    pub page: u32,
    pub offline: bool,
    pub cache_dir: Option<PathBuf>,
    pub api_base: String,
    pub refresh: RefreshConfig,
    pub log_file: Option<PathBuf>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            page: 1,
            offline: false,
            cache_dir: None,
            api_base: COINGECKO_BASE_URL.to_string(),
            refresh: RefreshConfig::default(),
            log_file: None,
        }
    }
}

/// Parses a currency string argument into a Currency.
///
/// # Returns
/// * `Ok(Currency)` if the string matches a supported currency
/// * `Err(CliError::InvalidCurrency)` otherwise
pub fn parse_currency_arg(s: &str) -> Result<Currency, CliError> {
    Currency::from_code(s).ok_or_else(|| CliError::InvalidCurrency(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an invalid currency was specified
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let currency = parse_currency_arg(&cli.currency)?;

        let refresh = if cli.refresh_secs == 0 {
            RefreshConfig {
                enabled: false,
                ..Default::default()
            }
        } else {
            RefreshConfig {
                dashboard_interval: Duration::from_secs(cli.refresh_secs),
                ..Default::default()
            }
        };

        Ok(StartupConfig {
            currency,
            page: cli.page.max(1),
            offline: cli.offline,
            cache_dir: cli.cache_dir.clone(),
            api_base: cli.api_base.clone(),
            refresh,
            log_file: cli.log_file.clone(),
        })
    }
}
