//! Application state management for CryptoVisual
//!
//! This module contains the main application state, keyboard handling and the
//! request/response plumbing between the UI loop and background data tasks.
//! Every request is tagged with a per-view generation; responses from older
//! generations are dropped so a late answer never overwrites newer state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cache::KeyValueStore;
use crate::cli::StartupConfig;
use crate::data::format::{format_change_pill, format_money};
use crate::data::{Currency, MarketChart, MarketClient, MarketCoin, Timeframe, FALLBACK_COINS};
use crate::portfolio::{value_portfolio, Portfolio, Valuation};

/// How long a toast stays on screen
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Application state enum representing the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    /// Initial loading state until the first listing arrives
    Loading,
    /// Main dashboard
    Dashboard,
}

/// Where keystrokes go on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing into the market table filter
    Search,
    /// Add-holding form is open
    AddHolding,
}

/// Logical views that load independently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    TopAssets,
    MainChart,
    MarketTable,
    Portfolio,
}

impl View {
    pub const ALL: [View; 4] = [
        View::TopAssets,
        View::MainChart,
        View::MarketTable,
        View::Portfolio,
    ];

    fn index(self) -> usize {
        match self {
            View::TopAssets => 0,
            View::MainChart => 1,
            View::MarketTable => 2,
            View::Portfolio => 3,
        }
    }
}

/// Monotonic request counter per view
#[derive(Debug, Clone, Default)]
pub struct RequestGenerations {
    counters: [u64; 4],
}

impl RequestGenerations {
    /// Starts a new generation for `view` and returns it
    pub fn next(&mut self, view: View) -> u64 {
        let counter = &mut self.counters[view.index()];
        *counter += 1;
        *counter
    }

    /// Latest generation issued for `view`
    pub fn current(&self, view: View) -> u64 {
        self.counters[view.index()]
    }

    pub fn is_current(&self, view: View, generation: u64) -> bool {
        self.current(view) == generation
    }
}

/// Responses sent from background data tasks to the app
#[derive(Debug, Clone)]
pub enum DataMessage {
    TopAssets {
        generation: u64,
        coins: Vec<MarketCoin>,
    },
    MainChart {
        generation: u64,
        chart: MarketChart,
    },
    MarketTable {
        generation: u64,
        page: u32,
        coins: Vec<MarketCoin>,
    },
    Portfolio {
        generation: u64,
        valuation: Valuation,
    },
}

impl DataMessage {
    pub fn view(&self) -> View {
        match self {
            DataMessage::TopAssets { .. } => View::TopAssets,
            DataMessage::MainChart { .. } => View::MainChart,
            DataMessage::MarketTable { .. } => View::MarketTable,
            DataMessage::Portfolio { .. } => View::Portfolio,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            DataMessage::TopAssets { generation, .. }
            | DataMessage::MainChart { generation, .. }
            | DataMessage::MarketTable { generation, .. }
            | DataMessage::Portfolio { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Warning,
}

/// Transient notification
#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub expires_at: Instant,
}

/// State of the add-holding form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddHoldingForm {
    /// Index into the bundled asset list
    pub selected: usize,
    /// Amount as typed
    pub amount: String,
}

impl AddHoldingForm {
    /// Asset id currently selected
    pub fn asset_id(&self) -> &'static str {
        FALLBACK_COINS[self.selected % FALLBACK_COINS.len()].id
    }

    fn select_next(&mut self) {
        self.selected = (self.selected + 1) % FALLBACK_COINS.len();
    }

    fn select_previous(&mut self) {
        self.selected = if self.selected == 0 {
            FALLBACK_COINS.len() - 1
        } else {
            self.selected - 1
        };
    }
}

/// Main application struct managing state and data
pub struct App {
    /// Current application state/view
    pub state: AppState,
    pub mode: InputMode,
    pub currency: Currency,
    /// Market table page, starting at 1
    pub page: u32,
    pub timeframe: Timeframe,
    /// Market table filter
    pub search: String,
    pub add_form: AddHoldingForm,
    pub toasts: Vec<Toast>,
    pub top_assets: Vec<MarketCoin>,
    pub market_rows: Vec<MarketCoin>,
    /// A market page request is outstanding
    pub market_loading: bool,
    pub chart: MarketChart,
    pub valuation: Option<Valuation>,
    pub portfolio: Portfolio,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Timestamp of last applied listing
    pub last_refresh: Option<DateTime<Local>>,
    generations: RequestGenerations,
    market: MarketClient,
    store: Arc<dyn KeyValueStore>,
    tx: mpsc::UnboundedSender<DataMessage>,
    rx: mpsc::UnboundedReceiver<DataMessage>,
}

impl App {
    /// Creates a new App backed by `market`, loading the persisted portfolio
    pub fn new(market: MarketClient) -> Self {
        let store = market.resolver().store().clone();
        let portfolio = Portfolio::load(store.as_ref());
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::Loading,
            mode: InputMode::Normal,
            currency: Currency::default(),
            page: 1,
            timeframe: Timeframe::default(),
            search: String::new(),
            add_form: AddHoldingForm::default(),
            toasts: Vec::new(),
            top_assets: Vec::new(),
            market_rows: Vec::new(),
            market_loading: false,
            chart: MarketChart::default(),
            valuation: None,
            portfolio,
            show_help: false,
            should_quit: false,
            last_refresh: None,
            generations: RequestGenerations::default(),
            market,
            store,
            tx,
            rx,
        }
    }

    /// Creates a new App with the currency and page from the command line
    pub fn with_startup_config(market: MarketClient, config: &StartupConfig) -> Self {
        let mut app = Self::new(market);
        app.currency = config.currency;
        app.page = config.page.max(1);
        app
    }

    pub fn generations(&self) -> &RequestGenerations {
        &self.generations
    }

    /// Requests every view for the current currency, page and timeframe
    ///
    /// Must be called from within a tokio runtime.
    pub fn request_dashboard(&mut self) {
        let top_generation = self.generations.next(View::TopAssets);
        let chart_generation = self.generations.next(View::MainChart);
        let table_generation = self.generations.next(View::MarketTable);
        self.market_loading = true;

        let market = self.market.clone();
        let tx = self.tx.clone();
        let currency = self.currency;
        let page = self.page;
        let timeframe = self.timeframe;

        tokio::spawn(async move {
            let top = async {
                let coins = market.top_assets(currency).await;
                let _ = tx.send(DataMessage::TopAssets {
                    generation: top_generation,
                    coins,
                });
            };
            let chart = async {
                let chart = market.main_chart(currency, timeframe).await;
                let _ = tx.send(DataMessage::MainChart {
                    generation: chart_generation,
                    chart,
                });
            };
            let table = async {
                let coins = market.market_page(currency, page).await;
                let _ = tx.send(DataMessage::MarketTable {
                    generation: table_generation,
                    page,
                    coins,
                });
            };
            futures::join!(top, chart, table);
        });

        self.request_portfolio();
    }

    /// Requests only the historical chart
    pub fn request_chart(&mut self) {
        let generation = self.generations.next(View::MainChart);
        let market = self.market.clone();
        let tx = self.tx.clone();
        let (currency, timeframe) = (self.currency, self.timeframe);

        tokio::spawn(async move {
            let chart = market.main_chart(currency, timeframe).await;
            let _ = tx.send(DataMessage::MainChart { generation, chart });
        });
    }

    /// Requests only the current market table page
    pub fn request_market_table(&mut self) {
        let generation = self.generations.next(View::MarketTable);
        self.market_loading = true;
        let market = self.market.clone();
        let tx = self.tx.clone();
        let (currency, page) = (self.currency, self.page);

        tokio::spawn(async move {
            let coins = market.market_page(currency, page).await;
            let _ = tx.send(DataMessage::MarketTable {
                generation,
                page,
                coins,
            });
        });
    }

    /// Requests a fresh portfolio valuation
    pub fn request_portfolio(&mut self) {
        let generation = self.generations.next(View::Portfolio);
        let market = self.market.clone();
        let tx = self.tx.clone();
        let portfolio = self.portfolio.clone();
        let currency = self.currency;

        tokio::spawn(async move {
            let valuation = value_portfolio(&market, &portfolio, currency).await;
            let _ = tx.send(DataMessage::Portfolio {
                generation,
                valuation,
            });
        });
    }

    /// Applies a response; returns false when it was stale and dropped
    pub fn apply(&mut self, message: DataMessage) -> bool {
        let view = message.view();
        let generation = message.generation();
        if !self.generations.is_current(view, generation) {
            debug!(
                ?view,
                generation,
                current = self.generations.current(view),
                "dropping stale response"
            );
            return false;
        }

        match message {
            DataMessage::TopAssets { coins, .. } => {
                self.top_assets = coins;
                self.last_refresh = Some(Local::now());
                self.state = AppState::Dashboard;
            }
            DataMessage::MainChart { chart, .. } => {
                self.chart = chart;
            }
            DataMessage::MarketTable { coins, page, .. } => {
                if page == self.page {
                    self.market_rows = coins;
                    self.market_loading = false;
                }
            }
            DataMessage::Portfolio { valuation, .. } => {
                self.valuation = Some(valuation);
            }
        }
        true
    }

    /// Applies every response that has arrived
    pub fn drain_messages(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(message) = self.rx.try_recv() {
            if self.apply(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Waits for the next response and applies it
    pub async fn recv_message(&mut self) -> Option<bool> {
        let message = self.rx.recv().await?;
        Some(self.apply(message))
    }

    /// Switches the display currency and reloads everything
    ///
    /// Cached prices and listings for both the previous and the new currency
    /// are dropped so the switch always revalidates.
    pub fn set_currency(&mut self, currency: Currency) {
        let previous = self.currency;
        self.market.invalidate_currency(previous);
        if currency != previous {
            self.market.invalidate_currency(currency);
        }
        info!(from = previous.code(), to = currency.code(), "currency switched");

        self.currency = currency;
        self.valuation = None;
        self.market_rows.clear();
        self.request_dashboard();
    }

    /// Moves the market table to `page` (at least 1)
    pub fn set_page(&mut self, page: u32) {
        let page = page.max(1);
        if page == self.page && !self.market_rows.is_empty() {
            return;
        }
        self.page = page;
        self.market_rows.clear();
        self.request_market_table();
    }

    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        if timeframe == self.timeframe && !self.chart.is_empty() {
            return;
        }
        self.timeframe = timeframe;
        self.request_chart();
    }

    /// Whether the previous-page action is available
    pub fn can_go_back(&self) -> bool {
        self.page > 1
    }

    /// Adds the typed amount of `asset` to the portfolio
    ///
    /// Invalid input shows a warning toast and leaves holdings unchanged.
    pub fn add_holding(&mut self, asset: &str, input: &str) -> bool {
        let amount = match self.portfolio.add_from_input(asset, input) {
            Ok(amount) => amount,
            Err(e) => {
                self.push_toast(ToastKind::Warning, e.to_string());
                return false;
            }
        };

        if let Err(e) = self.portfolio.save(self.store.as_ref()) {
            warn!(error = %e, "failed to persist portfolio");
        }

        let symbol = FALLBACK_COINS
            .iter()
            .find(|c| c.id == asset)
            .map(|c| c.symbol.to_uppercase())
            .unwrap_or_else(|| asset.to_uppercase());
        self.push_toast(
            ToastKind::Success,
            format!("Added {} {} to portfolio", amount, symbol),
        );
        self.request_portfolio();
        true
    }

    /// Removes every holding
    pub fn clear_portfolio(&mut self) {
        self.portfolio.clear();
        if let Err(e) = self.portfolio.save(self.store.as_ref()) {
            warn!(error = %e, "failed to persist portfolio");
        }
        self.push_toast(ToastKind::Success, "Portfolio cleared".to_string());
        self.request_portfolio();
    }

    pub fn push_toast(&mut self, kind: ToastKind, message: String) {
        self.toasts.push(Toast {
            kind,
            message,
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    /// Drops toasts that have expired by `now`
    pub fn prune_toasts(&mut self, now: Instant) {
        self.toasts.retain(|toast| toast.expires_at > now);
    }

    /// Market rows matching the search filter
    pub fn filtered_rows(&self) -> Vec<&MarketCoin> {
        let term = self.search.trim().to_lowercase();
        self.market_rows
            .iter()
            .filter(|coin| {
                term.is_empty()
                    || row_search_text(coin, self.currency)
                        .to_lowercase()
                        .contains(&term)
            })
            .collect()
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `c`: Toggle currency
    /// - `h`/`d`/`w`: Chart timeframe 1H/1D/1W
    /// - `/`: Filter the market table
    /// - `Left`/`[` and `Right`/`]`: Previous/next market page
    /// - `a`: Add a holding
    /// - `X`: Clear the portfolio
    /// - `r`: Refresh now
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Handle help overlay - intercepts all keys when shown
        if self.show_help {
            if matches!(
                key_event.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return;
        }

        if self.state == AppState::Loading {
            // Only quit is allowed during loading
            if key_event.code == KeyCode::Char('q') {
                self.should_quit = true;
            }
            return;
        }

        match self.mode {
            InputMode::Search => self.handle_search_key(key_event),
            InputMode::AddHolding => self.handle_form_key(key_event),
            InputMode::Normal => self.handle_dashboard_key(key_event),
        }
    }

    fn handle_dashboard_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') => {
                self.set_currency(self.currency.toggled());
            }
            KeyCode::Char('h') => self.set_timeframe(Timeframe::OneHour),
            KeyCode::Char('d') => self.set_timeframe(Timeframe::OneDay),
            KeyCode::Char('w') => self.set_timeframe(Timeframe::OneWeek),
            KeyCode::Char('/') => {
                self.mode = InputMode::Search;
            }
            KeyCode::Left | KeyCode::Char('[') => {
                if self.can_go_back() {
                    self.set_page(self.page - 1);
                }
            }
            KeyCode::Right | KeyCode::Char(']') => {
                self.set_page(self.page.saturating_add(1));
            }
            KeyCode::Char('a') => {
                self.add_form = AddHoldingForm::default();
                self.mode = InputMode::AddHolding;
            }
            KeyCode::Char('X') => self.clear_portfolio(),
            KeyCode::Char('r') => self.request_dashboard(),
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.search.clear();
                self.mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
            }
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(c) => {
                self.search.push(c);
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
            }
            KeyCode::Up => self.add_form.select_previous(),
            KeyCode::Down | KeyCode::Tab => self.add_form.select_next(),
            KeyCode::Backspace => {
                self.add_form.amount.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => {
                self.add_form.amount.push(c);
            }
            KeyCode::Enter => {
                let asset = self.add_form.asset_id();
                let amount = self.add_form.amount.clone();
                if self.add_holding(asset, &amount) {
                    self.add_form = AddHoldingForm::default();
                    self.mode = InputMode::Normal;
                }
            }
            _ => {}
        }
    }
}

/// Text a market row is searched by: name, symbol, price, change, market cap
pub fn row_search_text(coin: &MarketCoin, currency: Currency) -> String {
    format!(
        "{} {} {} {} {}",
        coin.name,
        coin.symbol.to_uppercase(),
        format_money(coin.current_price, currency),
        format_change_pill(coin.change_24h()),
        coin.market_cap
            .map(|cap| format_money(cap, currency))
            .unwrap_or_default()
    )
}
