//! Background refresh timers
//!
//! Emits periodic ticks over a tokio channel: a full dashboard refresh and a
//! more frequent portfolio-only refresh. The main loop turns each tick into
//! data requests, so the timers never touch the network themselves.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Messages sent from the background timers to the main app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMessage {
    /// Time to reload top assets, chart, market table and portfolio
    DashboardTick,
    /// Time to revalue the portfolio
    PortfolioTick,
}

/// Configuration for refresh intervals
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshConfig {
    /// Interval for the full dashboard refresh
    pub dashboard_interval: Duration,
    /// Interval for the portfolio valuation refresh
    pub portfolio_interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            dashboard_interval: Duration::from_secs(180), // 3 minutes
            portfolio_interval: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh timers
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Creates a new RefreshHandle and spawns the timer task
    ///
    /// With refresh disabled no task is spawned and the receiver stays empty.
    pub fn spawn(config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut dashboard = tokio::time::interval(config.dashboard_interval);
                let mut portfolio = tokio::time::interval(config.portfolio_interval);
                // Skip the first ticks (immediate); startup loads everything anyway
                dashboard.tick().await;
                portfolio.tick().await;

                loop {
                    let message = tokio::select! {
                        _ = dashboard.tick() => RefreshMessage::DashboardTick,
                        _ = portfolio.tick() => RefreshMessage::PortfolioTick,
                        _ = shutdown_rx.recv() => break,
                    };
                    debug!(?message, "refresh tick");
                    if msg_tx.send(message).await.is_err() {
                        break;
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Stops the background timers
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_config_default() {
        let config = RefreshConfig::default();
        assert_eq!(config.dashboard_interval, Duration::from_secs(180));
        assert_eq!(config.portfolio_interval, Duration::from_secs(60));
        assert!(config.enabled);
    }

    #[tokio::test]
    async fn test_refresh_handle_spawn_disabled() {
        let config = RefreshConfig {
            enabled: false,
            ..Default::default()
        };

        let mut handle = RefreshHandle::spawn(config);

        // With refresh disabled, there should be no messages
        assert!(try_recv(&mut handle).is_none());
    }

    #[tokio::test]
    async fn test_portfolio_ticks_more_often_than_dashboard() {
        let mut handle = RefreshHandle::spawn(RefreshConfig {
            dashboard_interval: Duration::from_millis(200),
            portfolio_interval: Duration::from_millis(40),
            enabled: true,
        });

        let mut received = Vec::new();
        while received.len() < 6 {
            match tokio::time::timeout(Duration::from_secs(2), handle.receiver.recv()).await {
                Ok(Some(msg)) => received.push(msg),
                _ => break,
            }
        }

        assert_eq!(received[0], RefreshMessage::PortfolioTick);
        assert!(received.contains(&RefreshMessage::DashboardTick));
        let portfolio = received
            .iter()
            .filter(|m| **m == RefreshMessage::PortfolioTick)
            .count();
        assert!(portfolio >= 4);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_ticks() {
        let handle = RefreshHandle::spawn(RefreshConfig::default());
        let RefreshHandle {
            mut receiver,
            shutdown_tx,
        } = handle;

        shutdown_tx.send(()).await.unwrap();

        assert!(receiver.recv().await.is_none());
    }
}
