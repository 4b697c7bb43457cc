//! Fixed-window admission control for outbound gateway calls.
//!
//! Two ceilings apply before any network attempt:
//! - one global window covering every call made through a client instance
//! - one lazily created window per scope key (a wallet hash id)
//!
//! A call is counted against the global window even when the scoped check
//! rejects it afterwards: the global ceiling tracks attempted calls, not
//! admitted calls. Windows reset wholesale the first time they are observed
//! expired.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::{debug, info, warn};

use crate::error::{GatewayError, Result};
use crate::masking::mask;

/// Expired scoped windows are dropped opportunistically, at most this often.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Ceilings for the fixed windows.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per window across the whole client instance.
    pub global_ceiling: u32,
    /// Requests admitted per window for a single scope key.
    pub scoped_ceiling: u32,
    /// Width of every window, global and scoped alike.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global_ceiling: 20,
            scoped_ceiling: 3,
            window: Duration::from_millis(1000),
        }
    }
}

/// One counting window: calls seen since the last reset, and when the
/// window expires.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    reset_at: Instant,
}

impl RateWindow {
    fn fresh(now: Instant, width: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + width,
        }
    }
}

/// Point-in-time usage snapshot for logs and dashboards.
#[derive(Debug, Clone)]
pub struct RateLimiterUsage {
    pub global_in_window: u32,
    pub global_ceiling: u32,
    pub tracked_scopes: usize,
}

/// Fixed-window rate limiter owned by a single client instance.
///
/// Never shared across instances, so independent clients cannot contaminate
/// each other's budgets. The admission check is synchronous: no lock in this
/// module is ever held across an await.
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    global: Mutex<RateWindow>,
    scoped: DashMap<String, RateWindow>,
    last_sweep: Mutex<Instant>,
}

impl FixedWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let now = Instant::now();
        info!(
            "🚦 rate limiter ready: global {} per {:?}, per-wallet {} per {:?}",
            config.global_ceiling, config.window, config.scoped_ceiling, config.window
        );
        Self {
            global: Mutex::new(RateWindow::fresh(now, config.window)),
            scoped: DashMap::new(),
            last_sweep: Mutex::new(now),
            config,
        }
    }

    /// Decides whether a call may proceed and accounts for it if so.
    ///
    /// The global window is evaluated first; if a scope key is present, its
    /// window is evaluated with the tighter ceiling afterwards. Each
    /// check-then-increment runs under that window's lock, so concurrent
    /// callers can never both slip past a full window.
    pub fn admit(&self, scope_key: Option<&str>) -> Result<()> {
        let now = Instant::now();
        self.maybe_sweep(now);

        {
            let mut global = self.global.lock().unwrap();
            if now > global.reset_at {
                *global = RateWindow::fresh(now, self.config.window);
            }
            if global.count >= self.config.global_ceiling {
                warn!(
                    "🚫 global request ceiling hit: {} per {:?}",
                    self.config.global_ceiling, self.config.window
                );
                return Err(self.rejection("global".to_string(), self.config.global_ceiling));
            }
            global.count += 1;
        }

        if let Some(key) = scope_key {
            let mut window = self
                .scoped
                .entry(key.to_string())
                .or_insert_with(|| RateWindow::fresh(now, self.config.window));
            if now > window.reset_at {
                *window = RateWindow::fresh(now, self.config.window);
            }
            if window.count >= self.config.scoped_ceiling {
                let masked = mask(key);
                warn!(
                    "🚫 request ceiling hit for wallet {}: {} per {:?}",
                    masked, self.config.scoped_ceiling, self.config.window
                );
                return Err(self.rejection(masked, self.config.scoped_ceiling));
            }
            window.count += 1;
        }

        Ok(())
    }

    /// Drops scoped windows that have already expired.
    ///
    /// Safe at any time: removal matches the reset an expired window would
    /// undergo on its next use, so admission outcomes never change. Returns
    /// how many windows were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.scoped.len();
        self.scoped.retain(|_, window| now <= window.reset_at);
        let swept = before.saturating_sub(self.scoped.len());
        if swept > 0 {
            debug!("swept {} expired rate windows", swept);
        }
        swept
    }

    pub fn usage(&self) -> RateLimiterUsage {
        let now = Instant::now();
        let global = self.global.lock().unwrap();
        let global_in_window = if now > global.reset_at {
            0
        } else {
            global.count
        };
        RateLimiterUsage {
            global_in_window,
            global_ceiling: self.config.global_ceiling,
            tracked_scopes: self.scoped.len(),
        }
    }

    fn rejection(&self, scope: String, ceiling: u32) -> GatewayError {
        GatewayError::RateLimitExceeded {
            scope,
            ceiling,
            window_ms: self.config.window.as_millis() as u64,
        }
    }

    // The scoped map only grows while wallets stay active; a quiet wallet
    // would otherwise pin its window forever.
    fn maybe_sweep(&self, now: Instant) {
        {
            let mut last = self.last_sweep.lock().unwrap();
            if now.saturating_duration_since(*last) < SWEEP_INTERVAL {
                return;
            }
            *last = now;
        }
        self.sweep_expired();
    }
}

impl Default for FixedWindowLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
