//! Admission-control properties under real parallelism: ceilings hold
//! exactly, scope windows stay independent, and expired windows reset.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use payout_gateway_client::api::FixedWindowLimiter;
use payout_gateway_client::{GatewayError, RateLimitConfig};

// Run with RUST_LOG=payout_gateway_client=debug to watch admissions.
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn config(global: u32, scoped: u32, window_ms: u64) -> RateLimitConfig {
    init_logs();
    RateLimitConfig {
        global_ceiling: global,
        scoped_ceiling: scoped,
        window: Duration::from_millis(window_ms),
    }
}

async fn admit_concurrently(
    limiter: &Arc<FixedWindowLimiter>,
    scope_key: Option<&'static str>,
    calls: usize,
) -> Vec<payout_gateway_client::Result<()>> {
    init_logs();
    let tasks: Vec<_> = (0..calls)
        .map(|_| {
            let limiter = Arc::clone(limiter);
            tokio::spawn(async move { limiter.admit(scope_key) })
        })
        .collect();

    join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("admission task panicked"))
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_global_ceiling_admits_exactly_twenty_of_twenty_one() {
    let limiter = Arc::new(FixedWindowLimiter::new(RateLimitConfig::default()));

    let results = admit_concurrently(&limiter, None, 21).await;

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 20);

    let rejections: Vec<_> = results.into_iter().filter_map(|r| r.err()).collect();
    assert_eq!(rejections.len(), 1);
    match &rejections[0] {
        GatewayError::RateLimitExceeded {
            scope,
            ceiling,
            window_ms,
        } => {
            assert_eq!(scope, "global");
            assert_eq!(*ceiling, 20);
            assert_eq!(*window_ms, 1000);
        }
        other => panic!("expected a rate-limit rejection, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scoped_ceiling_rejects_fourth_concurrent_call() {
    let limiter = Arc::new(FixedWindowLimiter::new(RateLimitConfig::default()));

    let results = admit_concurrently(&limiter, Some("wallet-hash-22334455"), 4).await;

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 3);

    let rejection = results
        .into_iter()
        .find_map(|r| r.err())
        .expect("fourth call must be rejected");
    match rejection {
        GatewayError::RateLimitExceeded { scope, ceiling, .. } => {
            assert_eq!(scope, "wall***4455");
            assert_eq!(ceiling, 3);
        }
        other => panic!("expected a scoped rejection, got {other:?}"),
    }

    // A different wallet's window is untouched.
    assert!(limiter.admit(Some("wallet-hash-99887766")).is_ok());

    // All five attempts counted globally, the scoped rejection included.
    assert_eq!(limiter.usage().global_in_window, 5);
}

#[tokio::test]
async fn test_global_window_resets_after_expiry() {
    let limiter = FixedWindowLimiter::new(config(2, 3, 40));

    assert!(limiter.admit(None).is_ok());
    assert!(limiter.admit(None).is_ok());
    assert!(limiter.admit(None).is_err());

    tokio::time::sleep(Duration::from_millis(60)).await;

    assert!(limiter.admit(None).is_ok());
}

#[tokio::test]
async fn test_limiter_state_is_per_instance() {
    let exhausted = FixedWindowLimiter::new(config(1, 3, 1000));
    let fresh = FixedWindowLimiter::new(config(1, 3, 1000));

    assert!(exhausted.admit(None).is_ok());
    assert!(exhausted.admit(None).is_err());

    assert!(fresh.admit(None).is_ok());
}

#[tokio::test]
async fn test_sweep_drops_expired_scope_windows() {
    let limiter = FixedWindowLimiter::new(config(20, 3, 30));

    for wallet in ["wallet-a-11112222", "wallet-b-33334444", "wallet-c-55556666"] {
        assert!(limiter.admit(Some(wallet)).is_ok());
    }
    assert_eq!(limiter.usage().tracked_scopes, 3);

    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(limiter.sweep_expired(), 3);
    assert_eq!(limiter.usage().tracked_scopes, 0);
}
