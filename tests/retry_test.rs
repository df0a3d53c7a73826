//! 退避策略测试

use flare_grpc_discovery::retry::{BackoffPolicy, ExponentialBackoffPolicy, FixedBackoffPolicy};
use std::time::Duration;

#[test]
fn exponential_backoff_doubles_until_capped() {
    let policy =
        ExponentialBackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(1), 0.0);

    assert_eq!(policy.backoff_duration(0), Duration::from_millis(100));
    assert_eq!(policy.backoff_duration(1), Duration::from_millis(200));
    assert_eq!(policy.backoff_duration(3), Duration::from_millis(800));
    assert_eq!(policy.backoff_duration(4), Duration::from_secs(1));
    assert_eq!(policy.backoff_duration(1000), Duration::from_secs(1));
}

#[test]
fn jitter_stays_within_bounds() {
    let policy =
        ExponentialBackoffPolicy::new(Duration::from_millis(100), Duration::from_secs(10), 0.2);

    for _ in 0..100 {
        let delay = policy.backoff_duration(2);
        assert!(delay >= Duration::from_millis(319), "{delay:?}");
        assert!(delay <= Duration::from_millis(481), "{delay:?}");
    }
    for _ in 0..100 {
        assert!(policy.backoff_duration(30) <= Duration::from_secs(10));
    }
}

#[test]
fn fixed_backoff() {
    assert_eq!(FixedBackoffPolicy::immediate().backoff_duration(5), Duration::ZERO);
    let policy = FixedBackoffPolicy::new(Duration::from_millis(250));
    assert_eq!(policy.backoff_duration(0), Duration::from_millis(250));
    assert_eq!(policy.backoff_duration(9), Duration::from_millis(250));
}
