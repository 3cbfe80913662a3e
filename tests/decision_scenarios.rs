//! End-to-end decision scenarios driven through the public API, with a
//! manual clock so refill and expiry timing is exact.

use std::sync::Arc;

use ratelimitd::core::{
    Algorithm, Clock, DecisionRequest, Dispatcher, Introspector, KvExecutor, ManualClock,
};
use ratelimitd::storage::MemoryExecutor;

struct Service {
    clock: Arc<ManualClock>,
    dispatcher: Dispatcher,
    introspector: Introspector,
}

fn service(start: f64) -> Service {
    let clock = Arc::new(ManualClock::new(start));
    let executor: Arc<dyn KvExecutor> =
        Arc::new(MemoryExecutor::new(clock.clone() as Arc<dyn Clock>));
    Service {
        clock: clock.clone(),
        dispatcher: Dispatcher::new(Arc::clone(&executor), clock as Arc<dyn Clock>),
        introspector: Introspector::new(executor),
    }
}

// An epoch instant aligned to a 60 second window boundary.
const ALIGNED: f64 = 1_000_020.0;

#[tokio::test]
async fn token_bucket_burst_then_steady() {
    let s = service(1_000_000.0);
    let request = DecisionRequest::new("burst-user", 10, 10);

    // The initial burst drains the full capacity.
    for expected_remaining in (0..10).rev() {
        let decision = s.dispatcher.decide(&request).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, expected_remaining);
    }

    // Empty bucket: denied with a one second hint at 1 token/s refill.
    let denied = s.dispatcher.decide(&request).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert_eq!(denied.retry_after, Some(1));

    // One second later a single token has refilled.
    s.clock.advance(1.0);
    let refilled = s.dispatcher.decide(&request).await.unwrap();
    assert!(refilled.allowed);
    assert_eq!(refilled.remaining, 0);
}

#[tokio::test]
async fn fixed_window_resets_on_the_boundary() {
    let s = service(ALIGNED);
    let request = DecisionRequest::new("fw-user", 3, 60).with_algorithm(Algorithm::FixedWindow);

    for expected_remaining in [2, 1, 0] {
        let decision = s.dispatcher.decide(&request).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, expected_remaining);
        assert_eq!(decision.reset_time, ALIGNED as i64 + 60);
    }

    // Mid-window the counter is saturated; no retry hint is offered.
    s.clock.set(ALIGNED + 30.0);
    let denied = s.dispatcher.decide(&request).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert_eq!(denied.retry_after, None);
    assert_eq!(denied.reset_time, ALIGNED as i64 + 60);

    // The next window opens with a fresh counter.
    s.clock.set(ALIGNED + 60.0);
    let fresh = s.dispatcher.decide(&request).await.unwrap();
    assert!(fresh.allowed);
    assert_eq!(fresh.remaining, 2);
    assert_eq!(fresh.reset_time, ALIGNED as i64 + 120);
}

#[tokio::test]
async fn fixed_window_boundary_is_exact() {
    let s = service(ALIGNED);
    let request = DecisionRequest::new("fw-edge", 1, 60).with_algorithm(Algorithm::FixedWindow);

    assert!(s.dispatcher.decide(&request).await.unwrap().allowed);

    // A whisker before the boundary the old window still applies.
    s.clock.set(ALIGNED + 59.999);
    assert!(!s.dispatcher.decide(&request).await.unwrap().allowed);

    // Exactly on the boundary a new window opens.
    s.clock.set(ALIGNED + 60.0);
    assert!(s.dispatcher.decide(&request).await.unwrap().allowed);
}

#[tokio::test]
async fn sliding_window_evicts_with_precision() {
    let base = 1_000_000.0;
    let s = service(base);
    let request = DecisionRequest::new("sw-user", 5, 10).with_algorithm(Algorithm::SlidingWindow);

    // One admission per second fills the window.
    for _ in 0..5 {
        assert!(s.dispatcher.decide(&request).await.unwrap().allowed);
        s.clock.advance(1.0);
    }

    // At t+5 the oldest admission (t+0) still has five seconds to live.
    let denied = s.dispatcher.decide(&request).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.remaining, 0);
    assert_eq!(denied.retry_after, Some(5));

    // Once the oldest admission leaves the trailing window, room opens up.
    s.clock.set(base + 10.001);
    let admitted = s.dispatcher.decide(&request).await.unwrap();
    assert!(admitted.allowed);

    let entries = s.introspector.sliding_window_entries("sw-user").await.unwrap();
    assert_eq!(entries.len(), 5);
    assert!(entries.windows(2).all(|w| w[0].score <= w[1].score));
}

#[tokio::test]
async fn sliding_window_denies_rapid_burst_with_retry_hint() {
    let s = service(1_000_000.0);
    let request = DecisionRequest::new("sw-burst", 3, 10).with_algorithm(Algorithm::SlidingWindow);

    for _ in 0..3 {
        assert!(s.dispatcher.decide(&request).await.unwrap().allowed);
    }

    let denied = s.dispatcher.decide(&request).await.unwrap();
    assert!(!denied.allowed);
    assert!(denied.retry_after.unwrap_or(0) >= 1);
}

#[tokio::test]
async fn cost_equal_to_capacity_admits_exactly_once() {
    let s = service(1_000_000.0);
    let request = DecisionRequest::new("big-spender", 5, 5).with_cost(5);

    let first = s.dispatcher.decide(&request).await.unwrap();
    assert!(first.allowed);
    assert_eq!(first.remaining, 0);

    // Denied until the bucket refills completely.
    let denied = s.dispatcher.decide(&request).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.retry_after, Some(5));

    s.clock.advance(5.0);
    assert!(s.dispatcher.decide(&request).await.unwrap().allowed);
}

#[tokio::test]
async fn cost_above_capacity_always_denies() {
    let s = service(1_000_000.0);
    let request = DecisionRequest::new("oversized", 2, 2).with_cost(3);

    let denied = s.dispatcher.decide(&request).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.retry_after, Some(1));

    // No amount of waiting helps: the bucket caps at 2 tokens.
    s.clock.advance(100.0);
    let denied = s.dispatcher.decide(&request).await.unwrap();
    assert!(!denied.allowed);
    assert_eq!(denied.retry_after, Some(1));
}

#[tokio::test]
async fn fingerprints_are_isolated() {
    let s = service(1_000_000.0);

    // Exhaust fingerprint A.
    let a = DecisionRequest::new("tenant-a", 3, 60);
    for _ in 0..3 {
        assert!(s.dispatcher.decide(&a).await.unwrap().allowed);
    }
    assert!(!s.dispatcher.decide(&a).await.unwrap().allowed);

    // Fingerprint B with the same policy is untouched.
    let b = DecisionRequest::new("tenant-b", 3, 60);
    for expected_remaining in [2, 1, 0] {
        let decision = s.dispatcher.decide(&b).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.remaining, expected_remaining);
    }
}

#[tokio::test]
async fn idle_state_expires_after_an_hour() {
    let s = service(1_000_000.0);

    s.dispatcher
        .decide(&DecisionRequest::new("idle-user", 10, 60))
        .await
        .unwrap();
    s.dispatcher
        .decide(&DecisionRequest::new("idle-user", 10, 60).with_algorithm(Algorithm::SlidingWindow))
        .await
        .unwrap();

    // Just under the idle TTL both keys survive.
    s.clock.advance(3599.0);
    assert!(!s
        .introspector
        .token_bucket_state("idle-user")
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        s.introspector
            .sliding_window_entries("idle-user")
            .await
            .unwrap()
            .len(),
        1
    );

    // Past it they are gone.
    s.clock.advance(2.0);
    assert!(s
        .introspector
        .token_bucket_state("idle-user")
        .await
        .unwrap()
        .is_empty());
    assert!(s
        .introspector
        .sliding_window_entries("idle-user")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn a_denied_fingerprint_recovers_after_expiry() {
    let s = service(1_000_000.0);
    let request = DecisionRequest::new("comeback", 2, 10);

    assert!(s.dispatcher.decide(&request).await.unwrap().allowed);
    assert!(s.dispatcher.decide(&request).await.unwrap().allowed);
    assert!(!s.dispatcher.decide(&request).await.unwrap().allowed);

    // After the idle TTL the fingerprint starts from a full bucket.
    s.clock.advance(3601.0);
    let decision = s.dispatcher.decide(&request).await.unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 1);
}
