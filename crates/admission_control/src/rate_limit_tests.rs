//! Tests for the sliding-window rate limiter

use super::*;

#[test]
fn admits_up_to_the_ceiling() {
    let limiter = RateLimiter::new(3);

    assert!(limiter.check_rate("10.0.0.1"));
    assert!(limiter.check_rate("10.0.0.1"));
    assert!(limiter.check_rate("10.0.0.1"));
    assert!(!limiter.check_rate("10.0.0.1"));
}

#[test]
fn nth_admitted_nth_plus_one_rejected() {
    let limiter = RateLimiter::new(60);
    let now = Instant::now();

    for _ in 0..59 {
        assert!(limiter.check_rate_at("10.0.0.1", now));
    }
    // Request 60 is admitted; request 61 is rejected.
    assert!(limiter.check_rate_at("10.0.0.1", now));
    assert!(!limiter.check_rate_at("10.0.0.1", now));
}

#[test]
fn sources_have_independent_windows() {
    let limiter = RateLimiter::new(1);

    assert!(limiter.check_rate("10.0.0.1"));
    assert!(limiter.check_rate("10.0.0.2"));
    assert!(!limiter.check_rate("10.0.0.1"));
}

#[test]
fn window_resets_after_sixty_seconds() {
    let limiter = RateLimiter::new(2);
    let start = Instant::now();

    assert!(limiter.check_rate_at("10.0.0.1", start));
    assert!(limiter.check_rate_at("10.0.0.1", start));
    assert!(!limiter.check_rate_at("10.0.0.1", start));

    // Entries aged exactly 60s are stale and pruned.
    let later = start + WINDOW;
    assert!(limiter.check_rate_at("10.0.0.1", later));
}

#[test]
fn rejection_does_not_extend_the_window() {
    let limiter = RateLimiter::new(1);
    let start = Instant::now();

    assert!(limiter.check_rate_at("10.0.0.1", start));

    // Hammering while throttled must not push the reset point out.
    for i in 1..10 {
        assert!(!limiter.check_rate_at(
            "10.0.0.1",
            start + Duration::from_secs(i)
        ));
    }

    assert!(limiter.check_rate_at("10.0.0.1", start + WINDOW));
}

#[test]
fn window_length_never_exceeds_ceiling_after_admission() {
    let limiter = RateLimiter::new(5);
    let now = Instant::now();

    for _ in 0..20 {
        limiter.check_rate_at("10.0.0.1", now);
    }

    let windows = limiter.windows.lock().unwrap();
    assert_eq!(windows["10.0.0.1"].len(), 5);
}

#[test]
fn expired_sources_are_swept_from_the_map() {
    let limiter = RateLimiter::new(5);
    let start = Instant::now();

    assert!(limiter.check_rate_at("10.0.0.1", start));
    assert!(limiter.check_rate_at("10.0.0.2", start));

    // One source stays active past the others' expiry; the idle sources
    // must not leave entries behind.
    assert!(limiter.check_rate_at("10.0.0.3", start + WINDOW));

    let windows = limiter.windows.lock().unwrap();
    assert_eq!(windows.len(), 1);
    assert!(windows.contains_key("10.0.0.3"));
}

#[test]
fn shared_across_threads() {
    use std::sync::Arc;

    let limiter = Arc::new(RateLimiter::new(100));
    let mut handles = Vec::new();

    for _ in 0..4 {
        let limiter = Arc::clone(&limiter);
        handles.push(std::thread::spawn(move || {
            let mut admitted = 0;
            for _ in 0..50 {
                if limiter.check_rate("10.0.0.1") {
                    admitted += 1;
                }
            }
            admitted
        }));
    }

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    // 200 attempts against a ceiling of 100: no lost updates allowed.
    assert_eq!(total, 100);
}
