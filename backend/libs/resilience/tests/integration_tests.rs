/// Integration tests for resilience library
use resilience::{
    circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState},
    presets, CallContext, CallError, Clock, ErrorClass, ExecutorConfig, ManualClock,
    RecordingObserver, ResilientExecutor, RetryPolicy,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tonic::Status;

fn listings_config(failure_threshold: u32) -> ExecutorConfig {
    ExecutorConfig {
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
            multiplier: 2.0,
            jitter: false,
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold,
            open_cooldown: Duration::from_secs(30),
        },
        ..presets::catalog_read_config()
    }
}

fn manual_executor(
    config: ExecutorConfig,
) -> (ResilientExecutor<Status>, ManualClock, RecordingObserver) {
    let clock = ManualClock::new();
    let observer = RecordingObserver::new();
    let executor = ResilientExecutor::builder("listings", resilience::GrpcStatusClassifier)
        .config(config)
        .clock(Arc::new(clock.clone()))
        .observer(observer.clone())
        .build()
        .unwrap();
    (executor, clock, observer)
}

// ==================== Executor Scenarios ====================

#[tokio::test]
async fn test_two_transient_failures_then_success() {
    let (executor, clock, observer) = manual_executor(listings_config(5));
    let calls = AtomicU32::new(0);

    let product = executor
        .execute_default(&CallContext::background(), "GetProduct", 42_i64, |id| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Status::unavailable("listings restarting"))
                } else {
                    Ok(id)
                }
            }
        })
        .await;

    assert_eq!(assert_ok!(product), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert_eq!(executor.breaker().state(), CircuitState::Closed);
    assert_eq!(executor.breaker().consecutive_failures(), 0);
    assert_eq!(
        observer.events(),
        vec![
            "attempt_started",
            "attempt_failed",
            "attempt_started",
            "attempt_failed",
            "attempt_started",
            "call_succeeded",
        ]
    );
}

#[tokio::test]
async fn test_retry_bound() {
    let (executor, _clock, _observer) = manual_executor(listings_config(5));
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = executor
        .execute_default(&CallContext::background(), "GetProduct", (), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Status::deadline_exceeded("slow")) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match assert_err!(result) {
        CallError::ExhaustedRetries { attempts, last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.transport().map(|s| s.code()), Some(tonic::Code::DeadlineExceeded));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Exhaustion counts once against the breaker
    assert_eq!(executor.breaker().consecutive_failures(), 1);
}

#[tokio::test]
async fn test_non_retryable_short_circuit() {
    let (executor, clock, _observer) = manual_executor(listings_config(5));
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = executor
        .execute_default(&CallContext::background(), "GetProduct", (), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Status::not_found("product 42")) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(clock.sleeps().is_empty());
    let err = assert_err!(result);
    assert_eq!(err.cause().map(|s| s.code()), Some(tonic::Code::NotFound));
}

#[tokio::test]
async fn test_pending_attempt_that_succeeds_is_not_charged_its_timeout() {
    let (executor, clock, _observer) = manual_executor(listings_config(5));
    let started = clock.now();

    let result = executor
        .execute_default(&CallContext::background(), "GetProduct", 7_i64, |id| async move {
            tokio::task::yield_now().await;
            Ok::<_, Status>(id)
        })
        .await;

    assert_eq!(assert_ok!(result), 7);
    assert!(clock.sleeps().is_empty());
    assert_eq!(clock.now(), started);
}

// ==================== Circuit Breaker Tests ====================

#[tokio::test]
async fn test_fast_fail_when_open() {
    let (executor, _clock, observer) = manual_executor(listings_config(5));

    // Auth rejection trips the breaker on the first failure
    let _ = executor
        .execute_default(&CallContext::background(), "GetProduct", (), |_| async {
            Err::<(), _>(Status::unauthenticated("bad service token"))
        })
        .await;
    assert_eq!(executor.breaker().state(), CircuitState::Open);

    let calls = AtomicU32::new(0);
    for _ in 0..10 {
        let result = executor
            .execute_default(&CallContext::background(), "GetProduct", (), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, Status>(()) }
            })
            .await;
        assert!(assert_err!(result).is_unavailable());
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(observer.count("call_rejected"), 10);
    assert_eq!(observer.count("circuit_opened"), 1);
}

#[tokio::test]
async fn test_breaker_recovery_after_cooldown() {
    let mut config = listings_config(3);
    config.retry = RetryPolicy::no_retry();
    let (executor, clock, observer) = manual_executor(config);
    let ctx = CallContext::background();

    for _ in 0..3 {
        let _ = executor
            .execute_default(&ctx, "GetProduct", (), |_| async {
                Err::<(), _>(Status::internal("boom"))
            })
            .await;
    }
    assert_eq!(executor.breaker().state(), CircuitState::Open);
    assert_eq!(executor.breaker().consecutive_failures(), 3);

    // Still within the cooldown
    clock.advance(Duration::from_secs(29));
    assert!(executor.breaker().admit().is_err());

    clock.advance(Duration::from_secs(2));
    {
        let probe = executor.breaker().admit().unwrap();
        assert!(probe.is_probe());
        assert!(executor.breaker().admit().is_err());
    }

    let result = executor
        .execute_default(&ctx, "GetProduct", (), |_| async { Ok::<_, Status>("back") })
        .await;

    assert_eq!(assert_ok!(result), "back");
    assert_eq!(executor.breaker().state(), CircuitState::Closed);
    assert_eq!(executor.breaker().consecutive_failures(), 0);
    assert_eq!(observer.count("circuit_closed"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_half_open_admits_single_probe_call() {
    let mut config = listings_config(1);
    config.retry = RetryPolicy::no_retry();
    let executor = ResilientExecutor::grpc("listings", config).unwrap();
    let ctx = CallContext::background();

    let _ = executor
        .execute_default(&ctx, "GetProduct", (), |_| async {
            Err::<(), _>(Status::unavailable("down"))
        })
        .await;
    assert_eq!(executor.breaker().state(), CircuitState::Open);

    tokio::time::advance(Duration::from_secs(31)).await;

    let probe = {
        let executor = executor.clone();
        tokio::spawn(async move {
            executor
                .execute_default(&CallContext::background(), "GetProduct", (), |_| async {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    Ok::<_, Status>(())
                })
                .await
        })
    };
    // Let the probe get admitted
    tokio::task::yield_now().await;
    assert_eq!(executor.breaker().state(), CircuitState::HalfOpen);

    let concurrent = executor
        .execute_default(&ctx, "GetProduct", (), |_| async { Ok::<_, Status>(()) })
        .await;
    assert!(assert_err!(concurrent).is_unavailable());

    assert_ok!(probe.await.unwrap());
    assert_eq!(executor.breaker().state(), CircuitState::Closed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_breaker_under_concurrency() {
    let breaker = CircuitBreaker::new(
        "listings",
        CircuitBreakerConfig {
            failure_threshold: 5,
            open_cooldown: Duration::from_secs(60),
        },
    );
    let mut config = listings_config(5);
    config.retry = RetryPolicy::no_retry();
    let executor = ResilientExecutor::builder("listings", resilience::GrpcStatusClassifier)
        .config(config)
        .breaker(breaker.clone())
        .build()
        .unwrap();
    let calls = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let executor = executor.clone();
        let calls = calls.clone();
        handles.push(tokio::spawn(async move {
            executor
                .execute_default(&CallContext::background(), "GetProduct", (), move |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err::<(), _>(Status::invalid_argument("bad id")) }
                })
                .await
        }));
    }

    let mut rejected = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap_err().is_unavailable() {
            rejected += 1;
        }
    }

    // Every call either reached the transport or was rejected, never both
    assert_eq!(calls.load(Ordering::SeqCst) + rejected, 50);
    assert!(calls.load(Ordering::SeqCst) >= 5);
    assert_eq!(breaker.state(), CircuitState::Open);
}

// ==================== Cancellation & Deadlines ====================

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff() {
    let mut config = listings_config(5);
    config.retry.initial_backoff = Duration::from_secs(2);
    let executor = ResilientExecutor::grpc("listings", config).unwrap();
    let ctx = CallContext::background();
    let started = tokio::time::Instant::now();

    let canceler = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceler.cancel();
    });

    let result: Result<(), _> = executor
        .execute_default(&ctx, "ListProducts", (), |_| async {
            Err(Status::unavailable("down"))
        })
        .await;

    let err = result.unwrap_err();
    assert!(err.is_canceled());
    assert_eq!(err.attempts(), Some(1));
    assert_eq!(err.cause().map(|s| s.code()), Some(tonic::Code::Unavailable));
    assert_eq!(err.cause().map(|s| s.message()), Some("down"));
    assert!(started.elapsed() < Duration::from_millis(100));
    assert_eq!(executor.breaker().state(), CircuitState::Closed);
    assert_eq!(executor.breaker().consecutive_failures(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_in_flight_attempt_is_not_a_failure() {
    let executor = ResilientExecutor::grpc("listings", listings_config(1)).unwrap();
    let ctx = CallContext::background();

    let canceler = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceler.cancel();
    });

    let result: Result<(), _> = executor
        .execute_default(&ctx, "GetProduct", (), |_| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(())
        })
        .await;

    assert!(matches!(
        result,
        Err(CallError::Canceled {
            last: None,
            attempts: 1
        })
    ));
    // A threshold of 1 would have opened on any recorded failure
    assert_eq!(executor.breaker().state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_batch_timeout_applies_per_attempt() {
    let executor = ResilientExecutor::grpc("listings", listings_config(5)).unwrap();
    let ctx = CallContext::background();

    // 7s fits the 10s batch budget but not the 5s single-entity one
    let slow = |_: ()| async {
        tokio::time::sleep(Duration::from_secs(7)).await;
        Ok::<_, Status>("page")
    };

    let batch = executor.execute_batch(&ctx, "GetProductsBySKUs", (), slow).await;
    assert_eq!(assert_ok!(batch), "page");

    let single = executor.execute_default(&ctx, "GetProduct", (), slow).await;
    let err = assert_err!(single);
    assert!(err.is_timeout());
    assert_eq!(err.attempts(), Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_caller_deadline_caps_total_latency() {
    let executor = ResilientExecutor::grpc("listings", listings_config(5)).unwrap();
    let ctx = CallContext::background().with_timeout(Duration::from_secs(1));
    let started = tokio::time::Instant::now();

    let result: Result<(), _> = executor
        .execute_default(&ctx, "GetProduct", (), |_| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(CallError::Timeout { .. })));
    assert!(started.elapsed() <= Duration::from_millis(1001));
    assert_eq!(executor.breaker().consecutive_failures(), 0);
}

#[test]
fn test_classifier_is_total_over_codes() {
    for code in 0..=16 {
        let class = resilience::classify_code(tonic::Code::from_i32(code));
        assert!(matches!(
            class,
            ErrorClass::Retryable
                | ErrorClass::NonRetryable
                | ErrorClass::CircuitTrip
                | ErrorClass::CallerCanceled
        ));
    }
}
