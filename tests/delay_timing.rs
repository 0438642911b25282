use encore::ops::{limit_max_tries, stop_on_success, with_counter};
use encore::{backoff, ops, repeat, with_delay, CancellationToken, DelayOptions, Outcome, Repeater};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn errors_timeout_ends_the_loop_with_the_last_cause() {
    let start = Instant::now();
    let err = repeat(ops![
        with_counter(|_| Outcome::temporary("still failing")),
        with_delay(
            DelayOptions::new()
                .backoff(backoff::fixed(Duration::from_millis(10)))
                .errors_timeout(Duration::from_millis(30)),
        ),
    ])
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "still failing");
    assert_eq!(start.elapsed(), Duration::from_millis(30));
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_wait_returns_promptly() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        canceller.cancel();
    });

    let start = Instant::now();
    let err = repeat(ops![
        with_counter(|_| Outcome::retry()),
        with_delay(
            DelayOptions::new()
                .backoff(backoff::fixed(Duration::from_secs(60)))
                .cancellation(token),
        ),
    ])
    .await
    .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(start.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn repeater_cancellation_stops_between_passes() {
    let token = CancellationToken::new();
    let canceller = token.clone();
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_clone = calls.clone();

    let result = Repeater::new()
        .with_cancellation(token)
        .repeat(ops![
            with_counter(move |attempt| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
                if attempt == 2 {
                    canceller.cancel();
                }
                Outcome::Success
            }),
            with_delay(DelayOptions::new().backoff(backoff::fixed(Duration::from_millis(5)))),
        ])
        .await;

    // the wrapped delay is skipped and reports the cancellation as a stop
    assert!(result.unwrap_err().is_cancelled());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn full_jitter_waits_stay_under_the_ceilings() {
    let start = Instant::now();
    let result = repeat(ops![
        with_counter(|attempt| if attempt < 4 { Outcome::retry() } else { Outcome::Success }),
        stop_on_success(),
        limit_max_tries(10),
        with_delay(
            DelayOptions::new()
                .backoff(backoff::full_jitter(Duration::from_millis(100)).with_seed(11)),
        ),
    ])
    .await;
    assert!(result.is_ok());
    assert!(start.elapsed() < Duration::from_millis(100 + 200 + 400 + 800));
}
