//! Retry a flaky step with full-jitter backoff.
//!
//! The step fails five times before it succeeds; each attempt prints the time waited since the
//! previous one.

use encore::ops::{limit_max_tries, stop_on_success, with_counter};
use encore::{backoff, ops, repeat, with_delay, DelayOptions, Outcome};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut last = Instant::now();
    let result = repeat(ops![
        with_counter(move |attempt| {
            println!("Attempt #{}, Delay {:?}", attempt, last.elapsed());
            last = Instant::now();
            if attempt < 5 {
                Outcome::temporary("can't connect to a server")
            } else {
                Outcome::Success
            }
        }),
        stop_on_success(),
        limit_max_tries(10),
        with_delay(DelayOptions::new().backoff(backoff::full_jitter(Duration::from_millis(500)))),
    ])
    .await;

    println!("Repetition process is finished with: {:?}", result);
}
