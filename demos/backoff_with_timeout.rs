//! Retry with backoff, abandoned after three seconds through a cancellation token.

use encore::ops::with_counter;
use encore::{ops, presets, repeat, CancellationToken, Outcome};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        canceller.cancel();
    });

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
        presets::backoff_retry_until_cancelled(Duration::from_millis(500), 10, token),
    ])
    .await;

    match result {
        Ok(()) => println!("Repetition process is finished"),
        Err(err) => println!("Repetition process is finished with: {}", err),
    }
}
