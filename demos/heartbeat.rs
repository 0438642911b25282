//! Heartbeat every second until cancelled after seven seconds.

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
        tokio::time::sleep(Duration::from_secs(7)).await;
        canceller.cancel();
    });

    let mut last = Instant::now();
    let result = repeat(ops![
        with_counter(move |attempt| {
            println!("Attempt #{}, Delay {:?}", attempt, last.elapsed());
            last = Instant::now();
            Outcome::Success
        }),
        presets::heartbeat(Duration::from_secs(1), token),
    ])
    .await;

    if let Err(err) = result {
        println!("Repetition process is finished with: {}", err);
    }
}
