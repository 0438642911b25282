//! Heartbeat that gives up once failures persist for three seconds.
//!
//! The step succeeds four times, then keeps failing; the error timeout ends the loop.

use encore::ops::with_counter;
use encore::{ops, presets, repeat, Outcome};
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
            if attempt > 3 && attempt < 8 {
                Outcome::temporary("can't connect to a server")
            } else {
                Outcome::Success
            }
        }),
        presets::heartbeat_with_error_timeout(Duration::from_secs(1), Duration::from_secs(3)),
    ])
    .await;

    if let Err(err) = result {
        println!("Repetition process is finished with: {}", err);
    }
}
