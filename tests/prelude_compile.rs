//! Compile-time prelude coverage test.
use encore::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn prelude_reexports_core_types() {
    let token = CancellationToken::new();
    let repeater = Repeater::new()
        .with_cancellation(token.clone())
        .wrap(forward())
        .destruct_policy(DestructPolicy::Escalate);

    let result = repeater
        .repeat(ops![
            with_counter(|attempt| if attempt < 2 { Outcome::retry() } else { Outcome::Success }),
            stop_on_success(),
            limit_max_tries(5),
            with_delay(
                DelayOptions::new()
                    .backoff(FixedBackoffBuilder { delay: Duration::ZERO })
                    .cancellation(token),
            ),
        ])
        .await;
    assert!(result.is_ok());

    let _builders: (ExponentialBackoffBuilder, FullJitterBackoffBuilder) =
        (Default::default(), Default::default());
}
