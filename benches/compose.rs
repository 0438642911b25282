use criterion::{black_box, criterion_group, criterion_main, Criterion};
use encore::ops::{limit_max_tries, nope, stop_on_success, with_counter};
use encore::{backoff, compose, ops, repeat, Backoff, Operation, Outcome};
use std::time::Duration;

fn compose_pass(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut op = compose(ops![nope(), nope(), nope(), nope(), nope(), nope(), nope(), nope()]);

    c.bench_function("compose_eight_step_pass", |b| {
        b.iter(|| rt.block_on(async { black_box(op.call(Outcome::retry()).await) }))
    });
}

fn repeat_until_success(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("repeat_ten_temporary_then_success", |b| {
        b.to_async(&rt).iter(|| async {
            let result = repeat(ops![
                with_counter(|attempt| if attempt < 10 {
                    Outcome::temporary("busy")
                } else {
                    Outcome::Success
                }),
                stop_on_success(),
                limit_max_tries(20),
            ])
            .await;
            black_box(result)
        })
    });
}

fn backoff_generators(c: &mut Criterion) {
    let mut exponential = backoff::exponential(Duration::from_millis(10))
        .with_jitter(0.5)
        .unwrap()
        .with_max_delay(Duration::from_secs(30))
        .with_seed(1)
        .build();
    c.bench_function("exponential_next_delay", |b| {
        b.iter(|| black_box(exponential.next_delay()))
    });

    let mut full_jitter = backoff::full_jitter(Duration::from_millis(10))
        .with_max_delay(Duration::from_secs(30))
        .unwrap()
        .with_seed(1)
        .build();
    c.bench_function("full_jitter_next_delay", |b| b.iter(|| black_box(full_jitter.next_delay())));
}

criterion_group!(benches, compose_pass, repeat_until_success, backoff_generators);
criterion_main!(benches);
