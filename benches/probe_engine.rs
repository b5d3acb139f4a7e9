//! 探测引擎基准测试
//!
//! 测试探测结果处理和指标编码的性能

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use url_vitals::metrics::PushgatewaySink;
use url_vitals::probe::{normalize_target, ProbeOutcome, RetryPolicy};

/// 探测结果处理基准测试
fn probe_engine_benchmark(c: &mut Criterion) {
    c.bench_function("probe_outcome_creation", |b| {
        b.iter(|| {
            let outcome = ProbeOutcome::from_response(
                "github.com".to_string(),
                "http://github.com".to_string(),
                200,
                87,
            );
            black_box(outcome)
        });
    });

    c.bench_function("probe_outcome_serialization", |b| {
        let outcome = ProbeOutcome::from_failure(
            "10.0.0.1:9999".to_string(),
            "http://10.0.0.1:9999".to_string(),
            "connection refused".to_string(),
            3021,
        );

        b.iter(|| {
            let json = serde_json::to_string(&outcome).unwrap();
            black_box(json)
        });
    });

    c.bench_function("normalize_target", |b| {
        b.iter(|| {
            let url = normalize_target(black_box("example.com:8080/health"));
            black_box(url)
        });
    });

    c.bench_function("backoff_delay_computation", |b| {
        let policy = RetryPolicy::default();

        b.iter(|| {
            for attempt in 1..=10 {
                black_box(policy.backoff_delay(black_box(attempt)));
            }
        });
    });
}

/// 指标编码基准测试
fn metrics_encoding_benchmark(c: &mut Criterion) {
    c.bench_function("pushgateway_text_encoding", |b| {
        let outcomes = sample_outcomes();

        b.iter(|| {
            let body = PushgatewaySink::encode(&outcomes).unwrap();
            black_box(body)
        });
    });
}

/// 构造20个目标的批次结果
fn sample_outcomes() -> Vec<ProbeOutcome> {
    (0..20)
        .map(|i| {
            if i % 5 == 0 {
                ProbeOutcome::from_failure(
                    format!("target-{i}.example.com"),
                    format!("http://target-{i}.example.com"),
                    "timeout".to_string(),
                    10_000,
                )
            } else {
                ProbeOutcome::from_response(
                    format!("target-{i}.example.com"),
                    format!("http://target-{i}.example.com"),
                    200,
                    40 + i as u64,
                )
            }
        })
        .collect()
}

criterion_group!(
    benches,
    probe_engine_benchmark,
    metrics_encoding_benchmark
);
criterion_main!(benches);
