//! Benchmarks for the request-path pipeline.
//!
//! Run with: cargo bench -p pathguard

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use pathguard::{
    preprocess, sanitize, CompileOptions, GuardConfig, PathContext, PathPatternCompiler,
    PathValidator, RequestInterceptor, RouteCompiler,
};

/// Inputs covering the common shapes seen in request paths.
fn sample_paths() -> Vec<(&'static str, &'static str)> {
    vec![
        ("plain", "/api/v1/users/42/orders"),
        ("param", "/users/:userId/orders/:orderId"),
        ("absolute", "http://localhost:3000/api/test?debug=true"),
        ("embedded_url", "/api/resource/https://problem.com/path"),
        ("broken_param", "/test/:"),
        ("metachars", "/files/report.v2+final[1].pdf"),
    ]
}

fn bench_preprocess(c: &mut Criterion) {
    let mut group = c.benchmark_group("preprocess");
    for (name, path) in sample_paths() {
        group.bench_with_input(BenchmarkId::new("preprocess", name), path, |b, path| {
            b.iter(|| black_box(preprocess(path)));
        });
    }
    group.finish();
}

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");
    for (name, path) in sample_paths() {
        group.bench_with_input(BenchmarkId::new("sanitize", name), path, |b, path| {
            b.iter(|| black_box(sanitize(path)));
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    let options = CompileOptions::default();

    for (name, path) in sample_paths() {
        // Every call after the first is a cache hit.
        let validator = PathValidator::new();
        group.bench_with_input(BenchmarkId::new("cached", name), path, |b, path| {
            b.iter(|| black_box(validator.validate(path)));
        });

        let pattern = preprocess(path);
        group.bench_with_input(
            BenchmarkId::new("compile", name),
            &pattern,
            |b, pattern| {
                b.iter(|| black_box(PathPatternCompiler.compile(pattern, &options).is_ok()));
            },
        );
    }

    // Distinct patterns churning through a small LRU.
    let validator = PathValidator::from_config(&GuardConfig::new().with_cache_capacity(64));
    let churn: Vec<String> = (0..256).map(|i| format!("/tenant/{i}/items/:id")).collect();
    group.bench_function("lru_churn", |b| {
        b.iter(|| {
            for pattern in &churn {
                black_box(validator.validate(pattern));
            }
        });
    });

    group.finish();
}

fn bench_intercept(c: &mut Criterion) {
    let interceptor = RequestInterceptor::new(Arc::new(PathValidator::new()));
    let mut group = c.benchmark_group("intercept");

    for (name, path) in sample_paths() {
        group.bench_with_input(BenchmarkId::new("context", name), path, |b, path| {
            b.iter(|| {
                let mut ctx = PathContext::new(path)
                    .with_original_url(path)
                    .with_path(path);
                black_box(interceptor.intercept(&mut ctx).is_ok());
                ctx
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_preprocess,
    bench_sanitize,
    bench_validate,
    bench_intercept
);
criterion_main!(benches);
