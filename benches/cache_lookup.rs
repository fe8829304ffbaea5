//! Benchmarks for the hot path of a repeated query
//!
//! This benchmark measures:
//! - Fingerprinting requests with growing history
//! - Cache lookups (hit and miss)
//! - Citation-marker stripping
//! - A full cached `query` through the orchestrator

use ai_query_orchestrator::cache::{CacheKey, CacheKeyGenerator, ResponseCache};
use ai_query_orchestrator::drivers::{AdapterReply, AdapterRequest, ProviderAdapter};
use ai_query_orchestrator::normalize::strip_citation_markers;
use ai_query_orchestrator::{
    Backend, Message, OrchestratorConfig, QueryOrchestratorBuilder, QueryRequest, QueryResponse,
};
use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::time::Duration;

fn request_with_history(turns: usize) -> QueryRequest {
    let history = (0..turns)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(format!("question number {i}"))
            } else {
                Message::assistant(format!("answer number {i}"))
            }
        })
        .collect();
    QueryRequest::new("And what about the next one?")
        .with_context("benchmark conversation")
        .with_history(history)
}

fn sample_response() -> QueryResponse {
    QueryResponse {
        content: "Paris is the capital of France.".to_string(),
        provider: Backend::Perplexity,
        model: "sonar".to_string(),
        latency_ms: 120,
        citations: Some(vec!["https://example.com/paris".to_string()]),
        cached: false,
        tier: 1,
    }
}

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");
    let keys = CacheKeyGenerator::new();

    for turns in [0usize, 10, 50] {
        let req = request_with_history(turns);
        group.throughput(Throughput::Elements(turns.max(1) as u64));
        group.bench_with_input(BenchmarkId::new("history_turns", turns), &req, |b, req| {
            b.iter(|| keys.generate(black_box(req)))
        });
    }
    group.finish();
}

fn bench_cache_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_lookup");
    let cache = ResponseCache::new(Duration::from_secs(300), 1000);
    for i in 0..1000 {
        cache.set(&CacheKey::new(format!("key-{i}")), &sample_response());
    }
    let hit = CacheKey::new("key-500");
    let miss = CacheKey::new("absent");

    group.bench_function("hit", |b| b.iter(|| cache.get(black_box(&hit))));
    group.bench_function("miss", |b| b.iter(|| cache.get(black_box(&miss))));
    group.finish();
}

fn bench_citation_strip(c: &mut Criterion) {
    let text = "Paris [1] is the capital [2][3] of France, with about 2.1 million residents [4]. "
        .repeat(20);
    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("strip_citation_markers", |b| {
        b.iter(|| strip_citation_markers(black_box(&text)))
    });
    group.finish();
}

struct Immediate;

#[async_trait]
impl ProviderAdapter for Immediate {
    async fn call(&self, _: &AdapterRequest) -> ai_query_orchestrator::Result<AdapterReply> {
        Ok(AdapterReply::text("4"))
    }
}

fn bench_cached_query(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let orch = rt.block_on(async {
        let orch = QueryOrchestratorBuilder::new()
            .config(OrchestratorConfig::default().with_tier_order(vec![Backend::OpenAi]))
            .adapter(Backend::OpenAi, Arc::new(Immediate))
            .build()
            .await
            .expect("orchestrator");
        orch.query(QueryRequest::new("What is 2+2?"))
            .await
            .expect("warm-up query");
        orch
    });

    c.bench_function("query_cached", |b| {
        b.to_async(&rt)
            .iter(|| async { orch.query(QueryRequest::new("What is 2+2?")).await })
    });
}

criterion_group!(
    benches,
    bench_fingerprint,
    bench_cache_lookup,
    bench_citation_strip,
    bench_cached_query
);
criterion_main!(benches);
