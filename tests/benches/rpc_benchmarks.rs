//! RPC path benchmarks: registry bookkeeping and a full in-process round
//! trip through the broker.

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Value;
use shared_bus::InMemoryBroker;
use shared_rpc::{normalize_payload, CorrelationRegistry, HandlerError, RpcConfig, RpcEndpoint, RpcHandler};
use shared_types::Response;
use std::sync::Arc;
use std::time::Duration;

struct Echo;

#[async_trait]
impl RpcHandler for Echo {
    type Request = Value;
    type Reply = Value;

    async fn handle(&self, request: Value) -> Result<Response<Value>, HandlerError> {
        Ok(Response::ok(request))
    }
}

fn bench_registry(c: &mut Criterion) {
    let registry = CorrelationRegistry::new();

    c.bench_function("registry_register_resolve", |b| {
        b.iter(|| {
            let (id, _rx) = registry.register("bench", Duration::from_secs(1));
            black_box(registry.resolve(id, Response::ok(Value::Null)))
        })
    });

    c.bench_function("registry_register_expire", |b| {
        b.iter(|| {
            let (id, _rx) = registry.register("bench", Duration::from_secs(1));
            black_box(registry.expire(&id))
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    let nested = serde_json::to_string(&serde_json::to_string("p-42").unwrap()).unwrap();

    c.bench_function("normalize_nested_string", |b| {
        b.iter(|| black_box(normalize_payload(nested.as_bytes())))
    });
}

fn bench_round_trip(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let (caller, _callee, topic) = runtime.block_on(async {
        let broker = Arc::new(InMemoryBroker::new());
        let mut callee = RpcEndpoint::new(Arc::clone(&broker), RpcConfig::for_service("callee"));
        let topics = callee.config().topics.clone();
        callee.serve(&topics.product_lookup, Arc::new(Echo)).unwrap();

        let mut caller = RpcEndpoint::new(Arc::clone(&broker), RpcConfig::for_service("caller"));
        caller.listen_replies(&topics.product_lookup).unwrap();
        (caller, callee, topics.product_lookup.request)
    });
    let client = caller.client().clone();

    c.bench_function("rpc_round_trip", |b| {
        b.iter(|| {
            runtime.block_on(async {
                let reply: Response<Value> = client
                    .call(&topic, "ping", Duration::from_secs(1))
                    .await
                    .unwrap();
                black_box(reply)
            })
        })
    });
}

criterion_group!(benches, bench_registry, bench_normalize, bench_round_trip);
criterion_main!(benches);
