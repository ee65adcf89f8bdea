//! Admission and session resolution benchmarks.
//!
//! Measures the two hot paths of the orchestrator loop:
//! - Admission pass over queues of 100, 1 000 and 10 000 requests
//! - Remote resolution against registries with and without host groups
//!
//! Run with: cargo bench --bench admission
//! Results saved to: target/criterion/

use std::hint::black_box;
use std::net::{IpAddr, Ipv4Addr};

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use url::Url;

use stealth_core::request::{PendingRequest, RequestQueue};
use stealth_core::session::SessionRegistry;
use stealth_core::{
    ConnectionClass, Execution, HostGroup, ModeProfile, RemoteIdentity, RequestConfig, RequestId,
};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const QUEUE_SIZES: &[usize] = &[100, 1_000, 10_000];
const REGISTRY_SIZES: &[u8] = &[16, 64, 250];

// ============================================================================
// Fixtures
// ============================================================================

struct Noop;

impl Execution for Noop {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

fn queue(size: usize) -> RequestQueue {
    let mut queue = RequestQueue::new();
    for i in 0..size {
        let url = Url::parse(&format!("https://host{i}.example/")).unwrap();
        let config = RequestConfig {
            url,
            mode: ModeProfile::pending(None),
            user_agent: None,
            proxy: None,
        };
        queue.push(PendingRequest::new(RequestId::generate(), config, Box::new(Noop)));
    }
    queue
}

fn lan(last: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
}

fn registry(size: u8) -> SessionRegistry {
    let mut registry = SessionRegistry::new();
    for last in 1..=size {
        registry.resolve(RemoteIdentity::new(lan(last), 40000).into(), &[]);
    }
    registry
}

// ============================================================================
// Benchmark: Admission Pass
// ============================================================================

fn bench_admit(c: &mut Criterion) {
    let mut group = c.benchmark_group("admit");

    for &size in QUEUE_SIZES {
        group.bench_with_input(BenchmarkId::new("broadband", size), &size, |b, &size| {
            b.iter_batched(
                || queue(size),
                |mut queue| {
                    black_box(queue.admit(ConnectionClass::Broadband.budget()));
                    black_box(queue.admit(ConnectionClass::Broadband.budget()))
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Session Resolution
// ============================================================================

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for &size in REGISTRY_SIZES {
        group.bench_with_input(BenchmarkId::new("known_remote", size), &size, |b, &size| {
            let mut registry = registry(size);
            let remote = RemoteIdentity::new(lan(size), 40001);
            b.iter(|| black_box(registry.resolve(remote.into(), &[]).id()));
        });

        group.bench_with_input(BenchmarkId::new("host_group", size), &size, |b, &size| {
            let groups = [HostGroup::new("laptop.home", [lan(1), lan(size)])];
            let mut registry = registry(size);
            let remote = RemoteIdentity::new(lan(1), 40001);
            b.iter(|| black_box(registry.resolve(remote.into(), &groups).id()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_admit, bench_resolve);
criterion_main!(benches);
