//! # Network State Benchmarks
//!
//! | Path | Work per call |
//! |------|---------------|
//! | `parse_edges` | one full management response |
//! | `parse_forwarding_line` | one journal line |
//! | `LoginThrottle::record_failure` at cap | one overflow eviction scan |
//! | `compare_virtual_addresses` | sorting a listing |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use n2n_netstate::domain::edges::parse_edges;
use n2n_netstate::domain::ordering::compare_virtual_addresses;
use n2n_netstate::domain::relay_line::parse_forwarding_line;
use n2n_netstate::test_utils::ManualTimeSource;
use n2n_netstate::{LoginConfig, LoginThrottle, ThrottleKey};
use std::net::Ipv4Addr;
use std::sync::Arc;

fn edges_response(edges: usize) -> String {
    let mut out = String::from("COMMUNITY 'bench'\n");
    for i in 0..edges {
        out.push_str(&format!(
            "    {i} | 10.{}.{}.{} | 02:00:{:02x}:{:02x}:{:02x}:01 | 198.51.100.{}:{} |  | {}\n",
            (i >> 16) & 0xff,
            (i >> 8) & 0xff,
            i & 0xff,
            (i >> 16) & 0xff,
            (i >> 8) & 0xff,
            i & 0xff,
            i % 250,
            40_000 + i % 20_000,
            1_700_000_000 + i
        ));
    }
    out
}

fn bench_parse_edges(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse-edges");
    for edges in [10usize, 100, 1_000] {
        let response = edges_response(edges);
        group.throughput(Throughput::Elements(edges as u64));
        group.bench_with_input(BenchmarkId::from_parameter(edges), &response, |b, r| {
            b.iter(|| parse_edges(black_box(r)))
        });
    }
    group.finish();
}

fn bench_forwarding_line(c: &mut Criterion) {
    let hit = "Mar 02 10:00:01 gw supernode[812]: forwarding packet of 98 bytes \
               from aa:bb:cc:dd:ee:09 to aa:bb:cc:dd:ee:10";
    let miss = "Mar 02 10:00:01 gw supernode[812]: [OK] edge registered";

    c.bench_function("parse-forwarding-line/hit", |b| {
        b.iter(|| parse_forwarding_line(black_box(hit)))
    });
    c.bench_function("parse-forwarding-line/miss", |b| {
        b.iter(|| parse_forwarding_line(black_box(miss)))
    });
}

fn bench_throttle_at_cap(c: &mut Criterion) {
    let clock = Arc::new(ManualTimeSource::new(1_000_000));
    let throttle = LoginThrottle::new(LoginConfig::default(), clock);
    let account = ThrottleKey::account("admin");
    for i in 0..10_000u32 {
        throttle.record_failure(&ThrottleKey::client(Ipv4Addr::from(i)), &account);
    }

    let mut next = 10_000u32;
    c.bench_function("login-throttle/record-failure-at-cap", |b| {
        b.iter(|| {
            next = next.wrapping_add(1);
            throttle.record_failure(&ThrottleKey::client(Ipv4Addr::from(next)), &account)
        })
    });
}

fn bench_address_sort(c: &mut Criterion) {
    let mut addresses: Vec<String> = (0..1_000u32)
        .rev()
        .map(|i| Ipv4Addr::from(0x0A00_0000 + i * 37).to_string())
        .collect();
    addresses.push("fd00::1".to_string());
    addresses.push(String::new());

    c.bench_function("virtual-address-sort/1000", |b| {
        b.iter(|| {
            let mut list = addresses.clone();
            list.sort_by(|a, b| compare_virtual_addresses(a, b));
            list
        })
    });
}

criterion_group!(
    benches,
    bench_parse_edges,
    bench_forwarding_line,
    bench_throttle_at_cap,
    bench_address_sort
);
criterion_main!(benches);
