//! Criterion benchmarks for patch generation
//!
//! Patch generation runs inline in every admission request, so these track
//! its cost across pod shapes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use k8s_openapi::api::core::v1::PodSpec;
use serde_json::json;

use apm_injector::{create_patch, AgentConfig};

// =============================================================================
// Test Fixtures
// =============================================================================

fn config(vars: usize) -> AgentConfig {
    (0..vars).fold(AgentConfig::new(), |config, i| {
        config.with_env(format!("ELASTIC_APM_VAR_{i:03}"), format!("value-{i}"))
    })
}

fn pod_spec(containers: usize, with_env: bool) -> PodSpec {
    let containers: Vec<_> = (0..containers)
        .map(|i| {
            if with_env {
                json!({"name": format!("c{i}"), "env": [{"name": "PORT", "value": "8080"}]})
            } else {
                json!({"name": format!("c{i}")})
            }
        })
        .collect();
    serde_json::from_value(json!({"containers": containers})).expect("valid pod spec")
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_containers(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_patch/containers");
    let config = config(5);

    for count in [1, 4, 16] {
        group.throughput(Throughput::Elements(count as u64));
        for with_env in [false, true] {
            let spec = pod_spec(count, with_env);
            let id = if with_env { "append" } else { "create" };
            group.bench_with_input(BenchmarkId::new(id, count), &spec, |b, spec| {
                b.iter(|| create_patch(black_box(&config), black_box(spec)))
            });
        }
    }

    group.finish();
}

fn bench_environment_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_patch/environment");
    let spec = pod_spec(2, true);

    for vars in [0, 10, 50] {
        let config = config(vars);
        group.bench_with_input(BenchmarkId::from_parameter(vars), &config, |b, config| {
            b.iter(|| create_patch(black_box(config), black_box(&spec)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_containers, bench_environment_size);
criterion_main!(benches);
