//! Routing benchmarks.
//!
//! Run with: `cargo bench -p carica-router`

use carica_core::{ActionDeclaration, ActionOutput, ActionRef, Value};
use carica_router::RouteTable;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;

fn action(id: String) -> ActionRef {
    ActionRef::from_fn(id, ActionDeclaration::new(), |_| {
        Ok(ActionOutput::from(Value::Null))
    })
}

fn build_routes(num_routes: usize) -> RouteTable {
    let mut routes = RouteTable::new();

    for i in 0..num_routes / 3 {
        routes
            .get(&format!("/api/v1/resource{i}"), action(format!("getResource{i}")))
            .expect("static route");
    }

    for i in 0..num_routes / 3 {
        routes
            .get(
                &format!("/api/v1/resource{i}/{{id}}"),
                action(format!("getResourceById{i}")),
            )
            .expect("param route");
    }

    for i in 0..num_routes / 3 {
        routes
            .get(
                &format!("/api/v1/org/{{orgId}}/resource{i}/{{id}}"),
                action(format!("getOrgResource{i}")),
            )
            .expect("nested route");
    }

    routes
}

fn bench_static_match(c: &mut Criterion) {
    let routes = build_routes(100);

    c.bench_function("static_match", |b| {
        b.iter(|| black_box(routes.match_route(&Method::GET, "/api/v1/resource20")));
    });
}

fn bench_param_match(c: &mut Criterion) {
    let routes = build_routes(100);

    c.bench_function("param_match", |b| {
        b.iter(|| black_box(routes.match_route(&Method::GET, "/api/v1/resource25/12345")));
    });
}

fn bench_nested_param_match(c: &mut Criterion) {
    let routes = build_routes(100);

    c.bench_function("nested_param_match", |b| {
        b.iter(|| {
            black_box(routes.match_route(&Method::GET, "/api/v1/org/acme-corp/resource10/12345"))
        });
    });
}

fn bench_method_not_allowed(c: &mut Criterion) {
    let routes = build_routes(100);

    c.bench_function("method_not_allowed", |b| {
        b.iter(|| black_box(routes.match_route(&Method::DELETE, "/api/v1/resource10")));
    });
}

fn bench_miss(c: &mut Criterion) {
    let routes = build_routes(100);

    c.bench_function("miss", |b| {
        b.iter(|| black_box(routes.match_route(&Method::GET, "/api/v1/nonexistent/path")));
    });
}

fn bench_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("scaling");

    for num_routes in [30, 300, 900] {
        let routes = build_routes(num_routes);
        group.bench_with_input(
            BenchmarkId::new("param_match", num_routes),
            &num_routes,
            |b, _| {
                b.iter(|| black_box(routes.match_route(&Method::GET, "/api/v1/resource5/42")));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_static_match,
    bench_param_match,
    bench_nested_param_match,
    bench_method_not_allowed,
    bench_miss,
    bench_scaling
);
criterion_main!(benches);
