use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlweave::{Expr, MySql, Postgres, SelectStmt, SqlStmt, select};

/// SELECT col0, col1, ... FROM t WHERE col0 = ? AND col1 = ? ...
fn select_with_filters(n: usize) -> SelectStmt {
    let cols: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let col_refs: Vec<&str> = cols.iter().map(String::as_str).collect();
    let mut q = select("t").select_cols(&col_refs);
    for (i, col) in cols.iter().enumerate() {
        q = q.eq(col, i as i64);
    }
    q
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/build");

    for n in [1, 5, 10, 50, 100] {
        let q = select_with_filters(n);
        group.bench_with_input(BenchmarkId::new("postgres", n), &q, |b, q| {
            b.iter(|| black_box(q.build(&Postgres)));
        });
        group.bench_with_input(BenchmarkId::new("mysql", n), &q, |b, q| {
            b.iter(|| black_box(q.build(&MySql)));
        });
    }

    group.finish();
}

fn bench_compose_and_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/compose_and_build");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(select_with_filters(n).build(&Postgres)));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/in_list");

    for n in [5, 20, 100, 500] {
        let ids: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &ids, |b, ids| {
            b.iter(|| {
                let q = select("t").in_list("id", ids.iter().copied());
                black_box(q.build(&Postgres))
            });
        });
    }

    group.finish();
}

fn bench_nested_subqueries(c: &mut Criterion) {
    let mut group = c.benchmark_group("sql_builder/nested_subqueries");

    for depth in [1, 3, 6] {
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut q = select("t0").select("id").eq("level", 0i64);
                for d in 1..=depth {
                    q = select(&format!("t{d}"))
                        .select("id")
                        .eq("level", d as i64)
                        .where_(Expr::in_subquery("id", q));
                }
                black_box(q.build(&Postgres))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_compose_and_build,
    bench_in_list,
    bench_nested_subqueries
);
criterion_main!(benches);
