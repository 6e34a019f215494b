use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use flyux::runtime::object_map::ObjectMap;
use flyux::runtime::object_ops::{get_field, set_field};
use flyux::runtime::value::Value;

fn keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("field_{}", i)).collect()
}

fn build(keys: &[String]) -> Value {
    let object = Value::object(ObjectMap::new());
    for (i, key) in keys.iter().enumerate() {
        set_field(&object, key, Value::number(i as f64 + 0.5));
    }
    object
}

fn bench_object_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("object/insert");

    // 4 and 8 stay in linear storage; the rest are hashed.
    for &size in &[4, 8, 64, 1_000] {
        let names = keys(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &names, |b, names| {
            b.iter(|| black_box(build(names)));
        });
    }

    group.finish();
}

fn bench_object_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("object/lookup");

    for &size in &[4, 8, 64, 1_000] {
        let names = keys(size);
        let object = build(&names);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &names, |b, names| {
            b.iter(|| {
                for name in names {
                    black_box(get_field(&object, name));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_object_insert, bench_object_lookup);
criterion_main!(benches);
