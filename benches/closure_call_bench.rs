use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use flyux::runtime::arith;
use flyux::runtime::closure::{self, CaptureMode, EntryPoint, bind_self_capture};
use flyux::runtime::value::Value;

fn add_captured(args: &[Value]) -> Value {
    arith::add(&args[0], &args[1])
}

// args: [n, self]
fn fib(args: &[Value]) -> Value {
    let n = args[0].as_number().unwrap_or(0.0);
    if n < 2.0 {
        return args[0].clone();
    }
    let a = closure::call(&args[1], &[Value::number(n - 1.0)]);
    let b = closure::call(&args[1], &[Value::number(n - 2.0)]);
    arith::add(&a, &b)
}

fn bench_capture_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure/call");

    for mode in [CaptureMode::ByValue, CaptureMode::ByReference] {
        let f = Value::closure(
            EntryPoint::Native(add_captured),
            1,
            vec![Value::number(1000.5)],
            mode,
        );
        let arg = Value::number(2.0);
        group.bench_function(BenchmarkId::new("captured_add", format!("{:?}", mode)), |b| {
            b.iter(|| black_box(closure::call(&f, std::slice::from_ref(&arg))));
        });
    }

    group.finish();
}

fn bench_recursive(c: &mut Criterion) {
    let mut group = c.benchmark_group("closure/recursive");

    let f = Value::native_fn(fib, 1, vec![Value::undefined()]);
    bind_self_capture(&f, 0);
    for &n in &[10.0, 18.0] {
        group.bench_with_input(BenchmarkId::new("fib", n), &n, |b, &n| {
            b.iter(|| black_box(closure::call(&f, &[Value::number(n)])));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_capture_modes, bench_recursive);
criterion_main!(benches);
