use criterion::{black_box, criterion_group, criterion_main, Criterion};
use verbs::script::builtins::lookup;
use verbs::script::curry::apply;
use verbs::script::deferred::bind;
use verbs::script::{CompiledExpression, Value};

const FORMULA: &str = "sqrt(a ^ 2 + b ^ 2) * (c > 0 ? c : -c) + sin(pi / 4)";

fn args(i: i64) -> Vec<Value> {
    vec![Value::Int(i), Value::Int(i + 1), Value::Int(-i)]
}

fn bench_eval(c: &mut Criterion) {
    let compiled = CompiledExpression::compile(FORMULA).unwrap();

    let mut g = c.benchmark_group("eval");

    g.bench_function("compile_once", |b| {
        let mut i = 0;
        b.iter(|| {
            i += 1;
            compiled.evaluate(black_box(&bind(&args(i)))).unwrap()
        })
    });
    g.bench_function("recompile_each_call", |b| {
        let mut i = 0;
        b.iter(|| {
            i += 1;
            CompiledExpression::compile(black_box(FORMULA))
                .unwrap()
                .evaluate(&bind(&args(i)))
                .unwrap()
        })
    });

    g.finish();
}

fn bench_curry(c: &mut Criterion) {
    let power = lookup("power").unwrap();

    let mut g = c.benchmark_group("curry");

    g.bench_function("saturated", |b| {
        b.iter(|| apply(power, black_box(vec![Value::Int(2), Value::Int(10)])).unwrap())
    });
    g.bench_function("partial_then_call", |b| {
        b.iter(|| {
            let f = apply(power, black_box(vec![Value::Int(2)])).unwrap().into_value();
            match f {
                Value::Callable(f) => f.call(vec![Value::Int(10)]).unwrap(),
                other => other,
            }
        })
    });

    g.finish();
}

criterion_group!(benches, bench_eval, bench_curry);
criterion_main!(benches);
