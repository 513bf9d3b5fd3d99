use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hierlog::core::printf;
use hierlog::{args, Arg, Formatter, NullHandler, Record, Registry, BASIC_FORMAT, INFO, WARN};
use std::sync::Arc;

fn bench_disabled_call(c: &mut Criterion) {
    let registry = Registry::new();
    let logger = registry.get_logger("bench.disabled");
    logger.set_level(WARN).unwrap();

    c.bench_function("disabled_call_short_circuit", |b| {
        b.iter(|| {
            black_box(logger.info(args!["dropped %d", 42]));
        })
    });
}

fn bench_dispatch_to_null(c: &mut Criterion) {
    let registry = Registry::new();
    let logger = registry.get_logger("bench.dispatch");
    logger.set_level(INFO).unwrap();
    logger.add_handler(Arc::new(NullHandler::new()));

    c.bench_function("dispatch_to_null_handler", |b| {
        b.iter(|| {
            black_box(logger.info(args!["job %d finished", 7]).wait()).ok();
        })
    });
}

fn bench_propagation_depth(c: &mut Criterion) {
    let registry = Registry::new();
    registry.root().add_handler(Arc::new(NullHandler::new()));
    let leaf = registry.get_logger("a.b.c.d.e");
    leaf.set_level(INFO).unwrap();

    c.bench_function("propagate_five_levels", |b| {
        b.iter(|| {
            black_box(leaf.info("climbing").wait()).ok();
        })
    });
}

fn bench_printf(c: &mut Criterion) {
    let args = vec![Arg::from("worker-3"), Arg::from(128), Arg::from(0.75)];
    c.bench_function("printf_three_tokens", |b| {
        b.iter(|| {
            black_box(printf::format(
                black_box("%s processed %d jobs (%d load)"),
                &args,
            ))
        })
    });
}

fn bench_formatter(c: &mut Criterion) {
    let formatter = Formatter::new(BASIC_FORMAT);
    let record = Record::new("bench.fmt", INFO, vec![Arg::from("steady state")]);
    c.bench_function("format_basic_template", |b| {
        b.iter(|| black_box(formatter.format(black_box(&record))))
    });
}

criterion_group!(
    benches,
    bench_disabled_call,
    bench_dispatch_to_null,
    bench_propagation_depth,
    bench_printf,
    bench_formatter
);
criterion_main!(benches);
