use criterion::{black_box, criterion_group, criterion_main, Criterion};
use zcl_foundation::datatype::{classify, DataType};
use zcl_foundation::status::{AccessKind, ErrorKind, Status};
use zcl_foundation::value::AttributeValue;

fn classify_benchmark(c: &mut Criterion) {
    c.bench_function("classify_all_codes", |b| {
        b.iter(|| {
            for code in 0..=u8::MAX {
                black_box(classify(black_box(code)));
            }
        })
    });

    c.bench_function("data_type_from_code", |b| {
        b.iter(|| {
            for code in 0..=u8::MAX {
                black_box(DataType::from(black_box(code)).is_analog());
            }
        })
    });
}

fn status_benchmark(c: &mut Criterion) {
    let kinds = [
        ErrorKind::NotFound,
        ErrorKind::Unreadable,
        ErrorKind::Unwritable,
        ErrorKind::Execution,
        ErrorKind::Other,
    ];

    c.bench_function("status_from_error", |b| {
        b.iter(|| {
            for kind in kinds {
                black_box(Status::from_error(AccessKind::Read, black_box(kind)));
                black_box(Status::from_error(AccessKind::Write, black_box(kind)));
            }
        })
    });

    c.bench_function("status_from_name", |b| {
        b.iter(|| black_box(Status::from_name(black_box("UnreportableAttribute"))))
    });
}

fn threshold_benchmark(c: &mut Criterion) {
    let previous = AttributeValue::from(10u16);
    let current = AttributeValue::from(50u16);

    c.bench_function("exceeds_change", |b| {
        b.iter(|| black_box(current.exceeds_change(black_box(&previous), 15.0)))
    });
}

criterion_group!(benches, classify_benchmark, status_benchmark, threshold_benchmark);
criterion_main!(benches);
