use {
    criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput},
    std::{collections::HashMap, hint::black_box},
    struct_pack::{
        config::Config, deserialize, deserialize_with_config, get_needed_size, serialize,
        serialize_into, serialize_with_config, Compatible, Pack, Unpack,
    },
};

#[derive(Pack, Unpack, Clone)]
struct SimpleStruct {
    id: u64,
    value: u64,
    flag: bool,
}

#[repr(C)]
#[derive(Clone, Copy, Pack, Unpack)]
#[struct_pack(fixed_layout)]
struct PodStruct {
    a: [u8; 32],
    b: [u8; 16],
    c: [u8; 8],
}

#[derive(Pack, Unpack, Clone)]
struct Record {
    id: u32,
    name: String,
    tags: Vec<String>,
    score: Compatible<f64, 1>,
}

/// Encoded bytes of `data`, checked against its planned length.
fn verified_bytes<T: Pack + ?Sized>(data: &T) -> Vec<u8> {
    let bytes = serialize(data).unwrap();
    assert_eq!(bytes.len(), get_needed_size(data));
    bytes
}

/// Allocated outside the benchmark loop to measure only the encoding.
fn bench_buffer<T: Pack + ?Sized>(data: &T) -> Vec<u8> {
    vec![0u8; get_needed_size(data)]
}

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("Primitives");
    group.throughput(Throughput::Elements(1));

    let data = 0xDEADBEEFCAFEBABEu64;
    let bytes = verified_bytes(&data);

    group.bench_function("u64/serialize_into", |b| {
        let mut buffer = bench_buffer(&data);
        b.iter(|| {
            serialize_into(
                black_box(&mut buffer.as_mut_slice()),
                black_box(&data),
                Config::DEFAULT,
            )
            .unwrap()
        });
    });

    group.bench_function("u64/serialize", |b| {
        b.iter(|| serialize(black_box(&data)).unwrap());
    });

    group.bench_function("u64/get_needed_size", |b| {
        b.iter(|| get_needed_size(black_box(&data)));
    });

    group.bench_function("u64/deserialize", |b| {
        b.iter(|| deserialize::<u64>(black_box(&bytes)).unwrap());
    });

    group.finish();
}

fn bench_vec(c: &mut Criterion) {
    let mut group = c.benchmark_group("Vec<u64>");

    for size in [100, 1_000, 10_000] {
        let data: Vec<u64> = (0..size).collect();
        let bytes = verified_bytes(&data);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("serialize_into", size), &data, |b, d| {
            let mut buffer = bench_buffer(d);
            b.iter(|| {
                serialize_into(
                    black_box(&mut buffer.as_mut_slice()),
                    black_box(d),
                    Config::DEFAULT,
                )
                .unwrap()
            });
        });

        group.bench_with_input(BenchmarkId::new("deserialize", size), &bytes, |b, s| {
            b.iter(|| deserialize::<Vec<u64>>(black_box(s)).unwrap());
        });

        // Varint integers take the element-wise path.
        let config = Config::ENCODING_WITH_VARINT;
        let varint_bytes = serialize_with_config(&data, config).unwrap();
        group.bench_with_input(BenchmarkId::new("serialize/varint", size), &data, |b, d| {
            b.iter(|| serialize_with_config(black_box(d), config).unwrap());
        });

        group.bench_with_input(
            BenchmarkId::new("deserialize/varint", size),
            &varint_bytes,
            |b, s| {
                b.iter(|| deserialize_with_config::<Vec<u64>>(black_box(s), config).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_struct(c: &mut Criterion) {
    let mut group = c.benchmark_group("SimpleStruct");
    group.throughput(Throughput::Elements(1));

    let data = SimpleStruct {
        id: 12345,
        value: 0xDEADBEEF,
        flag: true,
    };
    let bytes = verified_bytes(&data);

    group.bench_function("serialize_into", |b| {
        let mut buffer = bench_buffer(&data);
        b.iter(|| {
            serialize_into(
                black_box(&mut buffer.as_mut_slice()),
                black_box(&data),
                Config::DEFAULT,
            )
            .unwrap()
        });
    });

    group.bench_function("deserialize", |b| {
        b.iter(|| deserialize::<SimpleStruct>(black_box(&bytes)).unwrap());
    });

    group.finish();
}

fn bench_pod_structs(c: &mut Criterion) {
    let mut group = c.benchmark_group("PodStruct");

    let pod = PodStruct {
        a: [42u8; 32],
        b: [17u8; 16],
        c: [99u8; 8],
    };

    for size in [100, 1_000, 10_000] {
        let data = vec![pod; size];
        let bytes = verified_bytes(&data);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("serialize", size), &data, |b, d| {
            b.iter(|| serialize(black_box(d)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("deserialize", size), &bytes, |b, s| {
            b.iter(|| deserialize::<Vec<PodStruct>>(black_box(s)).unwrap());
        });
    }

    group.finish();
}

fn bench_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("Record");

    for size in [10, 100, 1_000] {
        let data: Vec<Record> = (0..size)
            .map(|i| Record {
                id: i,
                name: format!("record-{i}"),
                tags: vec!["alpha".into(), "beta".into()],
                score: Compatible::new(f64::from(i) / 2.0),
            })
            .collect();
        let bytes = verified_bytes(&data);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("serialize", size), &data, |b, d| {
            b.iter(|| serialize(black_box(d)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("deserialize", size), &bytes, |b, s| {
            b.iter(|| deserialize::<Vec<Record>>(black_box(s)).unwrap());
        });
    }

    group.finish();
}

fn bench_hashmap(c: &mut Criterion) {
    let mut group = c.benchmark_group("HashMap<u64, u64>");

    for size in [100, 1_000] {
        let data: HashMap<u64, u64> = (0..size).map(|i| (i, i * 2)).collect();
        let bytes = verified_bytes(&data);
        group.throughput(Throughput::Elements(size));

        group.bench_with_input(BenchmarkId::new("serialize", size), &data, |b, d| {
            b.iter(|| serialize(black_box(d)).unwrap());
        });

        group.bench_with_input(BenchmarkId::new("deserialize", size), &bytes, |b, s| {
            b.iter(|| deserialize::<HashMap<u64, u64>>(black_box(s)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_primitives,
    bench_vec,
    bench_struct,
    bench_pod_structs,
    bench_records,
    bench_hashmap,
);
criterion_main!(benches);
