use criterion::{
    black_box, criterion_group, criterion_main, Criterion, Throughput,
};

use tinycsv::{Reader, StringRecord, Writer};

const ROWS: usize = 10_000;
const COLS: usize = 5;

/// Rows with the field mix CSV parsers trip over: plain words, embedded
/// delimiters, embedded quotes, embedded newlines and empty fields.
fn sample_rows() -> Vec<Vec<String>> {
    (0..ROWS)
        .map(|i| {
            (0..COLS)
                .map(|j| match (i + j) % 5 {
                    0 => format!("field{}", i),
                    1 => format!("fie,ld{}", i),
                    2 => format!("fie\"ld{}", i),
                    3 => format!("fie\nld{}", i),
                    _ => String::new(),
                })
                .collect()
        })
        .collect()
}

fn sample_data() -> Vec<u8> {
    let mut wtr = Writer::from_writer(Vec::with_capacity(1 << 20));
    wtr.write_rows(sample_rows()).unwrap();
    wtr.into_inner().unwrap()
}

fn bench_read(c: &mut Criterion) {
    let data = sample_data();
    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("rows_10k", |b| {
        b.iter(|| {
            let mut rdr = Reader::from_reader(black_box(data.as_slice()));
            let mut record = StringRecord::new();
            let mut fields = 0u64;
            while rdr.read_record(&mut record).unwrap() {
                fields += record.len() as u64;
            }
            black_box(fields)
        });
    });
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let rows = sample_rows();
    let bytes = sample_data().len();
    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Bytes(bytes as u64));
    group.bench_function("rows_10k", |b| {
        b.iter(|| {
            let mut wtr = Writer::from_writer(Vec::with_capacity(1 << 20));
            for row in &rows {
                wtr.write_record(row).unwrap();
            }
            black_box(wtr.into_inner().unwrap())
        });
    });
    group.finish();
}

criterion_group!(benches, bench_read, bench_write);
criterion_main!(benches);
