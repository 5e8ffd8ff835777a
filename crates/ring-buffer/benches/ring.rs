//! Ring buffer put/get throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ring_buffer::{flags, RingBuffer, Sample};

fn bench_put_get(c: &mut Criterion) {
    c.bench_function("put_get", |b| {
        let mut buffer = RingBuffer::with_default_capacity();
        let mut n = 0i32;
        b.iter(|| {
            buffer.put(Sample::new(n as u64, n, flags::NEW));
            n = n.wrapping_add(1);
            black_box(buffer.get())
        })
    });

    c.bench_function("put_overwrite", |b| {
        let mut buffer = RingBuffer::with_default_capacity();
        b.iter(|| buffer.put(black_box(Sample::new(1, 25000, flags::NEW))))
    });
}

criterion_group!(benches, bench_put_get);
criterion_main!(benches);
