use criterion::{black_box, criterion_group, criterion_main, Criterion};
use overflow_beacon::protocol::hamming::{decode, encode};
use overflow_beacon::protocol::overflow::{encode_payload, extract};

fn codec_benchmarks(c: &mut Criterion) {
    let data: Vec<u8> = (0..48).map(|i| (i % 3 == 0) as u8).collect();
    let codeword = encode(&data);

    c.bench_function("hamming_encode_48", |b| b.iter(|| encode(black_box(&data))));
    c.bench_function("hamming_decode_55", |b| b.iter(|| decode(black_box(&codeword))));

    let raw = encode_payload(&[0x00, 0x02, 0x1e, 0x61, 197], 5).unwrap();
    c.bench_function("overflow_extract", |b| b.iter(|| extract(black_box(&raw), 5)));
}

criterion_group!(benches, codec_benchmarks);
criterion_main!(benches);
