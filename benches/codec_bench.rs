// Codec and interning benchmarks for lexwire

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lexwire::codec::{WireRead, WireWrite};
use lexwire::filter::{CompressionFilter, FilterChain, OutputStage, XorFilter};
use lexwire::intern::{PeerRole, StringCompressor, StringIo};
use lexwire::CompressionType;
use std::hint::black_box;
use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Sink(Arc<Mutex<Vec<u8>>>);

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn benchmark_string_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("string_codec");

    for size in [16, 1024, 100_000].iter() {
        let value = "x".repeat(*size);
        let mut encoded = Vec::new();
        encoded.write_string(Some(value.as_str())).unwrap();

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("write", size), &value, |b, value| {
            let mut buf = Vec::with_capacity(value.len() + 16);
            b.iter(|| {
                buf.clear();
                buf.write_string(Some(value.as_str())).unwrap();
                black_box(buf.len());
            });
        });
        group.bench_with_input(BenchmarkId::new("read", size), &encoded, |b, encoded| {
            b.iter(|| {
                let value = encoded.as_slice().read_string().unwrap();
                black_box(value);
            });
        });
    }

    group.finish();
}

fn benchmark_interning(c: &mut Criterion) {
    let mut group = c.benchmark_group("interning");

    for vocabulary in [10, 1000].iter() {
        let terms: Vec<String> = (0..*vocabulary).map(|i| format!("http://snomed.info/id/{}", i)).collect();

        group.throughput(Throughput::Elements(terms.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(vocabulary), &terms, |b, terms| {
            let client = StringCompressor::new(PeerRole::Client);
            let server = StringCompressor::new(PeerRole::Server);
            let mut wire = Vec::new();
            b.iter(|| {
                for term in terms {
                    wire.clear();
                    client.write(&mut wire, Some(term.as_str())).unwrap();
                    black_box(server.read(&mut wire.as_slice()).unwrap());

                    // the reply carries the acknowledgement back
                    wire.clear();
                    server.write(&mut wire, Some(term.as_str())).unwrap();
                    client.read(&mut wire.as_slice()).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn benchmark_filter_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_chain");
    let chain = FilterChain::new()
        .with(CompressionFilter::new(CompressionType::default(), 64 * 1024, 4))
        .with(XorFilter::new(b"benchmark-key".to_vec()));

    for size in [1024, 1024 * 1024].iter() {
        let data: Vec<u8> = (0..*size).map(|i| (i % 64) as u8).collect();

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let mut out = chain.wrap_output_raw(Vec::new()).unwrap();
                out.write_all(data).unwrap();
                out.finish().unwrap();
            });
        });

        let sink = Sink::default();
        let mut out = chain.wrap_output_raw(sink.clone()).unwrap();
        out.write_all(&data).unwrap();
        out.finish().unwrap();
        let compressed = sink.0.lock().unwrap().clone();
        group.bench_with_input(BenchmarkId::new("read", size), &compressed, |b, compressed| {
            b.iter(|| {
                let mut input = chain.wrap_input_raw(Cursor::new(compressed.clone())).unwrap();
                let mut read = Vec::new();
                input.read_to_end(&mut read).unwrap();
                black_box(read);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_string_codec, benchmark_interning, benchmark_filter_chain);
criterion_main!(benches);
