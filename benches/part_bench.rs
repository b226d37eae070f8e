#![allow(missing_docs)]

use std::sync::Arc;

use bytes::Bytes;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use futures::stream;
use partbound::{
    AsyncBufferedSource, BoundaryPattern, BufferedSource, MemorySource, MultipartReader,
    PartStream, find_boundary,
};
use tokio_util::io::StreamReader;

fn benchmark_boundary_search(c: &mut Criterion) {
    let pattern =
        BoundaryPattern::with_leading_line_break("BOUND").expect("token should be valid");
    let window = build_part(64 * 1024);

    c.bench_function("find_boundary_64kb_window", |b| {
        b.iter(|| find_boundary(black_box(&window), &pattern));
    });
}

fn benchmark_part_read(c: &mut Criterion) {
    let pattern =
        Arc::new(BoundaryPattern::with_leading_line_break("BOUND").expect("token should be valid"));
    let body = Bytes::from(build_part(64 * 1024));

    c.bench_function("read_64kb_part_blocking", |b| {
        b.iter(|| {
            let source = BufferedSource::new(&body[..]);
            let mut part = PartStream::new(source, Arc::clone(&pattern));
            let read = part.drain().expect("part should read");
            assert_eq!(read, 64 * 1024);
        });
    });

    c.bench_function("read_64kb_part_memory", |b| {
        b.iter(|| {
            let mut part = PartStream::new(MemorySource::new(body.clone()), Arc::clone(&pattern));
            let read = part.drain().expect("part should read");
            assert_eq!(read, 64 * 1024);
        });
    });
}

fn benchmark_multipart_async(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let body = Bytes::from(build_body(64 * 1024));

    c.bench_function("parse_64kb_multipart_async", |b| {
        b.to_async(&runtime).iter(|| async {
            let chunks = body
                .chunks(4096)
                .map(|chunk| Ok::<_, std::io::Error>(body.slice_ref(chunk)))
                .collect::<Vec<_>>();
            let source = AsyncBufferedSource::new(StreamReader::new(stream::iter(chunks)));
            let mut reader = MultipartReader::new("BOUND", source).expect("reader should build");

            let mut total = 0;
            while let Some(mut part) = reader.next_part_async().await.expect("part should parse") {
                total += part.body().drain_async().await.expect("part should read");
            }
            assert_eq!(total, 64 * 1024);
        });
    });
}

fn build_part(size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size + 16);
    out.extend(std::iter::repeat(b'x').take(size));
    out.extend_from_slice(b"\r\n--BOUND--\r\n");
    out
}

fn build_body(size: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size + 256);
    out.extend_from_slice(
        b"--BOUND\r\nContent-Disposition: form-data; name=\"upload\"; filename=\"bench.bin\"\r\n\r\n",
    );
    out.extend(build_part(size));
    out
}

criterion_group!(
    benches,
    benchmark_boundary_search,
    benchmark_part_read,
    benchmark_multipart_async
);
criterion_main!(benches);
