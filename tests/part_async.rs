#![allow(missing_docs)]

use std::{
    io::{self, Read},
    sync::Arc,
};

use bytes::Bytes;
use futures::{Stream, TryStreamExt, stream};
use partbound::{
    AsyncBufferedSource, BoundaryPattern, BufferedSource, Limits, MemorySource, PartError,
    PartStream,
};
use tokio::io::AsyncWriteExt;
use tokio_util::{io::StreamReader, sync::CancellationToken};

fn pattern(token: &str) -> Arc<BoundaryPattern> {
    Arc::new(BoundaryPattern::new(token).expect("token should be valid"))
}

fn chunked_reader(
    body: &[u8],
    chunk: usize,
) -> StreamReader<impl Stream<Item = io::Result<Bytes>> + Unpin, Bytes> {
    let chunks: Vec<io::Result<Bytes>> = body
        .chunks(chunk)
        .map(|piece| Ok(Bytes::copy_from_slice(piece)))
        .collect();
    StreamReader::new(stream::iter(chunks))
}

/// Reader handing out at most `chunk` bytes per call.
struct ChunkedReader<'a> {
    data: &'a [u8],
    chunk: usize,
}

impl Read for ChunkedReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(self.chunk).min(self.data.len());
        buf[..count].copy_from_slice(&self.data[..count]);
        self.data = &self.data[count..];
        Ok(count)
    }
}

#[tokio::test]
async fn async_read_matches_examples() {
    let mut part = PartStream::new(
        MemorySource::new(&b"hello world\r\n--BOUNDARY\r\n"[..]),
        pattern("BOUNDARY"),
    );
    let mut buf = [0u8; 64];

    let read = part.read_into_async(&mut buf).await.expect("read should succeed");
    assert_eq!(&buf[..read], b"hello world\r\n");
    assert_eq!(part.read_into_async(&mut buf).await.expect("end of part"), 0);
    assert!(part.is_finished());
    assert!(!part.final_boundary_found());

    let mut part = PartStream::new(
        MemorySource::new(&b"abc--BOUNDARY--\r\n"[..]),
        pattern("BOUNDARY"),
    );
    let body = part.read_to_bytes_async().await.expect("part should read");
    assert_eq!(body, Bytes::from_static(b"abc"));
    assert!(part.final_boundary_found());
}

#[tokio::test]
async fn blocking_and_async_paths_yield_identical_chunks() {
    let payload = b"alpha\r\n--XA-not\r\n-\r\n--X";
    let mut body = payload.to_vec();
    body.extend_from_slice(b"\r\n--XB--\r\n");
    let delimiter =
        Arc::new(BoundaryPattern::with_leading_line_break("XB").expect("token should be valid"));

    for chunk in 1..=body.len() {
        let source = BufferedSource::with_capacity(
            chunk,
            ChunkedReader {
                data: &body,
                chunk,
            },
        );
        let mut blocking = PartStream::new(source, Arc::clone(&delimiter));
        let mut expected = Vec::new();
        let mut buf = [0u8; 5];
        loop {
            let read = blocking.read_into(&mut buf).expect("blocking read");
            if read == 0 {
                break;
            }
            expected.push(buf[..read].to_vec());
        }

        let source = AsyncBufferedSource::with_capacity(chunk, chunked_reader(&body, chunk));
        let mut suspending = PartStream::new(source, Arc::clone(&delimiter));
        let mut actual = Vec::new();
        loop {
            let read = suspending.read_into_async(&mut buf).await.expect("async read");
            if read == 0 {
                break;
            }
            actual.push(buf[..read].to_vec());
        }

        assert_eq!(actual, expected, "chunk={chunk}");
        assert_eq!(actual.concat(), payload);
        assert_eq!(suspending.final_boundary_found(), blocking.final_boundary_found());
        assert_eq!(suspending.observed_length(), blocking.observed_length());
    }
}

#[tokio::test]
async fn async_path_skips_garbled_overlong_trailer() {
    let mut body = b"x\r\n--B \xff\xfe".to_vec();
    body.extend(std::iter::repeat(b'\t').take(20));
    body.extend_from_slice(b"\r\nnext\r\n--B--");
    let limits = Limits {
        max_trailer_length: 4,
        ..Limits::default()
    };
    let delimiter =
        Arc::new(BoundaryPattern::with_leading_line_break("B").expect("token should be valid"));

    for chunk in [1, 2, 3, 7] {
        let source = AsyncBufferedSource::with_capacity(chunk, chunked_reader(&body, chunk));
        let mut part = PartStream::with_limits(source, Arc::clone(&delimiter), &limits);
        let first = part.read_to_bytes_async().await.expect("part should read");
        assert_eq!(first, Bytes::from_static(b"x"), "chunk={chunk}");
        assert!(part.is_finished());
        assert!(!part.final_boundary_found());

        let source = part.into_source();
        let mut next = PartStream::with_limits(source, Arc::clone(&delimiter), &limits);
        let second = next.read_to_bytes_async().await.expect("part should read");
        assert_eq!(second, Bytes::from_static(b"next"), "chunk={chunk}");
        assert!(next.final_boundary_found());
    }
}

#[tokio::test]
async fn async_source_reports_unexpected_end() {
    let source = AsyncBufferedSource::new(chunked_reader(b"no boundary here", 4));
    let mut part = PartStream::new(source, pattern("BOUNDARY"));

    let err = part.read_to_bytes_async().await.expect_err("must fail");
    assert!(matches!(err, PartError::UnexpectedEndOfStream));
}

#[tokio::test]
async fn async_source_propagates_io_errors() {
    let chunks = vec![
        Ok(Bytes::from_static(b"partial")),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away")),
    ];
    let source = AsyncBufferedSource::new(StreamReader::new(stream::iter(chunks)));
    let mut part = PartStream::new(source, pattern("BOUNDARY"));

    let err = part.read_to_bytes_async().await.expect_err("must fail");
    match err {
        PartError::Io(err) => assert_eq!(err.kind(), io::ErrorKind::ConnectionReset),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(part.position(), 0);
}

#[tokio::test]
async fn cancellation_leaves_state_untouched() {
    let (mut writer, reader) = tokio::io::duplex(64);
    writer.write_all(b"abc").await.expect("write first bytes");

    let mut part = PartStream::new(AsyncBufferedSource::new(reader), pattern("BOUNDARY"));
    let token = CancellationToken::new();
    let mut buf = [0u8; 16];

    let (result, ()) = tokio::join!(part.read_cancellable(&mut buf, &token), async {
        tokio::task::yield_now().await;
        token.cancel();
    });
    assert!(matches!(result, Err(PartError::Canceled)));
    assert_eq!(part.position(), 0);
    assert_eq!(part.observed_length(), 0);
    assert!(!part.is_finished());

    writer
        .write_all(b"--BOUNDARY--\r\n")
        .await
        .expect("write boundary");
    drop(writer);

    let body = part.read_to_bytes_async().await.expect("part should read");
    assert_eq!(body, Bytes::from_static(b"abc"));
    assert!(part.final_boundary_found());
}

#[tokio::test]
async fn pre_canceled_token_fails_fast() {
    let mut part = PartStream::new(MemorySource::new(&b"abc--B\r\n"[..]), pattern("B"));
    let token = CancellationToken::new();
    token.cancel();

    let mut buf = [0u8; 8];
    let err = part
        .read_cancellable(&mut buf, &token)
        .await
        .expect_err("must fail");
    assert!(matches!(err, PartError::Canceled));
    assert_eq!(io::Error::from(err).kind(), io::ErrorKind::Interrupted);

    let live = CancellationToken::new();
    let read = part
        .read_cancellable(&mut buf, &live)
        .await
        .expect("read should succeed");
    assert_eq!(&buf[..read], b"abc");
}

#[tokio::test]
async fn part_streams_as_chunks() {
    let source =
        AsyncBufferedSource::with_capacity(3, chunked_reader(b"0123456789\r\n--B\r\n", 3));
    let delimiter =
        Arc::new(BoundaryPattern::with_leading_line_break("B").expect("token should be valid"));
    let part = PartStream::new(source, delimiter);

    let chunks: Vec<Bytes> = part
        .into_chunks(4)
        .try_collect()
        .await
        .expect("chunks should stream");
    assert!(chunks.iter().all(|chunk| !chunk.is_empty() && chunk.len() <= 4));
    assert_eq!(chunks.concat(), b"0123456789");
}

#[tokio::test]
async fn drain_async_skips_to_next_part() {
    let source = MemorySource::new(&b"skip me--B\r\nnext"[..]);
    let mut part = PartStream::new(source, pattern("B"));

    assert_eq!(part.drain_async().await.expect("drain should succeed"), 7);
    assert!(part.is_finished());
    assert_eq!(part.into_source().remaining(), Bytes::from_static(b"next"));
}
