// Copyright (c) 2024-2025 Federico G. Schwindt <fgsch@lodoss.net>
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt as _};

use crate::{signal::CancelSignal, writer::WriteError};

/// Async counterpart of [`crate::write_chunked`].
///
/// The signal is still only checked between chunks: a chunk whose write or
/// flush has started is awaited to completion.
pub async fn write_chunked_async<S, W>(
    signal: &S,
    data: &[u8],
    sink: &mut W,
    chunk_size: usize,
) -> Result<usize, WriteError>
where
    S: CancelSignal + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    write_chunked_async_with_progress(signal, data, sink, chunk_size, |_| {}).await
}

pub async fn write_chunked_async_with_progress<S, W, F>(
    signal: &S,
    data: &[u8],
    sink: &mut W,
    chunk_size: usize,
    mut progress: F,
) -> Result<usize, WriteError>
where
    S: CancelSignal + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(usize),
{
    if chunk_size == 0 {
        return Err(WriteError::ZeroChunkSize);
    }

    let total = data.len();
    let mut written = 0;

    while written < total {
        if signal.is_cancelled() {
            tracing::debug!(written, total, "write cancelled");
            return Err(WriteError::Cancelled { written });
        }

        let end = total.min(written.saturating_add(chunk_size));
        let chunk = &data[written..end];

        match sink.write(chunk).await {
            Ok(0) => {
                tracing::debug!(written, total, "sink accepted no bytes");
                return Err(WriteError::Write {
                    written,
                    source: io::Error::from(io::ErrorKind::WriteZero),
                });
            }
            Ok(n) => written += n.min(chunk.len()),
            Err(source) => {
                tracing::debug!(written, total, "write failed: {source}");
                return Err(WriteError::Write { written, source });
            }
        }

        if let Err(source) = sink.flush().await {
            tracing::debug!(written, total, "flush failed: {source}");
            return Err(WriteError::Flush { written, source });
        }

        tracing::trace!(written, total, "chunk flushed");
        progress(written);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::tests::sample_data;
    use std::{
        pin::Pin,
        task::{Context, Poll},
    };
    use tempfile::TempDir;
    use tokio::fs;
    use tokio_util::sync::CancellationToken;

    /// Async sink that commits on flush and can short-write or fail.
    #[derive(Default)]
    struct TestSink {
        committed: Vec<u8>,
        pending: Vec<u8>,
        writes: usize,
        flushes: usize,
        max_write: Option<usize>,
        fail_write: Option<usize>,
        fail_flush: Option<usize>,
        cancel_after: Option<(usize, CancellationToken)>,
    }

    impl AsyncWrite for TestSink {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            let this = self.get_mut();
            this.writes += 1;
            if this.fail_write == Some(this.writes) {
                return Poll::Ready(Err(io::Error::other("broken pipe")));
            }
            let n = this.max_write.map_or(buf.len(), |max| max.min(buf.len()));
            this.pending.extend_from_slice(&buf[..n]);
            if let Some((after, token)) = &this.cancel_after {
                if this.writes == *after {
                    token.cancel();
                }
            }
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            let this = self.get_mut();
            this.flushes += 1;
            if this.fail_flush == Some(this.flushes) {
                return Poll::Ready(Err(io::Error::other("device gone")));
            }
            this.committed.append(&mut this.pending);
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn writes_file_with_custom_chunk_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        let data = sample_data();
        let mut file = fs::File::create(&path).await.unwrap();

        let written = write_chunked_async(&CancellationToken::new(), &data, &mut file, 2)
            .await
            .unwrap();

        assert_eq!(written, data.len());
        assert_eq!(fs::read(&path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn cancelled_token_leaves_file_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        let token = CancellationToken::new();
        token.cancel();
        let mut file = fs::File::create(&path).await.unwrap();

        let err = write_chunked_async(&token, &sample_data(), &mut file, 2)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.written(), 0);
        assert!(fs::read(&path).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn short_writes_and_flush_counts() {
        let data = sample_data();
        let mut sink = TestSink {
            max_write: Some(4),
            ..Default::default()
        };
        let mut seen = Vec::new();

        let written = write_chunked_async_with_progress(
            &CancellationToken::new(),
            &data,
            &mut sink,
            16,
            |n| seen.push(n),
        )
        .await
        .unwrap();

        assert_eq!(written, data.len());
        assert_eq!(sink.committed, data);
        assert_eq!(sink.flushes, data.len().div_ceil(4));
        assert_eq!(seen.last(), Some(&data.len()));
    }

    #[tokio::test]
    async fn failing_write_stops_immediately() {
        let data = sample_data();
        let mut sink = TestSink {
            fail_write: Some(2),
            ..Default::default()
        };

        let err = write_chunked_async(&CancellationToken::new(), &data, &mut sink, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Write { written: 5, .. }));
        assert_eq!(sink.committed, data[..5]);
        assert_eq!(sink.writes, 2);
    }

    #[tokio::test]
    async fn cancellation_during_write_keeps_committed_prefix() {
        let token = CancellationToken::new();
        let data: Vec<u8> = (0..100).collect();
        let mut sink = TestSink {
            cancel_after: Some((5, token.clone())),
            ..Default::default()
        };

        let err = write_chunked_async(&token, &data, &mut sink, 3)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.written(), 15);
        assert!(err.written() > 0 && err.written() < data.len());
        assert_eq!(sink.committed, data[..err.written()]);
        assert_eq!(sink.writes, 5);
    }

    #[tokio::test]
    async fn flush_failure_after_last_chunk_reports_full_length() {
        let mut sink = TestSink {
            fail_flush: Some(1),
            ..Default::default()
        };

        let err = write_chunked_async(&CancellationToken::new(), b"abc", &mut sink, 3)
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Flush { written: 3, .. }));
        assert!(err.is_io());
        assert!(sink.committed.is_empty());
    }

    #[tokio::test]
    async fn empty_input_does_not_touch_the_sink() {
        let token = CancellationToken::new();
        token.cancel();
        let mut sink = TestSink::default();

        let written = write_chunked_async(&token, &[], &mut sink, 4).await.unwrap();

        assert_eq!(written, 0);
        assert_eq!(sink.writes, 0);
        assert_eq!(sink.flushes, 0);
    }

    #[tokio::test]
    async fn sink_accepting_nothing_is_an_error() {
        let mut sink = TestSink {
            max_write: Some(0),
            ..Default::default()
        };

        let err = write_chunked_async(&CancellationToken::new(), b"abc", &mut sink, 2)
            .await
            .unwrap_err();

        match err {
            WriteError::Write { written, source } => {
                assert_eq!(written, 0);
                assert_eq!(source.kind(), io::ErrorKind::WriteZero);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(sink.writes, 1);
        assert_eq!(sink.flushes, 0);
    }

    #[tokio::test]
    async fn zero_chunk_size_is_rejected() {
        let mut sink = TestSink::default();

        let err = write_chunked_async(&CancellationToken::new(), b"abc", &mut sink, 0)
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::ZeroChunkSize));
        assert_eq!(sink.writes, 0);
    }
}
