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

use std::{
    fs::File,
    io::{self, BufWriter, Write},
};
use thiserror::Error;

use crate::signal::CancelSignal;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("all data was not written to the file due to cancellation")]
    Cancelled { written: usize },
    #[error("write failed after {written} bytes: {source}")]
    Write {
        written: usize,
        #[source]
        source: io::Error,
    },
    #[error("flush failed after {written} bytes: {source}")]
    Flush {
        written: usize,
        #[source]
        source: io::Error,
    },
    #[error("chunk size must be greater than 0")]
    ZeroChunkSize,
}

impl WriteError {
    /// Bytes committed to the sink before the write stopped.
    ///
    /// A flush failure on the last chunk reports the full length, so a count
    /// equal to the input length does not imply success.
    pub fn written(&self) -> usize {
        match self {
            WriteError::Cancelled { written }
            | WriteError::Write { written, .. }
            | WriteError::Flush { written, .. } => *written,
            WriteError::ZeroChunkSize => 0,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WriteError::Cancelled { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, WriteError::Write { .. } | WriteError::Flush { .. })
    }
}

/// Write `data` to `sink` in chunks of at most `chunk_size` bytes, flushing
/// after every chunk and checking `signal` before each one.
///
/// Returns the number of bytes written, which is always `data.len()` on
/// success. The sink is left as is on failure; truncating or removing a
/// partially written destination is up to the caller.
pub fn write_chunked<S, W>(
    signal: &S,
    data: &[u8],
    sink: &mut W,
    chunk_size: usize,
) -> Result<usize, WriteError>
where
    S: CancelSignal + ?Sized,
    W: Write + ?Sized,
{
    write_chunked_with_progress(signal, data, sink, chunk_size, |_| {})
}

/// Like [`write_chunked`], calling `progress` with the running total after
/// every flushed chunk.
pub fn write_chunked_with_progress<S, W, F>(
    signal: &S,
    data: &[u8],
    sink: &mut W,
    chunk_size: usize,
    mut progress: F,
) -> Result<usize, WriteError>
where
    S: CancelSignal + ?Sized,
    W: Write + ?Sized,
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

        // Advance by what the sink accepted, not by what was offered.
        match sink.write(chunk) {
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

        if let Err(source) = sink.flush() {
            tracing::debug!(written, total, "flush failed: {source}");
            return Err(WriteError::Flush { written, source });
        }

        tracing::trace!(written, total, "chunk flushed");
        progress(written);
    }

    Ok(written)
}

/// Write `data` to `file` using [`DEFAULT_CHUNK_SIZE`] chunks.
pub fn write_file<S>(signal: &S, data: &[u8], file: &File) -> Result<usize, WriteError>
where
    S: CancelSignal + ?Sized,
{
    write_file_sized(signal, data, file, DEFAULT_CHUNK_SIZE)
}

pub fn write_file_sized<S>(
    signal: &S,
    data: &[u8],
    file: &File,
    chunk_size: usize,
) -> Result<usize, WriteError>
where
    S: CancelSignal + ?Sized,
{
    write_file_with_progress(signal, data, file, chunk_size, |_| {})
}

/// Write `data` to `file` through a buffer of `chunk_size` bytes.
///
/// The file is neither truncated nor closed; writes start at its current
/// cursor.
pub fn write_file_with_progress<S, F>(
    signal: &S,
    data: &[u8],
    file: &File,
    chunk_size: usize,
    progress: F,
) -> Result<usize, WriteError>
where
    S: CancelSignal + ?Sized,
    F: FnMut(usize),
{
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let result = write_chunked_with_progress(signal, data, &mut writer, chunk_size, progress);
    // Whatever is still buffered belongs to a chunk that failed to flush and
    // must not reach the file when the writer is dropped.
    let _ = writer.into_parts();
    result
}
