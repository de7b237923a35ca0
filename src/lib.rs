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

//! Write an in-memory buffer to a sink in fixed-size chunks, polling a
//! cancellation signal between chunks so long writes can be aborted.
//!
//! ```no_run
//! use std::{fs::File, time::Duration};
//! use cancelable_writer::{Deadline, write_file_sized};
//!
//! let file = File::create("out.bin")?;
//! let data = vec![0u8; 1 << 20];
//! match write_file_sized(&Deadline::after(Duration::from_secs(1)), &data, &file, 64 * 1024) {
//!     Ok(written) => assert_eq!(written, data.len()),
//!     Err(err) if err.is_cancelled() => eprintln!("gave up after {} bytes", err.written()),
//!     Err(err) => return Err(err.into()),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod async_writer;
mod signal;
mod writer;

pub use async_writer::{write_chunked_async, write_chunked_async_with_progress};
pub use signal::{CancelSignal, Deadline};
pub use tokio_util::sync::CancellationToken;
pub use writer::{
    DEFAULT_CHUNK_SIZE, WriteError, write_chunked, write_chunked_with_progress, write_file,
    write_file_sized, write_file_with_progress,
};
