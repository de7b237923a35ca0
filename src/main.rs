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

mod args;
mod output;

use clap::Parser as _;
use indicatif::ProgressStyle;
use std::{path::PathBuf, process::ExitCode};
use tokio::{fs, io::AsyncReadExt as _};
use tracing::Level;
use tracing_indicatif::{IndicatifLayer, span_ext::IndicatifSpanExt as _};
use tracing_subscriber::{
    fmt::writer::MakeWriterExt as _, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use args::Args;
use cancelable_writer::{CancelSignal, CancellationToken, Deadline, write_file_with_progress};
use output::{OutputError, PartFile};

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let indicatif_layer = IndicatifLayer::new().with_progress_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar}] {bytes:>10}/{total_bytes:10} ({percent:>3}%) ETA: {eta}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(
                    indicatif_layer
                        .get_stderr_writer()
                        .with_max_level(Level::INFO),
                )
                .with_target(false),
        )
        .with(indicatif_layer)
        .init();

    let data = read_input(&args).await?;

    let span = tracing::info_span!("span");
    span.pb_set_length(data.len() as u64);

    // Handle ctrl-c
    let token = CancellationToken::new();
    tokio::task::spawn({
        let token = token.clone();
        async move {
            _ = tokio::signal::ctrl_c().await;
            token.cancel();
        }
    });
    let deadline = args.timeout.map(Deadline::after);

    if !args.quiet {
        span.pb_start();
    }

    // The write blocks on every chunk, keep it off the runtime threads.
    let result = tokio::task::spawn_blocking({
        let args = args.clone();
        let span = span.clone();
        move || {
            write_output(&args, &data, (token, deadline), |written| {
                span.pb_set_position(written as u64)
            })
        }
    })
    .await?;

    Ok(if report(result) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Log the outcome of a write, returning whether it succeeded.
fn report(result: Result<(usize, PathBuf), OutputError>) -> bool {
    match result {
        Ok((written, path)) => {
            tracing::info!("wrote {written} bytes to {}", path.display());
            true
        }
        Err(err) => {
            tracing::error!("{err}");
            false
        }
    }
}

async fn read_input(args: &Args) -> Result<Vec<u8>, OutputError> {
    let read_error = |source| OutputError::Read {
        path: args.input.display().to_string(),
        source,
    };
    if args.reads_stdin() {
        let mut data = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut data)
            .await
            .map_err(read_error)?;
        Ok(data)
    } else {
        fs::read(&args.input).await.map_err(read_error)
    }
}

/// Stage `data` in a part file next to the destination and move it into
/// place once every byte is flushed.
fn write_output<S, F>(
    args: &Args,
    data: &[u8],
    signal: S,
    progress: F,
) -> Result<(usize, PathBuf), OutputError>
where
    S: CancelSignal,
    F: FnMut(usize),
{
    let part = PartFile::create(&args.output)?;

    let result = write_file_with_progress(&signal, data, part.file(), args.chunk_size, progress);
    match result {
        Ok(written) => Ok((written, part.commit()?)),
        Err(source) => {
            if args.keep_partial {
                tracing::warn!(
                    "kept {} of {} bytes in {}",
                    source.written(),
                    data.len(),
                    part.path().display()
                );
                part.keep();
            }
            Err(OutputError::Write {
                path: args.output.display().to_string(),
                source,
            })
        }
    }
}
