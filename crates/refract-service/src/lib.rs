//! Refract Service - message-based front end for the shader translator
//!
//! This crate provides the service surface over a compiler session:
//! line-delimited JSON requests in, responses and notifications out,
//! processed strictly one at a time in arrival order.

/// Wire protocol - inbound/outbound message schema
pub mod protocol;

/// Protocol handler - the Idle/Compiling state machine over the session
pub mod handler;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use refract_core::engine::TranslatorEngine;

pub use handler::CompileService;

use protocol::Outbound;

/// Run the service over stdin/stdout.
///
/// # Errors
///
/// Returns an error if the channel cannot be read or written.
pub async fn run_server<E: TranslatorEngine>(service: CompileService<E>) -> Result<()> {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    serve(stdin, stdout, service).await
}

/// Drive the service over an arbitrary byte channel.
///
/// Emits `loaded` once, then serves compile requests strictly serially in
/// arrival order; responses are emitted in the same order. Engine
/// side-channel diagnostics are interleaved as `error` messages. Returns
/// when the inbound channel closes, after finalizing the session.
///
/// # Errors
///
/// Returns an error if the channel cannot be read or written.
pub async fn serve<R, W, E>(input: R, output: W, mut service: CompileService<E>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    E: TranslatorEngine,
{
    let mut lines = BufReader::new(input).lines();
    let mut output = output;

    let (diag_tx, mut diag_rx) = mpsc::unbounded_channel();
    // A local sender keeps the channel open even if the engine drops the
    // sink early.
    let keepalive = diag_tx.clone();
    service.set_diagnostic_sink(Box::new(move |text| {
        let _ = diag_tx.send(text);
    }));

    emit(&mut output, &Outbound::Loaded).await?;

    loop {
        tokio::select! {
            diagnostic = diag_rx.recv() => {
                if let Some(text) = diagnostic {
                    emit(&mut output, &Outbound::Error { value: text }).await?;
                }
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if let Some(response) = service.handle_line(&line) {
                            emit(&mut output, &response).await?;
                        }
                    }
                    // Inbound channel closed: tear down.
                    None => break,
                }
            }
        }
    }

    // Flush diagnostics already queued before finalizing.
    while let Ok(text) = diag_rx.try_recv() {
        emit(&mut output, &Outbound::Error { value: text }).await?;
    }
    drop(keepalive);
    service.shutdown();
    Ok(())
}

async fn emit<W: AsyncWrite + Unpin>(output: &mut W, message: &Outbound) -> Result<()> {
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    output.write_all(&line).await?;
    output.flush().await?;
    Ok(())
}
