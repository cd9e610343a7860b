//! The relay loop: input framing, concurrent forwards, ordered output.

use std::any::Any;
use std::sync::Arc;

use bytes::Bytes;
use relay_types::{ErrorEnvelope, RelayError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::endpoint::Endpoint;
use crate::forward::{Outcome, forward};
use crate::framing::LineBuffer;
use crate::ordering::OutputOrder;
use crate::output::{ErrorChannel, OutputRouter};

/// Size of each read from the input stream.
const READ_CHUNK_BYTES: usize = 8 * 1024;

tokio::task_local! {
    /// Sequence number of the line a forward task is working on.
    static FORWARD_SEQ: u64;
}

/// Behavior knobs for a [`Relay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayOptions {
    pub order: OutputOrder,
    pub error_channel: ErrorChannel,
}

/// Counters reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Non-blank input lines handed to a forward.
    pub forwarded: u64,
    /// Remote responses written.
    pub responses: u64,
    /// Error envelopes written.
    pub errors: u64,
    /// The run was stopped by cancellation rather than end of input.
    pub interrupted: bool,
}

/// Relays newline-delimited JSON-RPC from an input stream to one endpoint.
pub struct Relay {
    endpoint: Arc<dyn Endpoint>,
    options: RelayOptions,
}

impl Relay {
    pub fn new(endpoint: Arc<dyn Endpoint>, options: RelayOptions) -> Self {
        Self { endpoint, options }
    }

    /// Run until end of input (after draining in-flight forwards) or until
    /// `cancel` fires (abandoning them, writing nothing further).
    ///
    /// Each complete line is forwarded in its own task as soon as it is read,
    /// so a slow endpoint never stops new lines from being picked up.
    pub async fn run<R, O, E>(
        &self,
        mut input: R,
        out: &mut O,
        err: &mut E,
        cancel: CancellationToken,
    ) -> Result<RunSummary, RelayError>
    where
        R: AsyncRead + Unpin,
        O: AsyncWrite + Unpin,
        E: AsyncWrite + Unpin,
    {
        let mut lines = LineBuffer::new();
        let mut router =
            OutputRouter::new(out, err, self.options.order, self.options.error_channel);
        let mut tasks: JoinSet<(u64, Outcome)> = JoinSet::new();
        let mut chunk = vec![0u8; READ_CHUNK_BYTES];
        let mut next_seq: u64 = 0;
        let mut eof = false;

        tracing::info!(
            "Relaying to {} (order: {:?}, errors: {:?})",
            self.endpoint.target(),
            self.options.order,
            self.options.error_channel
        );

        loop {
            if eof && tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(
                        "Relay interrupted: {} forwards in flight, {} held, {} bytes unread",
                        tasks.len(),
                        router.held(),
                        lines.pending_len()
                    );
                    tasks.abort_all();
                    return Ok(RunSummary {
                        forwarded: next_seq,
                        responses: router.responses(),
                        errors: router.errors(),
                        interrupted: true,
                    });
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    let (seq, outcome) = joined.map_err(task_error)?;
                    router.deliver(seq, outcome).await?;
                }

                read = input.read(&mut chunk), if !eof => {
                    let n = read.map_err(RelayError::Input)?;
                    let completed = if n == 0 {
                        eof = true;
                        tracing::debug!("End of input, {} forwards in flight", tasks.len());
                        lines.finish().into_iter().collect()
                    } else {
                        lines.push(&chunk[..n])
                    };

                    for line in completed {
                        self.spawn_forward(&mut tasks, next_seq, line);
                        next_seq += 1;
                    }
                }
            }
        }

        Ok(RunSummary {
            forwarded: next_seq,
            responses: router.responses(),
            errors: router.errors(),
            interrupted: false,
        })
    }

    fn spawn_forward(&self, tasks: &mut JoinSet<(u64, Outcome)>, seq: u64, line: Bytes) {
        let endpoint = Arc::clone(&self.endpoint);
        tasks.spawn(FORWARD_SEQ.scope(seq, async move {
            let outcome = forward(endpoint.as_ref(), &line).await;
            (seq, outcome)
        }));
    }
}

fn task_error(err: tokio::task::JoinError) -> RelayError {
    if err.is_panic() {
        RelayError::Task(panic_message(&*err.into_panic()))
    } else {
        RelayError::Task(err.to_string())
    }
}

/// Whether the caller is running inside a forward task spawned by [`Relay::run`].
///
/// A panic there is caught by the relay and returned as [`RelayError::Task`].
pub fn in_forward_task() -> bool {
    FORWARD_SEQ.try_with(|_| ()).is_ok()
}

/// The message carried by a panic payload, without its source location.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The final envelope written when a run ends with a process-level fault.
pub fn fatal_envelope(reason: impl std::fmt::Display) -> ErrorEnvelope {
    ErrorEnvelope::internal(format!("Fatal error: {reason}"))
}
