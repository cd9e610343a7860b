//! Routing of forward outcomes to the success and error channels.

use relay_types::RelayError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::forward::Outcome;
use crate::ordering::{OutputOrder, ReorderBuffer};

/// Where synthesized error envelopes are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorChannel {
    /// Errors go to the diagnostic stream, responses to the primary one.
    #[default]
    Stderr,
    /// Every line, response or error, goes to the primary stream.
    Stdout,
}

/// Writes outcomes as newline-terminated lines, applying the configured
/// ordering and channel split.
pub struct OutputRouter<'a, O, E> {
    out: &'a mut O,
    err: &'a mut E,
    error_channel: ErrorChannel,
    order: OutputOrder,
    reorder: ReorderBuffer<Outcome>,
    responses: u64,
    errors: u64,
}

impl<'a, O, E> OutputRouter<'a, O, E>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    pub fn new(
        out: &'a mut O,
        err: &'a mut E,
        order: OutputOrder,
        error_channel: ErrorChannel,
    ) -> Self {
        Self {
            out,
            err,
            error_channel,
            order,
            reorder: ReorderBuffer::new(),
            responses: 0,
            errors: 0,
        }
    }

    /// Accept the outcome of forward `seq` and write whatever it releases.
    pub async fn deliver(&mut self, seq: u64, outcome: Outcome) -> Result<(), RelayError> {
        match self.order {
            OutputOrder::Completion => self.emit(&outcome).await,
            OutputOrder::Arrival => {
                for ready in self.reorder.insert(seq, outcome) {
                    self.emit(&ready).await?;
                }
                Ok(())
            }
        }
    }

    /// Write one outcome immediately, bypassing ordering.
    pub async fn emit(&mut self, outcome: &Outcome) -> Result<(), RelayError> {
        match outcome {
            Outcome::Response(line) => {
                self.responses += 1;
                write_line(&mut *self.out, line).await
            }
            Outcome::Error(envelope) => {
                self.errors += 1;
                let line = envelope.to_string();
                match self.error_channel {
                    ErrorChannel::Stderr => write_line(&mut *self.err, &line).await,
                    ErrorChannel::Stdout => write_line(&mut *self.out, &line).await,
                }
            }
        }
    }

    /// Outcomes held back waiting for an earlier line's outcome.
    pub fn held(&self) -> usize {
        self.reorder.len()
    }

    pub fn responses(&self) -> u64 {
        self.responses
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }
}

/// Write `line` plus a newline in one call, then flush.
async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<(), RelayError> {
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    writer.write_all(&buf).await.map_err(RelayError::Output)?;
    writer.flush().await.map_err(RelayError::Output)
}
