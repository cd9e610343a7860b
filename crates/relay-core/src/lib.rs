//! Line-delimited JSON-RPC forwarding engine.
//!
//! Reads newline-delimited JSON-RPC 2.0 messages from an async input stream,
//! POSTs each one to a remote HTTP endpoint, and writes every response back
//! as a single line. Forwards run concurrently; output order is either
//! completion order or input order depending on [`OutputOrder`].

pub mod endpoint;
pub mod forward;
pub mod framing;
pub mod ordering;
pub mod output;
pub mod relay;

pub use endpoint::{Endpoint, HttpEndpoint, PostFuture};
pub use forward::{Outcome, forward};
pub use framing::LineBuffer;
pub use ordering::{OutputOrder, ReorderBuffer};
pub use output::{ErrorChannel, OutputRouter};
pub use relay::{Relay, RelayOptions, RunSummary, fatal_envelope, in_forward_task, panic_message};
