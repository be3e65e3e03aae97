//! Wire types shared by the Tether host daemon and the agent session.
//!
//! Messages are UTF-8 JSON documents with no newline delimiter and no length
//! prefix. A receiver knows a message is complete when the whole buffer it has
//! accumulated parses as one document, which is what [`FrameBuffer`]
//! implements. Requests are [`Command`] envelopes and replies are
//! [`Response`] envelopes.

mod command;
mod frame;
mod response;

pub use command::{Command, CommandParams};
pub use frame::{FrameBuffer, FrameError};
pub use response::Response;
