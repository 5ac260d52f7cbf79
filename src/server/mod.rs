//! Device host: TCP server, client, and the line protocol between them

mod client;
pub mod framing;
mod host;
pub mod protocol;

pub use client::Client;
pub use host::{dispatch, serve_session, Server, SessionOptions, SharedDevice};
pub use protocol::{ProtocolError, Request, RequestHead, Response};
