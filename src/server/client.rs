//! Client side of the device protocol

use super::framing::{self, Line, MAX_RESPONSE_LINE, MAX_WRITE_PAYLOAD};
use super::protocol::{ProtocolError, Request, Response};
use crate::Result;
use anyhow::Context;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

/// One open session against a running device
pub struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: Vec<u8>,
}

impl Client {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            line: Vec::new(),
        })
    }

    /// Send one request and wait for its response
    pub async fn request(&mut self, request: &Request) -> Result<Response> {
        if let Request::Write(payload) = request {
            if payload.len() > MAX_WRITE_PAYLOAD {
                return Err(ProtocolError::PayloadTooLong {
                    len: payload.len(),
                    max: MAX_WRITE_PAYLOAD,
                }
                .into());
            }
        }
        self.writer.write_all(&request.encode()).await?;

        match framing::read_line(&mut self.reader, &mut self.line, MAX_RESPONSE_LINE).await? {
            Line::Complete => Ok(Response::parse(&self.line)?),
            Line::TooLong => Err(ProtocolError::LineTooLong {
                max: MAX_RESPONSE_LINE,
            }
            .into()),
            Line::Eof => {
                Err(ProtocolError::MalformedResponse("connection closed".to_string()).into())
            }
        }
    }

    /// Close the session; the device folds the total into its ledger
    pub async fn close(mut self) -> Result<()> {
        match self.request(&Request::Close).await? {
            Response::Bye => Ok(()),
            other => Err(ProtocolError::MalformedResponse(other.to_string()).into()),
        }
    }
}
