//! TCP host for the device
//!
//! Every accepted connection is one session. The connection holds the device
//! lock from open to close, so sessions never interleave and a drain cannot
//! race an append; later clients wait on the lock.
//!
//! Limitation: an open but silent client blocks every other session until it
//! disconnects or hits the idle timeout (`server.idle_timeout_ms`). With the
//! timeout disabled it can block them indefinitely.

use super::framing::{self, Line, MAX_REQUEST_LINE, MAX_WRITE_PAYLOAD};
use super::protocol::{ProtocolError, Request, RequestHead, Response};
use crate::config::SummerConfig;
use crate::device::{Control, Device};
use crate::Result;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Device shared between connections
pub type SharedDevice = Arc<Mutex<Device>>;

/// Per-session settings taken from the server config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Capacity for a READ that names none
    pub read_buffer: usize,
    /// Close the session after this long without a request
    pub idle_timeout: Option<Duration>,
}

impl SessionOptions {
    pub fn from_config(config: &SummerConfig) -> Self {
        Self {
            read_buffer: config.server.read_buffer,
            idle_timeout: config.idle_timeout(),
        }
    }
}

pub struct Server {
    listener: TcpListener,
    device: SharedDevice,
    options: SessionOptions,
}

impl Server {
    /// Bind the listener described by `config`
    pub async fn bind(config: &SummerConfig) -> Result<Self> {
        config.validate()?;
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        Ok(Self {
            listener,
            device: Arc::new(Mutex::new(Device::with_capacity(config.device.capacity))),
            options: SessionOptions::from_config(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails
    pub async fn run(self) -> Result<()> {
        tracing::info!(addr = %self.local_addr()?, "summer device listening");

        loop {
            let (stream, peer) = self.listener.accept().await?;
            let device = Arc::clone(&self.device);
            let options = self.options;

            tokio::spawn(async move {
                if let Err(e) = serve_session(stream, device, options).await {
                    tracing::warn!(%peer, error = %e, "session ended with error");
                }
            });
        }
    }
}

/// Run one session over `stream`
pub async fn serve_session(
    stream: TcpStream,
    device: SharedDevice,
    options: SessionOptions,
) -> Result<()> {
    let peer = stream.peer_addr().ok();
    let mut device = device.lock_owned().await;
    device.on_session_open();
    tracing::info!(?peer, "session opened");

    let result = handle_requests(stream, &mut device, options).await;

    let outcome = device.on_session_close();
    tracing::info!(?peer, ?outcome, "session closed");
    result
}

async fn handle_requests(
    stream: TcpStream,
    device: &mut Device,
    options: SessionOptions,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        let next = next_request(&mut reader, &mut line);
        let next = match options.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, next).await {
                Ok(next) => next?,
                Err(_) => {
                    tracing::info!(?limit, "session idle, closing");
                    writer.write_all(b"ERR idle timeout\n").await?;
                    return Ok(());
                }
            },
            None => next.await?,
        };

        let response = match next {
            None => return Ok(()),
            Some(Ok(Request::Close)) => {
                writer.write_all(b"BYE\n").await?;
                return Ok(());
            }
            Some(Ok(request)) => dispatch(device, request, options.read_buffer),
            Some(Err(e)) => Response::Error(e.to_string()),
        };

        writer.write_all(format!("{}\n", response).as_bytes()).await?;
    }
}

/// Read the next request: its line, plus the payload for a write.
///
/// `None` at end of stream. Oversized lines and payloads are consumed and
/// reported as protocol errors without being buffered.
async fn next_request<R>(
    reader: &mut R,
    line: &mut Vec<u8>,
) -> Result<Option<std::result::Result<Request, ProtocolError>>>
where
    R: AsyncBufRead + Unpin,
{
    match framing::read_line(reader, line, MAX_REQUEST_LINE).await? {
        Line::Eof => return Ok(None),
        Line::TooLong => {
            return Ok(Some(Err(ProtocolError::LineTooLong {
                max: MAX_REQUEST_LINE,
            })))
        }
        Line::Complete => {}
    }

    let request = match RequestHead::parse(line.as_slice()) {
        Ok(RequestHead::Ready(request)) => Ok(request),
        Ok(RequestHead::Write { len }) if len > MAX_WRITE_PAYLOAD => {
            framing::skip_bytes(reader, len).await?;
            Err(ProtocolError::PayloadTooLong {
                len,
                max: MAX_WRITE_PAYLOAD,
            })
        }
        Ok(RequestHead::Write { len }) => {
            let mut payload = vec![0; len];
            reader.read_exact(&mut payload).await?;
            Ok(Request::Write(payload))
        }
        Err(e) => Err(e),
    };
    Ok(Some(request))
}

/// Apply one request to the device
pub fn dispatch(device: &mut Device, request: Request, read_buffer: usize) -> Response {
    match request {
        Request::Write(payload) => match device.on_write(&payload) {
            Ok(consumed) => Response::Ok(consumed as u64),
            Err(e) => Response::Error(e.to_string()),
        },
        Request::Read(capacity) => {
            Response::Data(device.on_read(capacity.unwrap_or(read_buffer)))
        }
        Request::Add(value) => Response::Ok(device.on_control(Control::Add(value))),
        Request::Get => Response::Value(device.on_control(Control::Get)),
        Request::Close => Response::Bye,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn requests_from(mut input: &[u8]) -> Vec<std::result::Result<Request, ProtocolError>> {
        let mut line = Vec::new();
        let mut out = Vec::new();
        while let Some(request) = next_request(&mut input, &mut line).await.unwrap() {
            out.push(request);
        }
        out
    }

    #[test]
    fn test_dispatch_write_and_get() {
        let mut device = Device::new();
        device.on_session_open();
        assert_eq!(
            dispatch(&mut device, Request::Write(b"452".to_vec()), 64),
            Response::Ok(3)
        );
        assert_eq!(dispatch(&mut device, Request::Add(19), 64), Response::Ok(471));
        assert_eq!(dispatch(&mut device, Request::Get, 64), Response::Value(471));
    }

    #[test]
    fn test_dispatch_bad_write_reports_error() {
        let mut device = Device::new();
        device.on_session_open();
        let response = dispatch(&mut device, Request::Write(b"abc".to_vec()), 64);
        assert!(matches!(response, Response::Error(msg) if msg.contains("invalid digit")));
        assert_eq!(device.total(), 0);
    }

    #[test]
    fn test_dispatch_read_uses_default_buffer() {
        let mut device = Device::new();
        device.on_session_open();
        device.on_write(b"123456").unwrap();
        device.on_session_close();

        assert_eq!(
            dispatch(&mut device, Request::Read(None), 4),
            Response::Data(b"1234".to_vec())
        );
    }

    #[tokio::test]
    async fn test_write_payload_keeps_terminators() {
        let requests = requests_from(b"WRITE 4\n452\nWRITE 3\n\xff\x001GET\n").await;
        assert_eq!(
            requests,
            vec![
                Ok(Request::Write(b"452\n".to_vec())),
                Ok(Request::Write(b"\xff\x001".to_vec())),
                Ok(Request::Get),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_line_is_skipped() {
        let mut input = b"WRITE 1\n7".to_vec();
        input.extend_from_slice(b"ADD ");
        input.extend(std::iter::repeat(b'7').take(MAX_REQUEST_LINE * 4));
        input.extend_from_slice(b"\nGET\n");

        let requests = requests_from(&input).await;
        assert_eq!(
            requests,
            vec![
                Ok(Request::Write(b"7".to_vec())),
                Err(ProtocolError::LineTooLong {
                    max: MAX_REQUEST_LINE
                }),
                Ok(Request::Get),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_payload_is_skipped() {
        let len = MAX_WRITE_PAYLOAD + 1;
        let mut input = format!("WRITE {}\n", len).into_bytes();
        input.extend(std::iter::repeat(b'1').take(len));
        input.extend_from_slice(b"GET\n");

        let requests = requests_from(&input).await;
        assert_eq!(
            requests,
            vec![
                Err(ProtocolError::PayloadTooLong {
                    len,
                    max: MAX_WRITE_PAYLOAD
                }),
                Ok(Request::Get),
            ]
        );
    }
}
