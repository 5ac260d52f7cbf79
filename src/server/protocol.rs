//! Line protocol spoken over a device connection
//!
//! One request per line, one response line per request:
//!
//! | request                        | response                   |
//! |--------------------------------|----------------------------|
//! | `WRITE <len>` + `<len>` bytes  | `OK <consumed>` / `ERR ..` |
//! | `READ [capacity]`              | `DATA <ledger bytes>`      |
//! | `ADD <n>`                      | `OK <total>`               |
//! | `GET`                          | `VALUE <total>`            |
//! | `CLOSE` / `QUIT`               | `BYE`                      |
//!
//! A write payload follows its header line verbatim (no trailing newline), so
//! terminators and non-UTF-8 bytes reach the device untouched.

use crate::codec;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty request")]
    EmptyRequest,

    #[error("unknown command: {0}")]
    UnknownVerb(String),

    #[error("{verb} requires an argument")]
    MissingArgument { verb: &'static str },

    #[error("invalid argument for {verb}: {value}")]
    InvalidArgument { verb: &'static str, value: String },

    #[error("line too long (max {max} bytes)")]
    LineTooLong { max: usize },

    #[error("payload too long ({len} bytes, max {max})")]
    PayloadTooLong { len: usize, max: usize },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// A client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Raw bytes handed to the device's write handler
    Write(Vec<u8>),
    /// Drain the ledger; `None` uses the server's read buffer size
    Read(Option<usize>),
    Add(u64),
    Get,
    Close,
}

/// What a request line announces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestHead {
    /// `len` payload bytes follow the line
    Write { len: usize },
    /// The line is the whole request
    Ready(Request),
}

impl RequestHead {
    /// Parse one request line (without its trailing newline)
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let line = trim_line_end(line);
        let (verb, arg) = match line.iter().position(|&b| b == b' ') {
            Some(pos) => (&line[..pos], Some(trim_spaces(&line[pos + 1..]))),
            None => (line, None),
        };
        if verb.is_empty() {
            return Err(ProtocolError::EmptyRequest);
        }
        let arg = arg.filter(|a| !a.is_empty());

        let request = match verb.to_ascii_uppercase().as_slice() {
            b"WRITE" => {
                let len = required("WRITE", arg)?;
                return parse_number("WRITE", len).map(|len| RequestHead::Write { len });
            }
            b"READ" => match arg {
                None => Request::Read(None),
                Some(value) => Request::Read(Some(parse_number("READ", value)?)),
            },
            b"ADD" => {
                let value = required("ADD", arg)?;
                Request::Add(codec::decode_uint(value).map_err(|_| invalid("ADD", value))?)
            }
            b"GET" => Request::Get,
            b"CLOSE" | b"QUIT" => Request::Close,
            _ => {
                return Err(ProtocolError::UnknownVerb(
                    String::from_utf8_lossy(verb).into_owned(),
                ))
            }
        };
        Ok(RequestHead::Ready(request))
    }
}

impl Request {
    /// Bytes sent on the wire for this request
    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!("{}\n", self).into_bytes();
        if let Request::Write(payload) = self {
            out.extend_from_slice(payload);
        }
        out
    }
}

/// Request header as it appears on the wire
impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Write(payload) => write!(f, "WRITE {}", payload.len()),
            Request::Read(Some(capacity)) => write!(f, "READ {}", capacity),
            Request::Read(None) => f.write_str("READ"),
            Request::Add(value) => write!(f, "ADD {}", value),
            Request::Get => f.write_str("GET"),
            Request::Close => f.write_str("CLOSE"),
        }
    }
}

/// A server response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Write consumed this many bytes, or ADD left this total
    Ok(u64),
    /// Ledger payload from a READ
    Data(Vec<u8>),
    /// Running total from a GET
    Value(u64),
    Error(String),
    Bye,
}

impl Response {
    /// Parse one response line (without its trailing newline)
    pub fn parse(line: &[u8]) -> Result<Self, ProtocolError> {
        let line = trim_line_end(line);
        let malformed =
            || ProtocolError::MalformedResponse(String::from_utf8_lossy(line).into_owned());

        let (tag, rest) = match line.iter().position(|&b| b == b' ') {
            Some(pos) => (&line[..pos], &line[pos + 1..]),
            None => (line, &[][..]),
        };

        match tag {
            b"OK" => codec::decode_uint(rest)
                .map(Response::Ok)
                .map_err(|_| malformed()),
            b"VALUE" => codec::decode_uint(rest)
                .map(Response::Value)
                .map_err(|_| malformed()),
            b"DATA" => Ok(Response::Data(rest.to_vec())),
            b"ERR" => Ok(Response::Error(String::from_utf8_lossy(rest).into_owned())),
            b"BYE" => Ok(Response::Bye),
            _ => Err(malformed()),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Ok(value) => write!(f, "OK {}", value),
            Response::Data(payload) => write!(f, "DATA {}", String::from_utf8_lossy(payload)),
            Response::Value(total) => write!(f, "VALUE {}", total),
            Response::Error(message) => write!(f, "ERR {}", message),
            Response::Bye => f.write_str("BYE"),
        }
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_spaces(arg: &[u8]) -> &[u8] {
    let start = arg.iter().position(|&b| b != b' ').unwrap_or(arg.len());
    let end = arg.iter().rposition(|&b| b != b' ').map_or(start, |p| p + 1);
    &arg[start..end]
}

fn required<'a>(verb: &'static str, arg: Option<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    arg.ok_or(ProtocolError::MissingArgument { verb })
}

/// Numeric arguments use the device's own decimal decoder
fn parse_number(verb: &'static str, value: &[u8]) -> Result<usize, ProtocolError> {
    codec::decode_uint(value)
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| invalid(verb, value))
}

fn invalid(verb: &'static str, value: &[u8]) -> ProtocolError {
    ProtocolError::InvalidArgument {
        verb,
        value: String::from_utf8_lossy(value).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(line: &[u8]) -> Result<Request, ProtocolError> {
        match RequestHead::parse(line)? {
            RequestHead::Ready(request) => Ok(request),
            head => panic!("expected a complete request, got {:?}", head),
        }
    }

    #[test]
    fn test_parse_write_header() {
        assert_eq!(
            RequestHead::parse(b"WRITE 4\n"),
            Ok(RequestHead::Write { len: 4 })
        );
        assert_eq!(
            RequestHead::parse(b"write 0"),
            Ok(RequestHead::Write { len: 0 })
        );
        assert_eq!(
            RequestHead::parse(b"WRITE"),
            Err(ProtocolError::MissingArgument { verb: "WRITE" })
        );
        assert!(matches!(
            RequestHead::parse(b"WRITE abc"),
            Err(ProtocolError::InvalidArgument { verb: "WRITE", .. })
        ));
    }

    #[test]
    fn test_parse_read() {
        assert_eq!(ready(b"READ"), Ok(Request::Read(None)));
        assert_eq!(ready(b"READ 64\r\n"), Ok(Request::Read(Some(64))));
        assert_eq!(
            ready(b"READ lots"),
            Err(ProtocolError::InvalidArgument {
                verb: "READ",
                value: "lots".to_string()
            })
        );
    }

    #[test]
    fn test_numeric_arguments_share_one_decoder() {
        for line in [&b"READ +64"[..], &b"ADD +64"[..], &b"WRITE +3"[..]] {
            assert!(matches!(
                RequestHead::parse(line),
                Err(ProtocolError::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn test_parse_control() {
        assert_eq!(ready(b"ADD 12"), Ok(Request::Add(12)));
        assert_eq!(ready(b"GET"), Ok(Request::Get));
        assert_eq!(
            ready(b"ADD"),
            Err(ProtocolError::MissingArgument { verb: "ADD" })
        );
        assert!(matches!(
            ready(b"ADD -1"),
            Err(ProtocolError::InvalidArgument { verb: "ADD", .. })
        ));
    }

    #[test]
    fn test_parse_close_and_errors() {
        assert_eq!(ready(b"QUIT"), Ok(Request::Close));
        assert_eq!(ready(b"close"), Ok(Request::Close));
        assert_eq!(ready(b"\n"), Err(ProtocolError::EmptyRequest));
        assert_eq!(
            ready(b"FROB 1"),
            Err(ProtocolError::UnknownVerb("FROB".to_string()))
        );
    }

    #[test]
    fn test_encode_write_keeps_raw_payload() {
        assert_eq!(Request::Write(b"452\n".to_vec()).encode(), b"WRITE 4\n452\n");
        assert_eq!(Request::Write(vec![0xff]).encode(), b"WRITE 1\n\xff");
        assert_eq!(Request::Write(Vec::new()).encode(), b"WRITE 0\n");
    }

    #[test]
    fn test_encoded_headers_parse_back() {
        for request in [
            Request::Read(Some(8)),
            Request::Read(None),
            Request::Add(3),
            Request::Get,
            Request::Close,
        ] {
            assert_eq!(ready(&request.encode()), Ok(request));
        }
        assert_eq!(
            RequestHead::parse(&Request::Write(b"19".to_vec()).encode()[..8]),
            Ok(RequestHead::Write { len: 2 })
        );
    }

    #[test]
    fn test_response_parse() {
        assert_eq!(Response::parse(b"OK 4\n"), Ok(Response::Ok(4)));
        assert_eq!(Response::parse(b"VALUE 471"), Ok(Response::Value(471)));
        assert_eq!(
            Response::parse(b"DATA 471, "),
            Ok(Response::Data(b"471, ".to_vec()))
        );
        assert_eq!(Response::parse(b"DATA"), Ok(Response::Data(Vec::new())));
        assert_eq!(
            Response::parse(b"ERR empty input"),
            Ok(Response::Error("empty input".to_string()))
        );
        assert_eq!(Response::parse(b"BYE"), Ok(Response::Bye));
        assert!(Response::parse(b"HELLO").is_err());
        assert!(Response::parse(b"OK x").is_err());
    }

    #[test]
    fn test_response_display() {
        assert_eq!(Response::Data(b"471, ".to_vec()).to_string(), "DATA 471, ");
        assert_eq!(Response::Error("bad".to_string()).to_string(), "ERR bad");
    }
}
