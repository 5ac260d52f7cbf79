//! Bounded reads for the line protocol

use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest request line the host accepts, newline included
pub const MAX_REQUEST_LINE: usize = 256;

/// Longest payload a single `WRITE` may carry
pub const MAX_WRITE_PAYLOAD: usize = 4096;

/// Longest response line the client accepts, newline included
pub const MAX_RESPONSE_LINE: usize = 64 * 1024;

/// Outcome of [`read_line`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    /// Peer closed the stream before sending anything
    Eof,
    /// A line (possibly unterminated at end of stream) is in the buffer
    Complete,
    /// The line exceeded the limit; it was discarded up to its newline
    TooLong,
}

/// Read one `\n`-terminated line into `buf`, never buffering more than `max` bytes.
pub async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader).take(max as u64).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(Line::Eof);
    }
    if buf.ends_with(b"\n") || read < max {
        return Ok(Line::Complete);
    }

    buf.clear();
    skip_line(reader).await?;
    Ok(Line::TooLong)
}

/// Drop input up to and including the next newline
async fn skip_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        let (consumed, done) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };
        reader.consume(consumed);
        if done {
            return Ok(());
        }
    }
}

/// Drop exactly `len` bytes of input without buffering them
pub async fn skip_bytes<R>(reader: &mut R, len: usize) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let skipped = io::copy(&mut (&mut *reader).take(len as u64), &mut io::sink()).await?;
    if skipped < len as u64 {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}
