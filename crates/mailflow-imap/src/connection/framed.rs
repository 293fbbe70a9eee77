//! Framed I/O for IMAP protocol.
//!
//! IMAP uses CRLF-terminated lines with support for literals. The read and
//! write halves of a connection are framed separately so the reader and
//! writer tasks can own one each.

#![allow(clippy::missing_errors_doc)]

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::Result;

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024; // 1 MB

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024; // 100 MB

/// Reading half of a framed connection.
///
/// Yields whole responses: a line plus any literals it announces and the
/// lines that follow them.
pub struct FramedReader<R> {
    reader: BufReader<R>,
}

impl<R> FramedReader<R>
where
    R: AsyncRead + Unpin,
{
    /// Creates a new framed reader.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, inner),
        }
    }

    /// Reads a complete IMAP response, handling literals.
    ///
    /// Returns `Ok(None)` on a clean end of stream between responses.
    pub async fn read_response(&mut self) -> Result<Option<Vec<u8>>> {
        let mut response = Vec::new();

        loop {
            let Some(line) = self.read_line().await? else {
                if response.is_empty() {
                    return Ok(None);
                }
                return Err(crate::Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed inside a response",
                )));
            };

            response.extend_from_slice(&line);

            // Check for literal at end of line: {123} or {123+}
            let Some(literal_len) = parse_literal_length(&line) else {
                break;
            };
            if literal_len > MAX_LITERAL_SIZE {
                return Err(crate::Error::Protocol(format!(
                    "literal too large: {literal_len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            let mut literal = vec![0u8; literal_len];
            self.reader.read_exact(&mut literal).await?;
            response.extend_from_slice(&literal);
        }

        tracing::trace!(line = %String::from_utf8_lossy(&response).trim_end(), "S:");
        Ok(Some(response))
    }

    /// Reads a single CRLF-terminated line; `None` at end of stream.
    async fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                if line.is_empty() {
                    return Ok(None);
                }
                return Err(crate::Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed mid-line",
                )));
            }

            if let Some(pos) = find_crlf(&line, buf) {
                line.extend_from_slice(&buf[..pos]);
                self.reader.consume(pos);
                break;
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(crate::Error::Protocol("line too long".to_string()));
            }
        }

        Ok(Some(line))
    }
}

/// Writing half of a framed connection.
pub struct FramedWriter<W> {
    writer: W,
    buffer: BytesMut,
}

impl<W> FramedWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Creates a new framed writer.
    pub fn new(inner: W) -> Self {
        Self {
            writer: inner,
            buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Writes one part of a command and flushes it.
    pub async fn write_part(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.clear();
        self.buffer.extend_from_slice(data);
        tracing::trace!(line = %String::from_utf8_lossy(data).trim_end(), "C:");

        self.writer.write_all(&self.buffer).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shuts down the write side of the stream.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Returns the length up to and including the first CRLF.
///
/// `pending` holds bytes already taken from earlier buffers, so a CR at the
/// end of one buffer pairs with an LF at the start of the next.
fn find_crlf(pending: &[u8], buf: &[u8]) -> Option<usize> {
    if pending.last() == Some(&b'\r') && buf.first() == Some(&b'\n') {
        return Some(1);
    }
    buf.windows(2).position(|w| w == b"\r\n").map(|pos| pos + 2)
}

/// Parses a literal length from the end of a line.
///
/// Matches patterns like `{123}\r\n` or `{123+}\r\n` (non-synchronizing).
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?;
    let body = line.strip_suffix(b"}")?;
    let body = body.strip_suffix(b"+").unwrap_or(body);
    let open = body.iter().rposition(|&b| b == b'{')?;

    let num_str = std::str::from_utf8(&body[open + 1..]).ok()?;
    num_str.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn crlf_detection() {
        assert_eq!(find_crlf(b"", b"hello\r\n"), Some(7));
        assert_eq!(find_crlf(b"", b"\r\n"), Some(2));
        assert_eq!(find_crlf(b"", b"no newline"), None);
        assert_eq!(find_crlf(b"", b"just\n"), None);
        assert_eq!(find_crlf(b"line\r", b"\nnext"), Some(1));
    }

    #[test]
    fn literal_length() {
        assert_eq!(parse_literal_length(b"* ACL {5}\r\n"), Some(5));
        assert_eq!(parse_literal_length(b"* ACL {5+}\r\n"), Some(5));
        assert_eq!(parse_literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(parse_literal_length(b"no literal\r\n"), None);
        assert_eq!(parse_literal_length(b"incomplete {123"), None);
        assert_eq!(parse_literal_length(b"wrong {abc}\r\n"), None);
    }

    #[tokio::test]
    async fn read_simple_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedReader::new(mock);

        let response = framed.read_response().await.unwrap().unwrap();
        assert_eq!(response, b"* OK ready\r\n");
        assert!(framed.read_response().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_with_literal() {
        let mock = Builder::new()
            .read(b"* MYRIGHTS {8}\r\n")
            .read(b"Entw\xc3\xbcrf")
            .read(b" lrswi\r\n")
            .build();
        let mut framed = FramedReader::new(mock);

        let response = framed.read_response().await.unwrap().unwrap();
        assert_eq!(response, b"* MYRIGHTS {8}\r\nEntw\xc3\xbcrf lrswi\r\n");
    }

    #[tokio::test]
    async fn line_split_across_reads() {
        let mock = Builder::new()
            .read(b"M0001 OK GETACL\r")
            .read(b"\n* OK next\r\n")
            .build();
        let mut framed = FramedReader::new(mock);

        assert_eq!(
            framed.read_response().await.unwrap().unwrap(),
            b"M0001 OK GETACL\r\n"
        );
        assert_eq!(
            framed.read_response().await.unwrap().unwrap(),
            b"* OK next\r\n"
        );
    }

    #[tokio::test]
    async fn eof_mid_line_is_an_error() {
        let mock = Builder::new().read(b"* OK trunc").build();
        let mut framed = FramedReader::new(mock);
        assert!(framed.read_response().await.is_err());
    }

    #[tokio::test]
    async fn literal_size_validation() {
        let literal_size = MAX_LITERAL_SIZE + 1;
        let header = format!("* ACL INBOX {{{literal_size}}}\r\n");

        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedReader::new(mock);

        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedReader::new(mock);

        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("line too long"));
    }

    #[tokio::test]
    async fn write_part_flushes() {
        let mock = Builder::new()
            .write(b"M0001 LOGIN {4}\r\n")
            .write(b"user pass\r\n")
            .build();
        let mut framed = FramedWriter::new(mock);

        framed.write_part(b"M0001 LOGIN {4}\r\n").await.unwrap();
        framed.write_part(b"user pass\r\n").await.unwrap();
    }
}
