//! Newline framing for the input stream.
//!
//! Input arrives in arbitrary chunks. [`LineBuffer`] accumulates bytes and
//! hands back only complete lines, keeping any trailing partial line until a
//! later chunk finishes it.

use bytes::{Bytes, BytesMut};

/// Accumulates raw input bytes and drains complete lines.
///
/// Lines are returned as raw bytes. Decoding is left to the JSON parser, so
/// a multi-byte UTF-8 sequence split across two reads arrives whole and an
/// invalid one is reported instead of being replaced.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
    /// Bytes at the front of `buf` already known to contain no newline.
    scanned: usize,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completes.
    ///
    /// Line terminators (`\n`, or `\r\n`) are stripped. Empty and
    /// whitespace-only lines are dropped.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();

        while let Some(offset) = self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(self.scanned + offset + 1).freeze();
            self.scanned = 0;
            if let Some(line) = trim_line(line) {
                lines.push(line);
            }
        }
        self.scanned = self.buf.len();

        lines
    }

    /// Take whatever partial line remains at end of input.
    pub fn finish(&mut self) -> Option<Bytes> {
        let rest = self.buf.split().freeze();
        self.scanned = 0;
        trim_line(rest)
    }

    /// Number of buffered bytes not yet part of a complete line.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

fn trim_line(mut line: Bytes) -> Option<Bytes> {
    if line.ends_with(b"\n") {
        line.truncate(line.len() - 1);
    }
    if line.ends_with(b"\r") {
        line.truncate(line.len() - 1);
    }
    if line.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_complete_line() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"{\"jsonrpc\":\"2.0\",\"method\":\"ping\",\"id\":1}\n");
        assert_eq!(lines, vec![r#"{"jsonrpc":"2.0","method":"ping","id":1}"#]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn fragmented_chunks_reassemble() {
        let mut buf = LineBuffer::new();
        let first = buf.push(b"{\"a\":1}\n{\"b\"");
        assert_eq!(first, vec![r#"{"a":1}"#]);
        assert_eq!(buf.pending_len(), 4);

        let second = buf.push(b":2}\n");
        assert_eq!(second, vec![r#"{"b":2}"#]);
        assert_eq!(buf.pending_len(), 0);
    }

    #[test]
    fn partial_line_is_held_until_newline() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"{\"id\"").is_empty());
        assert!(buf.push(b":").is_empty());
        assert!(buf.push(b"7}").is_empty());
        assert_eq!(buf.push(b"\n"), vec![r#"{"id":7}"#]);
    }

    #[test]
    fn multiple_lines_in_one_chunk() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"1\n2\n3\n");
        assert_eq!(lines, vec!["1", "2", "3"]);
    }

    #[test]
    fn blank_and_whitespace_lines_are_dropped() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"\n").is_empty());
        assert!(buf.push(b"   \n").is_empty());
        assert!(buf.push(b"\t \r\n").is_empty());
        assert_eq!(buf.push(b"\n{}\n\n"), vec!["{}"]);
    }

    #[test]
    fn crlf_terminator_is_stripped() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"{\"x\":true}\r\n"), vec![r#"{"x":true}"#]);
    }

    #[test]
    fn split_utf8_sequence_arrives_whole() {
        // "é" is 0xC3 0xA9
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"{\"name\":\"Ren\xC3").is_empty());
        let lines = buf.push(b"\xA9\"}\n");
        assert_eq!(lines, vec!["{\"name\":\"René\"}"]);
    }

    #[test]
    fn invalid_utf8_is_passed_through_untouched() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"{\"name\":\"\xff\xfe\"}\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(&lines[0][..], b"{\"name\":\"\xff\xfe\"}");
        assert!(serde_json::from_slice::<serde_json::Value>(&lines[0]).is_err());
    }

    #[test]
    fn finish_returns_trailing_partial_line() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"{\"a\":1}\n{\"b\":2}"), vec![r#"{"a":1}"#]);
        assert_eq!(buf.finish(), Some(Bytes::from_static(br#"{"b":2}"#)));
        assert_eq!(buf.pending_len(), 0);
        assert!(buf.finish().is_none());
    }

    #[test]
    fn finish_ignores_whitespace_residue() {
        let mut buf = LineBuffer::new();
        buf.push(b"{}\n   ");
        assert!(buf.finish().is_none());
    }

    #[test]
    fn long_line_across_many_chunks() {
        let mut buf = LineBuffer::new();
        let payload = "x".repeat(10_000);
        let line = format!("\"{payload}\"\n");
        let mut completed = Vec::new();
        for chunk in line.as_bytes().chunks(7) {
            completed.extend(buf.push(chunk));
        }
        assert_eq!(completed, vec![format!("\"{payload}\"")]);
    }
}
