//! CRLF line codec.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::CodecError;

/// Terminator appended to every outgoing line.
pub const TERMINATOR: &[u8] = b"\r\n";

/// Codec for newline-delimited protocol lines.
///
/// Decoded lines have their `\n` (and a preceding `\r`, if any) removed.
/// Encoded lines are written followed by `\r\n`.
///
/// A line that is too long or not valid UTF-8 is consumed and yielded as an
/// `Err` item, so the stream stays usable for the lines after it. Only a
/// stream ending in the middle of a line fails the decoder itself.
#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    /// Index in the read buffer up to which no `\n` has been found.
    next_index: usize,
    /// Maximum line length, terminator excluded.
    max_length: Option<usize>,
    /// Dropping the rest of an over-long line.
    discarding: bool,
}

impl LineCodec {
    /// Create a codec without a line length limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec rejecting lines longer than `max_length` bytes.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            max_length: Some(max_length),
            ..Self::default()
        }
    }

    /// Get the maximum line length, if one is set.
    #[must_use]
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    fn check_length(&self, length: usize) -> Result<(), CodecError> {
        match self.max_length {
            Some(max) if length > max => Err(CodecError::LineTooLong { length, max }),
            _ => Ok(()),
        }
    }
}

impl Decoder for LineCodec {
    type Item = Result<String, CodecError>;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let offset = self.next_index.min(src.len());
            let newline = src[offset..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|pos| offset + pos);

            match (self.discarding, newline) {
                (true, Some(newline)) => {
                    src.advance(newline + 1);
                    self.discarding = false;
                    self.next_index = 0;
                }
                (true, None) => {
                    src.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                (false, Some(newline)) => {
                    self.next_index = 0;

                    let mut line = src.split_to(newline + 1);
                    line.truncate(newline);
                    if line.last() == Some(&b'\r') {
                        line.truncate(line.len() - 1);
                    }

                    let line = self.check_length(line.len()).and_then(|()| {
                        std::str::from_utf8(&line)
                            .map(str::to_owned)
                            .map_err(|_| CodecError::InvalidUtf8)
                    });
                    return Ok(Some(line));
                }
                (false, None) => {
                    // Allow for the "\r" of a terminator that has not arrived yet.
                    if let Err(err) = self.check_length(src.len().saturating_sub(1)) {
                        tracing::debug!(error = %err, "discarding over-long line");
                        src.clear();
                        self.next_index = 0;
                        self.discarding = true;
                        return Ok(Some(Err(err)));
                    }
                    self.next_index = src.len();
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }

        tracing::trace!(
            pending = src.len(),
            "stream ended in the middle of a line"
        );
        src.clear();
        self.next_index = 0;
        Err(CodecError::ConnectionClosed)
    }
}

impl Encoder<&str> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, line: &str, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(line.len() + TERMINATOR.len());
        dst.put_slice(line.as_bytes());
        dst.put_slice(TERMINATOR);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next(codec: &mut LineCodec, buf: &mut BytesMut) -> Option<Result<String, CodecError>> {
        codec.decode(buf).unwrap()
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("START search pw", &mut buf).unwrap();
        codec.encode("PING", &mut buf).unwrap();
        assert_eq!(&buf[..], b"START search pw\r\nPING\r\n");
    }

    #[test]
    fn test_decode_complete_lines() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"CONNECTED <sonic-server v1.4.9>\r\nPONG\n"[..]);

        assert_eq!(
            next(&mut codec, &mut buf).unwrap().unwrap(),
            "CONNECTED <sonic-server v1.4.9>"
        );
        assert_eq!(next(&mut codec, &mut buf).unwrap().unwrap(), "PONG");
        assert!(next(&mut codec, &mut buf).is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"STARTED search "[..]);
        assert!(next(&mut codec, &mut buf).is_none());

        buf.extend_from_slice(b"protocol(1) buffer(20000)\r");
        assert!(next(&mut codec, &mut buf).is_none());

        buf.extend_from_slice(b"\n");
        assert_eq!(
            next(&mut codec, &mut buf).unwrap().unwrap(),
            "STARTED search protocol(1) buffer(20000)"
        );
    }

    #[test]
    fn test_decode_eof_with_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"ENDED qu"[..]);
        let err = codec.decode_eof(&mut buf).unwrap_err();
        assert!(matches!(err, CodecError::ConnectionClosed));
        assert!(err.is_end_of_stream());
    }

    #[test]
    fn test_decode_eof_clean() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_max_length() {
        let mut codec = LineCodec::with_max_length(4);
        let mut buf = BytesMut::from(&b"PONG\r\nPONGPONG\r\nPONG\r\n"[..]);
        assert_eq!(next(&mut codec, &mut buf).unwrap().unwrap(), "PONG");

        let err = next(&mut codec, &mut buf).unwrap().unwrap_err();
        assert!(matches!(err, CodecError::LineTooLong { length: 8, max: 4 }));
        assert!(!err.is_end_of_stream());

        assert_eq!(next(&mut codec, &mut buf).unwrap().unwrap(), "PONG");
    }

    #[test]
    fn test_over_long_partial_line_is_discarded() {
        let mut codec = LineCodec::with_max_length(4);
        let mut buf = BytesMut::from(&b"PONGPONG"[..]);
        let err = next(&mut codec, &mut buf).unwrap().unwrap_err();
        assert!(matches!(err, CodecError::LineTooLong { length: 7, max: 4 }));
        assert!(buf.is_empty());

        // The tail of the rejected line is skipped.
        buf.extend_from_slice(b"PONG\r\nOK\r\n");
        assert_eq!(next(&mut codec, &mut buf).unwrap().unwrap(), "OK");
        assert!(next(&mut codec, &mut buf).is_none());
    }

    #[test]
    fn test_invalid_utf8_is_consumed() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"\xff\xfe\r\nPONG\r\n"[..]);
        let err = next(&mut codec, &mut buf).unwrap().unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8));
        assert_eq!(next(&mut codec, &mut buf).unwrap().unwrap(), "PONG");
    }
}
