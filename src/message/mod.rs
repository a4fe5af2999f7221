//! Message envelopes and cursor-based payload access.
//!
//! A wire message is an 8-byte header followed by a word-aligned
//! payload:
//!
//! ```text
//! ┌───────────────┬─────────────────────────┬─────────────────┐
//! │ object_id: u32│ size:u16 │ opcode:u16   │ payload         │
//! │               │ packed (size<<16)|opcode│ size - 8 bytes  │
//! └───────────────┴─────────────────────────┴─────────────────┘
//! ```
//!
//! [`Message`] is a borrowed view sliced out of the receive buffer —
//! it never owns its bytes, and every view is invalidated by the next
//! refill. [`Request`] is the outbound counterpart: a header
//! descriptor that allocates its wire bytes from the send buffer and
//! hands back a [`Writer`] positioned past the header.
//!
//! [`Reader`] and [`Writer`] are single-pass cursors that check the
//! payload boundary before every access; overrunning it is a framing
//! error, never memory corruption.

use crate::buffers::send::SendBuffer;
use crate::error::{Result, WaylinkError};
use crate::wire::primitives::{
    align4, decode_fixed, decode_int, decode_object, decode_uint, encode_fixed, encode_int,
    encode_object, encode_uint, pack_header_word, unpack_header_word, HEADER_SIZE, WORD_SIZE,
};
use crate::wire::string::WlString;

/// A complete inbound message, borrowed from the receive buffer.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    /// Target object.
    pub object_id: u32,
    /// Event selector within the object's interface.
    pub opcode: u16,
    /// Total length in bytes, header included. Always a multiple of 4,
    /// at least 8.
    pub size: u16,
    /// The `size - 8` bytes following the header.
    pub payload: &'a [u8],
}

impl<'a> Message<'a> {
    /// Parse one message from the front of `frame`.
    ///
    /// The slice must hold the full frame: a short slice, a size field
    /// below the header size or off word alignment, and a declared size
    /// exceeding the slice are all framing errors.
    pub fn parse(frame: &'a [u8]) -> Result<Self> {
        if frame.len() < HEADER_SIZE {
            return Err(WaylinkError::Framing(format!(
                "truncated message: {} bytes, header needs {HEADER_SIZE}",
                frame.len()
            )));
        }

        let object_id = decode_object(frame);
        let (size, opcode) = unpack_header_word(decode_uint(&frame[WORD_SIZE..]));

        if (size as usize) < HEADER_SIZE || size as u32 % WORD_SIZE as u32 != 0 {
            return Err(WaylinkError::Framing(format!(
                "invalid message size {size} for object {object_id}"
            )));
        }

        if frame.len() < size as usize {
            return Err(WaylinkError::Framing(format!(
                "truncated message: declared {size} bytes, {} available",
                frame.len()
            )));
        }

        Ok(Self {
            object_id,
            opcode,
            size,
            payload: &frame[HEADER_SIZE..size as usize],
        })
    }

    /// A fresh single-pass reader over the payload.
    pub fn reader(&self) -> Reader<'a> {
        Reader::new(self.payload)
    }
}

/// Descriptor for an outbound request message.
///
/// Opcode tables declare, per operation, how many 4-byte words the
/// fixed-size fields occupy; each string field adds
/// `string.word_size() + 1` words on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub object_id: u32,
    pub opcode: u16,
    /// Total message length: payload words plus the 8-byte header.
    pub size: u16,
}

impl Request {
    /// Describe a request whose payload occupies `words` 4-byte words.
    pub fn with_words(object_id: u32, opcode: u16, words: u16) -> Self {
        Self {
            object_id,
            opcode,
            size: words * WORD_SIZE as u16 + HEADER_SIZE as u16,
        }
    }

    /// Allocate this message's bytes from `send`, fill in the header,
    /// and return a writer positioned at the start of the payload.
    pub fn writer<'a>(&self, send: &'a mut SendBuffer) -> Result<Writer<'a>> {
        let buf = send.allocate(self.size as usize)?;
        encode_object(self.object_id, buf);
        encode_uint(pack_header_word(self.size, self.opcode), &mut buf[WORD_SIZE..]);
        Ok(Writer {
            buf,
            cursor: HEADER_SIZE,
        })
    }
}

/// Sequential, bounds-checked payload decoder.
///
/// Each `read_*` advances the cursor by the wire size of the type read;
/// exceeding the payload length is a framing error. Re-reading requires
/// a new reader — the cursor never rewinds.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over a message payload.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    fn take(&mut self, bytes: usize) -> Result<&'a [u8]> {
        if self.cursor + bytes > self.data.len() {
            return Err(WaylinkError::Framing(format!(
                "exceeded message payload boundary: {} needed at offset {}, {} total",
                bytes,
                self.cursor,
                self.data.len()
            )));
        }
        let slice = &self.data[self.cursor..];
        self.cursor += bytes;
        Ok(slice)
    }

    pub fn read_uint(&mut self) -> Result<u32> {
        Ok(decode_uint(self.take(WORD_SIZE)?))
    }

    pub fn read_int(&mut self) -> Result<i32> {
        Ok(decode_int(self.take(WORD_SIZE)?))
    }

    pub fn read_fixed(&mut self) -> Result<f64> {
        Ok(decode_fixed(self.take(WORD_SIZE)?))
    }

    pub fn read_object(&mut self) -> Result<u32> {
        Ok(decode_object(self.take(WORD_SIZE)?))
    }

    /// Decode a length-prefixed string, advancing by its full
    /// serialised size (length word, body, padding).
    pub fn read_string(&mut self) -> Result<WlString> {
        let value = WlString::from_wire(&self.data[self.cursor..])?;
        self.take(value.serialised_size() as usize)?;
        Ok(value)
    }
}

/// Sequential, bounds-checked payload encoder over a send-buffer
/// region whose header is already filled in.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    cursor: usize,
}

impl Writer<'_> {
    fn reserve(&mut self, bytes: usize) -> Result<&mut [u8]> {
        if self.cursor + bytes > self.buf.len() {
            return Err(WaylinkError::Framing(format!(
                "exceeded message payload boundary: {} needed at offset {}, {} total",
                bytes,
                self.cursor,
                self.buf.len()
            )));
        }
        let slice = &mut self.buf[self.cursor..];
        self.cursor += bytes;
        Ok(slice)
    }

    pub fn write_uint(&mut self, value: u32) -> Result<()> {
        encode_uint(value, self.reserve(WORD_SIZE)?);
        Ok(())
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        encode_int(value, self.reserve(WORD_SIZE)?);
        Ok(())
    }

    pub fn write_object(&mut self, id: u32) -> Result<()> {
        encode_object(id, self.reserve(WORD_SIZE)?);
        Ok(())
    }

    pub fn write_fixed(&mut self, value: f64) -> Result<()> {
        encode_fixed(value, self.reserve(WORD_SIZE)?);
        Ok(())
    }

    /// Encode a string field: length word, body, zero padding up to the
    /// next word boundary.
    pub fn write_string(&mut self, value: &WlString) -> Result<()> {
        let body = value.as_bytes();
        let padded = align4(value.size()) as usize;
        let out = self.reserve(WORD_SIZE + padded)?;

        encode_uint(value.size(), out);
        out[WORD_SIZE..WORD_SIZE + body.len()].copy_from_slice(body);
        out[WORD_SIZE + body.len()..WORD_SIZE + padded].fill(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::send::SendBuffer;

    fn frame_bytes(object_id: u32, opcode: u16, payload_words: &[u32]) -> Vec<u8> {
        let size = (payload_words.len() * WORD_SIZE + HEADER_SIZE) as u16;
        let mut bytes = vec![0u8; size as usize];
        encode_object(object_id, &mut bytes);
        encode_uint(pack_header_word(size, opcode), &mut bytes[WORD_SIZE..]);
        for (i, word) in payload_words.iter().enumerate() {
            encode_uint(*word, &mut bytes[HEADER_SIZE + i * WORD_SIZE..]);
        }
        bytes
    }

    #[test]
    fn test_parse_header_fields() {
        let bytes = frame_bytes(7, 3, &[1, 2]);
        let msg = Message::parse(&bytes).unwrap();
        assert_eq!(msg.object_id, 7);
        assert_eq!(msg.opcode, 3);
        assert_eq!(msg.size, 16);
        assert_eq!(msg.payload.len(), 8);
    }

    #[test]
    fn test_parse_rejects_undersized_header() {
        let mut bytes = frame_bytes(1, 0, &[]);
        // Corrupt the size field down to 4.
        encode_uint(pack_header_word(4, 0), &mut bytes[WORD_SIZE..]);
        assert!(matches!(
            Message::parse(&bytes),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_parse_rejects_short_slice() {
        assert!(matches!(
            Message::parse(&[0u8; 5]),
            Err(WaylinkError::Framing(_))
        ));
        assert!(matches!(
            Message::parse(&[]),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_parse_rejects_size_beyond_slice() {
        let mut bytes = frame_bytes(1, 0, &[7]);
        // Declares one word more than the slice carries.
        encode_uint(pack_header_word(16, 0), &mut bytes[WORD_SIZE..]);
        assert!(matches!(
            Message::parse(&bytes),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_parse_rejects_unaligned_size() {
        let mut bytes = frame_bytes(1, 0, &[0]);
        encode_uint(pack_header_word(10, 0), &mut bytes[WORD_SIZE..]);
        assert!(matches!(
            Message::parse(&bytes),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_request_size_accounting() {
        assert_eq!(Request::with_words(1, 0, 0).size, 8);
        assert_eq!(Request::with_words(1, 0, 1).size, 12);
        assert_eq!(Request::with_words(1, 0, 6).size, 32);
    }

    #[test]
    fn test_writer_prefills_header() {
        let mut send = SendBuffer::new();
        let request = Request::with_words(3, 2, 1);
        let mut writer = request.writer(&mut send).unwrap();
        writer.write_uint(42).unwrap();

        let msg = Message::parse(send.queued_bytes()).unwrap();
        assert_eq!(msg.object_id, 3);
        assert_eq!(msg.opcode, 2);
        assert_eq!(msg.size, 12);
        assert_eq!(msg.reader().read_uint().unwrap(), 42);
    }

    #[test]
    fn test_encode_then_decode_mixed_fields() {
        let mut send = SendBuffer::new();
        let text = WlString::from("hi");
        let words = 1 + text.word_size() as u16 + 1;
        let request = Request::with_words(3, 2, words);

        let mut writer = request.writer(&mut send).unwrap();
        writer.write_uint(42).unwrap();
        writer.write_string(&text).unwrap();

        let msg = Message::parse(send.queued_bytes()).unwrap();
        let mut reader = msg.reader();
        assert_eq!(reader.read_uint().unwrap(), 42);
        assert_eq!(reader.read_string().unwrap(), "hi");
    }

    #[test]
    fn test_reader_overrun_is_framing_error() {
        let bytes = frame_bytes(1, 0, &[5]);
        let msg = Message::parse(&bytes).unwrap();
        let mut reader = msg.reader();
        assert_eq!(reader.read_uint().unwrap(), 5);
        assert!(matches!(
            reader.read_uint(),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_reader_string_overrun_is_framing_error() {
        // Payload declares an 80-byte string but only carries 4 bytes.
        let bytes = frame_bytes(1, 0, &[80]);
        let msg = Message::parse(&bytes).unwrap();
        assert!(matches!(
            msg.reader().read_string(),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_writer_overrun_is_framing_error() {
        let mut send = SendBuffer::new();
        let request = Request::with_words(1, 0, 1);
        let mut writer = request.writer(&mut send).unwrap();
        writer.write_uint(1).unwrap();
        assert!(matches!(
            writer.write_uint(2),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_reader_single_pass_non_restartable() {
        let bytes = frame_bytes(1, 0, &[9, 10]);
        let msg = Message::parse(&bytes).unwrap();

        let mut first = msg.reader();
        assert_eq!(first.read_uint().unwrap(), 9);
        assert_eq!(first.read_uint().unwrap(), 10);

        // A new reader over the same payload starts from the top.
        let mut second = msg.reader();
        assert_eq!(second.read_uint().unwrap(), 9);
    }

    #[test]
    fn test_signed_and_fixed_fields() {
        let mut send = SendBuffer::new();
        let request = Request::with_words(2, 1, 2);
        let mut writer = request.writer(&mut send).unwrap();
        writer.write_int(-640).unwrap();
        writer.write_uint(480).unwrap();

        let msg = Message::parse(send.queued_bytes()).unwrap();
        let mut reader = msg.reader();
        assert_eq!(reader.read_int().unwrap(), -640);
        assert_eq!(reader.read_uint().unwrap(), 480);
    }
}
