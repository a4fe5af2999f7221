//! Receive buffer: one `recv` per refill, sliced into message views.
//!
//! The arena is filled wholesale by [`RecvBuffer::refill`] and then
//! drained as a lazy, forward-only sequence of [`Message`] envelopes
//! via [`RecvBuffer::next_message`]. Views borrow the arena directly;
//! the next refill invalidates all of them (the borrow checker
//! enforces this).
//!
//! A `recv` may end mid-frame. The incomplete tail is carried over:
//! `refill` moves it to the front of the arena and appends fresh bytes
//! after it, so parsing resumes where it stopped.

use std::io::Read;
use std::os::unix::net::UnixStream;

use crate::error::{Result, WaylinkError};
use crate::message::Message;
use crate::wire::primitives::{decode_uint, unpack_header_word, HEADER_SIZE, WORD_SIZE};

/// Default arena capacity in bytes.
pub const RECV_CAPACITY: usize = 4096;

/// Fixed-capacity byte arena filled from one `recv` call per refill.
pub struct RecvBuffer {
    arena: Box<[u8]>,
    /// Bytes of the arena that hold received data.
    len: usize,
    /// Bytes already handed out as complete messages.
    consumed: usize,
}

impl RecvBuffer {
    pub fn new() -> Self {
        Self::with_capacity(RECV_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
            consumed: 0,
        }
    }

    /// Issue exactly one `recv` into the arena and record the result.
    ///
    /// Any unconsumed partial tail from the previous fill is moved to
    /// the front first and kept. Returns the number of new bytes; zero
    /// means the peer closed the connection.
    ///
    /// Fails if the arena is already full of one oversized frame — the
    /// stream cannot make progress in that case.
    pub fn refill(&mut self, socket: &UnixStream) -> Result<usize> {
        if self.consumed > 0 {
            self.arena.copy_within(self.consumed..self.len, 0);
            self.len -= self.consumed;
            self.consumed = 0;
        }

        if self.len == self.arena.len() {
            return Err(WaylinkError::Framing(format!(
                "frame larger than receive buffer ({} bytes)",
                self.arena.len()
            )));
        }

        let n = (&*socket).read(&mut self.arena[self.len..])?;
        self.len += n;
        Ok(n)
    }

    /// Slice the next complete message out of the arena.
    ///
    /// Returns `None` when the remaining bytes are empty or form only a
    /// partial frame (kept for the next refill). A size field below the
    /// header size or off word alignment is a fatal framing error —
    /// once that happens the offset of the next valid frame is unknown.
    pub fn next_message(&mut self) -> Result<Option<Message<'_>>> {
        let remaining = &self.arena[self.consumed..self.len];

        if remaining.len() < HEADER_SIZE {
            return Ok(None);
        }

        let (size, _) = unpack_header_word(decode_uint(&remaining[WORD_SIZE..]));
        let size = size as usize;

        if size < HEADER_SIZE || size % WORD_SIZE != 0 {
            return Err(WaylinkError::Framing(format!(
                "invalid frame size {size} at offset {}",
                self.consumed
            )));
        }

        if remaining.len() < size {
            return Ok(None);
        }

        let frame = &self.arena[self.consumed..self.consumed + size];
        self.consumed += size;
        Message::parse(frame).map(Some)
    }

    /// Bytes received but not yet sliced into messages.
    pub fn pending(&self) -> usize {
        self.len - self.consumed
    }

    #[cfg(test)]
    pub(crate) fn load(&mut self, bytes: &[u8]) {
        self.arena[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }
}

impl Default for RecvBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::primitives::{encode_object, encode_uint, pack_header_word};

    fn frame(object_id: u32, opcode: u16, payload_words: &[u32]) -> Vec<u8> {
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
    fn test_empty_buffer_yields_nothing() {
        let mut buf = RecvBuffer::new();
        assert!(buf.next_message().unwrap().is_none());
    }

    #[test]
    fn test_back_to_back_frames_yield_exact_count() {
        let mut buf = RecvBuffer::new();
        for i in 0..5u32 {
            buf.load(&frame(i + 2, i as u16, &[i]));
        }

        let mut seen = 0;
        while let Some(msg) = buf.next_message().unwrap() {
            assert_eq!(msg.object_id, seen + 2);
            seen += 1;
        }
        assert_eq!(seen, 5);
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn test_sequence_terminates_at_valid_length() {
        let mut buf = RecvBuffer::new();
        buf.load(&frame(2, 0, &[]));
        assert!(buf.next_message().unwrap().is_some());
        assert!(buf.next_message().unwrap().is_none());
        // Still none on repeat; the cursor does not run past the end.
        assert!(buf.next_message().unwrap().is_none());
    }

    #[test]
    fn test_partial_frame_is_kept_for_next_fill() {
        let mut buf = RecvBuffer::new();
        let whole = frame(3, 1, &[0xAAAA, 0xBBBB]);
        buf.load(&whole[..10]);

        assert!(buf.next_message().unwrap().is_none());
        assert_eq!(buf.pending(), 10);

        buf.load(&whole[10..]);
        let msg = buf.next_message().unwrap().unwrap();
        assert_eq!(msg.object_id, 3);
        assert_eq!(msg.reader().read_uint().unwrap(), 0xAAAA);
    }

    #[test]
    fn test_header_smaller_than_word_pair_waits() {
        let mut buf = RecvBuffer::new();
        buf.load(&[1, 2, 3]);
        assert!(buf.next_message().unwrap().is_none());
    }

    #[test]
    fn test_undersized_size_field_is_fatal() {
        let mut buf = RecvBuffer::new();
        let mut bad = frame(2, 0, &[]);
        encode_uint(pack_header_word(4, 0), &mut bad[WORD_SIZE..]);
        buf.load(&bad);
        assert!(matches!(
            buf.next_message(),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_unaligned_size_field_is_fatal() {
        let mut buf = RecvBuffer::new();
        let mut bad = frame(2, 0, &[7]);
        encode_uint(pack_header_word(11, 0), &mut bad[WORD_SIZE..]);
        buf.load(&bad);
        assert!(matches!(
            buf.next_message(),
            Err(WaylinkError::Framing(_))
        ));
    }

    #[test]
    fn test_refill_carries_partial_tail() {
        let (client, server) = UnixStream::pair().unwrap();
        let mut buf = RecvBuffer::new();

        let whole = frame(5, 2, &[42]);
        use std::io::Write;
        (&server).write_all(&whole[..6]).unwrap();
        assert_eq!(buf.refill(&client).unwrap(), 6);
        assert!(buf.next_message().unwrap().is_none());

        (&server).write_all(&whole[6..]).unwrap();
        buf.refill(&client).unwrap();
        let msg = buf.next_message().unwrap().unwrap();
        assert_eq!(msg.object_id, 5);
        assert_eq!(msg.opcode, 2);
        assert_eq!(msg.reader().read_uint().unwrap(), 42);
    }

    #[test]
    fn test_refill_returns_zero_on_peer_close() {
        let (client, server) = UnixStream::pair().unwrap();
        drop(server);
        let mut buf = RecvBuffer::new();
        assert_eq!(buf.refill(&client).unwrap(), 0);
    }
}
