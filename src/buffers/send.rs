//! Send buffer: bump-allocated outbound messages, flushed atomically.
//!
//! Requests serialize themselves into regions handed out by
//! [`SendBuffer::allocate`]; a region stays valid until the next
//! [`SendBuffer::flush`]. File descriptors queued with
//! [`SendBuffer::attach_fd`] travel with the flush as one `SCM_RIGHTS`
//! control message — descriptor-bearing requests and their fds are
//! therefore delivered together, and two of them may share a flush
//! without losing a descriptor.
//!
//! The buffer never closes a descriptor. Ownership stays with the
//! caller; after a successful flush the peer holds its own copy and
//! the local one can be closed if not otherwise needed.

use std::io::{IoSlice, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;

use nix::sys::socket::{sendmsg, ControlMessage, MsgFlags};

use crate::error::{Result, WaylinkError};

/// Default arena capacity in bytes.
pub const SEND_CAPACITY: usize = 4096;

/// Fixed-capacity outbound arena with an ancillary descriptor queue.
pub struct SendBuffer {
    arena: Box<[u8]>,
    /// Write cursor; everything below it is queued for the next flush.
    offset: usize,
    /// Messages allocated since the last flush.
    queued: usize,
    /// Descriptors to send as `SCM_RIGHTS` with the next flush.
    fds: Vec<RawFd>,
}

impl SendBuffer {
    pub fn new() -> Self {
        Self::with_capacity(SEND_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: vec![0u8; capacity].into_boxed_slice(),
            offset: 0,
            queued: 0,
            fds: Vec::new(),
        }
    }

    /// Bump-allocate `bytes` from the write cursor.
    ///
    /// The region is valid until the next flush. Fails if the new
    /// cursor would meet or exceed the arena capacity.
    pub fn allocate(&mut self, bytes: usize) -> Result<&mut [u8]> {
        let start = self.offset;
        let end = start + bytes;

        if end >= self.arena.len() {
            return Err(WaylinkError::BufferFull {
                requested: bytes,
                capacity: self.arena.len(),
            });
        }

        self.offset = end;
        self.queued += 1;
        Ok(&mut self.arena[start..end])
    }

    /// Queue a file descriptor for the next flush's ancillary data.
    ///
    /// Descriptors cross the socket only alongside message bytes
    /// (`SOCK_STREAM` delivers no ancillary data with an empty
    /// payload), so an attached descriptor waits until a flush that
    /// actually carries a message. Every descriptor-bearing request
    /// queues its message in the same cycle, so in practice the two
    /// always travel together.
    pub fn attach_fd(&mut self, fd: RawFd) {
        self.fds.push(fd);
    }

    /// Send everything queued in one syscall and reset the buffer.
    ///
    /// Uses `sendmsg` with a single `SCM_RIGHTS` control message when
    /// descriptors are queued, plain `send` otherwise. A short write is
    /// fatal — there is no retry loop. Returns the number of messages
    /// that had been queued.
    ///
    /// With no message bytes queued this is a no-op: any attached
    /// descriptors stay queued for the next flush that carries data.
    pub fn flush(&mut self, socket: &UnixStream) -> Result<usize> {
        if self.offset == 0 {
            return Ok(0);
        }

        let written = if self.fds.is_empty() {
            (&*socket).write(&self.arena[..self.offset])?
        } else {
            let iov = [IoSlice::new(&self.arena[..self.offset])];
            let cmsgs = [ControlMessage::ScmRights(&self.fds)];
            sendmsg::<()>(
                socket.as_raw_fd(),
                &iov,
                &cmsgs,
                MsgFlags::empty(),
                None,
            )
            .map_err(std::io::Error::from)?
        };

        if written != self.offset {
            return Err(WaylinkError::ShortWrite {
                written,
                expected: self.offset,
            });
        }

        let flushed = self.queued;
        self.offset = 0;
        self.queued = 0;
        self.fds.clear();
        Ok(flushed)
    }

    /// True iff nothing has been allocated since the last flush.
    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    /// Messages allocated since the last flush.
    pub fn queued_messages(&self) -> usize {
        self.queued
    }

    /// Descriptors waiting to travel with the next flush.
    pub fn queued_fds(&self) -> &[RawFd] {
        &self.fds
    }

    /// The serialized bytes waiting to be flushed.
    pub fn queued_bytes(&self) -> &[u8] {
        &self.arena[..self.offset]
    }
}

impl Default for SendBuffer {
    fn default() -> Self {
        Self::new()
    }
}
