//! Connection: the flush / receive / dispatch round-trip.
//!
//! A [`Connection`] owns the socket, both arenas, and the object
//! registry — there is no global state, so multiple independent
//! connections can coexist in one process. All I/O is synchronous and
//! blocking, driven from a single thread:
//!
//! 1. **Flush**: push queued requests to the peer.
//! 2. **Receive**: one `recv` into the receive arena.
//! 3. **Dispatch**: route each framed message, in arrival order, to
//!    its object — or handle it on the root control channel.
//!
//! A stalled peer blocks the calling thread indefinitely; there is no
//! timeout or cancellation. That limitation is inherited from the
//! protocol's synchronous client model.

use std::os::fd::RawFd;
use std::os::unix::net::UnixStream;

use crate::buffers::{RecvBuffer, SendBuffer};
use crate::error::{Result, WaylinkError};
use crate::identity::{ObjectHandle, ObjectRegistry, DISPLAY_OBJECT_ID, NULL_OBJECT_ID};
use crate::message::{Request, Writer};
use crate::transport;

/// Root control channel: fatal error notification.
pub const DISPLAY_EV_ERROR: u16 = 0;
/// Root control channel: the peer is done with an object ID.
pub const DISPLAY_EV_DELETE_ID: u16 = 1;

/// A connected protocol client.
pub struct Connection {
    socket: UnixStream,
    recv: RecvBuffer,
    send: SendBuffer,
    registry: ObjectRegistry,
}

impl Connection {
    /// Connect to the compositor socket resolved from the environment.
    pub fn connect() -> Result<Self> {
        Ok(Self::from_stream(transport::connect()?))
    }

    /// Wrap an already connected stream (tests, custom bootstrap).
    pub fn from_stream(socket: UnixStream) -> Self {
        Self {
            socket,
            recv: RecvBuffer::new(),
            send: SendBuffer::new(),
            registry: ObjectRegistry::new(),
        }
    }

    /// The request-building surface: split borrows of the send buffer
    /// and registry, usable both outside and inside dispatch.
    pub fn ctx(&mut self) -> Context<'_> {
        Context {
            send: &mut self.send,
            registry: &mut self.registry,
        }
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.registry
    }

    pub fn socket(&self) -> &UnixStream {
        &self.socket
    }

    /// Flush queued requests without reading events.
    ///
    /// Returns the number of messages dispatched to the peer. A no-op
    /// when nothing is queued; attached descriptors travel only with
    /// message bytes (see [`SendBuffer::attach_fd`]).
    pub fn flush_pending(&mut self) -> Result<usize> {
        self.send.flush(&self.socket)
    }

    /// Block for one `recv` and dispatch every framed message in it.
    ///
    /// Messages are dispatched strictly in arrival order. Events for
    /// objects the client no longer knows are logged and skipped — the
    /// peer may still reference an object destroyed locally, which is a
    /// benign race.
    pub fn read_events(&mut self) -> Result<()> {
        if self.recv.refill(&self.socket)? == 0 {
            return Err(WaylinkError::ConnectionClosed);
        }

        while let Some(msg) = self.recv.next_message()? {
            let (object_id, opcode) = (msg.object_id, msg.opcode);

            if object_id == NULL_OBJECT_ID {
                return Err(WaylinkError::Protocol(
                    "event addressed to the null object".into(),
                ));
            }

            if object_id == DISPLAY_OBJECT_ID && opcode == DISPLAY_EV_ERROR {
                let mut reader = msg.reader();
                let bad_object = reader.read_object()?;
                let code = reader.read_uint()?;
                let text = reader.read_string()?;
                tracing::error!(
                    object_id = bad_object,
                    code,
                    "fatal error from peer: {text}"
                );
                return Err(WaylinkError::Remote {
                    object_id: bad_object,
                    code,
                    message: text.to_string(),
                });
            }

            if object_id == DISPLAY_OBJECT_ID && opcode == DISPLAY_EV_DELETE_ID {
                let mut reader = msg.reader();
                let id = reader.read_uint()?;
                tracing::debug!(id, "peer released object ID");
                if self.registry.is_allocated(id) {
                    self.registry.release_id(id);
                }
                self.registry.unbind(id);
                continue;
            }

            let Some(object) = self.registry.lookup(object_id) else {
                tracing::warn!(object_id, opcode, "event for non-existent object, skipping");
                continue;
            };

            let mut ctx = Context {
                send: &mut self.send,
                registry: &mut self.registry,
            };
            object
                .borrow_mut()
                .handle_event(&mut ctx, opcode, msg.reader())?;
        }

        Ok(())
    }

    /// One full protocol turnaround: flush queued requests, then block
    /// for the peer's events and dispatch them.
    pub fn roundtrip(&mut self) -> Result<()> {
        self.flush_pending()?;
        self.read_events()
    }
}

/// Request-building access handed to event handlers and consumers.
///
/// Carries disjoint borrows of the send buffer and the registry, so an
/// object can issue requests and bind newly created objects while the
/// receive arena is being dispatched.
pub struct Context<'c> {
    send: &'c mut SendBuffer,
    registry: &'c mut ObjectRegistry,
}

impl<'c> Context<'c> {
    /// Pair a send buffer with an object registry.
    ///
    /// [`Connection::ctx`] is the usual entry point; constructing a
    /// context directly is useful for driving protocol objects against
    /// standalone buffers.
    pub fn new(send: &'c mut SendBuffer, registry: &'c mut ObjectRegistry) -> Self {
        Self { send, registry }
    }

    /// Claim a fresh object ID.
    pub fn allocate_id(&mut self) -> Result<u32> {
        self.registry.allocate_id()
    }

    /// Bind an object handle to an ID.
    pub fn bind(&mut self, id: u32, object: ObjectHandle) {
        self.registry.bind(id, object);
    }

    /// Start a request whose payload occupies `words` 4-byte words.
    ///
    /// The returned writer is positioned past the pre-filled header.
    pub fn writer(&mut self, object_id: u32, opcode: u16, words: u16) -> Result<Writer<'_>> {
        Request::with_words(object_id, opcode, words).writer(self.send)
    }

    /// Queue a descriptor to travel with the next flush.
    pub fn attach_fd(&mut self, fd: RawFd) {
        self.send.attach_fd(fd);
    }

    pub fn registry(&mut self) -> &mut ObjectRegistry {
        self.registry
    }

    pub fn send_buffer(&mut self) -> &mut SendBuffer {
        self.send
    }
}
