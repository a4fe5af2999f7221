//! One-shot completion callback, the far end of a `sync` fence.

use crate::connection::Context;
use crate::error::Result;
use crate::identity::Dispatch;
use crate::message::Reader;

pub const EV_DONE_OPCODE: u16 = 0;

/// Records the peer's `done(serial)` event.
///
/// The peer fires it exactly once and then deletes the object's ID, so
/// a callback is spent after one round-trip.
pub struct Callback {
    id: u32,
    done: Option<u32>,
}

impl Callback {
    pub fn new(id: u32) -> Self {
        Self { id, done: None }
    }

    /// The serial from the `done` event, once it has arrived.
    pub fn done_serial(&self) -> Option<u32> {
        self.done
    }

    pub fn is_done(&self) -> bool {
        self.done.is_some()
    }
}

impl Dispatch for Callback {
    fn object_id(&self) -> u32 {
        self.id
    }

    fn handle_event(
        &mut self,
        _ctx: &mut Context<'_>,
        opcode: u16,
        mut reader: Reader<'_>,
    ) -> Result<()> {
        if opcode != EV_DONE_OPCODE {
            tracing::warn!(object_id = self.id, opcode, "unknown callback event");
            return Ok(());
        }

        self.done = Some(reader.read_uint()?);
        Ok(())
    }
}
