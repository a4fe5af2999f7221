//! Global registry: the peer's advertised capability list.
//!
//! Distinct from the object identity registry: this is a protocol
//! object that enumerates the server's *globals* (compositor, shared
//! memory, seats, outputs) and binds them one by one into client-side
//! object IDs.

use crate::connection::Context;
use crate::error::Result;
use crate::identity::Dispatch;
use crate::message::Reader;
use crate::wire::string::WlString;

pub const BIND_OPCODE: u16 = 0;

pub const EV_GLOBAL_OPCODE: u16 = 0;
pub const EV_GLOBAL_REMOVE_OPCODE: u16 = 1;

/// One advertised global: a server-scoped numeric name, the interface
/// it implements, and the highest version the server supports.
#[derive(Debug, Clone)]
pub struct Global {
    pub name: u32,
    pub interface: WlString,
    pub version: u32,
}

/// Client-side view of the peer's global list.
pub struct Registry {
    id: u32,
    globals: Vec<Global>,
}

impl Registry {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            globals: Vec::new(),
        }
    }

    /// All globals advertised so far, in announcement order.
    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    /// The first advertised global implementing `interface`.
    pub fn find(&self, interface: &str) -> Option<&Global> {
        self.globals.iter().find(|g| g.interface == *interface)
    }

    /// Bind `global` into a freshly allocated client-side ID.
    ///
    /// Queues the bind request and returns the new ID; the caller
    /// constructs the typed object for it and registers it for
    /// dispatch. `version` must not exceed the advertised one.
    pub fn bind(&self, ctx: &mut Context<'_>, global: &Global, version: u32) -> Result<u32> {
        let id = ctx.allocate_id()?;
        let words = 3 + global.interface.word_size() as u16 + 1;

        let mut w = ctx.writer(self.id, BIND_OPCODE, words)?;
        w.write_uint(global.name)?;
        w.write_string(&global.interface)?;
        w.write_uint(version)?;
        w.write_uint(id)?;

        tracing::debug!(
            name = global.name,
            interface = %global.interface,
            version,
            id,
            "bound global"
        );
        Ok(id)
    }
}

impl Dispatch for Registry {
    fn object_id(&self) -> u32 {
        self.id
    }

    fn handle_event(
        &mut self,
        _ctx: &mut Context<'_>,
        opcode: u16,
        mut reader: Reader<'_>,
    ) -> Result<()> {
        match opcode {
            EV_GLOBAL_OPCODE => {
                let name = reader.read_uint()?;
                let interface = reader.read_string()?;
                let version = reader.read_uint()?;
                tracing::debug!(name, %interface, version, "global advertised");
                self.globals.push(Global {
                    name,
                    interface,
                    version,
                });
            }
            EV_GLOBAL_REMOVE_OPCODE => {
                let name = reader.read_uint()?;
                tracing::debug!(name, "global removed");
                self.globals.retain(|g| g.name != name);
            }
            _ => {
                tracing::warn!(object_id = self.id, opcode, "unknown registry event");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::SendBuffer;
    use crate::identity::ObjectRegistry;
    use crate::message::Message;
    use crate::wire::primitives::{encode_uint, WORD_SIZE};

    fn global_event_payload(name: u32, interface: &str, version: u32) -> Vec<u8> {
        let s = WlString::from(interface);
        let mut out = vec![0u8; WORD_SIZE + s.serialised_size() as usize + WORD_SIZE];
        encode_uint(name, &mut out);
        encode_uint(s.size(), &mut out[WORD_SIZE..]);
        out[2 * WORD_SIZE..2 * WORD_SIZE + s.as_bytes().len()].copy_from_slice(s.as_bytes());
        let version_at = WORD_SIZE + s.serialised_size() as usize;
        encode_uint(version, &mut out[version_at..]);
        out
    }

    fn deliver(registry: &mut Registry, opcode: u16, payload: &[u8]) {
        let mut send = SendBuffer::new();
        let mut objects = ObjectRegistry::new();
        let mut ctx = Context::new(&mut send, &mut objects);
        registry
            .handle_event(&mut ctx, opcode, Reader::new(payload))
            .unwrap();
    }

    #[test]
    fn test_global_events_accumulate() {
        let mut registry = Registry::new(2);
        deliver(
            &mut registry,
            EV_GLOBAL_OPCODE,
            &global_event_payload(1, "wl_compositor", 6),
        );
        deliver(
            &mut registry,
            EV_GLOBAL_OPCODE,
            &global_event_payload(4, "wl_shm", 1),
        );

        assert_eq!(registry.globals().len(), 2);
        let shm = registry.find("wl_shm").expect("advertised");
        assert_eq!(shm.name, 4);
        assert_eq!(shm.version, 1);
        assert!(registry.find("wl_seat").is_none());
    }

    #[test]
    fn test_global_remove_drops_by_name() {
        let mut registry = Registry::new(2);
        deliver(
            &mut registry,
            EV_GLOBAL_OPCODE,
            &global_event_payload(7, "wl_output", 3),
        );

        let mut name = [0u8; 4];
        encode_uint(7, &mut name);
        deliver(&mut registry, EV_GLOBAL_REMOVE_OPCODE, &name);
        assert!(registry.find("wl_output").is_none());
    }

    #[test]
    fn test_bind_request_layout() {
        let registry = Registry::new(2);
        let global = Global {
            name: 4,
            interface: WlString::from("wl_shm"),
            version: 1,
        };

        let mut send = SendBuffer::new();
        let mut objects = ObjectRegistry::new();
        let mut ctx = Context::new(&mut send, &mut objects);
        let id = registry.bind(&mut ctx, &global, 1).unwrap();

        let msg = Message::parse(send.queued_bytes()).unwrap();
        assert_eq!(msg.object_id, 2);
        assert_eq!(msg.opcode, BIND_OPCODE);

        let mut reader = msg.reader();
        assert_eq!(reader.read_uint().unwrap(), 4);
        assert_eq!(reader.read_string().unwrap(), "wl_shm");
        assert_eq!(reader.read_uint().unwrap(), 1);
        assert_eq!(reader.read_uint().unwrap(), id);
        assert_eq!(reader.remaining(), 0);
    }
}
