//! Requests on the root connection object (ID 1).

use std::cell::RefCell;
use std::rc::Rc;

use crate::connection::Context;
use crate::error::Result;
use crate::identity::DISPLAY_OBJECT_ID;
use crate::proto::callback::Callback;
use crate::proto::registry::Registry;

pub const SYNC_OPCODE: u16 = 0;
pub const GET_REGISTRY_OPCODE: u16 = 1;

/// Error codes the peer may attach to a fatal error event on the root
/// object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DisplayError {
    InvalidObject = 0,
    InvalidMethod = 1,
    NoMemory = 2,
    Implementation = 3,
}

impl DisplayError {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::InvalidObject),
            1 => Some(Self::InvalidMethod),
            2 => Some(Self::NoMemory),
            3 => Some(Self::Implementation),
            _ => None,
        }
    }
}

/// Ask the peer for its global registry.
///
/// Allocates the registry's ID, queues the request, and binds a fresh
/// [`Registry`] so the subsequent `global` events land in it.
pub fn get_registry(ctx: &mut Context<'_>) -> Result<Rc<RefCell<Registry>>> {
    let id = ctx.allocate_id()?;
    {
        let mut w = ctx.writer(DISPLAY_OBJECT_ID, GET_REGISTRY_OPCODE, 1)?;
        w.write_uint(id)?;
    }

    let registry = Rc::new(RefCell::new(Registry::new(id)));
    ctx.bind(id, registry.clone());
    Ok(registry)
}

/// Queue a `sync` fence.
///
/// The returned [`Callback`] records the peer's `done` serial once all
/// requests queued before the fence have been processed.
pub fn sync(ctx: &mut Context<'_>) -> Result<Rc<RefCell<Callback>>> {
    let id = ctx.allocate_id()?;
    {
        let mut w = ctx.writer(DISPLAY_OBJECT_ID, SYNC_OPCODE, 1)?;
        w.write_uint(id)?;
    }

    let callback = Rc::new(RefCell::new(Callback::new(id)));
    ctx.bind(id, callback.clone());
    Ok(callback)
}
