//! Shared memory interfaces: the descriptor-passing consumers.
//!
//! `wl_shm.create_pool` is the request that exercises ancillary
//! descriptor transfer: the pool's backing memfd travels as
//! `SCM_RIGHTS` alongside the serialized request in the same flush.

use std::cell::RefCell;
use std::os::fd::RawFd;
use std::rc::Rc;

use crate::connection::Context;
use crate::error::Result;
use crate::identity::Dispatch;
use crate::message::Reader;

pub const CREATE_POOL_OPCODE: u16 = 0;
pub const EV_FORMAT_OPCODE: u16 = 0;

pub const POOL_CREATE_BUFFER_OPCODE: u16 = 0;
pub const POOL_DESTROY_OPCODE: u16 = 1;
pub const POOL_RESIZE_OPCODE: u16 = 2;

/// Pixel formats every server is required to support.
///
/// Servers may advertise many more; unrecognized codes are kept as raw
/// values rather than dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ShmFormat {
    Argb8888 = 0,
    Xrgb8888 = 1,
}

impl ShmFormat {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Argb8888),
            1 => Some(Self::Xrgb8888),
            _ => None,
        }
    }
}

/// Client-side `wl_shm` global: collects advertised pixel formats and
/// creates shared-memory pools.
pub struct Shm {
    id: u32,
    formats: Vec<u32>,
}

impl Shm {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            formats: Vec::new(),
        }
    }

    /// Raw format codes advertised so far.
    pub fn formats(&self) -> &[u32] {
        &self.formats
    }

    pub fn supports(&self, format: ShmFormat) -> bool {
        self.formats.contains(&(format as u32))
    }

    /// Create a pool backed by `size` bytes of the memory behind `fd`.
    ///
    /// The descriptor is queued for the next flush's ancillary data;
    /// the caller keeps ownership of the local copy and may close it
    /// after a successful flush.
    pub fn create_pool(
        &self,
        ctx: &mut Context<'_>,
        fd: RawFd,
        size: i32,
    ) -> Result<Rc<RefCell<ShmPool>>> {
        let id = ctx.allocate_id()?;
        {
            let mut w = ctx.writer(self.id, CREATE_POOL_OPCODE, 2)?;
            w.write_uint(id)?;
            w.write_int(size)?;
        }
        ctx.attach_fd(fd);

        let pool = Rc::new(RefCell::new(ShmPool::new(id)));
        ctx.bind(id, pool.clone());
        Ok(pool)
    }
}

impl Dispatch for Shm {
    fn object_id(&self) -> u32 {
        self.id
    }

    fn handle_event(
        &mut self,
        _ctx: &mut Context<'_>,
        opcode: u16,
        mut reader: Reader<'_>,
    ) -> Result<()> {
        if opcode != EV_FORMAT_OPCODE {
            tracing::warn!(object_id = self.id, opcode, "unknown shm event");
            return Ok(());
        }

        let format = reader.read_uint()?;
        tracing::debug!(format, "pixel format advertised");
        self.formats.push(format);
        Ok(())
    }
}

/// A bound shared-memory pool. Sends requests only; the interface has
/// no events.
pub struct ShmPool {
    id: u32,
}

impl ShmPool {
    pub fn new(id: u32) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Carve a buffer out of the pool. Returns the buffer's new ID.
    pub fn create_buffer(
        &self,
        ctx: &mut Context<'_>,
        offset: i32,
        width: i32,
        height: i32,
        stride: i32,
        format: ShmFormat,
    ) -> Result<u32> {
        let id = ctx.allocate_id()?;
        let mut w = ctx.writer(self.id, POOL_CREATE_BUFFER_OPCODE, 6)?;
        w.write_uint(id)?;
        w.write_int(offset)?;
        w.write_int(width)?;
        w.write_int(height)?;
        w.write_int(stride)?;
        w.write_uint(format as u32)?;
        Ok(id)
    }

    /// Grow the pool's backing mapping to `bytes`.
    ///
    /// The protocol only permits growth; keeping the backing file at
    /// the right size is the caller's job.
    pub fn resize(&self, ctx: &mut Context<'_>, bytes: i32) -> Result<()> {
        let mut w = ctx.writer(self.id, POOL_RESIZE_OPCODE, 1)?;
        w.write_int(bytes)?;
        Ok(())
    }

    /// Destroy the server-side pool object.
    pub fn destroy(&self, ctx: &mut Context<'_>) -> Result<()> {
        ctx.writer(self.id, POOL_DESTROY_OPCODE, 0)?;
        Ok(())
    }
}

impl Dispatch for ShmPool {
    fn object_id(&self) -> u32 {
        self.id
    }

    fn handle_event(
        &mut self,
        _ctx: &mut Context<'_>,
        opcode: u16,
        _reader: Reader<'_>,
    ) -> Result<()> {
        tracing::warn!(object_id = self.id, opcode, "unexpected shm_pool event");
        Ok(())
    }
}
