//! Object identity: ID allocation and the ID → object map.
//!
//! Protocol object IDs form a numbering space shared with the peer.
//! `0` is the null object, `1` the root connection object, and
//! `2..=0xFEFFFFFF` the client-allocated pool. An ID is live from
//! allocation until explicit release; released IDs are reused (the
//! allocator always hands out the lowest free ID).
//!
//! Allocation and binding are deliberately separate operations: an ID
//! exists in the window between requesting it and constructing the
//! object that will own it, and the peer's delete notification arrives
//! independently of local release timing.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::connection::Context;
use crate::error::{Result, WaylinkError};
use crate::message::Reader;

/// Reserved ID addressing no object.
pub const NULL_OBJECT_ID: u32 = 0;
/// Reserved ID of the root connection object.
pub const DISPLAY_OBJECT_ID: u32 = 1;
/// Lowest ID the client allocator hands out.
pub const NEW_ID_MIN: u32 = 2;
/// Exclusive upper bound of the client-allocated ID range.
pub const NEW_ID_MAX: u32 = 0xFEFF_FFFF;

/// A protocol object that can receive inbound events.
///
/// Implementations decode the payload through the reader and must not
/// retain it past the call — the backing bytes are invalidated by the
/// next receive. The context allows issuing requests and binding new
/// objects from inside a handler.
pub trait Dispatch {
    /// The object's wire ID, stable for its lifetime.
    fn object_id(&self) -> u32;

    /// Decode and react to one inbound event.
    fn handle_event(&mut self, ctx: &mut Context<'_>, opcode: u16, reader: Reader<'_>)
        -> Result<()>;
}

/// Shared handle to a dispatchable object.
///
/// Both the registry and application code hold references; the object
/// is dropped with its last handle.
pub type ObjectHandle = Rc<RefCell<dyn Dispatch>>;

/// Allocates object IDs and maps live IDs to dispatchable objects.
///
/// The allocated-ID set and the handler map are coordinated but
/// separate: `allocate_id`/`release_id` manage ID ownership,
/// `bind`/`unbind` manage handler presence.
#[derive(Default)]
pub struct ObjectRegistry {
    ids: BTreeSet<u32>,
    objects: HashMap<u32, ObjectHandle>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the lowest free ID in the dynamic pool.
    ///
    /// Linear scan over the live set — live ID counts are tiny relative
    /// to the 32-bit space, so this never matters in practice.
    pub fn allocate_id(&mut self) -> Result<u32> {
        let mut candidate = NEW_ID_MIN;
        for &held in &self.ids {
            if held > candidate {
                break;
            }
            if held == candidate {
                candidate += 1;
            }
        }

        if candidate >= NEW_ID_MAX {
            return Err(WaylinkError::IdSpaceExhausted);
        }

        self.ids.insert(candidate);
        Ok(candidate)
    }

    /// Return an ID to the pool.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not currently allocated — a double release is
    /// a programming defect, not a runtime condition.
    pub fn release_id(&mut self, id: u32) {
        assert!(
            self.ids.remove(&id),
            "released object ID {id} that was never allocated"
        );
    }

    /// Whether `id` is currently held by the allocator.
    pub fn is_allocated(&self, id: u32) -> bool {
        self.ids.contains(&id)
    }

    /// Associate `id` with an object, replacing any prior association.
    pub fn bind(&mut self, id: u32, object: ObjectHandle) {
        self.objects.insert(id, object);
    }

    /// Look up the object bound to `id`.
    pub fn lookup(&self, id: u32) -> Option<ObjectHandle> {
        self.objects.get(&id).cloned()
    }

    /// Drop the ID → object association.
    ///
    /// Does not release the ID; the peer signals deletion independently
    /// of local unbinding.
    pub fn unbind(&mut self, id: u32) {
        self.objects.remove(&id);
    }

    /// Number of currently bound objects.
    pub fn bound_objects(&self) -> usize {
        self.objects.len()
    }
}
