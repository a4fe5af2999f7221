//! # waylink
//!
//! Client-side transport for the Wayland wire protocol.
//!
//! This crate implements the framing codec, buffering, descriptor
//! passing, and object dispatch a Wayland client needs to talk to a
//! compositor over its `AF_UNIX` socket. It is deliberately synchronous
//! and single-threaded: one blocking round-trip per iteration, the way
//! the protocol's request/event model expects.
//!
//! ## Architecture
//!
//! - **Wire layer**: scalar codecs, 4-byte word alignment, the packed
//!   `(size << 16) | opcode` header word, length-prefixed strings
//! - **Buffers**: fixed 4096-byte receive and send arenas; descriptors
//!   travel as `SCM_RIGHTS` ancillary data with the flush
//! - **Identity**: object ID allocation and the ID → object map
//! - **Dispatch**: flush pending requests, block on one `recv`, route
//!   each framed event to its object
//!
//! ## Example
//!
//! ```ignore
//! use waylink::{proto, Connection};
//!
//! fn main() -> waylink::Result<()> {
//!     let mut conn = Connection::connect()?;
//!     let registry = proto::display::get_registry(&mut conn.ctx())?;
//!     conn.roundtrip()?;
//!
//!     for global in registry.borrow().globals() {
//!         println!("{} v{}", global.interface, global.version);
//!     }
//!     Ok(())
//! }
//! ```

pub mod buffers;
pub mod connection;
pub mod error;
pub mod identity;
pub mod message;
pub mod proto;
pub mod transport;
pub mod wire;

pub use connection::{Connection, Context};
pub use error::{Result, WaylinkError};
pub use identity::{Dispatch, ObjectHandle, ObjectRegistry};
pub use message::{Message, Reader, Request, Writer};
