//! Protocol object types built atop the core transport.
//!
//! Each type here is a consumer of the core: it encodes its requests
//! through [`Context`](crate::connection::Context) writers and decodes
//! its events in a [`Dispatch`](crate::identity::Dispatch)
//! implementation. Only the bootstrap interfaces are covered — root
//! object requests, global enumeration, sync fencing, and shared
//! memory (the one interface that exercises descriptor passing).

pub mod callback;
pub mod display;
pub mod registry;
pub mod shm;

pub use callback::Callback;
pub use display::DisplayError;
pub use registry::{Global, Registry};
pub use shm::{Shm, ShmFormat, ShmPool};
