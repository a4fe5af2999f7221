//! Fixed-capacity receive and send arenas.
//!
//! Both buffers wrap a 4096-byte arena allocated once for the life of
//! the connection. The receive side fills from one `recv` per refill
//! and lends out message views; the send side bump-allocates outbound
//! messages and flushes them in one `send`/`sendmsg`, carrying any
//! queued file descriptors as `SCM_RIGHTS` ancillary data.

pub mod recv;
pub mod send;

pub use recv::RecvBuffer;
pub use send::SendBuffer;
