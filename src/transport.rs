//! Socket resolution and connection establishment.
//!
//! The compositor listens on a `SOCK_STREAM` Unix socket inside the
//! user's runtime directory. The path is assembled from two environment
//! variables: `XDG_RUNTIME_DIR` (mandatory, no fallback) and
//! `WAYLAND_DISPLAY` (defaults to `wayland-0`).

use std::env;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use crate::error::{Result, WaylinkError};

const RUNTIME_DIR_VAR: &str = "XDG_RUNTIME_DIR";
const DISPLAY_VAR: &str = "WAYLAND_DISPLAY";
const DEFAULT_DISPLAY: &str = "wayland-0";

/// Resolve the compositor socket path from the environment.
///
/// Fails if `XDG_RUNTIME_DIR` is unset — there is no portable guess
/// for the runtime directory.
pub fn socket_path() -> Result<PathBuf> {
    let runtime_dir =
        env::var_os(RUNTIME_DIR_VAR).ok_or(WaylinkError::MissingEnv(RUNTIME_DIR_VAR))?;
    let display = env::var_os(DISPLAY_VAR).unwrap_or_else(|| DEFAULT_DISPLAY.into());
    Ok(PathBuf::from(runtime_dir).join(display))
}

/// Connect a blocking stream socket to the compositor.
pub fn connect() -> Result<UnixStream> {
    let path = socket_path()?;
    tracing::debug!(path = %path.display(), "connecting to compositor socket");
    Ok(UnixStream::connect(&path)?)
}
