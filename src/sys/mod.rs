//! Platform layer.
//!
//! Each backend exposes the same crate-private surface: descriptor
//! ownership, the one-time bootstrap, the error-code table, sockaddr
//! encoding and thin syscall wrappers. The backend is picked at build time.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub(crate) use self::unix::*;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub(crate) use self::windows::*;
