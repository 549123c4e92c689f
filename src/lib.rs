//! Portable blocking/non-blocking sockets over the host's berkeley-socket API.
//!
//! IPv4 and IPv6 addresses, endpoints, TCP and UDP sockets, and one error
//! taxonomy for every platform. Each call goes straight to the OS and hands
//! back byte counts and errors; retry policy belongs to the caller.

pub mod socket;
mod addr;
mod error;
mod sys;

pub use self::addr::{Endpoint, IpAddress, IpVersion, Ipv4Address, Ipv6Address};
pub use self::error::{ErrorKind, Result, SocketError};
pub use self::socket::{Protocol, Shutdown, Socket, SocketBuilder, SocketOptions};
