mod builder;
mod datagram;
mod listener;
mod options;
mod raw;
mod stream;

pub use self::builder::{SocketBuilder, SocketOptions};
pub use self::stream::Shutdown;
pub(crate) use self::options::SocketOption;

use crate::addr::{Endpoint, IpVersion};
use crate::error::{Result, SocketError};
use crate::sys;

/// Transport protocol of a socket.
///
/// - `Tcp` — connection-oriented byte stream (`SOCK_STREAM`)
/// - `Udp` — connectionless datagrams (`SOCK_DGRAM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
	Udp,
	Tcp,
}

/// One OS socket.
///
/// Owns its descriptor exclusively: moving the handle moves ownership, and
/// dropping it closes the descriptor exactly once. The address family and
/// protocol are fixed at creation.
///
/// Lifecycle for TCP: `new` → `bind` → `listen` → `accept` (repeatable), or
/// `new` → `connect`. UDP sockets `bind` and then use `send_to` /
/// `receive_from` directly.
///
/// Every method is a direct call into the OS. Nothing is retried; in
/// non-blocking mode a call that would block fails with
/// `ErrorKind::WouldBlock` and the caller decides what to do.
///
/// A `Socket` is not synchronized. Share it across threads only behind
/// external locking.
#[derive(Debug)]
pub struct Socket {
	fd: sys::Descriptor,
	version: IpVersion,
	protocol: Protocol,
}

impl Socket {
	/// Wraps a descriptor the OS handed back from `accept`.
	pub(crate) fn from_descriptor(fd: sys::Descriptor, version: IpVersion, protocol: Protocol) -> Self {
		Self { fd, version, protocol }
	}

	#[inline]
	pub(crate) fn raw(&self) -> sys::Raw {
		sys::as_raw(&self.fd)
	}

	pub fn version(&self) -> IpVersion {
		self.version
	}

	pub fn protocol(&self) -> Protocol {
		self.protocol
	}

	/// Rejects an endpoint whose family differs from the socket's.
	///
	/// Runs before any OS call, so a mismatch is always `InvalidArgument`.
	fn check_family(&self, endpoint: &Endpoint, op: &'static str) -> Result<()> {
		if endpoint.version() == self.version {
			Ok(())
		} else {
			Err(SocketError::invalid_argument(
				op,
				format!("{} endpoint {} on an {} socket", endpoint.version(), endpoint, self.version),
			))
		}
	}
}

/// Adopts a descriptor created elsewhere (`OwnedFd` on unix, `OwnedSocket`
/// on Windows).
///
/// The family comes from `getsockname` and the protocol from `SO_TYPE`.
/// Anything other than an IPv4/IPv6 stream or datagram socket fails with
/// `InvalidArgument`, and the descriptor is closed. WinSock only reports a
/// local address once the socket is bound.
impl TryFrom<sys::Descriptor> for Socket {
	type Error = SocketError;

	fn try_from(fd: sys::Descriptor) -> Result<Self> {
		let raw = sys::as_raw(&fd);
		sys::init()?;
		let version = sys::local_addr(raw)?
			.version()
			.ok_or_else(|| SocketError::invalid_argument("getsockname", "not an IPv4 or IPv6 socket"))?;
		let protocol = sys::socket_protocol(raw)?;
		tracing::debug!(fd = ?raw, %version, ?protocol, "socket adopted");
		Ok(Self::from_descriptor(fd, version, protocol))
	}
}

#[cfg(unix)]
impl std::os::fd::AsRawFd for Socket {
	fn as_raw_fd(&self) -> std::os::fd::RawFd {
		self.raw()
	}
}

#[cfg(unix)]
impl std::os::fd::AsFd for Socket {
	fn as_fd(&self) -> std::os::fd::BorrowedFd<'_> {
		std::os::fd::AsFd::as_fd(&self.fd)
	}
}

#[cfg(unix)]
impl std::os::fd::IntoRawFd for Socket {
	fn into_raw_fd(self) -> std::os::fd::RawFd {
		std::os::fd::IntoRawFd::into_raw_fd(self.fd)
	}
}

#[cfg(unix)]
impl From<Socket> for std::os::fd::OwnedFd {
	fn from(socket: Socket) -> Self {
		socket.fd
	}
}

#[cfg(windows)]
impl std::os::windows::io::AsRawSocket for Socket {
	fn as_raw_socket(&self) -> std::os::windows::io::RawSocket {
		std::os::windows::io::AsRawSocket::as_raw_socket(&self.fd)
	}
}

#[cfg(windows)]
impl std::os::windows::io::AsSocket for Socket {
	fn as_socket(&self) -> std::os::windows::io::BorrowedSocket<'_> {
		std::os::windows::io::AsSocket::as_socket(&self.fd)
	}
}

#[cfg(windows)]
impl std::os::windows::io::IntoRawSocket for Socket {
	fn into_raw_socket(self) -> std::os::windows::io::RawSocket {
		std::os::windows::io::IntoRawSocket::into_raw_socket(self.fd)
	}
}

#[cfg(windows)]
impl From<Socket> for std::os::windows::io::OwnedSocket {
	fn from(socket: Socket) -> Self {
		socket.fd
	}
}
