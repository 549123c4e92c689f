use crate::error::Result;
use crate::sys;
use super::Socket;

/// Boolean socket options this crate toggles.
///
/// The platform backend maps each one to its `(level, name)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SocketOption {
	/// `SO_BROADCAST`
	Broadcast,
	/// `SO_REUSEADDR`
	ReuseAddress,
	/// `TCP_NODELAY`
	TcpNoDelay,
}

impl SocketOption {
	pub(crate) fn name(&self) -> &'static str {
		match self {
			SocketOption::Broadcast => "SO_BROADCAST",
			SocketOption::ReuseAddress => "SO_REUSEADDR",
			SocketOption::TcpNoDelay => "TCP_NODELAY",
		}
	}
}

impl Socket {
	/// `true` puts the socket in non-blocking mode: calls that would block
	/// (`accept`, `receive`, `connect`, ...) fail at once with
	/// `ErrorKind::WouldBlock`. `false` restores blocking mode.
	pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
		sys::set_nonblocking(self.raw(), nonblocking)?;
		tracing::debug!(fd = ?self.raw(), nonblocking, "blocking mode changed");
		Ok(())
	}

	/// Allows sending to the broadcast address.
	pub fn set_broadcast(&self, enable: bool) -> Result<()> {
		sys::set_option(self.raw(), SocketOption::Broadcast, enable)
	}

	pub fn broadcast(&self) -> Result<bool> {
		sys::option(self.raw(), SocketOption::Broadcast)
	}

	/// Disables Nagle's algorithm: small writes go out immediately instead
	/// of being coalesced. Stream sockets only; the OS rejects it on UDP.
	pub fn set_tcp_nodelay(&self, enable: bool) -> Result<()> {
		sys::set_option(self.raw(), SocketOption::TcpNoDelay, enable)
	}

	pub fn tcp_nodelay(&self) -> Result<bool> {
		sys::option(self.raw(), SocketOption::TcpNoDelay)
	}

	/// Allows binding an address still in TIME_WAIT. Must be set before
	/// `bind`.
	pub fn set_reuse_address(&self, enable: bool) -> Result<()> {
		sys::set_option(self.raw(), SocketOption::ReuseAddress, enable)
	}

	pub fn reuse_address(&self) -> Result<bool> {
		sys::option(self.raw(), SocketOption::ReuseAddress)
	}
}
