use crate::addr::Endpoint;
use crate::error::{Result, SocketError};
use crate::sys;
use super::Socket;

impl Socket {
	/// Marks a bound stream socket as ready to accept, with the system's
	/// maximum backlog.
	pub fn listen(&self) -> Result<()> {
		self.listen_with_backlog(sys::DEFAULT_BACKLOG)
	}

	/// Like `listen`, with an explicit pending-connection queue size.
	///
	/// Fails if the OS refuses, e.g. on a UDP socket.
	pub fn listen_with_backlog(&self, backlog: i32) -> Result<()> {
		sys::listen(self.raw(), backlog)?;
		tracing::debug!(fd = ?self.raw(), backlog, "listening");
		Ok(())
	}

	/// Waits for the next incoming connection.
	///
	/// Returns a new socket that owns the accepted descriptor, with this
	/// socket's family and protocol, paired with the peer's endpoint.
	/// Blocks unless non-blocking mode is on, in which case an empty queue
	/// fails with `WouldBlock`.
	pub fn accept(&self) -> Result<(Socket, Endpoint)> {
		let (fd, addr) = sys::accept(self.raw())?;
		// Owned before decoding the peer, so an error below still closes it.
		let client = Socket::from_descriptor(fd, self.version, self.protocol);
		let peer = addr
			.to_endpoint()
			.ok_or_else(|| SocketError::invalid_argument("accept", "unsupported peer address family"))?;
		tracing::debug!(fd = ?self.raw(), client = ?client.raw(), %peer, "accepted");
		Ok((client, peer))
	}
}
