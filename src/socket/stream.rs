use crate::addr::Endpoint;
use crate::error::{Result, SocketError};
use crate::sys;
use super::Socket;

/// Which direction(s) of a connection to shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
	Read,
	Write,
	ReadWrite,
}

impl Socket {
	/// Sends bytes on a connected socket.
	///
	/// Returns how many bytes the OS took, which may be fewer than
	/// `buf.len()`. Loop to send the rest.
	pub fn send(&self, buf: &[u8]) -> Result<usize> {
		let n = sys::send(self.raw(), buf)?;
		tracing::trace!(fd = ?self.raw(), requested = buf.len(), sent = n, "send");
		Ok(n)
	}

	/// Receives bytes from a connected socket.
	///
	/// `Ok(0)` on a stream socket means the peer closed the connection in
	/// order; it is not an error. A non-empty result may be shorter than
	/// `buf`.
	pub fn receive(&self, buf: &mut [u8]) -> Result<usize> {
		let n = sys::recv(self.raw(), buf)?;
		tracing::trace!(fd = ?self.raw(), capacity = buf.len(), received = n, "receive");
		Ok(n)
	}

	/// Returns the endpoint of the connected peer.
	pub fn peer_endpoint(&self) -> Result<Endpoint> {
		sys::peer_addr(self.raw())?
			.to_endpoint()
			.ok_or_else(|| SocketError::invalid_argument("getpeername", "unsupported address family"))
	}

	pub fn shutdown(&self, how: Shutdown) -> Result<()> {
		sys::shutdown(self.raw(), how)
	}
}

impl std::io::Read for Socket {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		Ok(self.receive(buf)?)
	}
}

impl std::io::Write for Socket {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		Ok(self.send(buf)?)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}

impl std::io::Read for &Socket {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		Ok(self.receive(buf)?)
	}
}

impl std::io::Write for &Socket {
	fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
		Ok(self.send(buf)?)
	}

	fn flush(&mut self) -> std::io::Result<()> {
		Ok(())
	}
}
