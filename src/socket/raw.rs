use crate::addr::{Endpoint, IpVersion};
use crate::error::{Result, SocketError};
use crate::sys;
use super::{Protocol, Socket};

impl Socket {
	/// Creates a fresh, unbound socket.
	///
	/// Brings up the platform networking layer on first use (WinSock needs
	/// it; unix does not). On failure no handle exists, so nothing leaks.
	pub fn new(version: IpVersion, protocol: Protocol) -> Result<Self> {
		sys::init()?;
		let fd = sys::socket(version, protocol)?;
		let socket = Self::from_descriptor(fd, version, protocol);
		tracing::debug!(fd = ?socket.raw(), %version, ?protocol, "socket created");
		Ok(socket)
	}

	/// Binds to `endpoint`, then overwrites it with the address the OS chose.
	///
	/// Bind to port 0 or the wildcard address and read `endpoint` afterwards
	/// to learn the concrete port/address.
	///
	/// An endpoint of the other family fails with `InvalidArgument` before
	/// any OS call.
	pub fn bind(&self, endpoint: &mut Endpoint) -> Result<()> {
		self.check_family(endpoint, "bind")?;
		sys::bind(self.raw(), &sys::SockAddr::from_endpoint(endpoint))?;
		*endpoint = self.local_endpoint()?;
		tracing::debug!(fd = ?self.raw(), %endpoint, "bound");
		Ok(())
	}

	/// Connects a stream socket, or sets the default peer of a datagram
	/// socket so `send`/`receive` can be used.
	///
	/// Same family check as `bind`. In non-blocking mode a connection still
	/// in progress fails with `WouldBlock`.
	pub fn connect(&self, endpoint: &Endpoint) -> Result<()> {
		self.check_family(endpoint, "connect")?;
		sys::connect(self.raw(), &sys::SockAddr::from_endpoint(endpoint))?;
		tracing::debug!(fd = ?self.raw(), %endpoint, "connected");
		Ok(())
	}

	/// Returns the local address the socket is bound to.
	pub fn local_endpoint(&self) -> Result<Endpoint> {
		sys::local_addr(self.raw())?
			.to_endpoint()
			.ok_or_else(|| SocketError::invalid_argument("getsockname", "unsupported address family"))
	}
}
