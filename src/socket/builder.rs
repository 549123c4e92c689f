use crate::addr::{Endpoint, IpVersion};
use crate::error::Result;
use super::{Protocol, Socket};

// ============================================================================
// Options
// ============================================================================

/// Options applied to a socket right after it is created.
///
/// `None` leaves the OS default untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SocketOptions {
	pub nonblocking: bool,
	pub broadcast: Option<bool>,
	pub tcp_nodelay: Option<bool>,
	pub reuse_address: Option<bool>,
	/// Listen queue size. `None` uses the system maximum.
	pub backlog: Option<i32>,
}

impl SocketOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Applies the options that make sense for the socket's protocol.
	///
	/// Broadcast is a datagram option and no-delay a stream option; each is
	/// skipped on the other protocol instead of being handed to the OS.
	fn apply(&self, socket: &Socket) -> Result<()> {
		if let Some(enable) = self.reuse_address {
			socket.set_reuse_address(enable)?;
		}
		match socket.protocol() {
			Protocol::Tcp => {
				if let Some(enable) = self.tcp_nodelay {
					socket.set_tcp_nodelay(enable)?;
				}
			}
			Protocol::Udp => {
				if let Some(enable) = self.broadcast {
					socket.set_broadcast(enable)?;
				}
			}
		}
		if self.nonblocking {
			socket.set_nonblocking(true)?;
		}
		Ok(())
	}
}

// ============================================================================
// Socket Builder
// ============================================================================

/// Builder for configured sockets.
///
/// # Example
/// ```no_run
/// use netlane::{Endpoint, IpVersion, Ipv4Address, Protocol, SocketBuilder};
///
/// let mut endpoint = Endpoint::new(Ipv4Address::localhost(), 0);
/// let listener = SocketBuilder::new(IpVersion::V4, Protocol::Tcp)
///     .reuse_address(true)
///     .tcp_nodelay(true)
///     .backlog(64)
///     .listen(&mut endpoint)?;
/// println!("listening on {endpoint}");
/// # Ok::<(), netlane::SocketError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SocketBuilder {
	version: IpVersion,
	protocol: Protocol,
	options: SocketOptions,
}

impl SocketBuilder {
	pub fn new(version: IpVersion, protocol: Protocol) -> Self {
		Self {
			version,
			protocol,
			options: SocketOptions::default(),
		}
	}

	/// Replaces all options at once.
	pub fn options(mut self, options: SocketOptions) -> Self {
		self.options = options;
		self
	}

	pub fn nonblocking(mut self, enable: bool) -> Self {
		self.options.nonblocking = enable;
		self
	}

	/// Ignored for TCP.
	pub fn broadcast(mut self, enable: bool) -> Self {
		self.options.broadcast = Some(enable);
		self
	}

	/// Ignored for UDP.
	pub fn tcp_nodelay(mut self, enable: bool) -> Self {
		self.options.tcp_nodelay = Some(enable);
		self
	}

	pub fn reuse_address(mut self, enable: bool) -> Self {
		self.options.reuse_address = Some(enable);
		self
	}

	pub fn backlog(mut self, backlog: i32) -> Self {
		self.options.backlog = Some(backlog);
		self
	}

	/// Creates the socket and applies the options.
	pub fn build(self) -> Result<Socket> {
		let socket = Socket::new(self.version, self.protocol)?;
		self.options.apply(&socket)?;
		Ok(socket)
	}

	/// Builds, then binds. `endpoint` receives the OS-assigned address.
	pub fn bind(self, endpoint: &mut Endpoint) -> Result<Socket> {
		let socket = self.build()?;
		socket.bind(endpoint)?;
		Ok(socket)
	}

	/// Builds, binds and starts listening.
	pub fn listen(self, endpoint: &mut Endpoint) -> Result<Socket> {
		let socket = self.bind(endpoint)?;
		match self.options.backlog {
			Some(backlog) => socket.listen_with_backlog(backlog)?,
			None => socket.listen()?,
		}
		Ok(socket)
	}

	/// Builds and connects.
	///
	/// With `nonblocking(true)` the connect itself is non-blocking and will
	/// usually fail with `WouldBlock`; set the mode on the returned socket
	/// instead if the connect should complete first.
	pub fn connect(self, endpoint: &Endpoint) -> Result<Socket> {
		let socket = self.build()?;
		socket.connect(endpoint)?;
		Ok(socket)
	}
}
