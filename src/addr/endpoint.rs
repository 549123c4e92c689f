use crate::addr::{IpAddress, IpVersion};

/// One side of a connection: address plus port (host byte order).
///
/// Pure value; building one never touches the OS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Endpoint {
	ip: IpAddress,
	port: u16,
}

impl Endpoint {
	pub fn new<I: Into<IpAddress>>(ip: I, port: u16) -> Self {
		Self { ip: ip.into(), port }
	}

	pub fn ip(&self) -> IpAddress {
		self.ip
	}

	pub fn port(&self) -> u16 {
		self.port
	}

	pub fn set_port(&mut self, port: u16) {
		self.port = port;
	}

	/// Family of the address; must match the socket it is used with.
	pub fn version(&self) -> IpVersion {
		self.ip.version()
	}
}

impl std::fmt::Display for Endpoint {
	/// `ip:port` for IPv4, `[ip]:port` for IPv6.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.ip {
			IpAddress::V4(ip) => write!(f, "{ip}:{}", self.port),
			IpAddress::V6(ip) => write!(f, "[{ip}]:{}", self.port),
		}
	}
}

impl From<std::net::SocketAddr> for Endpoint {
	fn from(addr: std::net::SocketAddr) -> Self {
		Self::new(addr.ip(), addr.port())
	}
}

impl From<Endpoint> for std::net::SocketAddr {
	fn from(endpoint: Endpoint) -> Self {
		std::net::SocketAddr::new(endpoint.ip.into(), endpoint.port)
	}
}
