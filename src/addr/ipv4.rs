use crate::addr::{IpAddress, IpVersion};
use crate::error::{Result, SocketError};
use crate::sys;

/// IPv4 address, stored as a 32-bit integer in host byte order.
///
/// `Display` gives dotted-decimal text (e.g. `192.168.1.1`) and never fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv4Address {
	value: u32,
}

impl Ipv4Address {
	/// `0.0.0.0`, the wildcard address.
	pub const fn any() -> Self {
		Self::from_bits(0)
	}

	/// `127.0.0.1`
	pub const fn localhost() -> Self {
		Self::from_bits(0x7f00_0001)
	}

	/// `255.255.255.255`. Sending here needs `set_broadcast(true)`.
	pub const fn broadcast() -> Self {
		Self::from_bits(u32::MAX)
	}

	pub const fn from_bits(value: u32) -> Self {
		Self { value }
	}

	pub const fn to_bits(&self) -> u32 {
		self.value
	}

	/// Creates from octets in network order: `[127, 0, 0, 1]`.
	pub const fn from_octets(octets: [u8; 4]) -> Self {
		Self::from_bits(u32::from_be_bytes(octets))
	}

	pub const fn octets(&self) -> [u8; 4] {
		self.value.to_be_bytes()
	}

	/// Parses dotted-decimal text.
	///
	/// Fails with `InvalidArgument` for anything that is not exactly four
	/// decimal octets, e.g. `"999.1.1.1"` or `"not-an-ip"`.
	pub fn parse(text: &str) -> Result<Self> {
		text.parse::<std::net::Ipv4Addr>()
			.map(Self::from)
			.map_err(|_| {
				SocketError::invalid_argument("inet_pton", format!("{text:?} is not an IPv4 address"))
			})
	}

	/// Looks up `hostname` and returns its first IPv4 address.
	pub fn resolve(hostname: &str) -> Result<Self> {
		match sys::resolve(hostname, IpVersion::V4)? {
			IpAddress::V4(ip) => Ok(ip),
			IpAddress::V6(_) => Err(SocketError::resolution(hostname, "no IPv4 address")),
		}
	}
}

impl std::str::FromStr for Ipv4Address {
	type Err = SocketError;

	fn from_str(text: &str) -> Result<Self> {
		Self::parse(text)
	}
}

impl std::fmt::Display for Ipv4Address {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let [a, b, c, d] = self.octets();
		write!(f, "{a}.{b}.{c}.{d}")
	}
}

impl From<u32> for Ipv4Address {
	fn from(value: u32) -> Self {
		Self::from_bits(value)
	}
}

impl From<std::net::Ipv4Addr> for Ipv4Address {
	fn from(ip: std::net::Ipv4Addr) -> Self {
		Self::from_bits(ip.to_bits())
	}
}

impl From<Ipv4Address> for std::net::Ipv4Addr {
	fn from(ip: Ipv4Address) -> Self {
		std::net::Ipv4Addr::from_bits(ip.value)
	}
}
