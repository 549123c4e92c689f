use crate::addr::{IpAddress, IpVersion};
use crate::error::{Result, SocketError};
use crate::sys;

/// IPv6 address as eight 16-bit groups, most significant group first.
///
/// `Ipv6Address::from_groups([0x2001, 0xdb8, 0, 0, 0, 0, 0, 1])` is
/// `2001:db8::1`. Each group holds its numeric value; byte order only matters
/// when the address is written into a `sockaddr_in6`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ipv6Address {
	groups: [u16; 8],
}

impl Ipv6Address {
	/// `::`, the wildcard address.
	pub const fn any() -> Self {
		Self::from_groups([0; 8])
	}

	/// `::1`
	pub const fn localhost() -> Self {
		Self::from_groups([0, 0, 0, 0, 0, 0, 0, 1])
	}

	pub const fn from_groups(groups: [u16; 8]) -> Self {
		Self { groups }
	}

	pub const fn groups(&self) -> [u16; 8] {
		self.groups
	}

	/// Creates from the 16 bytes of an `in6_addr` (network order).
	pub fn from_octets(octets: [u8; 16]) -> Self {
		let mut groups = [0u16; 8];
		for (group, pair) in groups.iter_mut().zip(octets.chunks_exact(2)) {
			*group = u16::from_be_bytes([pair[0], pair[1]]);
		}
		Self { groups }
	}

	pub fn octets(&self) -> [u8; 16] {
		let mut octets = [0u8; 16];
		for (pair, group) in octets.chunks_exact_mut(2).zip(self.groups) {
			pair.copy_from_slice(&group.to_be_bytes());
		}
		octets
	}

	/// Parses colon-hex text, including `::` compression and an embedded
	/// dotted-decimal tail (`::ffff:10.0.0.1`).
	///
	/// Fails with `InvalidArgument` if `text` is not an IPv6 address.
	pub fn parse(text: &str) -> Result<Self> {
		text.parse::<std::net::Ipv6Addr>()
			.map(Self::from)
			.map_err(|_| {
				SocketError::invalid_argument("inet_pton", format!("{text:?} is not an IPv6 address"))
			})
	}

	/// Looks up `hostname` and returns its first IPv6 address.
	pub fn resolve(hostname: &str) -> Result<Self> {
		match sys::resolve(hostname, IpVersion::V6)? {
			IpAddress::V6(ip) => Ok(ip),
			IpAddress::V4(_) => Err(SocketError::resolution(hostname, "no IPv6 address")),
		}
	}
}

impl std::str::FromStr for Ipv6Address {
	type Err = SocketError;

	fn from_str(text: &str) -> Result<Self> {
		Self::parse(text)
	}
}

impl std::fmt::Display for Ipv6Address {
	/// Canonical text form: lowercase hex, longest zero run compressed.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(&std::net::Ipv6Addr::from(*self), f)
	}
}

impl From<[u16; 8]> for Ipv6Address {
	fn from(groups: [u16; 8]) -> Self {
		Self::from_groups(groups)
	}
}

impl From<std::net::Ipv6Addr> for Ipv6Address {
	fn from(ip: std::net::Ipv6Addr) -> Self {
		Self::from_groups(ip.segments())
	}
}

impl From<Ipv6Address> for std::net::Ipv6Addr {
	fn from(ip: Ipv6Address) -> Self {
		let [a, b, c, d, e, f, g, h] = ip.groups;
		std::net::Ipv6Addr::new(a, b, c, d, e, f, g, h)
	}
}
