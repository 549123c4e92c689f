//! Address families and related value types.
//!
//! - `Ipv4Address` — 32-bit address, host byte order
//! - `Ipv6Address` — eight 16-bit groups
//! - `IpAddress` — either of the two, as carried by an `Endpoint`
//!
//! None of these hold an OS resource. Only `resolve` talks to the OS.

mod endpoint;
mod ipv4;
mod ipv6;

pub use self::endpoint::Endpoint;
pub use self::ipv4::Ipv4Address;
pub use self::ipv6::Ipv6Address;

/// Address family of a socket. Fixed when the socket is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
	V4,
	V6,
}

impl std::fmt::Display for IpVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			IpVersion::V4 => f.write_str("IPv4"),
			IpVersion::V6 => f.write_str("IPv6"),
		}
	}
}

/// An IPv4 or IPv6 address.
///
/// The family is a tag, not a trait object: every socket call that takes an
/// endpoint matches on it and rejects the wrong one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpAddress {
	V4(Ipv4Address),
	V6(Ipv6Address),
}

impl IpAddress {
	/// The wildcard address of `version`.
	pub fn any(version: IpVersion) -> Self {
		match version {
			IpVersion::V4 => IpAddress::V4(Ipv4Address::any()),
			IpVersion::V6 => IpAddress::V6(Ipv6Address::any()),
		}
	}

	pub fn version(&self) -> IpVersion {
		match self {
			IpAddress::V4(_) => IpVersion::V4,
			IpAddress::V6(_) => IpVersion::V6,
		}
	}
}

impl Default for IpAddress {
	fn default() -> Self {
		IpAddress::V4(Ipv4Address::any())
	}
}

impl From<Ipv4Address> for IpAddress {
	fn from(ip: Ipv4Address) -> Self {
		IpAddress::V4(ip)
	}
}

impl From<Ipv6Address> for IpAddress {
	fn from(ip: Ipv6Address) -> Self {
		IpAddress::V6(ip)
	}
}

impl From<std::net::IpAddr> for IpAddress {
	fn from(ip: std::net::IpAddr) -> Self {
		match ip {
			std::net::IpAddr::V4(ip) => IpAddress::V4(ip.into()),
			std::net::IpAddr::V6(ip) => IpAddress::V6(ip.into()),
		}
	}
}

impl From<IpAddress> for std::net::IpAddr {
	fn from(ip: IpAddress) -> Self {
		match ip {
			IpAddress::V4(ip) => std::net::IpAddr::V4(ip.into()),
			IpAddress::V6(ip) => std::net::IpAddr::V6(ip.into()),
		}
	}
}

impl std::fmt::Display for IpAddress {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			IpAddress::V4(ip) => std::fmt::Display::fmt(ip, f),
			IpAddress::V6(ip) => std::fmt::Display::fmt(ip, f),
		}
	}
}
