use std::ffi::CString;
use std::mem;
use std::os::windows::io::{AsRawSocket, FromRawSocket, OwnedSocket, RawSocket};
use std::ptr;
use std::sync::OnceLock;

use windows_sys::Win32::Networking::WinSock::{
	self, ADDRINFOA, AF_INET, AF_INET6, AF_UNSPEC, FIONBIO, INVALID_SOCKET, IPPROTO_TCP, IPPROTO_UDP,
	SD_BOTH, SD_RECEIVE, SD_SEND, SOCKADDR, SOCKADDR_IN, SOCKADDR_IN6, SOCKADDR_STORAGE,
	SOCKET, SOCKET_ERROR, SOCK_DGRAM, SOCK_STREAM, SOL_SOCKET, SOMAXCONN, SO_BROADCAST,
	SO_REUSEADDR, SO_TYPE, TCP_NODELAY, WSADATA,
};

use crate::addr::{Endpoint, IpAddress, IpVersion, Ipv4Address, Ipv6Address};
use crate::error::{ErrorKind, Result, SocketError};
use crate::socket::{Protocol, Shutdown, SocketOption};

/// Owned WinSock handle. Dropping it calls `closesocket()` exactly once.
pub(crate) type Descriptor = OwnedSocket;
pub(crate) type Raw = SOCKET;

pub(crate) const DEFAULT_BACKLOG: i32 = SOMAXCONN as i32;

/// Largest length WinSock accepts in one call; lengths are `i32`.
const MAX_BUF_LEN: usize = i32::MAX as usize;

/// WSA error code → portable kind.
const ERROR_TABLE: &[(i32, ErrorKind)] = &[
	(WinSock::WSAEBADF, ErrorKind::BadDescriptor),
	(WinSock::WSAEINVAL, ErrorKind::InvalidArgument),
	(WinSock::WSAEFAULT, ErrorKind::MemoryFault),
	(WinSock::WSAENOTSOCK, ErrorKind::NotASocket),
	(WinSock::WSAEACCES, ErrorKind::AccessDenied),
	(WinSock::WSAECONNABORTED, ErrorKind::ConnectionAborted),
	(WinSock::WSAEADDRINUSE, ErrorKind::AddressInUse),
	(WinSock::WSAEOPNOTSUPP, ErrorKind::OperationNotSupported),
	(WinSock::WSAEWOULDBLOCK, ErrorKind::WouldBlock),
];

pub(crate) fn error_kind(code: i32) -> ErrorKind {
	ERROR_TABLE
		.iter()
		.find(|(wsa, _)| *wsa == code)
		.map_or(ErrorKind::Unknown, |(_, kind)| *kind)
}

#[inline]
pub(crate) fn last_error() -> i32 {
	unsafe { WinSock::WSAGetLastError() }
}

/// Runs `WSAStartup(2.2)` once per process and caches its outcome.
///
/// Every entry point that reaches WinSock calls this first; repeat calls
/// only read the cached result.
pub(crate) fn init() -> Result<()> {
	static STARTUP: OnceLock<i32> = OnceLock::new();

	let code = *STARTUP.get_or_init(|| {
		let mut data: WSADATA = unsafe { mem::zeroed() };
		let code = unsafe { WinSock::WSAStartup(0x0202, &mut data) };
		tracing::debug!(code, "WSAStartup");
		code
	});

	if code == 0 {
		Ok(())
	} else {
		Err(SocketError::from_code("WSAStartup", code))
	}
}

#[inline]
pub(crate) fn as_raw(socket: &Descriptor) -> Raw {
	socket.as_raw_socket() as Raw
}

fn check(op: &'static str, rc: i32) -> Result<i32> {
	if rc == SOCKET_ERROR {
		Err(SocketError::last_os_error(op))
	} else {
		Ok(rc)
	}
}

fn check_socket(op: &'static str, socket: SOCKET) -> Result<Descriptor> {
	if socket == INVALID_SOCKET {
		Err(SocketError::last_os_error(op))
	} else {
		Ok(unsafe { OwnedSocket::from_raw_socket(socket as RawSocket) })
	}
}

/// A `SOCKADDR_STORAGE` plus the length WinSock filled in.
pub(crate) struct SockAddr {
	storage: SOCKADDR_STORAGE,
	len: i32,
}

impl SockAddr {
	pub(crate) fn empty() -> Self {
		Self {
			storage: unsafe { mem::zeroed() },
			len: mem::size_of::<SOCKADDR_STORAGE>() as i32,
		}
	}

	pub(crate) fn from_endpoint(endpoint: &Endpoint) -> Self {
		let mut storage: SOCKADDR_STORAGE = unsafe { mem::zeroed() };
		let len = match endpoint.ip() {
			IpAddress::V4(ip) => {
				let raw = unsafe { &mut *(&mut storage as *mut _ as *mut SOCKADDR_IN) };
				raw.sin_family = AF_INET;
				raw.sin_port = endpoint.port().to_be();
				raw.sin_addr.S_un.S_addr = ip.to_bits().to_be();
				mem::size_of::<SOCKADDR_IN>()
			}
			IpAddress::V6(ip) => {
				let raw = unsafe { &mut *(&mut storage as *mut _ as *mut SOCKADDR_IN6) };
				raw.sin6_family = AF_INET6;
				raw.sin6_port = endpoint.port().to_be();
				raw.sin6_addr.u.Byte = ip.octets();
				mem::size_of::<SOCKADDR_IN6>()
			}
		};
		Self { storage, len: len as i32 }
	}

	/// # Safety
	/// `addr` must point to at least `len` readable bytes.
	unsafe fn from_raw(addr: *const SOCKADDR, len: usize) -> Self {
		let mut copy = Self::empty();
		let len = len.min(mem::size_of::<SOCKADDR_STORAGE>());
		unsafe {
			ptr::copy_nonoverlapping(addr as *const u8, &mut copy.storage as *mut _ as *mut u8, len);
		}
		copy.len = len as i32;
		copy
	}

	/// Decodes by the family WinSock wrote, not the family we expected.
	pub(crate) fn to_endpoint(&self) -> Option<Endpoint> {
		let len = self.len as usize;
		match self.storage.ss_family {
			AF_INET if len >= mem::size_of::<SOCKADDR_IN>() => {
				let raw = unsafe { &*(&self.storage as *const _ as *const SOCKADDR_IN) };
				let bits = unsafe { raw.sin_addr.S_un.S_addr };
				Some(Endpoint::new(Ipv4Address::from_bits(u32::from_be(bits)), u16::from_be(raw.sin_port)))
			}
			AF_INET6 if len >= mem::size_of::<SOCKADDR_IN6>() => {
				let raw = unsafe { &*(&self.storage as *const _ as *const SOCKADDR_IN6) };
				let octets = unsafe { raw.sin6_addr.u.Byte };
				Some(Endpoint::new(Ipv6Address::from_octets(octets), u16::from_be(raw.sin6_port)))
			}
			_ => None,
		}
	}

	pub(crate) fn version(&self) -> Option<IpVersion> {
		match self.storage.ss_family {
			AF_INET => Some(IpVersion::V4),
			AF_INET6 => Some(IpVersion::V6),
			_ => None,
		}
	}

	pub(crate) fn is_unset(&self) -> bool {
		self.len == 0 || self.storage.ss_family == AF_UNSPEC
	}

	fn as_ptr(&self) -> *const SOCKADDR {
		&self.storage as *const _ as *const SOCKADDR
	}

	fn as_mut_ptr(&mut self) -> *mut SOCKADDR {
		&mut self.storage as *mut _ as *mut SOCKADDR
	}
}

fn family(version: IpVersion) -> i32 {
	match version {
		IpVersion::V4 => AF_INET as i32,
		IpVersion::V6 => AF_INET6 as i32,
	}
}

pub(crate) fn socket(version: IpVersion, protocol: Protocol) -> Result<Descriptor> {
	let (ty, proto) = match protocol {
		Protocol::Tcp => (SOCK_STREAM, IPPROTO_TCP),
		Protocol::Udp => (SOCK_DGRAM, IPPROTO_UDP),
	};
	check_socket("socket", unsafe { WinSock::socket(family(version), ty, proto) })
}

pub(crate) fn bind(socket: Raw, addr: &SockAddr) -> Result<()> {
	check("bind", unsafe { WinSock::bind(socket, addr.as_ptr(), addr.len) })?;
	Ok(())
}

pub(crate) fn listen(socket: Raw, backlog: i32) -> Result<()> {
	check("listen", unsafe { WinSock::listen(socket, backlog) })?;
	Ok(())
}

pub(crate) fn connect(socket: Raw, addr: &SockAddr) -> Result<()> {
	check("connect", unsafe { WinSock::connect(socket, addr.as_ptr(), addr.len) })?;
	Ok(())
}

pub(crate) fn accept(socket: Raw) -> Result<(Descriptor, SockAddr)> {
	let mut addr = SockAddr::empty();
	let client = unsafe { WinSock::accept(socket, addr.as_mut_ptr(), &mut addr.len) };
	Ok((check_socket("accept", client)?, addr))
}

pub(crate) fn send(socket: Raw, buf: &[u8]) -> Result<usize> {
	let len = buf.len().min(MAX_BUF_LEN) as i32;
	let n = check("send", unsafe { WinSock::send(socket, buf.as_ptr(), len, 0) })?;
	Ok(n as usize)
}

pub(crate) fn recv(socket: Raw, buf: &mut [u8]) -> Result<usize> {
	let len = buf.len().min(MAX_BUF_LEN) as i32;
	let n = check("recv", unsafe { WinSock::recv(socket, buf.as_mut_ptr(), len, 0) })?;
	Ok(n as usize)
}

pub(crate) fn send_to(socket: Raw, buf: &[u8], addr: &SockAddr) -> Result<usize> {
	let len = buf.len().min(MAX_BUF_LEN) as i32;
	let n = unsafe { WinSock::sendto(socket, buf.as_ptr(), len, 0, addr.as_ptr(), addr.len) };
	Ok(check("sendto", n)? as usize)
}

pub(crate) fn recv_from(socket: Raw, buf: &mut [u8]) -> Result<(usize, SockAddr)> {
	let mut addr = SockAddr::empty();
	let len = buf.len().min(MAX_BUF_LEN) as i32;
	let n = unsafe {
		WinSock::recvfrom(socket, buf.as_mut_ptr(), len, 0, addr.as_mut_ptr(), &mut addr.len)
	};
	Ok((check("recvfrom", n)? as usize, addr))
}

pub(crate) fn local_addr(socket: Raw) -> Result<SockAddr> {
	let mut addr = SockAddr::empty();
	check("getsockname", unsafe { WinSock::getsockname(socket, addr.as_mut_ptr(), &mut addr.len) })?;
	Ok(addr)
}

pub(crate) fn peer_addr(socket: Raw) -> Result<SockAddr> {
	let mut addr = SockAddr::empty();
	check("getpeername", unsafe { WinSock::getpeername(socket, addr.as_mut_ptr(), &mut addr.len) })?;
	Ok(addr)
}

pub(crate) fn shutdown(socket: Raw, how: Shutdown) -> Result<()> {
	let how = match how {
		Shutdown::Read => SD_RECEIVE,
		Shutdown::Write => SD_SEND,
		Shutdown::ReadWrite => SD_BOTH,
	};
	check("shutdown", unsafe { WinSock::shutdown(socket, how) })?;
	Ok(())
}

pub(crate) fn set_nonblocking(socket: Raw, nonblocking: bool) -> Result<()> {
	let mut mode = u32::from(nonblocking);
	check("FIONBIO", unsafe { WinSock::ioctlsocket(socket, FIONBIO, &mut mode) })?;
	Ok(())
}

fn option_id(option: SocketOption) -> (i32, i32) {
	match option {
		SocketOption::Broadcast => (SOL_SOCKET, SO_BROADCAST),
		SocketOption::ReuseAddress => (SOL_SOCKET, SO_REUSEADDR),
		SocketOption::TcpNoDelay => (IPPROTO_TCP, TCP_NODELAY),
	}
}

pub(crate) fn set_option(socket: Raw, option: SocketOption, enable: bool) -> Result<()> {
	let (level, name) = option_id(option);
	let value = i32::from(enable);
	let rc = unsafe {
		WinSock::setsockopt(
			socket,
			level,
			name,
			&value as *const i32 as *const u8,
			mem::size_of::<i32>() as i32,
		)
	};
	check(option.name(), rc)?;
	Ok(())
}

fn get_int(socket: Raw, level: i32, name: i32, op: &'static str) -> Result<i32> {
	// Some options come back as a one-byte BOOLEAN; the zeroed int absorbs both.
	let mut value: i32 = 0;
	let mut len = mem::size_of::<i32>() as i32;
	let rc = unsafe {
		WinSock::getsockopt(socket, level, name, &mut value as *mut i32 as *mut u8, &mut len)
	};
	check(op, rc)?;
	Ok(value)
}

pub(crate) fn option(socket: Raw, option: SocketOption) -> Result<bool> {
	let (level, name) = option_id(option);
	Ok(get_int(socket, level, name, option.name())? != 0)
}

pub(crate) fn socket_protocol(socket: Raw) -> Result<Protocol> {
	match get_int(socket, SOL_SOCKET, SO_TYPE, "SO_TYPE")? {
		SOCK_STREAM => Ok(Protocol::Tcp),
		SOCK_DGRAM => Ok(Protocol::Udp),
		other => Err(SocketError::invalid_argument("SO_TYPE", format!("unsupported socket type {other}"))),
	}
}

struct AddrInfoList(*mut ADDRINFOA);

impl Drop for AddrInfoList {
	fn drop(&mut self) {
		if !self.0.is_null() {
			unsafe { WinSock::freeaddrinfo(self.0) };
		}
	}
}

pub(crate) fn resolve(host: &str, version: IpVersion) -> Result<IpAddress> {
	init()?;
	let name = CString::new(host)
		.map_err(|_| SocketError::invalid_argument("getaddrinfo", "host name contains a NUL byte"))?;

	let mut hints: ADDRINFOA = unsafe { mem::zeroed() };
	hints.ai_family = family(version);

	let mut head: *mut ADDRINFOA = ptr::null_mut();
	let rc = unsafe {
		WinSock::getaddrinfo(name.as_ptr() as *const u8, ptr::null(), &hints, &mut head)
	};
	if rc != 0 {
		return Err(SocketError::resolution(host, std::io::Error::from_raw_os_error(rc)));
	}
	let list = AddrInfoList(head);

	let mut cursor = list.0;
	while !cursor.is_null() {
		let entry = unsafe { &*cursor };
		if !entry.ai_addr.is_null() {
			let addr = unsafe { SockAddr::from_raw(entry.ai_addr, entry.ai_addrlen) };
			if let Some(endpoint) = addr.to_endpoint() {
				if endpoint.version() == version {
					return Ok(endpoint.ip());
				}
			}
		}
		cursor = entry.ai_next;
	}

	Err(SocketError::resolution(host, "no address of the requested family"))
}
