use std::ffi::{CStr, CString};
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::ptr;

use libc::{c_int, socklen_t};

use crate::addr::{Endpoint, IpAddress, IpVersion, Ipv4Address, Ipv6Address};
use crate::error::{ErrorKind, Result, SocketError};
use crate::socket::{Protocol, Shutdown, SocketOption};

/// Owned socket descriptor. Dropping it calls `close()` exactly once.
pub(crate) type Descriptor = OwnedFd;
pub(crate) type Raw = RawFd;

pub(crate) const DEFAULT_BACKLOG: c_int = libc::SOMAXCONN;

/// errno → portable kind.
///
/// EINPROGRESS is what a non-blocking `connect` reports; it is the same
/// "not ready yet, poll" outcome as EAGAIN.
const ERROR_TABLE: &[(c_int, ErrorKind)] = &[
	(libc::EBADF, ErrorKind::BadDescriptor),
	(libc::EINVAL, ErrorKind::InvalidArgument),
	(libc::EFAULT, ErrorKind::MemoryFault),
	(libc::ENOTSOCK, ErrorKind::NotASocket),
	(libc::EACCES, ErrorKind::AccessDenied),
	(libc::EPERM, ErrorKind::PermissionDenied),
	(libc::ECONNABORTED, ErrorKind::ConnectionAborted),
	(libc::EADDRINUSE, ErrorKind::AddressInUse),
	(libc::EOPNOTSUPP, ErrorKind::OperationNotSupported),
	(libc::EAGAIN, ErrorKind::WouldBlock),
	(libc::EWOULDBLOCK, ErrorKind::WouldBlock),
	(libc::EINPROGRESS, ErrorKind::WouldBlock),
];

pub(crate) fn error_kind(code: i32) -> ErrorKind {
	ERROR_TABLE
		.iter()
		.find(|(errno, _)| *errno == code)
		.map_or(ErrorKind::Unknown, |(_, kind)| *kind)
}

#[inline]
pub(crate) fn last_error() -> i32 {
	std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Nothing to bring up on unix; the sockets API is always available.
#[inline]
pub(crate) fn init() -> Result<()> {
	Ok(())
}

#[inline]
pub(crate) fn as_raw(fd: &Descriptor) -> Raw {
	fd.as_raw_fd()
}

// Linux and the BSDs set close-on-exec atomically and suppress SIGPIPE per
// call. Everything else (Apple) gets FD_CLOEXEC and SO_NOSIGPIPE afterwards.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd"))]
mod flags {
	use std::os::fd::RawFd;

	use libc::{c_int, socklen_t};

	use crate::error::Result;

	pub(super) const SEND: c_int = libc::MSG_NOSIGNAL;

	pub(super) fn socket(domain: c_int, ty: c_int, proto: c_int) -> c_int {
		unsafe { libc::socket(domain, ty | libc::SOCK_CLOEXEC, proto) }
	}

	/// # Safety
	/// `addr` and `len` must describe writable address storage.
	pub(super) unsafe fn accept(fd: RawFd, addr: *mut libc::sockaddr, len: *mut socklen_t) -> c_int {
		unsafe { libc::accept4(fd, addr, len, libc::SOCK_CLOEXEC) }
	}

	pub(super) fn prepare_created(_fd: RawFd) -> Result<()> {
		Ok(())
	}

	pub(super) fn prepare_accepted(_fd: RawFd) -> Result<()> {
		Ok(())
	}
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd", target_os = "netbsd", target_os = "openbsd")))]
mod flags {
	use std::os::fd::RawFd;

	use libc::{c_int, socklen_t};

	use super::check;
	use crate::error::Result;

	pub(super) const SEND: c_int = 0;

	pub(super) fn socket(domain: c_int, ty: c_int, proto: c_int) -> c_int {
		unsafe { libc::socket(domain, ty, proto) }
	}

	/// # Safety
	/// `addr` and `len` must describe writable address storage.
	pub(super) unsafe fn accept(fd: RawFd, addr: *mut libc::sockaddr, len: *mut socklen_t) -> c_int {
		unsafe { libc::accept(fd, addr, len) }
	}

	fn set_cloexec(fd: RawFd) -> Result<()> {
		let flags = check("F_GETFD", unsafe { libc::fcntl(fd, libc::F_GETFD) })?;
		check("FD_CLOEXEC", unsafe { libc::fcntl(fd, libc::F_SETFD, flags | libc::FD_CLOEXEC) })?;
		Ok(())
	}

	pub(super) fn prepare_created(fd: RawFd) -> Result<()> {
		set_cloexec(fd)?;
		#[cfg(any(target_os = "macos", target_os = "ios"))]
		super::set_int(fd, libc::SOL_SOCKET, libc::SO_NOSIGPIPE, 1, "SO_NOSIGPIPE")?;
		Ok(())
	}

	pub(super) fn prepare_accepted(fd: RawFd) -> Result<()> {
		set_cloexec(fd)
	}
}

fn check(op: &'static str, rc: c_int) -> Result<c_int> {
	if rc == -1 {
		Err(SocketError::last_os_error(op))
	} else {
		Ok(rc)
	}
}

fn check_len(op: &'static str, n: libc::ssize_t) -> Result<usize> {
	if n < 0 {
		Err(SocketError::last_os_error(op))
	} else {
		Ok(n as usize)
	}
}

/// A `sockaddr_storage` plus the length the kernel filled in.
pub(crate) struct SockAddr {
	storage: libc::sockaddr_storage,
	len: socklen_t,
}

impl SockAddr {
	/// Zeroed storage for calls that write an address back.
	pub(crate) fn empty() -> Self {
		Self {
			storage: unsafe { mem::zeroed() },
			len: mem::size_of::<libc::sockaddr_storage>() as socklen_t,
		}
	}

	pub(crate) fn from_endpoint(endpoint: &Endpoint) -> Self {
		let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
		let len = match endpoint.ip() {
			IpAddress::V4(ip) => {
				let raw = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in) };
				raw.sin_family = libc::AF_INET as libc::sa_family_t;
				raw.sin_port = endpoint.port().to_be();
				raw.sin_addr.s_addr = ip.to_bits().to_be();
				mem::size_of::<libc::sockaddr_in>()
			}
			IpAddress::V6(ip) => {
				let raw = unsafe { &mut *(&mut storage as *mut _ as *mut libc::sockaddr_in6) };
				raw.sin6_family = libc::AF_INET6 as libc::sa_family_t;
				raw.sin6_port = endpoint.port().to_be();
				raw.sin6_addr.s6_addr = ip.octets();
				mem::size_of::<libc::sockaddr_in6>()
			}
		};
		Self { storage, len: len as socklen_t }
	}

	/// Copies an address the OS handed out by pointer (getaddrinfo).
	///
	/// # Safety
	/// `addr` must point to at least `len` readable bytes.
	unsafe fn from_raw(addr: *const libc::sockaddr, len: socklen_t) -> Self {
		let mut copy = Self::empty();
		let len = (len as usize).min(mem::size_of::<libc::sockaddr_storage>());
		unsafe {
			ptr::copy_nonoverlapping(addr as *const u8, &mut copy.storage as *mut _ as *mut u8, len);
		}
		copy.len = len as socklen_t;
		copy
	}

	/// Decodes by the family the OS wrote, not the family we expected.
	pub(crate) fn to_endpoint(&self) -> Option<Endpoint> {
		let len = self.len as usize;
		match self.storage.ss_family as c_int {
			libc::AF_INET if len >= mem::size_of::<libc::sockaddr_in>() => {
				let raw = unsafe { &*(&self.storage as *const _ as *const libc::sockaddr_in) };
				let ip = Ipv4Address::from_bits(u32::from_be(raw.sin_addr.s_addr));
				Some(Endpoint::new(ip, u16::from_be(raw.sin_port)))
			}
			libc::AF_INET6 if len >= mem::size_of::<libc::sockaddr_in6>() => {
				let raw = unsafe { &*(&self.storage as *const _ as *const libc::sockaddr_in6) };
				let ip = Ipv6Address::from_octets(raw.sin6_addr.s6_addr);
				Some(Endpoint::new(ip, u16::from_be(raw.sin6_port)))
			}
			_ => None,
		}
	}

	/// The family the OS wrote, if it is one this crate handles.
	pub(crate) fn version(&self) -> Option<IpVersion> {
		match self.storage.ss_family as c_int {
			libc::AF_INET => Some(IpVersion::V4),
			libc::AF_INET6 => Some(IpVersion::V6),
			_ => None,
		}
	}

	/// No address was written at all, as `recvfrom` does on a connected
	/// stream socket.
	pub(crate) fn is_unset(&self) -> bool {
		self.len == 0 || self.storage.ss_family as c_int == libc::AF_UNSPEC
	}

	fn as_ptr(&self) -> *const libc::sockaddr {
		&self.storage as *const _ as *const libc::sockaddr
	}

	fn as_mut_ptr(&mut self) -> *mut libc::sockaddr {
		&mut self.storage as *mut _ as *mut libc::sockaddr
	}
}

fn family(version: IpVersion) -> c_int {
	match version {
		IpVersion::V4 => libc::AF_INET,
		IpVersion::V6 => libc::AF_INET6,
	}
}

pub(crate) fn socket(version: IpVersion, protocol: Protocol) -> Result<Descriptor> {
	let (ty, proto) = match protocol {
		Protocol::Tcp => (libc::SOCK_STREAM, libc::IPPROTO_TCP),
		Protocol::Udp => (libc::SOCK_DGRAM, libc::IPPROTO_UDP),
	};

	let fd = check("socket", flags::socket(family(version), ty, proto))?;
	let fd = unsafe { OwnedFd::from_raw_fd(fd) };
	flags::prepare_created(fd.as_raw_fd())?;
	Ok(fd)
}

pub(crate) fn bind(fd: Raw, addr: &SockAddr) -> Result<()> {
	check("bind", unsafe { libc::bind(fd, addr.as_ptr(), addr.len) })?;
	Ok(())
}

pub(crate) fn listen(fd: Raw, backlog: c_int) -> Result<()> {
	check("listen", unsafe { libc::listen(fd, backlog) })?;
	Ok(())
}

pub(crate) fn connect(fd: Raw, addr: &SockAddr) -> Result<()> {
	check("connect", unsafe { libc::connect(fd, addr.as_ptr(), addr.len) })?;
	Ok(())
}

pub(crate) fn accept(fd: Raw) -> Result<(Descriptor, SockAddr)> {
	let mut addr = SockAddr::empty();
	let client = unsafe { flags::accept(fd, addr.as_mut_ptr(), &mut addr.len) };
	let client = unsafe { OwnedFd::from_raw_fd(check("accept", client)?) };
	flags::prepare_accepted(client.as_raw_fd())?;
	Ok((client, addr))
}

pub(crate) fn send(fd: Raw, buf: &[u8]) -> Result<usize> {
	let n = unsafe { libc::send(fd, buf.as_ptr() as *const libc::c_void, buf.len(), flags::SEND) };
	check_len("send", n)
}

pub(crate) fn recv(fd: Raw, buf: &mut [u8]) -> Result<usize> {
	let n = unsafe { libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0) };
	check_len("recv", n)
}

pub(crate) fn send_to(fd: Raw, buf: &[u8], addr: &SockAddr) -> Result<usize> {
	let n = unsafe {
		libc::sendto(
			fd,
			buf.as_ptr() as *const libc::c_void,
			buf.len(),
			flags::SEND,
			addr.as_ptr(),
			addr.len,
		)
	};
	check_len("sendto", n)
}

pub(crate) fn recv_from(fd: Raw, buf: &mut [u8]) -> Result<(usize, SockAddr)> {
	let mut addr = SockAddr::empty();
	let n = unsafe {
		libc::recvfrom(
			fd,
			buf.as_mut_ptr() as *mut libc::c_void,
			buf.len(),
			0,
			addr.as_mut_ptr(),
			&mut addr.len,
		)
	};
	Ok((check_len("recvfrom", n)?, addr))
}

pub(crate) fn local_addr(fd: Raw) -> Result<SockAddr> {
	let mut addr = SockAddr::empty();
	check("getsockname", unsafe { libc::getsockname(fd, addr.as_mut_ptr(), &mut addr.len) })?;
	Ok(addr)
}

pub(crate) fn peer_addr(fd: Raw) -> Result<SockAddr> {
	let mut addr = SockAddr::empty();
	check("getpeername", unsafe { libc::getpeername(fd, addr.as_mut_ptr(), &mut addr.len) })?;
	Ok(addr)
}

pub(crate) fn shutdown(fd: Raw, how: Shutdown) -> Result<()> {
	let how = match how {
		Shutdown::Read => libc::SHUT_RD,
		Shutdown::Write => libc::SHUT_WR,
		Shutdown::ReadWrite => libc::SHUT_RDWR,
	};
	check("shutdown", unsafe { libc::shutdown(fd, how) })?;
	Ok(())
}

pub(crate) fn set_nonblocking(fd: Raw, nonblocking: bool) -> Result<()> {
	let flags = check("F_GETFL", unsafe { libc::fcntl(fd, libc::F_GETFL) })?;
	let new_flags = if nonblocking {
		flags | libc::O_NONBLOCK
	} else {
		flags & !libc::O_NONBLOCK
	};
	check("O_NONBLOCK", unsafe { libc::fcntl(fd, libc::F_SETFL, new_flags) })?;
	Ok(())
}

fn option_id(option: SocketOption) -> (c_int, c_int) {
	match option {
		SocketOption::Broadcast => (libc::SOL_SOCKET, libc::SO_BROADCAST),
		SocketOption::ReuseAddress => (libc::SOL_SOCKET, libc::SO_REUSEADDR),
		SocketOption::TcpNoDelay => (libc::IPPROTO_TCP, libc::TCP_NODELAY),
	}
}

fn set_int(fd: Raw, level: c_int, name: c_int, value: c_int, op: &'static str) -> Result<()> {
	let rc = unsafe {
		libc::setsockopt(
			fd,
			level,
			name,
			&value as *const _ as *const libc::c_void,
			mem::size_of::<c_int>() as socklen_t,
		)
	};
	check(op, rc)?;
	Ok(())
}

pub(crate) fn set_option(fd: Raw, option: SocketOption, enable: bool) -> Result<()> {
	let (level, name) = option_id(option);
	set_int(fd, level, name, c_int::from(enable), option.name())
}

fn get_int(fd: Raw, level: c_int, name: c_int, op: &'static str) -> Result<c_int> {
	let mut value: c_int = 0;
	let mut len = mem::size_of::<c_int>() as socklen_t;
	let rc = unsafe {
		libc::getsockopt(fd, level, name, &mut value as *mut _ as *mut libc::c_void, &mut len)
	};
	check(op, rc)?;
	Ok(value)
}

pub(crate) fn option(fd: Raw, option: SocketOption) -> Result<bool> {
	let (level, name) = option_id(option);
	Ok(get_int(fd, level, name, option.name())? != 0)
}

/// Reads `SO_TYPE` and maps it onto the protocols this crate speaks.
pub(crate) fn socket_protocol(fd: Raw) -> Result<Protocol> {
	match get_int(fd, libc::SOL_SOCKET, libc::SO_TYPE, "SO_TYPE")? {
		libc::SOCK_STREAM => Ok(Protocol::Tcp),
		libc::SOCK_DGRAM => Ok(Protocol::Udp),
		other => Err(SocketError::invalid_argument("SO_TYPE", format!("unsupported socket type {other}"))),
	}
}

/// Frees a getaddrinfo result list on drop.
struct AddrInfoList(*mut libc::addrinfo);

impl Drop for AddrInfoList {
	fn drop(&mut self) {
		if !self.0.is_null() {
			unsafe { libc::freeaddrinfo(self.0) };
		}
	}
}

pub(crate) fn resolve(host: &str, version: IpVersion) -> Result<IpAddress> {
	init()?;
	let name = CString::new(host)
		.map_err(|_| SocketError::invalid_argument("getaddrinfo", "host name contains a NUL byte"))?;

	let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
	hints.ai_family = family(version);

	let mut head: *mut libc::addrinfo = ptr::null_mut();
	let rc = unsafe { libc::getaddrinfo(name.as_ptr(), ptr::null(), &hints, &mut head) };
	if rc != 0 {
		let reason = if rc == libc::EAI_SYSTEM {
			std::io::Error::last_os_error().to_string()
		} else {
			unsafe { CStr::from_ptr(libc::gai_strerror(rc)) }.to_string_lossy().into_owned()
		};
		return Err(SocketError::resolution(host, reason));
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
