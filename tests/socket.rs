use netlane::{
	Endpoint, ErrorKind, IpAddress, IpVersion, Ipv4Address, Ipv6Address, Protocol, Shutdown, Socket,
	SocketBuilder,
};

fn loopback() -> Endpoint {
	Endpoint::new(Ipv4Address::localhost(), 0)
}

/// Listener on 127.0.0.1 with an OS-assigned port.
fn listener() -> (Socket, Endpoint) {
	let socket = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	let mut endpoint = loopback();
	socket.bind(&mut endpoint).unwrap();
	socket.listen().unwrap();
	(socket, endpoint)
}

fn send_all(socket: &Socket, mut data: &[u8]) {
	while !data.is_empty() {
		let n = socket.send(data).unwrap();
		data = &data[n..];
	}
}

fn receive_exact(socket: &Socket, len: usize) -> Vec<u8> {
	let mut out = Vec::with_capacity(len);
	let mut buf = [0u8; 1024];
	while out.len() < len {
		let n = socket.receive(&mut buf).unwrap();
		assert_ne!(n, 0, "peer closed early");
		out.extend_from_slice(&buf[..n]);
	}
	out
}

#[test]
fn bind_to_port_zero_assigns_a_port() {
	let socket = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut endpoint = loopback();
	socket.bind(&mut endpoint).unwrap();

	assert_ne!(endpoint.port(), 0);
	assert_eq!(endpoint.ip(), IpAddress::V4(Ipv4Address::localhost()));
	assert_eq!(socket.local_endpoint().unwrap(), endpoint);
}

#[test]
fn family_mismatch_is_rejected_before_the_os() {
	let socket = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();

	let mut v6 = Endpoint::new(Ipv6Address::localhost(), 0);
	let err = socket.bind(&mut v6).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidArgument);
	assert_eq!(err.raw_os_error(), None);
	assert_eq!(v6.port(), 0);

	let err = socket.connect(&v6).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidArgument);

	let err = socket.send_to(b"x", &v6).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn tcp_end_to_end() {
	let (server, endpoint) = listener();
	assert_ne!(endpoint.port(), 0);

	let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();

	let (accepted, peer) = server.accept().unwrap();
	assert_eq!(peer.ip(), IpAddress::V4(Ipv4Address::localhost()));
	assert_eq!(peer, client.local_endpoint().unwrap());
	assert_eq!(accepted.version(), IpVersion::V4);
	assert_eq!(accepted.protocol(), Protocol::Tcp);
	assert_eq!(client.peer_endpoint().unwrap(), endpoint);

	let payload = b"hello over loopback";
	send_all(&client, payload);
	assert_eq!(receive_exact(&accepted, payload.len()), payload);

	let reply: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
	send_all(&accepted, &reply);
	assert_eq!(receive_exact(&client, reply.len()), reply);
}

#[test]
fn orderly_close_reads_as_zero() {
	let (server, endpoint) = listener();
	let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();
	let (accepted, _) = server.accept().unwrap();

	drop(client);

	let mut buf = [0u8; 16];
	assert_eq!(accepted.receive(&mut buf).unwrap(), 0);
}

#[test]
fn shutdown_write_signals_end_of_stream() {
	let (server, endpoint) = listener();
	let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();
	let (accepted, _) = server.accept().unwrap();

	send_all(&client, b"last");
	client.shutdown(Shutdown::Write).unwrap();

	assert_eq!(receive_exact(&accepted, 4), b"last");
	let mut buf = [0u8; 4];
	assert_eq!(accepted.receive(&mut buf).unwrap(), 0);
}

#[test]
fn nonblocking_receive_would_block() {
	let socket = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut endpoint = loopback();
	socket.bind(&mut endpoint).unwrap();
	socket.set_nonblocking(true).unwrap();

	let mut buf = [0u8; 16];
	let err = socket.receive_from(&mut buf).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::WouldBlock);
	assert!(err.is_would_block());
}

#[test]
fn nonblocking_accept_would_block() {
	let (server, _) = listener();
	server.set_nonblocking(true).unwrap();

	let err = server.accept().unwrap_err();
	assert_eq!(err.kind(), ErrorKind::WouldBlock);
}

#[test]
fn nonblocking_stream_receive_would_block() {
	let (server, endpoint) = listener();
	let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();
	let (accepted, _) = server.accept().unwrap();

	accepted.set_nonblocking(true).unwrap();
	let mut buf = [0u8; 8];
	assert_eq!(accepted.receive(&mut buf).unwrap_err().kind(), ErrorKind::WouldBlock);

	accepted.set_nonblocking(false).unwrap();
	send_all(&client, b"ok");
	assert_eq!(receive_exact(&accepted, 2), b"ok");
}

#[test]
fn udp_datagrams_report_sender() {
	let receiver = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut target = loopback();
	receiver.bind(&mut target).unwrap();

	let sender = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut origin = loopback();
	sender.bind(&mut origin).unwrap();

	assert_eq!(sender.send_to(b"ping", &target).unwrap(), 4);

	let mut buf = [0u8; 64];
	let (n, from) = receiver.receive_from(&mut buf).unwrap();
	assert_eq!(&buf[..n], b"ping");
	assert_eq!(from, origin);
}

#[test]
fn connected_udp_uses_send_and_receive() {
	let a = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut a_end = loopback();
	a.bind(&mut a_end).unwrap();

	let b = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut b_end = loopback();
	b.bind(&mut b_end).unwrap();

	a.connect(&b_end).unwrap();
	b.connect(&a_end).unwrap();

	assert_eq!(a.send(b"datagram").unwrap(), 8);
	let mut buf = [0u8; 32];
	let n = b.receive(&mut buf).unwrap();
	assert_eq!(&buf[..n], b"datagram");
}

#[test]
fn option_toggles_round_trip() {
	let udp = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	udp.set_broadcast(true).unwrap();
	assert!(udp.broadcast().unwrap());
	udp.set_broadcast(false).unwrap();
	assert!(!udp.broadcast().unwrap());

	let tcp = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	tcp.set_tcp_nodelay(true).unwrap();
	assert!(tcp.tcp_nodelay().unwrap());
	tcp.set_reuse_address(true).unwrap();
	assert!(tcp.reuse_address().unwrap());
}

#[test]
fn listen_on_udp_fails_with_os_error() {
	let socket = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut endpoint = loopback();
	socket.bind(&mut endpoint).unwrap();

	let err = socket.listen().unwrap_err();
	assert!(err.raw_os_error().is_some());
	assert_eq!(err.op(), "listen");
}

#[test]
fn address_in_use() {
	let (_server, endpoint) = listener();
	let other = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	let mut same = endpoint;
	assert_eq!(other.bind(&mut same).unwrap_err().kind(), ErrorKind::AddressInUse);
}

#[test]
fn builder_applies_options() {
	let mut endpoint = loopback();
	let server = SocketBuilder::new(IpVersion::V4, Protocol::Tcp)
		.reuse_address(true)
		.tcp_nodelay(true)
		.backlog(8)
		.listen(&mut endpoint)
		.unwrap();
	assert!(server.reuse_address().unwrap());
	assert!(server.tcp_nodelay().unwrap());
	assert_ne!(endpoint.port(), 0);

	let client = SocketBuilder::new(IpVersion::V4, Protocol::Tcp)
		.tcp_nodelay(true)
		.connect(&endpoint)
		.unwrap();
	let (accepted, _) = server.accept().unwrap();
	send_all(&client, b"built");
	assert_eq!(receive_exact(&accepted, 5), b"built");
}

#[test]
fn builder_nonblocking_udp() {
	let mut endpoint = loopback();
	let socket = SocketBuilder::new(IpVersion::V4, Protocol::Udp)
		.broadcast(true)
		.nonblocking(true)
		.bind(&mut endpoint)
		.unwrap();
	assert!(socket.broadcast().unwrap());

	let mut buf = [0u8; 4];
	assert_eq!(socket.receive_from(&mut buf).unwrap_err().kind(), ErrorKind::WouldBlock);
}

#[test]
fn io_traits() {
	use std::io::{Read, Write};

	let (server, endpoint) = listener();
	let mut client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();
	let (mut accepted, _) = server.accept().unwrap();

	client.write_all(b"through std::io").unwrap();
	client.shutdown(Shutdown::Write).unwrap();

	let mut text = String::new();
	accepted.read_to_string(&mut text).unwrap();
	assert_eq!(text, "through std::io");
}

#[test]
fn accepted_sockets_outlive_the_listener() {
	let (server, endpoint) = listener();
	let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();
	let (accepted, _) = server.accept().unwrap();
	drop(server);

	send_all(&client, b"still here");
	assert_eq!(receive_exact(&accepted, 10), b"still here");
}

#[test]
fn sockets_move_across_threads() {
	let (server, endpoint) = listener();
	let handle = std::thread::spawn(move || {
		let (accepted, _) = server.accept().unwrap();
		receive_exact(&accepted, 6)
	});

	let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();
	send_all(&client, b"thread");
	assert_eq!(handle.join().unwrap(), b"thread");
}

#[test]
fn receive_from_on_a_stream_keeps_the_data() {
	let (server, endpoint) = listener();
	let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();
	let (accepted, peer) = server.accept().unwrap();

	send_all(&client, b"payload");

	let mut buf = [0u8; 16];
	let mut got = 0;
	while got < 7 {
		let (n, from) = accepted.receive_from(&mut buf[got..]).unwrap();
		assert_ne!(n, 0);
		assert_eq!(from, peer);
		got += n;
	}
	assert_eq!(&buf[..7], b"payload");
}

#[test]
fn broadcast_needs_permission() {
	let socket = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
	let mut local = Endpoint::new(Ipv4Address::any(), 0);
	socket.bind(&mut local).unwrap();
	let target = Endpoint::new(Ipv4Address::broadcast(), local.port());

	let err = match socket.send_to(b"all", &target) {
		Err(err) => err,
		Ok(_) => panic!("broadcast sent without SO_BROADCAST"),
	};
	if err.kind() != ErrorKind::AccessDenied {
		// No broadcast route on this host; the permission check never runs.
		eprintln!("skipping broadcast check: {err}");
		return;
	}

	socket.set_broadcast(true).unwrap();
	assert_eq!(socket.send_to(b"all", &target).unwrap(), 3);
}

// ---------------------------------------------------------------------------
// IPv6
// ---------------------------------------------------------------------------

fn v6_loopback() -> Endpoint {
	Endpoint::new(Ipv6Address::localhost(), 0)
}

/// A socket bound to `[::1]:0`, or `None` when the host has no IPv6.
fn bound_v6(protocol: Protocol) -> Option<(Socket, Endpoint)> {
	let socket = match Socket::new(IpVersion::V6, protocol) {
		Ok(socket) => socket,
		Err(err) => {
			eprintln!("skipping IPv6 test: {err}");
			return None;
		}
	};
	let mut endpoint = v6_loopback();
	if let Err(err) = socket.bind(&mut endpoint) {
		eprintln!("skipping IPv6 test: {err}");
		return None;
	}
	Some((socket, endpoint))
}

#[test]
fn udp_over_ipv6_loopback() {
	let Some((receiver, target)) = bound_v6(Protocol::Udp) else { return };
	let Some((sender, origin)) = bound_v6(Protocol::Udp) else { return };
	assert_ne!(target.port(), 0);
	assert_eq!(target.to_string(), format!("[::1]:{}", target.port()));

	assert_eq!(sender.send_to(b"six", &target).unwrap(), 3);

	let mut buf = [0u8; 16];
	let (n, from) = receiver.receive_from(&mut buf).unwrap();
	assert_eq!(&buf[..n], b"six");
	assert_eq!(from, origin);
	assert_eq!(from.ip(), IpAddress::V6(Ipv6Address::localhost()));
}

#[test]
fn tcp_over_ipv6_loopback() {
	let Some((server, endpoint)) = bound_v6(Protocol::Tcp) else { return };
	server.listen().unwrap();

	let client = Socket::new(IpVersion::V6, Protocol::Tcp).unwrap();
	client.connect(&endpoint).unwrap();

	let (accepted, peer) = server.accept().unwrap();
	assert_eq!(accepted.version(), IpVersion::V6);
	assert_eq!(peer.ip(), IpAddress::V6(Ipv6Address::localhost()));
	assert_eq!(peer, client.local_endpoint().unwrap());

	send_all(&client, b"v6 stream");
	assert_eq!(receive_exact(&accepted, 9), b"v6 stream");
}

#[test]
fn ipv4_endpoint_on_ipv6_socket_is_rejected() {
	let socket = match Socket::new(IpVersion::V6, Protocol::Udp) {
		Ok(socket) => socket,
		Err(err) => {
			eprintln!("skipping IPv6 test: {err}");
			return;
		}
	};

	let mut v4 = loopback();
	let err = socket.bind(&mut v4).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::InvalidArgument);
	assert_eq!(err.raw_os_error(), None);
	assert_eq!(v4, loopback());

	assert_eq!(socket.connect(&v4).unwrap_err().kind(), ErrorKind::InvalidArgument);
	assert_eq!(socket.send_to(b"x", &v4).unwrap_err().kind(), ErrorKind::InvalidArgument);
}

// ---------------------------------------------------------------------------
// Adopting descriptors
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod adopt {
	use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd};

	use super::*;

	#[test]
	fn raw_descriptor_round_trip() {
		let (server, endpoint) = listener();
		let raw = server.into_raw_fd();
		let server = Socket::try_from(unsafe { OwnedFd::from_raw_fd(raw) }).unwrap();

		assert_eq!(server.version(), IpVersion::V4);
		assert_eq!(server.protocol(), Protocol::Tcp);
		assert_eq!(server.local_endpoint().unwrap(), endpoint);

		let client = Socket::new(IpVersion::V4, Protocol::Tcp).unwrap();
		client.connect(&endpoint).unwrap();
		let (accepted, _) = server.accept().unwrap();
		send_all(&client, b"adopted");
		assert_eq!(receive_exact(&accepted, 7), b"adopted");
	}

	#[test]
	fn unbound_datagram_socket_is_recognised() {
		let socket = Socket::new(IpVersion::V4, Protocol::Udp).unwrap();
		let socket = Socket::try_from(OwnedFd::from(socket)).unwrap();
		assert_eq!(socket.version(), IpVersion::V4);
		assert_eq!(socket.protocol(), Protocol::Udp);
	}

	#[test]
	fn unix_domain_socket_is_rejected() {
		let unix = std::os::unix::net::UnixDatagram::unbound().unwrap();
		let err = Socket::try_from(OwnedFd::from(unix)).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::InvalidArgument);
		assert_eq!(err.raw_os_error(), None);
	}
}
