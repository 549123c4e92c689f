use crate::addr::{Endpoint, IpAddress};
use crate::error::Result;
use crate::sys;
use super::Socket;

impl Socket {
	/// Sends one datagram to `endpoint`. No `connect` needed.
	///
	/// Returns the number of bytes sent. Sending to the broadcast address
	/// needs `set_broadcast(true)` first.
	pub fn send_to(&self, buf: &[u8], endpoint: &Endpoint) -> Result<usize> {
		self.check_family(endpoint, "sendto")?;
		let n = sys::send_to(self.raw(), buf, &sys::SockAddr::from_endpoint(endpoint))?;
		tracing::trace!(fd = ?self.raw(), %endpoint, sent = n, "send_to");
		Ok(n)
	}

	/// Receives one datagram and the endpoint it came from.
	///
	/// The sender's family is read from the address the OS returned, not
	/// assumed from this socket. A datagram larger than `buf` is truncated.
	///
	/// Data already taken from the socket is always reported. When the OS
	/// hands back no usable sender (a connected stream socket writes none),
	/// the peer endpoint stands in, or the wildcard endpoint if even that is
	/// unknown.
	pub fn receive_from(&self, buf: &mut [u8]) -> Result<(usize, Endpoint)> {
		let (n, addr) = sys::recv_from(self.raw(), buf)?;
		let sender = match addr.to_endpoint() {
			Some(sender) => sender,
			None => {
				tracing::debug!(fd = ?self.raw(), unset = addr.is_unset(), "recvfrom returned no usable sender");
				self.peer_endpoint()
					.unwrap_or_else(|_| Endpoint::new(IpAddress::any(self.version), 0))
			}
		};
		tracing::trace!(fd = ?self.raw(), %sender, received = n, "receive_from");
		Ok((n, sender))
	}
}
