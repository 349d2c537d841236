
use std::io::{self, Read, Write, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use byteorder::{BigEndian, WriteBytesExt, ReadBytesExt};
use log::trace;

use crate::error::{Error, Result};
use crate::xdr::{Packer, Unpacker};
use super::{xdr_pack, xdr_unpack, LAST_FRAGMENT};

/// An RPC client for a single program/version over a TCP stream with record marking.
pub struct TcpClient {
	stream: TcpStream,
	pub prog: u32,
	pub vers: u32,
	lastxid: u32,
	timeout: Duration,
	pub packer: Packer,
	pub unpacker: Unpacker,
}

impl TcpClient {

	pub fn connect<A: ToSocketAddrs>(addr:A, prog:u32, vers:u32, timeout:Duration) -> Result<Self> {
		let stream:TcpStream = connect_with_timeout(addr, timeout)?;

		// Start somewhere random so a reconnecting client doesn't pick up stale replies
		let lastxid:u32 = rand::random::<u32>();

		Ok(Self{ stream, prog, vers, lastxid, timeout, packer: Packer::new(), unpacker: Unpacker::new() })
	}

	pub fn set_timeout(&mut self, timeout:Duration) -> Result<()> {
		self.stream.set_read_timeout(Some(timeout))?;
		self.stream.set_write_timeout(Some(timeout))?;
		self.timeout = timeout;
		Ok(())
	}

	/// Reset the packer and write a call header for procedure `prc`.  Arguments get packed after
	/// this and then `do_call` sends the whole thing.
	pub fn start_call(&mut self, prc:u32) {
		self.lastxid = self.lastxid.wrapping_add(1);
		self.packer.reset();
		xdr_pack::pack_callheader(&mut self.packer, self.lastxid, self.prog, self.vers, prc);
	}

	/// Send the packed call and load the matching reply, minus its header, into the unpacker.
	pub fn do_call(&mut self) -> Result<()> {
		let timeout:Duration = self.timeout;
		let call:&[u8] = self.packer.as_bytes();

		let mut send_bytes:Vec<u8> = Vec::with_capacity(call.len() + 4);
		send_bytes.write_u32::<BigEndian>(call.len() as u32 | LAST_FRAGMENT)?;
		send_bytes.extend_from_slice(call);
		self.stream.write_all(&send_bytes).map_err(|e| timeout_to_err(e, timeout))?;

		loop {
			let reply:Vec<u8> = self.read_record()?;
			self.unpacker.reset(reply);

			let xid:u32 = xdr_unpack::unpack_replyheader(&mut self.unpacker)?;
			if xid == self.lastxid {
				return Ok(());
			}

			// Reply to some earlier call that we gave up on
			trace!("Discarding RPC reply with stale xid {} (expected {})", xid, self.lastxid);
		}
	}

	fn read_record(&mut self) -> Result<Vec<u8>> {
		let timeout:Duration = self.timeout;
		let mut reply:Vec<u8> = vec![];

		loop {
			let x:u32 = self.stream.read_u32::<BigEndian>().map_err(|e| timeout_to_err(e, timeout))?;
			let n:usize = (x & !LAST_FRAGMENT) as usize;

			let start:usize = reply.len();
			reply.resize(start + n, 0);
			self.stream.read_exact(&mut reply[start..]).map_err(|e| timeout_to_err(e, timeout))?;

			if x & LAST_FRAGMENT != 0 {
				return Ok(reply);
			}
		}
	}

}

pub(crate) fn connect_with_timeout<A: ToSocketAddrs>(addr:A, timeout:Duration) -> Result<TcpStream> {
	let mut last_err:Option<io::Error> = None;

	for sock_addr in addr.to_socket_addrs()? {
		match TcpStream::connect_timeout(&sock_addr, timeout) {
			Ok(stream) => {
				stream.set_read_timeout(Some(timeout))?;
				stream.set_write_timeout(Some(timeout))?;
				stream.set_nodelay(true)?;
				return Ok(stream);
			},
			Err(e) => last_err = Some(e),
		}
	}

	Err(last_err.unwrap_or_else(|| io::Error::new(ErrorKind::NotFound, "Address didn't resolve to anything")).into())
}

// Socket timeouts surface as WouldBlock on unix and TimedOut on windows
pub(crate) fn timeout_to_err(e:io::Error, timeout:Duration) -> Error {
	match e.kind() {
		ErrorKind::WouldBlock | ErrorKind::TimedOut => Error::Timeout(timeout, "a response from the instrument"),
		_ => Error::Io(e),
	}
}
