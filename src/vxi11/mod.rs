// Device core
pub const DEVICE_CORE_PROG:u32  = 0x0607af;
pub const DEVICE_CORE_VERS:u32  = 1;
pub const CREATE_LINK:u32       = 10;
pub const DEVICE_WRITE:u32      = 11;
pub const DEVICE_READ:u32       = 12;
pub const DEVICE_READSTB:u32    = 13;
pub const DEVICE_CLEAR:u32      = 15;
pub const DESTROY_LINK:u32      = 23;

pub const CLIENT_ID:i32 = 3333;
pub const DEFAULT_LOCK_TIMEOUT_MS:u32 = 10000;
pub const DEFAULT_DEVICE_NAME:&str = "inst0";

pub const OPERATION_FLAGS_NONE:i32     = 0;
pub const OPERATION_FLAGS_END_ONLY:i32 = 8;

// Bits in the reason field of a device_read reply
pub const REASON_REQCNT:i32 = 1;
pub const REASON_CHR:i32    = 2;
pub const REASON_END:i32    = 4;

// The socket gets a little longer than the device so the device gets to report its own timeout
const SOCKET_TIMEOUT_MARGIN:Duration = Duration::from_secs(2);

use std::time::Duration;

use log::{debug, warn};

use crate::error::{parse_err, Error, Result};
use crate::rpc::port_mapping::{TcpPortMapperClient, Mapping};
use crate::rpc::tcp_clients::TcpClient;
use crate::session::Instrument;

pub mod xdr_pack;

fn error_reason(code:i32) -> &'static str {
	match code {
		1  => "Syntax error",
		3  => "Device not accessible",
		4  => "Invalid link identifier",
		5  => "Parameter error",
		6  => "Channel not established",
		8  => "Operation not supported",
		9  => "Out of resources",
		11 => "Device locked by another link",
		12 => "No lock held by this link",
		15 => "I/O timeout",
		17 => "I/O error",
		21 => "Invalid address",
		23 => "Abort",
		29 => "Channel already established",
		_  => "Unknown error",
	}
}

fn check(operation:&'static str, code:i32) -> Result<()> {
	match code {
		0 => Ok(()),
		_ => Err(Error::Vxi11{ operation, code, reason: error_reason(code) }),
	}
}

/// A VXI-11 core channel client holding at most one link.
pub struct CoreClient {
	client: TcpClient,
	io_timeout: Duration,
	opt_link: Option<Link>,
}

#[derive(Debug)]
pub struct Link {
	pub link_id: i32,
	pub abort_port: u16,
	pub max_recv_size: u32,
}

impl CoreClient {

	fn get_link(&self) -> Result<&Link> {
		self.opt_link.as_ref().ok_or(Error::Rpc("No VXI-11 link has been created"))
	}

	fn io_timeout_ms(&self) -> u32 {
		self.io_timeout.as_millis().min(u32::MAX as u128) as u32
	}

	/// Ask the portmapper on `host` where the core channel lives and connect to it.
	pub fn new(host:&str, io_timeout:Duration) -> Result<Self> {
		let mut pmap_client = TcpPortMapperClient::new(host, io_timeout)?;

		let mapping = Mapping {
			program: DEVICE_CORE_PROG,
			version: DEVICE_CORE_VERS,
			port: 0,
		};

		let port:u16 = pmap_client.get_port(&mapping)?;
		Self::connect(host, port, io_timeout)
	}

	/// Connect straight to a core channel whose port is already known.
	pub fn connect(host:&str, port:u16, io_timeout:Duration) -> Result<Self> {
		let mut client = TcpClient::connect((host, port), DEVICE_CORE_PROG, DEVICE_CORE_VERS, io_timeout)?;
		client.set_timeout(io_timeout + SOCKET_TIMEOUT_MARGIN)?;

		Ok(CoreClient{ client, io_timeout, opt_link: None })
	}

	pub fn create_link(&mut self, device:&str) -> Result<()> {
		if self.opt_link.is_some() {
			return Err(Error::Rpc("Already connected to a link"));
		}
		if !device.is_ascii() {
			return Err(Error::InvalidResource(device.to_owned()));
		}

		self.client.start_call(CREATE_LINK);
		xdr_pack::pack_create_link_parms(&mut self.client.packer, CLIENT_ID, false, DEFAULT_LOCK_TIMEOUT_MS, device);
		self.client.do_call()?;

		let error:i32         = self.client.unpacker.unpack_i32()?;
		let link_id:i32       = self.client.unpacker.unpack_i32()?;
		let abort_port:u32    = self.client.unpacker.unpack_u32()?;
		let max_recv_size:u32 = self.client.unpacker.unpack_u32()?;

		check("create_link", error)?;

		let link = Link{ link_id, abort_port: abort_port as u16, max_recv_size };
		debug!("Created VXI-11 link to {}: {:?}", device, link);
		self.opt_link = Some(link);

		Ok(())
	}

	pub fn write(&mut self, data:&[u8]) -> Result<()> {
		let (link_id, max_recv_size) = {
			let link:&Link = self.get_link()?;
			(link.link_id, link.max_recv_size.max(1) as usize)
		};
		let io_timeout:u32 = self.io_timeout_ms();

		// The device advertises how much it will take per call, so big writes go out in pieces
		// and only the last one carries END
		let chunks:Vec<&[u8]> = if data.is_empty() { vec![data] } else { data.chunks(max_recv_size).collect() };
		let n_chunks:usize = chunks.len();

		for (idx, chunk) in chunks.into_iter().enumerate() {
			let flags:i32 = if idx + 1 == n_chunks { OPERATION_FLAGS_END_ONLY } else { OPERATION_FLAGS_NONE };

			self.client.start_call(DEVICE_WRITE);
			xdr_pack::pack_device_write_parms(&mut self.client.packer, link_id, io_timeout, DEFAULT_LOCK_TIMEOUT_MS, flags, chunk);
			self.client.do_call()?;

			let error:i32 = self.client.unpacker.unpack_i32()?;
			let size:u32  = self.client.unpacker.unpack_u32()?;
			check("device_write", error)?;

			if size as usize != chunk.len() {
				return Err(Error::Rpc("Number of bytes in confirmation doesn't match number of bytes sent"));
			}
		}

		Ok(())
	}

	/// Read one complete response, stitching together partial reads until the device sets END.
	pub fn read(&mut self) -> Result<Vec<u8>> {
		let link_id:i32 = self.get_link()?.link_id;
		let io_timeout:u32 = self.io_timeout_ms();
		let mut ans:Vec<u8> = vec![];

		loop {
			self.client.start_call(DEVICE_READ);
			xdr_pack::pack_device_read_parms(&mut self.client.packer, link_id, u32::MAX, io_timeout, DEFAULT_LOCK_TIMEOUT_MS, OPERATION_FLAGS_NONE, 0);
			self.client.do_call()?;

			let error:i32       = self.client.unpacker.unpack_i32()?;
			let reason:i32      = self.client.unpacker.unpack_i32()?;
			let data:Vec<u8>    = self.client.unpacker.unpack_opaque()?;
			check("device_read", error)?;

			ans.extend_from_slice(&data);

			if reason & REASON_END != 0 {
				return Ok(ans);
			} else if reason & (REASON_REQCNT | REASON_CHR) == 0 {
				return Err(Error::Rpc("Expected at least one reason bit to be set in device_read reply"));
			}
		}
	}

	/// IEEE 488.2 status byte, read out of band so it works even while the device is busy.
	pub fn read_status_byte(&mut self) -> Result<u8> {
		let link_id:i32 = self.get_link()?.link_id;
		let io_timeout:u32 = self.io_timeout_ms();

		self.client.start_call(DEVICE_READSTB);
		xdr_pack::pack_device_generic_parms(&mut self.client.packer, link_id, OPERATION_FLAGS_NONE, DEFAULT_LOCK_TIMEOUT_MS, io_timeout);
		self.client.do_call()?;

		let error:i32 = self.client.unpacker.unpack_i32()?;
		let stb:u32   = self.client.unpacker.unpack_u32()?;
		check("device_readstb", error)?;

		Ok(stb as u8)
	}

	/// Device clear: drops pending input/output and aborts whatever the device was parsing.
	pub fn clear(&mut self) -> Result<()> {
		let link_id:i32 = self.get_link()?.link_id;
		let io_timeout:u32 = self.io_timeout_ms();

		self.client.start_call(DEVICE_CLEAR);
		xdr_pack::pack_device_generic_parms(&mut self.client.packer, link_id, OPERATION_FLAGS_NONE, DEFAULT_LOCK_TIMEOUT_MS, io_timeout);
		self.client.do_call()?;

		check("device_clear", self.client.unpacker.unpack_i32()?)
	}

	pub fn destroy_link(&mut self) -> Result<()> {
		let link_id:i32 = self.get_link()?.link_id;

		self.client.start_call(DESTROY_LINK);
		xdr_pack::pack_device_link(&mut self.client.packer, link_id);
		self.client.do_call()?;

		self.opt_link = None;
		check("destroy_link", self.client.unpacker.unpack_i32()?)
	}

}

impl Instrument for CoreClient {

	fn write(&mut self, cmd:&str) -> Result<()> {
		debug!("-> {}", cmd);
		CoreClient::write(self, cmd.as_bytes())
	}

	fn ask(&mut self, cmd:&str) -> Result<String> {
		debug!("-> {}", cmd);
		CoreClient::write(self, cmd.as_bytes())?;
		let mut resp:Vec<u8> = CoreClient::read(self)?;
		while matches!(resp.last(), Some(b'\n') | Some(b'\r')) {
			resp.pop();
		}
		String::from_utf8(resp).map_err(|e| parse_err("a UTF-8 response", &String::from_utf8_lossy(e.as_bytes())))
	}

	fn clear(&mut self) -> Result<()> { CoreClient::clear(self) }

	fn timeout(&self) -> Duration { self.io_timeout }

}

impl Drop for CoreClient {

	fn drop(&mut self) {
		if self.opt_link.is_some() {
			if let Err(e) = self.destroy_link() {
				warn!("Unable to destroy VXI-11 link: {}", e);
			}
		}
	}

}
