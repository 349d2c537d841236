
pub const PMAP_PROG:u32 = 100000;
pub const PMAP_VERS:u32 = 2;
pub const PMAP_PORT:u16 = 111;

pub const PMAPPROC_GETPORT:u32 = 3;     // (mapping) -> unsigned int

use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use super::IPPROTO_TCP;
use super::xdr_pack;
use super::tcp_clients::TcpClient;

#[derive(Debug)]
pub struct Mapping {
	pub program: u32,
	pub version: u32,
	pub port: u32,				// XDR encodes this as a u32 even though ports only need 16 bits
}

pub struct TcpPortMapperClient {
	tcp_client: TcpClient,
}

impl TcpPortMapperClient {

	pub fn new(host:&str, timeout:Duration) -> Result<Self> {
		let tcp_client = TcpClient::connect((host, PMAP_PORT), PMAP_PROG, PMAP_VERS, timeout)?;
		Ok(Self{ tcp_client })
	}

	/// Look up the TCP port a program is listening on.  Zero means it isn't registered.
	pub fn get_port(&mut self, m:&Mapping) -> Result<u16> {
		self.tcp_client.start_call(PMAPPROC_GETPORT);
		xdr_pack::pack_mapping(&mut self.tcp_client.packer, m.program, m.version, IPPROTO_TCP, m.port);
		self.tcp_client.do_call()?;

		let ans:u32 = self.tcp_client.unpacker.unpack_u32()?;
		if !self.tcp_client.unpacker.all_data_consumed() {
			return Err(Error::Rpc("Data unexpectedly left over after unpacking port"));
		}

		debug!("Portmapper reports program {:#x} v{} on TCP port {}", m.program, m.version, ans);

		match ans {
			0                       => Err(Error::Rpc("Program isn't registered with the portmapper")),
			p if p <= u16::MAX as u32 => Ok(p as u16),
			_                       => Err(Error::Rpc("Portmapper returned a port outside the u16 range")),
		}
	}

}
