
// XDR (RFC 4506) encoding for the handful of types VXI-11 needs.  Everything is big-endian and
// padded out to four-byte boundaries.

use std::io::Cursor;

use byteorder::{BigEndian, WriteBytesExt, ReadBytesExt};

use crate::error::{Error, Result};

fn padding(n:usize) -> usize { (4 - n % 4) % 4 }

#[derive(Default)]
pub struct Packer {
	buff: Vec<u8>,
}

impl Packer {

	pub fn new() -> Self { Self::default() }

	pub fn reset(&mut self) { self.buff.clear(); }

	pub fn as_bytes(&self) -> &[u8] { &self.buff }

	// Writing into a Vec can't fail, so the byteorder results are discarded
	pub fn pack_u32(&mut self, x:u32) { let _ = self.buff.write_u32::<BigEndian>(x); }
	pub fn pack_i32(&mut self, x:i32) { let _ = self.buff.write_i32::<BigEndian>(x); }
	pub fn pack_bool(&mut self, b:bool) { self.pack_i32(if b { 1 } else { 0 }) }
	pub fn pack_enum(&mut self, x:i32) { self.pack_i32(x) }

	pub fn pack_opaque(&mut self, data:&[u8]) {
		self.pack_u32(data.len() as u32);
		self.buff.extend_from_slice(data);
		self.buff.resize(self.buff.len() + padding(data.len()), 0);
	}

	pub fn pack_string(&mut self, s:&str) { self.pack_opaque(s.as_bytes()) }

}

#[derive(Default)]
pub struct Unpacker {
	rdr: Cursor<Vec<u8>>,
}

impl Unpacker {

	pub fn new() -> Self { Self::default() }

	pub fn reset(&mut self, data:Vec<u8>) { self.rdr = Cursor::new(data); }

	fn remaining(&self) -> usize {
		self.rdr.get_ref().len().saturating_sub(self.rdr.position() as usize)
	}

	pub fn all_data_consumed(&self) -> bool { self.remaining() == 0 }

	pub fn unpack_u32(&mut self) -> Result<u32> {
		self.rdr.read_u32::<BigEndian>().map_err(|_| Error::Rpc("Reply ended in the middle of an integer"))
	}

	pub fn unpack_i32(&mut self) -> Result<i32> {
		self.rdr.read_i32::<BigEndian>().map_err(|_| Error::Rpc("Reply ended in the middle of an integer"))
	}

	// The set of valid discriminants depends on the caller, so at this level an enum is just an i32
	pub fn unpack_enum(&mut self) -> Result<i32> { self.unpack_i32() }

	pub fn unpack_bool(&mut self) -> Result<bool> {
		match self.unpack_i32()? {
			0 => Ok(false),
			1 => Ok(true),
			_ => Err(Error::Rpc("Expected 0 or 1 for an XDR bool")),
		}
	}

	pub fn unpack_opaque(&mut self) -> Result<Vec<u8>> {
		let n:usize = self.unpack_u32()? as usize;
		if n + padding(n) > self.remaining() {
			return Err(Error::Rpc("Opaque length runs past the end of the reply"));
		}

		let start:usize = self.rdr.position() as usize;
		let ans:Vec<u8> = self.rdr.get_ref()[start..start+n].to_vec();
		self.rdr.set_position((start + n + padding(n)) as u64);
		Ok(ans)
	}

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn opaque_is_padded_to_four_bytes() {
		let mut p = Packer::new();
		p.pack_opaque(b"inst0");
		assert_eq!(p.as_bytes(), &[0, 0, 0, 5, b'i', b'n', b's', b't', b'0', 0, 0, 0]);
	}

	#[test]
	fn unpacker_reads_back_mixed_fields() {
		let mut p = Packer::new();
		p.pack_i32(-7);
		p.pack_bool(true);
		p.pack_string("*IDN?");
		p.pack_u32(42);

		let mut u = Unpacker::new();
		u.reset(p.as_bytes().to_vec());
		assert_eq!(u.unpack_i32().unwrap(), -7);
		assert!(u.unpack_bool().unwrap());
		assert_eq!(u.unpack_opaque().unwrap(), b"*IDN?".to_vec());
		assert_eq!(u.unpack_u32().unwrap(), 42);
		assert!(u.all_data_consumed());
	}

	#[test]
	fn truncated_opaque_is_an_error() {
		let mut u = Unpacker::new();
		u.reset(vec![0, 0, 0, 9, 1, 2, 3]);
		assert!(u.unpack_opaque().is_err());
	}
}
