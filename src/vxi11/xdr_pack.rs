
use crate::xdr::Packer;

pub fn pack_device_link(packer:&mut Packer, link:i32) {
	packer.pack_i32(link);
}

pub fn pack_create_link_parms(packer:&mut Packer, id:i32, lock_device:bool, lock_timeout:u32, device:&str) {
	packer.pack_i32(id);
	packer.pack_bool(lock_device);
	packer.pack_u32(lock_timeout);
	packer.pack_string(device);
}

pub fn pack_device_write_parms(packer:&mut Packer, link:i32, io_timeout:u32, lock_timeout:u32, flags:i32, data:&[u8]) {
	packer.pack_i32(link);
	packer.pack_u32(io_timeout);
	packer.pack_u32(lock_timeout);
	packer.pack_i32(flags);
	packer.pack_opaque(data);
}

pub fn pack_device_read_parms(packer:&mut Packer, link:i32, request_size:u32, io_timeout:u32, lock_timeout:u32, flags:i32, term_char:i32) {
	packer.pack_i32(link);
	packer.pack_u32(request_size);
	packer.pack_u32(io_timeout);
	packer.pack_u32(lock_timeout);
	packer.pack_i32(flags);
	packer.pack_i32(term_char);
}

pub fn pack_device_generic_parms(packer:&mut Packer, link:i32, flags:i32, lock_timeout:u32, io_timeout:u32) {
	packer.pack_i32(link);
	packer.pack_i32(flags);
	packer.pack_u32(lock_timeout);
	packer.pack_u32(io_timeout);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn write_parms_layout() {
		let mut p = Packer::new();
		pack_device_write_parms(&mut p, 1, 2000, 10000, 8, b"*IDN?");

		let bytes:&[u8] = p.as_bytes();
		assert_eq!(bytes.len(), 4*5 + 8);
		assert_eq!(&bytes[12..16], &[0, 0, 0, 8]);
		assert_eq!(&bytes[16..20], &[0, 0, 0, 5]);
		assert_eq!(&bytes[20..25], b"*IDN?");
	}
}
