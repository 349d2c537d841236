
use crate::xdr::Packer;
use crate::rpc::{CALL, RPCVERSION};

const AUTH_NONE:i32 = 0;

pub fn pack_auth_none(packer:&mut Packer) {
	packer.pack_enum(AUTH_NONE);
	packer.pack_opaque(&[]);
}

pub fn pack_callheader(packer:&mut Packer, xid:u32, prog:u32, vers:u32, prc:u32) {
	packer.pack_u32(xid);
	packer.pack_enum(CALL);
	packer.pack_u32(RPCVERSION);
	packer.pack_u32(prog);
	packer.pack_u32(vers);
	packer.pack_u32(prc);
	pack_auth_none(packer);     // credentials
	pack_auth_none(packer);     // verifier
}

pub fn pack_mapping(packer:&mut Packer, prog:u32, vers:u32, prot:u32, port:u32) {
	packer.pack_u32(prog);
	packer.pack_u32(vers);
	packer.pack_u32(prot);
	packer.pack_u32(port);
}
