
use crate::error::{Error, Result};
use crate::xdr::Unpacker;
use crate::rpc::{REPLY, MSG_DENIED, RPC_MISMATCH, AUTH_ERROR, MSG_ACCEPTED, PROG_UNAVAIL, PROG_MISMATCH, PROC_UNAVAIL, GARBAGE_ARGS, SUCCESS};

/// Consume an RPC reply header and return its xid.  Anything other than an accepted, successful
/// reply is turned into an error.
pub fn unpack_replyheader(unpacker:&mut Unpacker) -> Result<u32> {
	let xid:u32 = unpacker.unpack_u32()?;

	if unpacker.unpack_enum()? != REPLY {
		return Err(Error::Rpc("Expected REPLY message type"));
	}

	match unpacker.unpack_enum()? {
		MSG_ACCEPTED => { },
		MSG_DENIED => {
			return match unpacker.unpack_enum()? {
				RPC_MISMATCH => Err(Error::Rpc("Message denied due to RPC version mismatch")),
				AUTH_ERROR   => Err(Error::Rpc("Message denied due to an authentication error")),
				_            => Err(Error::Rpc("Message denied for an unknown reason")),
			};
		},
		_ => return Err(Error::Rpc("Neither MSG_DENIED nor MSG_ACCEPTED in reply")),
	}

	// Verifier is always AUTH_NONE in practice
	unpacker.unpack_enum()?;
	unpacker.unpack_opaque()?;

	match unpacker.unpack_enum()? {
		SUCCESS       => Ok(xid),
		PROG_UNAVAIL  => Err(Error::Rpc("Program unavailable")),
		PROG_MISMATCH => Err(Error::Rpc("Program version mismatch")),
		PROC_UNAVAIL  => Err(Error::Rpc("Procedure unavailable")),
		GARBAGE_ARGS  => Err(Error::Rpc("Server couldn't decode the call arguments")),
		_             => Err(Error::Rpc("Call failed for an unknown reason")),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::xdr::Packer;

	fn reply(xid:u32, stat:i32) -> Vec<u8> {
		let mut p = Packer::new();
		p.pack_u32(xid);
		p.pack_enum(REPLY);
		p.pack_enum(MSG_ACCEPTED);
		p.pack_enum(0);
		p.pack_opaque(&[]);
		p.pack_enum(stat);
		p.as_bytes().to_vec()
	}

	#[test]
	fn accepted_reply_yields_xid() {
		let mut u = Unpacker::new();
		u.reset(reply(77, SUCCESS));
		assert_eq!(unpack_replyheader(&mut u).unwrap(), 77);
		assert!(u.all_data_consumed());
	}

	#[test]
	fn unavailable_program_is_an_error() {
		let mut u = Unpacker::new();
		u.reset(reply(1, PROG_UNAVAIL));
		assert!(matches!(unpack_replyheader(&mut u), Err(Error::Rpc(_))));
	}
}
