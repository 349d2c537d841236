// Drivers for the two instruments on the bench.  Both sit on top of any `Instrument` session, so
// they work the same over VXI-11, a raw socket, or the scripted loopback used in tests.

pub mod ag33200;
pub mod msox2000;

use log::warn;

use crate::error::Result;
use crate::session::{Identity, Instrument};

/// Identify the device and warn if it isn't the family the driver was written for.
fn check_model<I: Instrument>(session:&mut I, family:&str) -> Result<Identity> {
	let idn:Identity = session.identify()?;
	if !idn.model.to_ascii_uppercase().contains(family) {
		warn!("Expected a {} but connected to {}; carrying on anyway", family, idn);
	}
	Ok(idn)
}
