
use std::fmt;

use log::info;
use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::scpi::parse_f64;
use crate::session::{Identity, Instrument};

pub const MODEL_FAMILY:&str = "332";

/// Agilent/Keysight 33200-series function generator.
pub struct AG33200<I: Instrument> {
	session: I,
	pub identity: Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Function {
	Sin,
	Squ,
	Ramp,
	Puls,
	Nois,
	Dc,
}

impl Function {
	pub fn scpi(&self) -> &'static str {
		match self {
			Function::Sin  => "SIN",
			Function::Squ  => "SQU",
			Function::Ramp => "RAMP",
			Function::Puls => "PULS",
			Function::Nois => "NOIS",
			Function::Dc   => "DC",
		}
	}
}

impl fmt::Display for Function {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result { f.write_str(self.scpi()) }
}

/// Bounds on what the generator is allowed to put out.
#[derive(Debug, Clone, Copy)]
pub struct AmplitudeLimits {
	pub max_v: f64,
	pub tolerance_v: f64,
}

impl AmplitudeLimits {

	/// Reject a request before anything gets sent to the instrument.
	pub fn check_requested(&self, amp_v:f64) -> Result<()> {
		if amp_v.is_finite() && amp_v > 0.0 && amp_v <= self.max_v { Ok(()) }
		else { Err(Error::AmplitudeLimit{ requested: amp_v, max: self.max_v }) }
	}

	/// The instrument rounds to its own resolution, so the readback only has to be close.  It
	/// still has to respect the ceiling.
	pub fn check_readback(&self, requested:f64, actual:f64) -> Result<()> {
		if actual > self.max_v {
			return Err(Error::AmplitudeLimit{ requested: actual, max: self.max_v });
		}
		if (actual - requested).abs() <= self.tolerance_v { Ok(()) }
		else { Err(Error::AmplitudeMismatch{ requested, actual, tolerance: self.tolerance_v }) }
	}

}

impl<I: Instrument> AG33200<I> {

	pub fn new(mut session:I) -> Result<Self> {
		let identity:Identity = super::check_model(&mut session, MODEL_FAMILY)?;
		Ok(Self{ session, identity })
	}

	pub fn set_output(&mut self, on:bool) -> Result<()> {
		self.session.write(if on { "OUTPut ON" } else { "OUTPut OFF" })
	}

	pub fn set_function(&mut self, func:Function) -> Result<()> {
		self.session.write(&format!("FUNCtion {}", func.scpi()))
	}

	pub fn set_amplitude(&mut self, amp_v:f64) -> Result<()> {
		self.session.write(&format!("VOLTage {}", amp_v))
	}

	pub fn get_amplitude(&mut self) -> Result<f64> {
		let res:String = self.session.ask("VOLTage?")?;
		parse_f64(&res, "amplitude readback")
	}

	pub fn set_frequency(&mut self, freq_hz:f64) -> Result<()> {
		self.session.write(&format!("FREQuency {}", freq_hz))
	}

	/// Output off, program the waveform, confirm the amplitude stuck, output back on.  Output
	/// stays off if any step fails.  Returns the amplitude the instrument reported.
	pub fn configure(&mut self, func:Function, amp_v:f64, freq_hz:f64, limits:&AmplitudeLimits) -> Result<f64> {
		limits.check_requested(amp_v)?;

		self.set_output(false)?;
		self.set_function(func)?;
		self.set_amplitude(amp_v)?;
		self.set_frequency(freq_hz)?;

		let actual:f64 = self.get_amplitude()?;
		limits.check_readback(amp_v, actual)?;

		self.set_output(true)?;
		info!("Generator output on: {} {} V @ {} Hz", func, actual, freq_hz);

		Ok(actual)
	}

	pub fn session(&self) -> &I { &self.session }

}

#[cfg(test)]
mod tests {
	use super::*;

	const LIMITS:AmplitudeLimits = AmplitudeLimits{ max_v: 0.5, tolerance_v: 1e-3 };

	#[test]
	fn requested_amplitude_ceiling() {
		assert!(LIMITS.check_requested(0.25).is_ok());
		assert!(LIMITS.check_requested(0.5).is_ok());
		assert!(matches!(LIMITS.check_requested(0.6), Err(Error::AmplitudeLimit{ .. })));
		assert!(LIMITS.check_requested(0.0).is_err());
		assert!(LIMITS.check_requested(-0.1).is_err());
		assert!(LIMITS.check_requested(f64::NAN).is_err());
	}

	#[test]
	fn readback_tolerance() {
		assert!(LIMITS.check_readback(0.25, 0.2500001).is_ok());
		assert!(matches!(LIMITS.check_readback(0.25, 0.3), Err(Error::AmplitudeMismatch{ .. })));
		assert!(matches!(LIMITS.check_readback(0.5, 0.5004), Err(Error::AmplitudeLimit{ .. })));
	}

	#[test]
	fn function_names_deserialize_from_scpi_mnemonics() {
		let f:Function = serde_json::from_str("\"SQU\"").unwrap();
		assert_eq!(f, Function::Squ);
		assert_eq!(Function::Dc.to_string(), "DC");
	}
}
