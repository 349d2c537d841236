
use std::fmt;
use std::time::Duration;

use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::poll::poll_until;
use crate::scpi::{parse_register, parse_samples, strip_block_header};
use crate::session::{Identity, Instrument};
use crate::waveform::{Preamble, WaveformRecord};

pub const MODEL_FAMILY:&str = "X 20";

// :OPERegister:CONDition? bit that goes high once the single acquisition has finished
pub const OPER_ACQ_DONE:u32 = 0x8;

/// Keysight/Agilent InfiniiVision MSO-X/DSO-X 2000A oscilloscope.
pub struct MSOX2000<I: Instrument> {
	session: I,
	pub identity: Identity,
}

/// Digital pods are the only sources that come back as plain integers in ASCii format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WaveformSource {
	Pod1,
	Pod2,
}

impl WaveformSource {

	pub fn scpi(&self) -> &'static str {
		match self {
			WaveformSource::Pod1 => "POD1",
			WaveformSource::Pod2 => "POD2",
		}
	}

	/// Which digital lines the pod covers, used as the CSV column heading.
	pub fn label(&self) -> &'static str {
		match self {
			WaveformSource::Pod1 => "D0-D7",
			WaveformSource::Pod2 => "D8-D15",
		}
	}

}

impl fmt::Display for WaveformSource {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result { f.write_str(self.scpi()) }
}

impl<I: Instrument> MSOX2000<I> {

	pub fn new(mut session:I) -> Result<Self> {
		let identity:Identity = super::check_model(&mut session, MODEL_FAMILY)?;
		Ok(Self{ session, identity })
	}

	pub fn set_waveform_source(&mut self, src:WaveformSource) -> Result<()> {
		self.session.write(&format!(":WAVeform:SOURce {}", src.scpi()))
	}

	pub fn set_ascii_format(&mut self) -> Result<()> {
		self.session.write(":WAVeform:FORMat ASCii")
	}

	pub fn set_time_scale(&mut self, sec_per_div:f64) -> Result<()> {
		self.session.write(&format!(":TIMebase:SCALe {:E}", sec_per_div))
	}

	pub fn set_time_position(&mut self, delay_sec:f64) -> Result<()> {
		self.session.write(&format!(":TIMebase:POSition {:E}", delay_sec))
	}

	pub fn set_record_length(&mut self, points:u64) -> Result<()> {
		self.session.write(&format!(":WAVeform:POINts {}", points))
	}

	/// Everything that has to be in place before arming.
	pub fn configure(&mut self, src:WaveformSource, time_scale:f64, time_delay:f64, record_length:u64) -> Result<()> {
		self.set_waveform_source(src)?;
		self.set_ascii_format()?;
		self.set_time_scale(time_scale)?;
		self.set_time_position(time_delay)?;
		self.set_record_length(record_length)?;

		debug!("Scope configured: {} {} s/div, delay {} s, {} points", src, time_scale, time_delay, record_length);
		Ok(())
	}

	pub fn arm_single(&mut self) -> Result<()> {
		self.session.write(":SINGle")
	}

	pub fn acquisition_done(&mut self) -> Result<bool> {
		let res:String = self.session.ask(":OPERegister:CONDition?")?;
		Ok(parse_register(&res, "operation status register")? & OPER_ACQ_DONE != 0)
	}

	pub fn wait_for_acquisition(&mut self, timeout:Duration, interval:Duration) -> Result<()> {
		let probes:u32 = poll_until(timeout, interval, "the single acquisition to complete", || self.acquisition_done())?;
		info!("Acquisition complete after {} status polls", probes);
		Ok(())
	}

	pub fn get_preamble(&mut self) -> Result<Preamble> {
		let res:String = self.session.ask(":WAVeform:PREamble?")?;
		Preamble::parse(&res)
	}

	pub fn get_samples(&mut self) -> Result<Vec<u32>> {
		let res:String = self.session.ask(":WAVeform:DATA?")?;
		Ok(parse_samples(strip_block_header(&res)?))
	}

	pub fn fetch_waveform(&mut self) -> Result<WaveformRecord> {
		let preamble:Preamble = self.get_preamble()?;
		debug!("Preamble: x_increment={} x_origin={} points={}", preamble.x_increment, preamble.x_origin, preamble.points);

		let samples:Vec<u32> = self.get_samples()?;
		info!("Fetched {} samples", samples.len());

		Ok(WaveformRecord::from_preamble(&preamble, samples))
	}

	pub fn session(&self) -> &I { &self.session }

}
