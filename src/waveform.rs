
use serde::{Serialize, Deserialize};

use crate::error::{parse_err, Result};

/// `:WAVeform:PREamble?` fields, in the order the scope sends them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preamble {
	pub format: i32,            // 0 BYTE, 1 WORD, 4 ASCii
	pub acquire_type: i32,      // 0 normal, 1 peak detect, 2 average, 3 high resolution
	pub points: u64,
	pub count: u64,
	pub x_increment: f64,
	pub x_origin: f64,
	pub x_reference: f64,
	pub y_increment: f64,
	pub y_origin: f64,
	pub y_reference: f64,
}

impl Preamble {

	pub fn parse(resp:&str) -> Result<Self> {
		let fields:Vec<&str> = resp.trim().split(',').map(str::trim).collect();
		if fields.len() != 10 {
			return Err(parse_err("a 10-field waveform preamble", resp));
		}

		// Integer fields sometimes come back in float notation
		let int = |i:usize| fields[i].parse::<f64>().map_err(|_| parse_err("an integer preamble field", resp));
		let float = |i:usize| fields[i].parse::<f64>().map_err(|_| parse_err("a float preamble field", resp));

		Ok(Self {
			format:       int(0)? as i32,
			acquire_type: int(1)? as i32,
			points:       int(2)? as u64,
			count:        int(3)? as u64,
			x_increment:  float(4)?,
			x_origin:     float(5)?,
			x_reference:  float(6)?,
			y_increment:  float(7)?,
			y_origin:     float(8)?,
			y_reference:  float(9)?,
		})
	}

}

/// Decoded samples with their time axis.  `times` and `samples` always have the same length.
#[derive(Debug, Clone, Serialize)]
pub struct WaveformRecord {
	times: Vec<f64>,
	samples: Vec<u32>,
}

impl WaveformRecord {

	pub fn new(x_increment:f64, x_origin:f64, samples:Vec<u32>) -> Self {
		let times:Vec<f64> = time_axis(x_increment, x_origin, samples.len());
		Self{ times, samples }
	}

	pub fn from_preamble(preamble:&Preamble, samples:Vec<u32>) -> Self {
		Self::new(preamble.x_increment, preamble.x_origin, samples)
	}

	pub fn times(&self) -> &[f64] { &self.times }
	pub fn samples(&self) -> &[u32] { &self.samples }
	pub fn len(&self) -> usize { self.samples.len() }
	pub fn is_empty(&self) -> bool { self.samples.is_empty() }

	pub fn iter(&self) -> impl Iterator<Item=(f64, u32)> + '_ {
		self.times.iter().copied().zip(self.samples.iter().copied())
	}

}

// Computed from the index rather than accumulated so rounding error doesn't build up
pub fn time_axis(x_increment:f64, x_origin:f64, n:usize) -> Vec<f64> {
	(0..n).map(|i| x_origin + (i as f64) * x_increment).collect()
}
