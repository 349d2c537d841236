//! Naming and writing of capture files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::waveform::WaveformRecord;

/// The instrument settings a capture was taken with.  These end up in the file name.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CaptureSettings {
	pub time_scale: f64,
	pub time_delay: f64,
	pub record_length: u64,
	pub amplitude: f64,
	pub frequency: f64,
}

// At most three decimals, no trailing zeros, no negative zero
fn trimmed(x:f64) -> String {
	let s:String = format!("{:.3}", x);
	let s:&str = s.trim_end_matches('0').trim_end_matches('.');
	match s {
		"-0" | "" => "0".to_owned(),
		_ => s.to_owned(),
	}
}

// Value as it will be printed, so the unit is picked after rounding
fn rounded(x:f64) -> f64 {
	format!("{:.3}", x).parse::<f64>().unwrap_or(x)
}

// `units` runs largest first; the last one takes whatever is left
fn with_unit(x:f64, units:&[(f64, &str)]) -> String {
	for (idx, (scale, suffix)) in units.iter().enumerate() {
		if idx + 1 == units.len() || rounded(x.abs() / scale) >= 1.0 {
			return format!("{}{}", trimmed(x / scale), suffix);
		}
	}
	trimmed(x)
}

fn time_with_unit(t:f64) -> String {
	with_unit(t, &[(1.0, "s"), (1e-3, "ms"), (1e-6, "us"), (1e-9, "ns")])
}

fn samples_with_unit(n:u64) -> String {
	if n < 1_000 { return format!("{}sa", n); }
	with_unit(n as f64, &[(1e6, "Msa"), (1e3, "Ksa")])
}

fn freq_with_unit(f:f64) -> String {
	with_unit(f, &[(1e6, "MHz"), (1e3, "kHz"), (1.0, "Hz")])
}

/// `<date>_TS_<scale>_TD_<delay>_RL_<length>_A_<amp>V_F_<freq>.csv`
pub fn file_name(settings:&CaptureSettings, date:NaiveDate) -> String {
	format!("{}_TS_{}_TD_{}_RL_{}_A_{}V_F_{}.csv",
		date.format("%Y-%m-%d"),
		time_with_unit(settings.time_scale),
		time_with_unit(settings.time_delay),
		samples_with_unit(settings.record_length),
		trimmed(settings.amplitude),
		freq_with_unit(settings.frequency),
	)
}

/// Scientific notation with six decimals and a signed two-digit exponent, e.g. `-5.000000e-05`.
pub fn sci(x:f64) -> String {
	let s:String = format!("{:.6e}", x);
	match s.split_once('e') {
		Some((mantissa, exp)) => match exp.parse::<i32>() {
			Ok(e) => format!("{}e{}{:02}", mantissa, if e < 0 { '-' } else { '+' }, e.abs()),
			Err(_) => s.clone(),
		},
		// inf and NaN have no exponent
		None => s.clone(),
	}
}

/// Two header rows (column names, then units) followed by one `time,sample` row per point.
pub fn write_csv(path:&Path, label:&str, record:&WaveformRecord) -> Result<()> {
	let mut wtr = csv::Writer::from_path(path)?;

	wtr.write_record(["x-axis", label])?;
	wtr.write_record(["second", ""])?;
	for (t, sample) in record.iter() {
		wtr.write_record([sci(t), sample.to_string()])?;
	}

	wtr.flush()?;
	Ok(())
}

/// Write `record` into `dir` under the descriptive name, creating `dir` if needed.
pub fn save(dir:&Path, settings:&CaptureSettings, date:NaiveDate, label:&str, record:&WaveformRecord) -> Result<PathBuf> {
	fs::create_dir_all(dir)?;

	let path:PathBuf = dir.join(file_name(settings, date));
	write_csv(&path, label, record)?;

	info!("Saved {} with {} samples", path.display(), record.len());
	Ok(path)
}
