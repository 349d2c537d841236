//! One complete capture: drive the generator, take a single-shot digital acquisition, write the
//! CSV and pass it to the plotter.

use std::path::PathBuf;

use chrono::NaiveDate;
use log::info;
use serde::Serialize;

use crate::config::Conf;
use crate::devices::ag33200::AG33200;
use crate::devices::msox2000::MSOX2000;
use crate::error::Result;
use crate::export::{self, CaptureSettings};
use crate::plot::{self, PlotOutcome};
use crate::session::Instrument;
use crate::waveform::WaveformRecord;

#[derive(Debug, Serialize)]
pub struct CaptureReport {
	pub path: PathBuf,
	pub settings: CaptureSettings,
	pub samples: usize,
	/// What the generator reported back after programming
	pub amplitude_readback: f64,
	#[serde(skip)]
	pub plot: PlotOutcome,
}

/// Run the whole sequence.  The generator goes first so a rejected amplitude stops everything
/// before the scope is armed.  A failing plotter doesn't fail the capture.
pub fn run<S, G>(scope:&mut MSOX2000<S>, fgen:&mut AG33200<G>, conf:&Conf, date:NaiveDate) -> Result<CaptureReport>
	where S: Instrument, G: Instrument
{
	let settings:CaptureSettings = conf.capture_settings();

	let amplitude_readback:f64 = fgen.configure(
		conf.generator.waveform,
		conf.generator.amplitude,
		conf.generator.frequency,
		&conf.amplitude_limits())?;

	scope.configure(conf.scope.source, settings.time_scale, settings.time_delay, settings.record_length)?;
	scope.arm_single()?;
	info!("Armed single acquisition on {}", conf.scope.source);
	scope.wait_for_acquisition(conf.acquisition_timeout(), conf.poll_interval())?;

	let record:WaveformRecord = scope.fetch_waveform()?;
	let path:PathBuf = export::save(&conf.output.save_path, &settings, date, conf.scope.source.label(), &record)?;

	let plot:PlotOutcome = plot::hand_off(&conf.output.plot_command, &path);

	Ok(CaptureReport{ path, settings, samples: record.len(), amplitude_readback, plot })
}
