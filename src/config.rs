
use std::path::{Path, PathBuf};
use std::time::Duration;

use confique::Config;

use crate::devices::ag33200::{AmplitudeLimits, Function};
use crate::devices::msox2000::WaveformSource;
use crate::export::CaptureSettings;

/// Bench setup for one capture run, normally read from `scopecap.toml`.
#[derive(Config, Debug, Clone)]
pub struct Conf {
	#[config(nested)]
	pub instruments: InstrumentConf,
	#[config(nested)]
	pub generator: GeneratorConf,
	#[config(nested)]
	pub scope: ScopeConf,
	#[config(nested)]
	pub output: OutputConf,
}

#[derive(Config, Debug, Clone)]
pub struct InstrumentConf {
	/// VISA-style resource string, e.g. `TCPIP::192.168.1.10::INSTR`
	#[config(env = "SCOPECAP_SCOPE")]
	pub scope: String,
	#[config(env = "SCOPECAP_GENERATOR")]
	pub generator: String,
	#[config(default = 10000)]
	pub timeout_ms: u64,
}

#[derive(Config, Debug, Clone)]
pub struct GeneratorConf {
	#[config(default = "SIN")]
	pub waveform: Function,
	pub amplitude: f64,
	pub frequency: f64,
	#[config(default = 0.5)]
	pub max_amplitude: f64,
	#[config(default = 0.001)]
	pub amplitude_tolerance: f64,
}

#[derive(Config, Debug, Clone)]
pub struct ScopeConf {
	#[config(default = "POD1")]
	pub source: WaveformSource,
	pub time_scale: f64,
	#[config(default = 0.0)]
	pub time_delay: f64,
	pub record_length: u64,
	#[config(default = 100)]
	pub poll_interval_ms: u64,
	#[config(default = 30000)]
	pub acquisition_timeout_ms: u64,
}

#[derive(Config, Debug, Clone)]
pub struct OutputConf {
	#[config(default = "Data")]
	pub save_path: PathBuf,
	/// Program and leading arguments; the CSV path is appended.  Empty disables the handoff.
	#[config(default = [])]
	pub plot_command: Vec<String>,
}

impl Conf {

	/// Environment first, then the file.  A missing file is fine as long as the environment
	/// covers the required fields.
	pub fn load(path:&Path) -> Result<Self, confique::Error> {
		Conf::builder().env().file(path).load()
	}

	pub fn io_timeout(&self) -> Duration { Duration::from_millis(self.instruments.timeout_ms) }

	pub fn poll_interval(&self) -> Duration { Duration::from_millis(self.scope.poll_interval_ms) }

	pub fn acquisition_timeout(&self) -> Duration { Duration::from_millis(self.scope.acquisition_timeout_ms) }

	pub fn amplitude_limits(&self) -> AmplitudeLimits {
		AmplitudeLimits{ max_v: self.generator.max_amplitude, tolerance_v: self.generator.amplitude_tolerance }
	}

	pub fn capture_settings(&self) -> CaptureSettings {
		CaptureSettings {
			time_scale:    self.scope.time_scale,
			time_delay:    self.scope.time_delay,
			record_length: self.scope.record_length,
			amplitude:     self.generator.amplitude,
			frequency:     self.generator.frequency,
		}
	}

}
