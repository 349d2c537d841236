
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use scopecap::capture;
use scopecap::config::{Conf, GeneratorConf, InstrumentConf, OutputConf, ScopeConf};
use scopecap::devices::ag33200::{AG33200, Function};
use scopecap::devices::msox2000::{MSOX2000, WaveformSource};
use scopecap::loopback::Loopback;
use scopecap::plot::PlotOutcome;
use scopecap::Error;

const SCOPE_IDN:&str = "AGILENT TECHNOLOGIES,MSO-X 2024A,MY12345678,02.41.2015102200";
const FGEN_IDN:&str  = "Agilent Technologies,33220A,MY44012345,2.02-2.02-22-2";

fn conf(save_path:&Path, amplitude:f64) -> Conf {
	Conf {
		instruments: InstrumentConf {
			scope: "TCPIP::192.168.1.10::INSTR".to_owned(),
			generator: "TCPIP::192.168.1.11::5025::SOCKET".to_owned(),
			timeout_ms: 1000,
		},
		generator: GeneratorConf {
			waveform: Function::Sin,
			amplitude,
			frequency: 1e6,
			max_amplitude: 0.5,
			amplitude_tolerance: 0.001,
		},
		scope: ScopeConf {
			source: WaveformSource::Pod1,
			time_scale: 50e-6,
			time_delay: 0.0,
			record_length: 50000,
			poll_interval_ms: 1,
			acquisition_timeout_ms: 50,
		},
		output: OutputConf {
			save_path: save_path.to_path_buf(),
			plot_command: vec![],
		},
	}
}

fn scope() -> MSOX2000<Loopback> {
	let lb = Loopback::new()
		.respond("*IDN?", SCOPE_IDN)
		.respond_once(":OPERegister:CONDition?", "+0")
		.respond_once(":OPERegister:CONDition?", "+0")
		.respond(":OPERegister:CONDition?", "+8")
		.respond(":WAVeform:PREamble?", "+4,+0,+3,+1,+1.00000000E-06,-5.00000000E-05,+0,+1.00000000E+00,+0.0E+00,+0")
		.respond(":WAVeform:DATA?", "#800000009 0,255,17\n");
	MSOX2000::new(lb).unwrap()
}

fn fgen(readback:&str) -> AG33200<Loopback> {
	let lb = Loopback::new()
		.respond("*IDN?", FGEN_IDN)
		.respond("VOLTage?", readback);
	AG33200::new(lb).unwrap()
}

fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() }

#[test]
fn full_capture_writes_csv() {
	let dir = tempfile::tempdir().unwrap();
	let conf = conf(dir.path(), 0.25);
	let mut scope = scope();
	let mut fgen = fgen("+2.500000000000000E-01");

	let report = capture::run(&mut scope, &mut fgen, &conf, date()).unwrap();

	let expected:PathBuf = dir.path().join("2024-01-01_TS_50us_TD_0ns_RL_50Ksa_A_0.25V_F_1MHz.csv");
	assert_eq!(report.path, expected);
	assert_eq!(report.samples, 3);
	assert_eq!(report.plot, PlotOutcome::Skipped);
	assert!((report.amplitude_readback - 0.25).abs() < 1e-12);

	let text = std::fs::read_to_string(&expected).unwrap();
	assert_eq!(text.lines().collect::<Vec<_>>(), vec![
		"x-axis,D0-D7",
		"second,",
		"-5.000000e-05,0",
		"-4.900000e-05,255",
		"-4.800000e-05,17",
	]);

	// Output goes off before programming and only comes back on after the readback check
	let g = fgen.session();
	let off = g.position("OUTPut OFF").unwrap();
	let volt = g.position("VOLTage 0.25").unwrap();
	let readback = g.position("VOLTage?").unwrap();
	let on = g.position("OUTPut ON").unwrap();
	assert!(off < volt && volt < readback && readback < on);
	assert!(g.was_sent("FUNCtion SIN"));
	assert!(g.was_sent("FREQuency 1000000"));

	// Scope is configured before arming and only read out after the done bit showed up
	let s = scope.session();
	let source = s.position(":WAVeform:SOURce POD1").unwrap();
	let single = s.position(":SINGle").unwrap();
	let preamble = s.position(":WAVeform:PREamble?").unwrap();
	assert!(s.was_sent(":WAVeform:FORMat ASCii"));
	assert!(s.was_sent(":WAVeform:POINts 50000"));
	assert!(source < single && single < preamble);
	assert_eq!(s.sent().iter().filter(|c| *c == ":OPERegister:CONDition?").count(), 3);
}

#[test]
fn amplitude_over_ceiling_sends_nothing() {
	let dir = tempfile::tempdir().unwrap();
	let conf = conf(dir.path(), 0.6);
	let mut scope = scope();
	let mut fgen = fgen("+6.000000000000000E-01");

	let res = capture::run(&mut scope, &mut fgen, &conf, date());
	assert!(matches!(res, Err(Error::AmplitudeLimit{ .. })));

	// Only the identification query made it out of either driver
	assert_eq!(fgen.session().sent(), &["*IDN?".to_owned()]);
	assert_eq!(scope.session().sent(), &["*IDN?".to_owned()]);
	assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn readback_mismatch_leaves_output_off() {
	let dir = tempfile::tempdir().unwrap();
	let conf = conf(dir.path(), 0.25);
	let mut scope = scope();
	let mut fgen = fgen("+1.000000000000000E-01");

	let res = capture::run(&mut scope, &mut fgen, &conf, date());
	assert!(matches!(res, Err(Error::AmplitudeMismatch{ .. })));

	assert!(fgen.session().was_sent("OUTPut OFF"));
	assert!(!fgen.session().was_sent("OUTPut ON"));
	assert!(!scope.session().was_sent(":SINGle"));
}

#[test]
fn acquisition_that_never_finishes_times_out() {
	let dir = tempfile::tempdir().unwrap();
	let conf = conf(dir.path(), 0.25);
	let lb = Loopback::new()
		.respond("*IDN?", SCOPE_IDN)
		.respond(":OPERegister:CONDition?", "+0");
	let mut scope = MSOX2000::new(lb).unwrap();
	let mut fgen = fgen("0.25");

	let res = capture::run(&mut scope, &mut fgen, &conf, date());
	assert!(matches!(res, Err(Error::Timeout(..))));
	assert!(!scope.session().was_sent(":WAVeform:DATA?"));
	assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[cfg(unix)]
#[test]
fn plotter_failure_does_not_fail_capture() {
	let dir = tempfile::tempdir().unwrap();
	let mut conf = conf(&dir.path().join("Data"), 0.25);
	conf.output.plot_command = vec!["false".to_owned()];
	let mut scope = scope();
	let mut fgen = fgen("0.25");

	let report = capture::run(&mut scope, &mut fgen, &conf, date()).unwrap();
	assert!(matches!(report.plot, PlotOutcome::Failed(_)));
	assert!(report.path.exists());
}
