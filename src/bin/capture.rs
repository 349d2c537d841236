
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use log::{info, warn};

use scopecap::capture::{self, CaptureReport};
use scopecap::config::Conf;
use scopecap::devices::ag33200::AG33200;
use scopecap::devices::msox2000::MSOX2000;
use scopecap::plot::PlotOutcome;
use scopecap::session::{self, Instrument, Resource};

/// Program the function generator, take one single-shot digital capture, save it as CSV, and
/// hand the file to the plotter.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// TOML bench configuration
	#[arg(short, long, default_value = "scopecap.toml")]
	config: PathBuf,

	/// Scope resource string, overrides the config
	#[arg(long)]
	scope: Option<String>,

	/// Generator resource string, overrides the config
	#[arg(long)]
	generator: Option<String>,

	/// Generator amplitude in volts
	#[arg(short, long)]
	amplitude: Option<f64>,

	/// Generator frequency in hertz
	#[arg(short, long)]
	frequency: Option<f64>,

	/// Scope time base in seconds per division
	#[arg(long)]
	time_scale: Option<f64>,

	/// Scope horizontal delay in seconds
	#[arg(long, allow_hyphen_values = true)]
	time_delay: Option<f64>,

	/// Number of points to fetch
	#[arg(long)]
	record_length: Option<u64>,

	/// Directory the CSV is written into
	#[arg(short, long)]
	output: Option<PathBuf>,

	/// Don't run the plotting command
	#[arg(long)]
	no_plot: bool,

	/// Debug-level logging
	#[arg(short, long)]
	verbose: bool,
}

impl Args {
	fn apply(self, conf:&mut Conf) {
		if let Some(s) = self.scope         { conf.instruments.scope = s; }
		if let Some(g) = self.generator     { conf.instruments.generator = g; }
		if let Some(a) = self.amplitude     { conf.generator.amplitude = a; }
		if let Some(f) = self.frequency     { conf.generator.frequency = f; }
		if let Some(t) = self.time_scale    { conf.scope.time_scale = t; }
		if let Some(t) = self.time_delay    { conf.scope.time_delay = t; }
		if let Some(n) = self.record_length { conf.scope.record_length = n; }
		if let Some(o) = self.output        { conf.output.save_path = o; }
		if self.no_plot { conf.output.plot_command.clear(); }
	}
}

fn connect(resource:&str, timeout:Duration) -> anyhow::Result<Box<dyn Instrument>> {
	let resource:Resource = resource.parse()?;
	let mut session = session::open(&resource, timeout)
		.with_context(|| format!("unable to open {}", resource))?;
	session.clear()?;
	Ok(session)
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let default_level:&str = if args.verbose { "debug" } else { "info" };
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

	let mut conf:Conf = Conf::load(&args.config)
		.with_context(|| format!("unable to load configuration from {}", args.config.display()))?;
	args.apply(&mut conf);

	let mut fgen = AG33200::new(connect(&conf.instruments.generator, conf.io_timeout())?)?;
	let mut scope = MSOX2000::new(connect(&conf.instruments.scope, conf.io_timeout())?)?;

	let report:CaptureReport = capture::run(&mut scope, &mut fgen, &conf, Local::now().date_naive())?;
	info!("{}", serde_json::to_string(&report)?);

	match report.plot {
		PlotOutcome::Failed(reason) => warn!("Capture saved but plotting failed: {}", reason),
		PlotOutcome::Skipped | PlotOutcome::Succeeded => {},
	}

	if report.samples == 0 {
		warn!("The scope returned no samples; {} only has headers", report.path.display());
	}

	println!("{}", report.path.display());
	Ok(())
}
