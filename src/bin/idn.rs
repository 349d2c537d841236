
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;

use scopecap::session::{self, Identity, Instrument, Resource};

/// Identify an instrument, then send it any SCPI commands given.  Commands ending in `?` are
/// queries and their responses are printed.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
	/// e.g. TCPIP::192.168.1.10::INSTR or TCPIP::192.168.1.11::5025::SOCKET
	resource: String,

	/// SCPI command to send, may be repeated
	#[arg(short, long = "command")]
	commands: Vec<String>,

	#[arg(short, long, default_value_t = 5000)]
	timeout_ms: u64,
}

fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let resource:Resource = args.resource.parse()?;
	let mut inst = session::open(&resource, Duration::from_millis(args.timeout_ms))
		.with_context(|| format!("unable to open {}", resource))?;

	let idn:Identity = inst.identify()?;
	println!("{}", serde_json::to_string_pretty(&idn)?);

	for cmd in args.commands.iter() {
		if cmd.trim_end().ends_with('?') {
			let resp:String = inst.ask(cmd)?;
			println!("{} -> {}", cmd, resp);
		} else {
			inst.write(cmd)?;
			info!("Sent {}", cmd);
		}
	}

	Ok(())
}
