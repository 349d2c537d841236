
use std::path::Path;
use std::process::Command;

use log::{error, info};

#[derive(Debug, PartialEq)]
pub enum PlotOutcome {
	/// No plotting command configured
	Skipped,
	Succeeded,
	Failed(String),
}

/// Run `command` (program plus leading arguments) with the CSV path appended.  A plotter that
/// fails or can't be started is logged and reported, but the capture itself already succeeded.
pub fn hand_off(command:&[String], csv_path:&Path) -> PlotOutcome {
	let (program, args) = match command.split_first() {
		Some(split) => split,
		None => return PlotOutcome::Skipped,
	};

	info!("Running plotter: {} {}", command.join(" "), csv_path.display());

	match Command::new(program).args(args).arg(csv_path).status() {
		Ok(status) if status.success() => {
			info!("Plotter finished");
			PlotOutcome::Succeeded
		},
		Ok(status) => {
			error!("Plotter exited with {}", status);
			PlotOutcome::Failed(format!("exited with {}", status))
		},
		Err(e) => {
			error!("Unable to run plotter {:?}: {}", program, e);
			PlotOutcome::Failed(e.to_string())
		},
	}
}
