use std::io;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between opening a session and writing the CSV.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] io::Error),

	/// The remote end rejected or mangled an RPC call.
	#[error("RPC error: {0}")]
	Rpc(&'static str),

	/// Nonzero error code in a VXI-11 core channel reply.
	#[error("VXI-11 {operation} failed: {reason} (code {code})")]
	Vxi11 { operation: &'static str, code: i32, reason: &'static str },

	#[error("Invalid instrument resource string: {0}")]
	InvalidResource(String),

	#[error("Unsupported instrument resource: {0}")]
	Unsupported(String),

	/// A response from the instrument didn't look like what we asked for.
	#[error("Unable to parse {what} from response {response:?}")]
	Parse { what: &'static str, response: String },

	#[error("Malformed SCPI block header: {0}")]
	BlockHeader(&'static str),

	#[error("Requested amplitude {requested} V is outside the allowed range (0, {max}] V")]
	AmplitudeLimit { requested: f64, max: f64 },

	#[error("Amplitude readback {actual} V doesn't match requested {requested} V (tolerance {tolerance} V)")]
	AmplitudeMismatch { requested: f64, actual: f64, tolerance: f64 },

	#[error("Timed out after {0:?} waiting for {1}")]
	Timeout(Duration, &'static str),

	#[error(transparent)]
	Csv(#[from] csv::Error),
}

pub(crate) fn parse_err(what:&'static str, response:&str) -> Error {
	Error::Parse{ what, response: response.to_owned() }
}
