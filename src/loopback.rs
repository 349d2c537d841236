//! A scripted stand-in for a real instrument.  It records every command it's sent and answers
//! queries from canned responses, which is enough to drive the drivers and the capture pipeline
//! without hardware.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::session::Instrument;

#[derive(Debug, Default)]
pub struct Loopback {
	queued: HashMap<String, VecDeque<String>>,
	fixed: HashMap<String, String>,
	sent: Vec<String>,
}

impl Loopback {

	pub fn new() -> Self { Self::default() }

	/// Answer `query` with `resp` once.  Queued answers are used up in order before any fixed one.
	pub fn respond_once(mut self, query:&str, resp:&str) -> Self {
		self.queued.entry(query.to_owned()).or_default().push_back(resp.to_owned());
		self
	}

	/// Answer `query` with `resp` every time.
	pub fn respond(mut self, query:&str, resp:&str) -> Self {
		self.fixed.insert(query.to_owned(), resp.to_owned());
		self
	}

	/// Everything written or asked so far, in order.
	pub fn sent(&self) -> &[String] { &self.sent }

	pub fn was_sent(&self, cmd:&str) -> bool { self.sent.iter().any(|c| c == cmd) }

	pub fn position(&self, cmd:&str) -> Option<usize> { self.sent.iter().position(|c| c == cmd) }

}

impl Instrument for Loopback {

	fn write(&mut self, cmd:&str) -> Result<()> {
		self.sent.push(cmd.to_owned());
		Ok(())
	}

	fn ask(&mut self, cmd:&str) -> Result<String> {
		self.sent.push(cmd.to_owned());

		if let Some(resp) = self.queued.get_mut(cmd).and_then(|q| q.pop_front()) {
			return Ok(resp);
		}

		// A real instrument with nothing to say just leaves you waiting
		self.fixed.get(cmd).cloned().ok_or(Error::Timeout(self.timeout(), "a scripted response"))
	}

	fn timeout(&self) -> Duration { Duration::from_millis(0) }

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn queued_answers_come_before_fixed_ones() {
		let mut lb = Loopback::new()
			.respond_once("X?", "1")
			.respond_once("X?", "2")
			.respond("X?", "3");

		assert_eq!(lb.ask("X?").unwrap(), "1");
		assert_eq!(lb.ask("X?").unwrap(), "2");
		assert_eq!(lb.ask("X?").unwrap(), "3");
		assert_eq!(lb.ask("X?").unwrap(), "3");
	}

	#[test]
	fn unscripted_query_times_out_and_everything_is_logged() {
		let mut lb = Loopback::new();
		lb.write("*RST").unwrap();
		assert!(matches!(lb.ask("Y?"), Err(Error::Timeout(..))));
		assert_eq!(lb.sent(), &["*RST".to_owned(), "Y?".to_owned()]);
		assert_eq!(lb.position("Y?"), Some(1));
	}
}
