
use std::thread;
use std::time::{Duration, Instant};

use log::trace;

use crate::error::{Error, Result};

/// Call `probe` every `interval` until it returns true, giving up with `Error::Timeout` once
/// `timeout` has passed.  Errors from the probe end the wait immediately.  Returns the number of
/// probes it took.
pub fn poll_until<F>(timeout:Duration, interval:Duration, what:&'static str, mut probe:F) -> Result<u32>
	where F: FnMut() -> Result<bool>
{
	let start = Instant::now();
	let mut attempts:u32 = 0;

	loop {
		attempts += 1;
		if probe()? {
			trace!("{} after {} probes ({:?})", what, attempts, start.elapsed());
			return Ok(attempts);
		}

		let elapsed:Duration = start.elapsed();
		if elapsed >= timeout {
			return Err(Error::Timeout(timeout, what));
		}

		thread::sleep(interval.min(timeout - elapsed));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn returns_once_probe_succeeds() {
		let mut calls = 0;
		let n = poll_until(Duration::from_secs(5), Duration::from_millis(1), "test", || {
			calls += 1;
			Ok(calls == 3)
		}).unwrap();
		assert_eq!(n, 3);
	}

	#[test]
	fn gives_up_after_timeout() {
		let res = poll_until(Duration::from_millis(20), Duration::from_millis(5), "never", || Ok(false));
		assert!(matches!(res, Err(Error::Timeout(_, "never"))));
	}

	#[test]
	fn probe_errors_propagate() {
		let res = poll_until(Duration::from_secs(5), Duration::from_millis(1), "test", || Err(Error::Rpc("boom")));
		assert!(matches!(res, Err(Error::Rpc("boom"))));
	}
}
