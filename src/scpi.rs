//! Parsing helpers for SCPI responses.

use log::{debug, warn};

use crate::error::{parse_err, Error, Result};

/// Strip an IEEE 488.2 definite-length block header (`#<n><n length digits>`) and return the
/// payload.
///
/// Exactly `n` length digits are consumed, so payloads that happen to start with digits are left
/// alone.  Anything after the declared length (usually the newline terminator) is dropped.  A
/// payload shorter than declared is returned as-is.  `#0` marks an indefinite-length block, which
/// runs to the end of the response.
pub fn strip_block_header(resp:&str) -> Result<&str> {
	let rest:&str = resp.trim_start()
		.strip_prefix('#')
		.ok_or(Error::BlockHeader("response doesn't start with '#'"))?;

	let n:usize = rest.chars().next()
		.and_then(|c| c.to_digit(10))
		.ok_or(Error::BlockHeader("digit count after '#' is missing"))? as usize;

	if n == 0 {
		return Ok(rest[1..].trim_end_matches(|c| c == '\r' || c == '\n'));
	}

	let len_digits:&str = rest.get(1..1+n)
		.filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
		.ok_or(Error::BlockHeader("fewer length digits than the header declares"))?;
	let len:usize = len_digits.parse::<usize>()
		.map_err(|_| Error::BlockHeader("block length doesn't fit in a usize"))?;

	let body:&str = &rest[1+n..];
	if body.len() < len {
		warn!("Block declares {} bytes but only {} arrived", len, body.len());
		return Ok(body);
	}

	body.get(..len).ok_or(Error::BlockHeader("declared block length splits a character"))
}

/// Pull the non-negative integers out of a comma/space separated sample list.
///
/// Tokens that aren't plain digit strings (negative numbers, decimals, garbage) are skipped
/// without complaint.
pub fn parse_samples(data:&str) -> Vec<u32> {
	let mut dropped:usize = 0;

	let samples:Vec<u32> = data
		.split(|c:char| c == ',' || c.is_whitespace())
		.map(str::trim)
		.filter(|tok| !tok.is_empty())
		.filter_map(|tok| {
			let parsed = if tok.bytes().all(|b| b.is_ascii_digit()) { tok.parse::<u32>().ok() } else { None };
			if parsed.is_none() { dropped += 1; }
			parsed
		})
		.collect();

	if dropped > 0 {
		debug!("Dropped {} malformed sample tokens", dropped);
	}

	samples
}

pub fn parse_f64(resp:&str, what:&'static str) -> Result<f64> {
	resp.trim().parse::<f64>().map_err(|_| parse_err(what, resp))
}

/// Register queries come back as decimal integers, sometimes with a leading '+'.
pub fn parse_register(resp:&str, what:&'static str) -> Result<u32> {
	let s:&str = resp.trim();
	s.strip_prefix('+').unwrap_or(s).parse::<u32>().map_err(|_| parse_err(what, resp))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_exactly_the_declared_header() {
		let data = "0,1,2,255";
		let resp = format!("#8{}{}", "00003999", data);
		assert_eq!(strip_block_header(&resp).unwrap(), data);

		// Payload starting with digits mustn't be eaten along with the header
		assert_eq!(strip_block_header("#1512345\n").unwrap(), "12345");
	}

	#[test]
	fn drops_terminator_after_declared_length() {
		assert_eq!(strip_block_header("#15hello\n").unwrap(), "hello");
		assert_eq!(strip_block_header("  #2100123456789\r\n").unwrap(), "0123456789");
	}

	#[test]
	fn indefinite_length_block() {
		assert_eq!(strip_block_header("#01,2,3\n").unwrap(), "1,2,3");
	}

	#[test]
	fn malformed_headers_are_errors() {
		assert!(strip_block_header("1,2,3").is_err());
		assert!(strip_block_header("#").is_err());
		assert!(strip_block_header("#x123").is_err());
		assert!(strip_block_header("#812").is_err());
		assert!(strip_block_header("#3a12xyz").is_err());
	}

	#[test]
	fn sample_parse_splits_on_commas_and_spaces() {
		assert_eq!(parse_samples("1, 2, 3 4"), vec![1, 2, 3, 4]);
	}

	#[test]
	fn sample_parse_is_lossy() {
		assert_eq!(parse_samples("1,, -2"), vec![1]);
		assert_eq!(parse_samples("7,3.5,abc,+4,\n8"), vec![7, 8]);
		assert!(parse_samples("").is_empty());
	}

	#[test]
	fn registers_and_floats() {
		assert_eq!(parse_register("+8\n", "status").unwrap(), 8);
		assert_eq!(parse_register("40", "status").unwrap(), 40);
		assert!(parse_register("-1", "status").is_err());
		assert_eq!(parse_f64("+2.500000000000E-01\n", "amplitude").unwrap(), 0.25);
	}
}
