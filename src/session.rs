//! Instrument sessions: the `Instrument` trait both transports implement, parsing of VISA-style
//! resource strings, and the raw SCPI socket transport.

use std::fmt;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::str::{self, FromStr};
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, info};
use regex::Regex;
use serde::{Serialize, Deserialize};

use crate::error::{parse_err, Error, Result};
use crate::rpc::tcp_clients::{connect_with_timeout, timeout_to_err};
use crate::vxi11::{CoreClient, DEFAULT_DEVICE_NAME};

lazy_static! {
	static ref IDN_RE: Regex   = Regex::new("([^,]+),([^,]+),([^,]+),([^,\\s]+)").unwrap();
	static ref BOARD_RE: Regex = Regex::new("(?i)^(TCPIP|USB|GPIB|ASRL)(\\d*)$").unwrap();
}

/// Something that takes SCPI commands and answers SCPI queries.
pub trait Instrument {

	/// Send a command that doesn't produce a response.
	fn write(&mut self, cmd:&str) -> Result<()>;

	/// Send a query and return the complete response with the trailing newline removed.
	fn ask(&mut self, cmd:&str) -> Result<String>;

	fn clear(&mut self) -> Result<()> { self.write("*CLS") }

	fn timeout(&self) -> Duration;

	fn identify(&mut self) -> Result<Identity> {
		let resp:String = self.ask("*IDN?")?;
		Identity::parse(&resp)
	}

}

impl<T: Instrument + ?Sized> Instrument for Box<T> {
	fn write(&mut self, cmd:&str) -> Result<()>     { (**self).write(cmd) }
	fn ask(&mut self, cmd:&str) -> Result<String>   { (**self).ask(cmd) }
	fn clear(&mut self) -> Result<()>               { (**self).clear() }
	fn timeout(&self) -> Duration                   { (**self).timeout() }
	fn identify(&mut self) -> Result<Identity>      { (**self).identify() }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
	pub manufacturer: String,
	pub model: String,
	pub serial_num: String,
	pub fw_version: String,
}

impl Identity {

	pub fn parse(idn_resp:&str) -> Result<Self> {
		let caps = IDN_RE.captures(idn_resp).ok_or_else(|| parse_err("an *IDN? response", idn_resp))?;
		let field = |i:usize| caps.get(i).map(|m| m.as_str().trim().to_owned()).unwrap_or_default();

		Ok(Self {
			manufacturer: field(1),
			model:        field(2),
			serial_num:   field(3),
			fw_version:   field(4),
		})
	}

}

impl fmt::Display for Identity {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} {} (s/n {}, fw {})", self.manufacturer, self.model, self.serial_num, self.fw_version)
	}
}

/// A parsed instrument address.  Only the LAN forms can actually be opened.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
	/// `TCPIP::host[::device][::INSTR]`
	Vxi11 { host: String, device: String },
	/// `TCPIP::host::port::SOCKET`
	Socket { host: String, port: u16 },
	/// Recognised, but there's no transport for it here (USB, GPIB, serial, HiSLIP)
	Unsupported(String),
}

impl FromStr for Resource {
	type Err = Error;

	fn from_str(s:&str) -> Result<Self> {
		let invalid = || Error::InvalidResource(s.to_owned());
		let parts:Vec<&str> = s.trim().split("::").collect();

		let board = BOARD_RE.captures(parts[0]).ok_or_else(invalid)?;
		if !board[1].eq_ignore_ascii_case("TCPIP") {
			return Ok(Resource::Unsupported(s.to_owned()));
		}

		let host:String = match parts.get(1) {
			Some(h) if !h.is_empty() => h.to_string(),
			_ => return Err(invalid()),
		};

		let last:&str = parts[parts.len() - 1];
		if last.eq_ignore_ascii_case("SOCKET") {
			if parts.len() != 4 { return Err(invalid()); }
			let port:u16 = parts[2].parse::<u16>().map_err(|_| invalid())?;
			return Ok(Resource::Socket{ host, port });
		}

		// `TCPIP::INSTR` has a suffix but no host
		let rest:&[&str] = if last.eq_ignore_ascii_case("INSTR") {
			parts.get(2..parts.len()-1).ok_or_else(invalid)?
		} else {
			&parts[2..]
		};
		match rest {
			[] => Ok(Resource::Vxi11{ host, device: DEFAULT_DEVICE_NAME.to_owned() }),
			[dev] if dev.to_ascii_lowercase().starts_with("hislip") => Ok(Resource::Unsupported(s.to_owned())),
			[dev] if !dev.is_empty() => Ok(Resource::Vxi11{ host, device: dev.to_string() }),
			_ => Err(invalid()),
		}
	}
}

impl fmt::Display for Resource {
	fn fmt(&self, f:&mut fmt::Formatter) -> fmt::Result {
		match self {
			Resource::Vxi11{ host, device } => write!(f, "TCPIP::{}::{}::INSTR", host, device),
			Resource::Socket{ host, port }  => write!(f, "TCPIP::{}::{}::SOCKET", host, port),
			Resource::Unsupported(s)        => write!(f, "{}", s),
		}
	}
}

/// Open a session to `resource` and identify what answered.
pub fn open(resource:&Resource, timeout:Duration) -> Result<Box<dyn Instrument>> {
	let mut session:Box<dyn Instrument> = match resource {
		Resource::Vxi11{ host, device } => {
			let mut core = CoreClient::new(host, timeout)?;
			core.create_link(device)?;
			Box::new(core)
		},
		Resource::Socket{ host, port } => Box::new(SocketSession::connect(host, *port, timeout)?),
		Resource::Unsupported(s) => return Err(Error::Unsupported(s.clone())),
	};

	let idn:Identity = session.identify()?;
	info!("Connected to {} at {}", idn, resource);

	Ok(session)
}

fn trim_terminator(mut resp:Vec<u8>) -> Vec<u8> {
	while matches!(resp.last(), Some(b'\n') | Some(b'\r')) {
		resp.pop();
	}
	resp
}

/// Newline-terminated SCPI over a plain TCP connection, usually on port 5025.
pub struct SocketSession {
	reader: BufReader<TcpStream>,
	timeout: Duration,
}

impl SocketSession {

	pub fn connect(host:&str, port:u16, timeout:Duration) -> Result<Self> {
		let stream:TcpStream = connect_with_timeout((host, port), timeout)?;
		Ok(Self{ reader: BufReader::new(stream), timeout })
	}

	fn send(&mut self, cmd:&str) -> Result<()> {
		debug!("-> {}", cmd);
		let line:String = format!("{}\n", cmd);
		let timeout:Duration = self.timeout;
		self.reader.get_mut().write_all(line.as_bytes()).map_err(|e| timeout_to_err(e, timeout))
	}

	// Definite-length blocks can contain newlines, so those are read by count instead of by line
	fn read_response(&mut self) -> Result<Vec<u8>> {
		let timeout:Duration = self.timeout;
		let io_err = |e:io::Error| timeout_to_err(e, timeout);

		let mut first = [0u8; 1];
		self.reader.read_exact(&mut first).map_err(io_err)?;
		let mut ans:Vec<u8> = first.to_vec();

		if first[0] == b'#' {
			let mut n_digits = [0u8; 1];
			self.reader.read_exact(&mut n_digits).map_err(io_err)?;
			ans.push(n_digits[0]);

			// `#H1F`, `#B101` and friends are non-decimal numbers, not blocks
			let n:usize = match (n_digits[0] as char).to_digit(10) {
				Some(n) => n as usize,
				None => {
					if n_digits[0] != b'\n' {
						self.reader.read_until(b'\n', &mut ans).map_err(io_err)?;
					}
					return Ok(trim_terminator(ans));
				},
			};
			if n > 0 {
				let mut len_digits:Vec<u8> = vec![0; n];
				self.reader.read_exact(&mut len_digits).map_err(io_err)?;
				let len:usize = str::from_utf8(&len_digits).ok()
					.and_then(|s| s.parse::<usize>().ok())
					.ok_or(Error::BlockHeader("block length isn't a decimal number"))?;
				ans.extend_from_slice(&len_digits);

				let start:usize = ans.len();
				ans.resize(start + len, 0);
				self.reader.read_exact(&mut ans[start..]).map_err(io_err)?;
			}

			// Terminator after the block, or the whole payload for an indefinite-length (#0) block
			self.reader.read_until(b'\n', &mut ans).map_err(io_err)?;
		} else if first[0] != b'\n' {
			self.reader.read_until(b'\n', &mut ans).map_err(io_err)?;
		}

		Ok(trim_terminator(ans))
	}

}

impl Instrument for SocketSession {

	fn write(&mut self, cmd:&str) -> Result<()> { self.send(cmd) }

	fn ask(&mut self, cmd:&str) -> Result<String> {
		self.send(cmd)?;
		let resp:Vec<u8> = self.read_response()?;
		String::from_utf8(resp).map_err(|e| parse_err("a UTF-8 response", &String::from_utf8_lossy(e.as_bytes())))
	}

	fn timeout(&self) -> Duration { self.timeout }

}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_vxi11_resources() {
		assert_eq!("TCPIP::192.168.1.10::INSTR".parse::<Resource>().unwrap(),
			Resource::Vxi11{ host: "192.168.1.10".into(), device: "inst0".into() });
		assert_eq!("tcpip0::scope.lab::inst1::instr".parse::<Resource>().unwrap(),
			Resource::Vxi11{ host: "scope.lab".into(), device: "inst1".into() });
		assert_eq!("TCPIP::10.0.0.2".parse::<Resource>().unwrap(),
			Resource::Vxi11{ host: "10.0.0.2".into(), device: "inst0".into() });
	}

	#[test]
	fn parses_socket_resources() {
		assert_eq!("TCPIP0::10.0.0.3::5025::SOCKET".parse::<Resource>().unwrap(),
			Resource::Socket{ host: "10.0.0.3".into(), port: 5025 });
		assert!("TCPIP::10.0.0.3::notaport::SOCKET".parse::<Resource>().is_err());
	}

	#[test]
	fn usb_and_hislip_are_recognised_but_unsupported() {
		let usb = "USB0::0x0957::0x1796::MY53280216::INSTR".parse::<Resource>().unwrap();
		assert!(matches!(usb, Resource::Unsupported(_)));
		assert!(matches!(open(&usb, Duration::from_millis(10)), Err(Error::Unsupported(_))));

		let hislip = "TCPIP0::192.168.3.242::hislip0::INSTR".parse::<Resource>().unwrap();
		assert!(matches!(hislip, Resource::Unsupported(_)));
	}

	#[test]
	fn garbage_is_invalid() {
		assert!(matches!("scope".parse::<Resource>(), Err(Error::InvalidResource(_))));
		assert!(matches!("TCPIP::".parse::<Resource>(), Err(Error::InvalidResource(_))));
		assert!(matches!("TCPIP::INSTR".parse::<Resource>(), Err(Error::InvalidResource(_))));
		assert!(matches!("tcpip0::instr".parse::<Resource>(), Err(Error::InvalidResource(_))));
		assert!(matches!("TCPIP::SOCKET".parse::<Resource>(), Err(Error::InvalidResource(_))));
	}

	#[test]
	fn display_round_trips_through_parse() {
		let r = Resource::Socket{ host: "h".into(), port: 5025 };
		assert_eq!(r.to_string().parse::<Resource>().unwrap(), r);
	}

	#[test]
	fn identity_from_idn() {
		let idn = Identity::parse("AGILENT TECHNOLOGIES,MSO-X 2024A,MY53280216,02.43.2018020635\n").unwrap();
		assert_eq!(idn.manufacturer, "AGILENT TECHNOLOGIES");
		assert_eq!(idn.model, "MSO-X 2024A");
		assert_eq!(idn.serial_num, "MY53280216");
		assert_eq!(idn.fw_version, "02.43.2018020635");
	}
}
