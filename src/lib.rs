
// Error type shared by every layer below
pub mod error;
pub use error::{Error, Result};

// External data representation, a protocol for serializing data to be sent over the network
pub mod xdr;

// Remote procedure call, a protocol build on top of XDR to provide something like C-style function calls over the network
pub mod rpc;

// A protocol using RPC that's meant to communicate with instruments like oscilloscopes, power supplies, waveform generators, etc
pub mod vxi11;

// The Instrument trait, resource strings, and the raw socket transport
pub mod session;

// Response parsing: IEEE 488.2 block headers, sample lists, numbers
pub mod scpi;

pub mod poll;

pub mod waveform;

// Drivers for the scope and the function generator
pub mod devices;

// CSV naming and writing
pub mod export;

pub mod plot;

pub mod config;

// The end-to-end capture sequence
pub mod capture;

// Scripted instrument for running drivers without hardware
pub mod loopback;
