// CGI API client modules
//
// Hand-written client for the device's `/cgi-bin/*.cgi` endpoints. Reads
// answer with `key=value` lines; writes answer with a bare `OK`.

pub mod client;
pub mod config;
pub mod lighting;
pub mod system;

pub use client::{Credentials, DahuaClient, StreamSubtype};
pub use lighting::InfraredMode;
