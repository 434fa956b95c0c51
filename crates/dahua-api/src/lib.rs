// dahua-api: Async Rust client for the Dahua CGI API and event stream

pub mod cgi;
pub mod error;
pub mod event_stream;
pub mod kv;
pub mod transport;

pub use cgi::{Credentials, DahuaClient, InfraredMode, StreamSubtype};
pub use error::Error;
pub use event_stream::{AttachStream, ReconnectConfig};
pub use kv::KeyValues;
pub use transport::{TlsMode, TransportConfig};
