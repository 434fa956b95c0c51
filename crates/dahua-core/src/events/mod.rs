// ── Event pipeline ──
//
// sources → mpsc → dispatcher → listeners + timestamp table + event bus

pub(crate) mod dispatcher;
pub mod parser;
pub mod source;

pub use parser::{FrameError, doorbell_record, parse_frames};
pub use source::{DoorbellSource, FrameSource};
