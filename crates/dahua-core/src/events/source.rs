// ── Event sources ──
//
// A source runs as its own task and feeds the dispatcher through an mpsc
// channel. Cameras stream text frames over the attach CGI; doorbells
// speak a separate protocol whose client the host supplies.

use bytes::Bytes;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use dahua_api::AttachStream;

/// Produces raw camera event frames (whole `\r\n`-terminated lines).
pub trait FrameSource: Send + Sync {
    fn spawn(&self, tx: mpsc::Sender<Bytes>, cancel: CancellationToken) -> JoinHandle<()>;
}

/// Produces doorbell event records (`Code`, `Action`, `Data`, `Index`).
pub trait DoorbellSource: Send + Sync {
    fn spawn(&self, tx: mpsc::Sender<Value>, cancel: CancellationToken) -> JoinHandle<()>;
}

impl FrameSource for AttachStream {
    fn spawn(&self, tx: mpsc::Sender<Bytes>, cancel: CancellationToken) -> JoinHandle<()> {
        AttachStream::spawn(self, tx, cancel)
    }
}
