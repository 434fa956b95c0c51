//! Attach-stream keeper with auto-reconnect.
//!
//! Opens the device's `eventManager.cgi?action=attach` stream, a
//! never-ending multipart HTTP body, and forwards whole `\r\n`-terminated
//! lines into an [`mpsc`] channel. A line split across two network reads is
//! held back until its terminator arrives, so consumers never see half a
//! frame. Handles reconnection with exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use dahua_api::event_stream::{AttachStream, ReconnectConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let stream = AttachStream::new(client, &["VideoMotion".to_owned()], &transport, ReconnectConfig::default())?;
//! let (tx, mut rx) = tokio::sync::mpsc::channel(64);
//! let task = stream.spawn(tx, CancellationToken::new());
//!
//! while let Some(frames) = rx.recv().await {
//!     println!("{}", String::from_utf8_lossy(&frames));
//! }
//! ```

use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::cgi::DahuaClient;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Seconds between device heartbeats on the attach stream.
const HEARTBEAT_SECS: u32 = 5;

const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Upper bound on an unterminated line held between reads.
const MAX_PENDING: usize = 1024 * 1024;

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for stream reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── AttachStream ─────────────────────────────────────────────────────

/// Configured, not-yet-running attach stream for one device.
#[derive(Clone)]
pub struct AttachStream {
    client: DahuaClient,
    http: reqwest::Client,
    url: Url,
    reconnect: ReconnectConfig,
}

impl AttachStream {
    /// Prepare an attach stream for the given event codes.
    ///
    /// An empty `codes` list subscribes to `All`.
    pub fn new(
        client: DahuaClient,
        codes: &[String],
        transport: &TransportConfig,
        reconnect: ReconnectConfig,
    ) -> Result<Self, Error> {
        let codes = if codes.is_empty() {
            "All".to_owned()
        } else {
            codes.join(",")
        };
        let url = client.cgi_url(&format!(
            "eventManager.cgi?action=attach&codes=[{codes}]&heartbeat={HEARTBEAT_SECS}"
        ))?;
        let http = transport.build_stream_client()?;

        Ok(Self {
            client,
            http,
            url,
            reconnect,
        })
    }

    /// The attach URL this stream connects to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Spawn the reconnection loop. Whole lines are sent on `frame_tx`.
    ///
    /// The task exits when `cancel` fires, when the receiver is dropped, or
    /// when `max_retries` is exhausted.
    pub fn spawn(&self, frame_tx: mpsc::Sender<Bytes>, cancel: CancellationToken) -> JoinHandle<()> {
        let stream = self.clone();
        tokio::spawn(async move {
            stream_loop(stream, frame_tx, cancel).await;
        })
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// How a single connection ended without an error.
enum Disconnect {
    /// Server closed the body; reconnect. `delivered` is set when at least
    /// one whole line was forwarded before the close.
    Ended { delivered: bool },
    /// Cancelled or nobody is listening any more; stop for good.
    Stop,
}

/// Main loop: connect → read → backoff → reconnect.
///
/// Every reconnect waits at least `initial_delay`. The attempt counter only
/// resets after a connection that delivered frames, so a device that
/// accepts the request and closes an empty body backs off like a failure.
async fn stream_loop(stream: AttachStream, frame_tx: mpsc::Sender<Bytes>, cancel: CancellationToken) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&stream, &frame_tx, &cancel) => result,
        };

        match result {
            Ok(Disconnect::Stop) => break,
            Ok(Disconnect::Ended { delivered: true }) => {
                tracing::info!("Event stream ended, reconnecting");
                attempt = 0;
            }
            Ok(Disconnect::Ended { delivered: false }) => {
                tracing::warn!(attempt, "Event stream closed before any frames");
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "Event stream error");
            }
        }

        if let Some(max) = stream.reconnect.max_retries {
            if attempt >= max {
                tracing::error!(
                    max_retries = max,
                    "Event stream reconnection limit reached, giving up"
                );
                break;
            }
        }

        let delay = calculate_backoff(attempt, &stream.reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    tracing::debug!("Event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open the attach stream once and forward lines until it drops.
async fn connect_and_read(
    stream: &AttachStream,
    frame_tx: &mpsc::Sender<Bytes>,
    cancel: &CancellationToken,
) -> Result<Disconnect, Error> {
    tracing::info!(url = %stream.url, "Connecting to event stream");

    let resp = stream
        .client
        .send_get(&stream.http, stream.url.clone())
        .await?;

    tracing::info!("Event stream connected");

    let mut body = resp.bytes_stream();
    let mut lines = LineBuffer::default();
    let mut delivered = false;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(Disconnect::Stop),
            chunk = body.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        let Some(frames) = lines.push(&bytes) else { continue };
                        if frame_tx.send(frames).await.is_err() {
                            tracing::debug!("Frame receiver dropped");
                            return Ok(Disconnect::Stop);
                        }
                        delivered = true;
                    }
                    Some(Err(e)) => return Err(Error::StreamClosed(e.to_string())),
                    None => return Ok(Disconnect::Ended { delivered }),
                }
            }
        }
    }
}

// ── Line buffering ───────────────────────────────────────────────────

/// Accumulates raw body bytes and releases everything up to and including
/// the last `\r\n`.
///
/// After each release `pending` holds no terminator, so a push only scans
/// the new bytes plus one byte of overlap for a `\r` left at the end.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: BytesMut,
}

impl LineBuffer {
    /// Append a chunk; returns the complete lines now available, if any.
    ///
    /// A partial line that grows past [`MAX_PENDING`] is discarded.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Option<Bytes> {
        let scan_from = self.pending.len().saturating_sub(LINE_TERMINATOR.len() - 1);
        self.pending.extend_from_slice(chunk);

        let Some(offset) = self.pending[scan_from..]
            .windows(LINE_TERMINATOR.len())
            .rposition(|w| w == LINE_TERMINATOR)
        else {
            if self.pending.len() > MAX_PENDING {
                tracing::warn!(
                    bytes = self.pending.len(),
                    "Event stream line exceeds buffer limit, dropping"
                );
                self.pending.clear();
            }
            return None;
        };

        let end = scan_from + offset + LINE_TERMINATOR.len();
        Some(self.pending.split_to(end).freeze())
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms when several cameras
/// drop at once (typically a switch or NVR reboot).
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
