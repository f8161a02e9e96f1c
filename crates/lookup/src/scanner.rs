//! Barcode scanner adapter.
//!
//! [`DecodeBackend`] is the boundary to whatever actually turns frames (or
//! keystrokes) into barcodes. [`BarcodeScanner`] owns one backend exclusively
//! and runs at most one decode session at a time on a background task.
//!
//! # Session lifecycle
//!
//! ```text
//! start() ─ acquire ─┬─ decode_next ─ NoBarcode ──────────────┐
//!                    │       ▲                                │
//!                    │       └──── Failed (recoverable) ◄─────┘
//!                    ├─ Decoded(code) ─ release ─ on_scan(code) ─ Decoded
//!                    ├─ Failed (unrecoverable) ─ release ─ Failed
//!                    └─ stop() / drop ─ release ─ Stopped
//! ```
//!
//! "No barcode in frame" is never surfaced. The device is released on every
//! exit path by a drop guard on the session task.

use std::future::Future;
use std::io::BufReader;
use std::sync::Arc;

use metrics::counter;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shelfscan_core::error::ScannerError;
use shelfscan_core::metrics as m;
use shelfscan_core::types::CameraDevice;

use crate::session::validate_code;

/// Device id of the single device a [`LineDecoder`] exposes.
pub const KEYBOARD_DEVICE_ID: &str = "keyboard";

/// Result of one decode attempt.
#[derive(Debug)]
pub enum DecodeOutcome {
    /// A barcode was recognized.
    Decoded(String),
    /// Nothing recognizable in this frame.
    NoBarcode,
    /// The decoder failed. Recoverable failures are logged and decoding
    /// continues; unrecoverable ones end the session.
    Failed {
        recoverable: bool,
        error: ScannerError,
    },
}

/// Trait abstracting a barcode decoder and its capture devices.
///
/// # Cancellation
///
/// [`decode_next`](Self::decode_next) is raced against the session's
/// cancellation token and must be cancel-safe: dropping the future must not
/// lose a decoded code that a later call would have returned.
pub trait DecodeBackend: Send + 'static {
    /// Enumerates available capture devices.
    fn list_devices(
        &mut self,
    ) -> impl Future<Output = Result<Vec<CameraDevice>, ScannerError>> + Send;

    /// Opens `device_id` for exclusive use.
    fn acquire(&mut self, device_id: &str)
    -> impl Future<Output = Result<(), ScannerError>> + Send;

    /// Waits for the next decode attempt on the acquired device.
    fn decode_next(&mut self) -> impl Future<Output = DecodeOutcome> + Send;

    /// Releases the acquired device. Must be idempotent.
    fn release(&mut self);
}

/// How a decode session ended.
#[derive(Debug)]
pub enum ScanOutcome {
    /// A code was decoded and handed to the callback.
    Decoded(String),
    /// The session was stopped before a code was decoded.
    Stopped,
    /// The decoder failed unrecoverably.
    Failed(ScannerError),
}

/// Exclusive hold on the backend with an acquired device.
///
/// Dropping the lease releases the device.
struct DeviceLease<B: DecodeBackend> {
    backend: OwnedMutexGuard<B>,
    device_id: String,
}

impl<B: DecodeBackend> Drop for DeviceLease<B> {
    fn drop(&mut self) {
        self.backend.release();
        debug!(device_id = %self.device_id, "device released");
    }
}

struct ActiveSession {
    device_id: String,
    cancel: CancellationToken,
    handle: JoinHandle<ScanOutcome>,
}

/// Runs decode sessions on a backend.
pub struct BarcodeScanner<B: DecodeBackend> {
    backend: Arc<Mutex<B>>,
    devices: Option<Vec<CameraDevice>>,
    session: Option<ActiveSession>,
}

impl<B: DecodeBackend> BarcodeScanner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            devices: None,
            session: None,
        }
    }

    /// Available devices. Enumerated on first call and cached.
    pub async fn devices(&mut self) -> Result<&[CameraDevice], ScannerError> {
        if self.devices.is_none() {
            let devices = self.backend.lock().await.list_devices().await?;
            debug!(count = devices.len(), "capture devices enumerated");
            self.devices = Some(devices);
        }
        Ok(self.devices.as_deref().unwrap_or_default())
    }

    /// Whether a decode session is running.
    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| !session.handle.is_finished())
    }

    /// Device of the running session.
    pub fn active_device(&self) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|session| !session.handle.is_finished())
            .map(|session| session.device_id.as_str())
    }

    /// Starts a decode session on `device_id` (or the first device).
    ///
    /// `on_scan` is called once with the decoded code, after the device has
    /// been released. Returns `Ok(false)` without doing anything if a session
    /// is already running.
    ///
    /// # Errors
    ///
    /// - `ScannerError::NoDevice`: the backend has no devices
    /// - `ScannerError::DeviceNotFound`: `device_id` is not among them
    /// - any error from [`DecodeBackend::acquire`]
    pub async fn start<F>(&mut self, device_id: Option<&str>, on_scan: F) -> Result<bool, ScannerError>
    where
        F: FnOnce(String) + Send + 'static,
    {
        if self.is_active() {
            debug!("scan session already active, ignoring start");
            return Ok(false);
        }
        // a finished session has already released its device
        self.session = None;

        let device_id = {
            let devices = self.devices().await?;
            let selected = match device_id.map(str::trim).filter(|id| !id.is_empty()) {
                Some(id) => devices
                    .iter()
                    .find(|d| d.device_id == id)
                    .ok_or_else(|| ScannerError::DeviceNotFound(id.to_owned()))?,
                None => devices.first().ok_or(ScannerError::NoDevice)?,
            };
            selected.device_id.clone()
        };

        let mut backend = Arc::clone(&self.backend).lock_owned().await;
        backend.acquire(&device_id).await?;
        let lease = DeviceLease {
            backend,
            device_id: device_id.clone(),
        };
        info!(device_id = %device_id, "scan session started");

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(decode_loop(lease, cancel.clone(), on_scan));
        self.session = Some(ActiveSession {
            device_id,
            cancel,
            handle,
        });
        Ok(true)
    }

    /// Waits for the running session to end on its own.
    ///
    /// Returns `None` if no session was started.
    pub async fn wait(&mut self) -> Option<ScanOutcome> {
        let session = self.session.take()?;
        Some(join_session(session).await)
    }

    /// Cancels the running session and waits until the device is released.
    pub async fn stop(&mut self) -> Option<ScanOutcome> {
        let session = self.session.take()?;
        session.cancel.cancel();
        let outcome = join_session(session).await;
        info!(?outcome, "scan session stopped");
        Some(outcome)
    }
}

impl<B: DecodeBackend> Drop for BarcodeScanner<B> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            // the task drops its lease, and with it the device, once cancelled
            session.cancel.cancel();
        }
    }
}

async fn join_session(session: ActiveSession) -> ScanOutcome {
    match session.handle.await {
        Ok(outcome) => outcome,
        Err(e) => ScanOutcome::Failed(ScannerError::Decode(format!("scan task failed: {e}"))),
    }
}

async fn decode_loop<B, F>(
    mut lease: DeviceLease<B>,
    cancel: CancellationToken,
    on_scan: F,
) -> ScanOutcome
where
    B: DecodeBackend,
    F: FnOnce(String) + Send + 'static,
{
    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ScanOutcome::Stopped,
            outcome = lease.backend.decode_next() => outcome,
        };

        match outcome {
            DecodeOutcome::Decoded(code) => {
                counter!(m::SCANNER_CODES_DECODED_TOTAL).increment(1);
                info!(device_id = %lease.device_id, code = %code, "barcode decoded");
                drop(lease);
                on_scan(code.clone());
                return ScanOutcome::Decoded(code);
            }
            DecodeOutcome::NoBarcode => tokio::task::yield_now().await,
            DecodeOutcome::Failed {
                recoverable: true,
                error,
            } => {
                counter!(m::SCANNER_DECODE_ERRORS_TOTAL).increment(1);
                warn!(device_id = %lease.device_id, error = %error, "decode error, continuing");
            }
            DecodeOutcome::Failed {
                recoverable: false,
                error,
            } => {
                warn!(device_id = %lease.device_id, error = %error, "decode session failed");
                return ScanOutcome::Failed(error);
            }
        }
    }
}

/// Lines buffered between a reader and its decoder.
const LINE_BUFFER: usize = 16;

/// Keyboard-wedge decoder.
///
/// Handheld scanners in keyboard mode type the code followed by Enter. Each
/// line is one decode attempt: digit-only lines are decoded codes, anything
/// else counts as "no barcode". End of input closes the device.
///
/// Lines are read by a separate reader (a task for async readers, an OS
/// thread for blocking ones) and handed over a channel. A read that never
/// returns therefore does not keep a stopped session or the runtime alive.
pub struct LineDecoder {
    lines: mpsc::Receiver<std::io::Result<String>>,
    label: String,
    acquired: bool,
}

impl LineDecoder {
    /// Decoder over an async reader. Must be called inside a tokio runtime.
    pub fn new<R>(reader: R, label: impl Into<String>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                let line = lines.next_line().await.transpose();
                let Some(line) = line else { break };
                let failed = line.is_err();
                if tx.send(line).await.is_err() || failed {
                    break;
                }
            }
        });
        Self::from_receiver(rx, label)
    }

    /// Decoder over a blocking reader, read on a dedicated thread.
    ///
    /// The thread exits once the reader hits end of input or the decoder is
    /// dropped and the next line arrives.
    pub fn from_std<R>(reader: R, label: impl Into<String>) -> Self
    where
        R: std::io::BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);
        let spawned = std::thread::Builder::new()
            .name("shelfscan-line-reader".to_owned())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn line reader thread");
        }
        Self::from_receiver(rx, label)
    }

    /// Line decoder over standard input.
    ///
    /// Reads on its own thread: `tokio::io::stdin` blocks runtime shutdown
    /// until the pending read returns, so an interrupted scan would hang
    /// until the next Enter.
    pub fn stdin() -> Self {
        Self::from_std(BufReader::new(std::io::stdin()), "Keyboard wedge (stdin)")
    }

    fn from_receiver(lines: mpsc::Receiver<std::io::Result<String>>, label: impl Into<String>) -> Self {
        Self {
            lines,
            label: label.into(),
            acquired: false,
        }
    }
}

impl DecodeBackend for LineDecoder {
    async fn list_devices(&mut self) -> Result<Vec<CameraDevice>, ScannerError> {
        Ok(vec![CameraDevice {
            label: self.label.clone(),
            device_id: KEYBOARD_DEVICE_ID.to_owned(),
        }])
    }

    async fn acquire(&mut self, device_id: &str) -> Result<(), ScannerError> {
        if device_id != KEYBOARD_DEVICE_ID {
            return Err(ScannerError::DeviceNotFound(device_id.to_owned()));
        }
        self.acquired = true;
        Ok(())
    }

    async fn decode_next(&mut self) -> DecodeOutcome {
        if !self.acquired {
            return DecodeOutcome::Failed {
                recoverable: false,
                error: ScannerError::Decode("device not acquired".to_owned()),
            };
        }

        // `Receiver::recv` is cancel-safe
        match self.lines.recv().await {
            Some(Ok(line)) => match validate_code(&line) {
                Ok(code) => DecodeOutcome::Decoded(code),
                Err(_) => {
                    if !line.trim().is_empty() {
                        debug!(line = %line.trim(), "ignoring non-barcode input");
                    }
                    DecodeOutcome::NoBarcode
                }
            },
            None => DecodeOutcome::Failed {
                recoverable: false,
                error: ScannerError::DeviceClosed(KEYBOARD_DEVICE_ID.to_owned()),
            },
            Some(Err(e)) => DecodeOutcome::Failed {
                recoverable: false,
                error: ScannerError::Decode(e.to_string()),
            },
        }
    }

    fn release(&mut self) {
        self.acquired = false;
    }
}
