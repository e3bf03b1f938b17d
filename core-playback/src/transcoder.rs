//! # Transcode Pipeline
//!
//! Spawns the external transcoding process, pumps the resolved raw stream
//! into its stdin, and frames its stdout into fixed-size PCM frames.
//!
//! ```text
//! ┌──────────┐  stdin pump   ┌─────────┐  stdout read  ┌──────────────┐
//! │ raw      ├──────────────>│ ffmpeg  ├──────────────>│ FrameEncoder │
//! │ stream   │               │ (child) │               │  → frames    │
//! └──────────┘               └─────────┘               └──────┬───────┘
//!                                                             │ mpsc
//!                                                             ▼
//!                                                   PlayableResource
//! ```
//!
//! ## Lifecycle
//!
//! One [`ActiveTranscode`] per invocation. Cancelling it (seek, filter
//! change, track replacement) kills the child process and ends both pump
//! and reader tasks; the child is also spawned with `kill_on_drop` so a
//! dropped handle can never leak a process.
//!
//! ## Failure semantics
//!
//! A spawn failure is surfaced immediately from [`Transcoder::start`] — no
//! resource can be constructed. Once frames are flowing, an abnormal exit
//! or broken pipe simply closes the frame channel: the consumer observes
//! natural end of stream and the error is logged for diagnostics.

use bytes::Bytes;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use core_runtime::config::TranscoderConfig;
use session_traits::{ByteStream, Result, SessionError};

use crate::encoder::FrameEncoder;

/// Read size for the transcoder's stdout.
const STDOUT_CHUNK_BYTES: usize = 8 * 1024;

/// Factory for transcode invocations.
#[derive(Debug, Clone)]
pub struct Transcoder {
    config: TranscoderConfig,
}

impl Transcoder {
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Spawns the external process and wires up both pipe tasks.
    ///
    /// `raw` is consumed by the stdin pump. The returned handle owns the
    /// frame channel (for the resource) and the cancellation token (for the
    /// session).
    ///
    /// Fails with [`SessionError::TranscodeFailure`] if the process cannot
    /// be spawned — the one case where no resource can be constructed.
    #[instrument(skip(self, raw, args), fields(binary = %self.config.binary))]
    pub fn start(&self, mut raw: ByteStream, args: Vec<String>) -> Result<ActiveTranscode> {
        debug!(?args, "spawning transcoder");

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SessionError::TranscodeFailure(format!(
                    "failed to spawn {}: {}",
                    self.config.binary, e
                ))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            SessionError::TranscodeFailure("transcoder stdin was not piped".to_string())
        })?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            SessionError::TranscodeFailure("transcoder stdout was not piped".to_string())
        })?;

        let cancel = CancellationToken::new();
        let (frame_tx, frame_rx) = mpsc::channel::<Bytes>(self.config.frame_channel_capacity);

        // Stdin pump: raw stream → child. A write error here means the
        // child went away; the reader task reports that, so the pump just
        // stops quietly.
        let pump_cancel = cancel.clone();
        let chunk_bytes = self.config.stdin_chunk_bytes;
        let pump: JoinHandle<()> = tokio::spawn(async move {
            let mut buf = vec![0u8; chunk_bytes];
            loop {
                let read = tokio::select! {
                    _ = pump_cancel.cancelled() => break,
                    read = raw.read(&mut buf) => read,
                };
                match read {
                    Ok(0) => break,
                    Ok(n) => {
                        if stdin.write_all(&buf[..n]).await.is_err() {
                            debug!("transcoder stdin closed early");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "raw stream read failed mid-transcode");
                        break;
                    }
                }
            }
            // Closing stdin signals end of input to the child.
            let _ = stdin.shutdown().await;
        });

        // Stdout reader: child → frames. Owns the child so it can reap the
        // exit status after the pipe drains.
        let reader_cancel = cancel.clone();
        let reader: JoinHandle<()> = tokio::spawn(async move {
            let mut encoder = FrameEncoder::new();
            let mut buf = vec![0u8; STDOUT_CHUNK_BYTES];
            let mut frames_sent: u64 = 0;

            'read: loop {
                let read = tokio::select! {
                    _ = reader_cancel.cancelled() => {
                        let _ = child.start_kill();
                        break 'read;
                    }
                    read = stdout.read(&mut buf) => read,
                };
                match read {
                    Ok(0) => {
                        if let Some(last) = encoder.flush() {
                            if frame_tx.send(last).await.is_ok() {
                                frames_sent += 1;
                            }
                        }
                        break 'read;
                    }
                    Ok(n) => {
                        for frame in encoder.push(&buf[..n]) {
                            if frame_tx.send(frame).await.is_err() {
                                // Consumer gone (resource replaced); stop
                                // the child rather than transcode into the
                                // void.
                                let _ = child.start_kill();
                                break 'read;
                            }
                            frames_sent += 1;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "transcoder stdout read failed");
                        break 'read;
                    }
                }
            }

            match child.wait().await {
                Ok(status) if status.success() => {
                    debug!(frames_sent, "transcoder exited cleanly");
                }
                Ok(status) => {
                    if frames_sent == 0 && !reader_cancel.is_cancelled() {
                        error!(%status, "transcoder exited before producing any frame");
                    } else {
                        warn!(%status, frames_sent, "transcoder exited abnormally");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to reap transcoder process");
                }
            }
            // frame_tx drops here; the consumer sees end of stream.
        });

        Ok(ActiveTranscode {
            frames: Some(frame_rx),
            cancel,
            pump: Some(pump),
            reader: Some(reader),
        })
    }
}

/// Handle over one running transcode invocation.
pub struct ActiveTranscode {
    frames: Option<mpsc::Receiver<Bytes>>,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl ActiveTranscode {
    /// Takes the frame channel to build the playable resource. Yields
    /// `Some` exactly once.
    pub fn take_frames(&mut self) -> Option<mpsc::Receiver<Bytes>> {
        self.frames.take()
    }

    /// Signals cancellation without waiting for the tasks to finish.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels and waits for both pipe tasks to release their resources.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.await;
        }
    }
}

impl Drop for ActiveTranscode {
    fn drop(&mut self) {
        // Tasks notice the token and the child dies via kill_on_drop even
        // if shutdown() was never awaited.
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for ActiveTranscode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveTranscode")
            .field("frames_taken", &self.frames.is_none())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
