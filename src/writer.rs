//! Dedicated writer task for the data plane.
//!
//! After a successful handshake, producers submit opaque payloads via
//! an mpsc channel; a writer task encodes data frames and writes them
//! to the stream, batching ready frames into single vectored writes.
//!
//! ```text
//! Producer 1 ─┐
//! Producer 2 ─┼─► mpsc::Sender<DataFrame> ─► Writer Task ─► Stream
//! Producer N ─┘
//! ```
//!
//! A pending-frame counter provides backpressure: submissions wait for
//! the queue to drain and fail with a timeout rather than queuing
//! outbound bytes without bound.

use std::io::IoSlice;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{FramestreamError, Result};
use crate::protocol::wire_format::LENGTH_PREFIX_SIZE;

/// Default maximum pending frames before backpressure kicks in.
pub const DEFAULT_MAX_PENDING_FRAMES: usize = 1024;

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Default backpressure timeout.
pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum frames to batch in a single write operation.
const MAX_BATCH_SIZE: usize = 64;

/// An encoded data frame ready to be written.
#[derive(Debug)]
pub struct DataFrame {
    /// Big-endian length prefix.
    prefix: [u8; LENGTH_PREFIX_SIZE],
    /// Opaque payload bytes.
    payload: Bytes,
}

impl DataFrame {
    /// Create a data frame for the given payload.
    ///
    /// Fails with [`FramestreamError::EmptyDataFrame`] for an empty
    /// payload: its length prefix would be byte-identical to the
    /// escape sequence, and the wire format leaves that case
    /// undefined. Refusing it here keeps the ambiguity off the wire.
    pub fn new(payload: Bytes) -> Result<Self> {
        if payload.is_empty() {
            return Err(FramestreamError::EmptyDataFrame);
        }
        Ok(Self {
            prefix: (payload.len() as u32).to_be_bytes(),
            payload,
        })
    }

    /// Total size of this frame on the wire (prefix + payload).
    #[inline]
    pub fn size(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.payload.len()
    }
}

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Maximum pending frames before backpressure kicks in.
    pub max_pending_frames: usize,
    /// Channel capacity for the frame queue.
    pub channel_capacity: usize,
    /// Timeout when waiting for backpressure to clear.
    pub backpressure_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            max_pending_frames: DEFAULT_MAX_PENDING_FRAMES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            backpressure_timeout: DEFAULT_BACKPRESSURE_TIMEOUT,
        }
    }
}

/// Handle for submitting payloads to the writer task.
///
/// Cheaply cloneable; may be shared across producers.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<DataFrame>,
    pending: Arc<AtomicUsize>,
    max_pending: usize,
    timeout: Duration,
}

impl WriterHandle {
    fn new(
        tx: mpsc::Sender<DataFrame>,
        pending: Arc<AtomicUsize>,
        max_pending: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            tx,
            pending,
            max_pending,
            timeout,
        }
    }

    /// Submit a payload as one data frame.
    ///
    /// Waits when backpressure is active, failing with
    /// [`FramestreamError::BackpressureTimeout`] after the configured
    /// duration.
    pub async fn send(&self, payload: Bytes) -> Result<()> {
        let frame = DataFrame::new(payload)?;

        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            self.wait_for_backpressure().await?;
        }

        // Increment BEFORE sending so the count never undershoots.
        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.send(frame).await.map_err(|_| {
            self.pending.fetch_sub(1, Ordering::Release);
            FramestreamError::ConnectionClosed
        })
    }

    /// Submit without waiting; fails immediately at capacity.
    pub fn try_send(&self, payload: Bytes) -> Result<()> {
        let frame = DataFrame::new(payload)?;

        if self.pending.load(Ordering::Acquire) >= self.max_pending {
            return Err(FramestreamError::BackpressureTimeout);
        }

        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.try_send(frame).map_err(|e| {
            self.pending.fetch_sub(1, Ordering::Release);
            match e {
                mpsc::error::TrySendError::Full(_) => FramestreamError::BackpressureTimeout,
                mpsc::error::TrySendError::Closed(_) => FramestreamError::ConnectionClosed,
            }
        })
    }

    async fn wait_for_backpressure(&self) -> Result<()> {
        let start = Instant::now();
        let check_interval = Duration::from_micros(100);

        loop {
            if self.pending.load(Ordering::Acquire) < self.max_pending {
                return Ok(());
            }
            if start.elapsed() > self.timeout {
                return Err(FramestreamError::BackpressureTimeout);
            }
            tokio::time::sleep(check_interval).await;
        }
    }

    /// Check if backpressure is currently active.
    #[inline]
    pub fn is_backpressure_active(&self) -> bool {
        self.pending.load(Ordering::Acquire) >= self.max_pending
    }

    /// Current pending frame count.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Spawn the writer task over the given stream.
///
/// Returns the submission handle and the task's `JoinHandle`; the task
/// exits cleanly when every handle is dropped.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let pending = Arc::new(AtomicUsize::new(0));

    let handle = WriterHandle::new(
        tx,
        pending.clone(),
        config.max_pending_frames,
        config.backpressure_timeout,
    );

    let task = tokio::spawn(writer_loop(rx, writer, pending));

    (handle, task)
}

/// Spawn the writer task with default configuration.
pub fn spawn_writer_task_default<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_writer_task(writer, WriterConfig::default())
}

/// Main writer loop: drain the channel in batches and write them out.
async fn writer_loop<W>(
    mut rx: mpsc::Receiver<DataFrame>,
    mut writer: W,
    pending: Arc<AtomicUsize>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let first = match rx.recv().await {
            Some(frame) => frame,
            None => return Ok(()), // all handles dropped
        };

        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        let batch_size = batch.len();
        write_batch(&mut writer, &batch).await?;

        pending.fetch_sub(batch_size, Ordering::Release);
    }
}

/// Write a batch of frames with scatter/gather I/O, flushing at the end.
async fn write_batch<W>(writer: &mut W, batch: &[DataFrame]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if batch.is_empty() {
        return Ok(());
    }

    let mut slices: Vec<IoSlice<'_>> = Vec::with_capacity(batch.len() * 2);
    for frame in batch {
        slices.push(IoSlice::new(&frame.prefix));
        slices.push(IoSlice::new(&frame.payload));
    }

    let total_size: usize = batch.iter().map(DataFrame::size).sum();

    let written = writer.write_vectored(&slices).await?;
    if written == 0 {
        return Err(FramestreamError::Io(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            "write_vectored returned 0",
        )));
    }

    // Partial write: continue with the remaining slices.
    let mut total_written = written;
    while total_written < total_size {
        let remaining = build_remaining_slices(batch, total_written);
        if remaining.is_empty() {
            break;
        }

        let written = writer.write_vectored(&remaining).await?;
        if written == 0 {
            return Err(FramestreamError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                "write_vectored returned 0",
            )));
        }
        total_written += written;
    }

    writer.flush().await?;
    Ok(())
}

/// Build the IoSlice array for whatever a partial write left behind.
fn build_remaining_slices(batch: &[DataFrame], skip_bytes: usize) -> Vec<IoSlice<'_>> {
    let mut slices = Vec::with_capacity(batch.len() * 2);
    let mut skipped = 0;

    for frame in batch {
        let prefix_end = skipped + LENGTH_PREFIX_SIZE;
        if skip_bytes < prefix_end {
            let start = skip_bytes.saturating_sub(skipped);
            slices.push(IoSlice::new(&frame.prefix[start..]));
        }
        skipped = prefix_end;

        let payload_end = skipped + frame.payload.len();
        if skip_bytes < payload_end {
            let start = skip_bytes.saturating_sub(skipped);
            slices.push(IoSlice::new(&frame.payload[start..]));
        }
        skipped = payload_end;
    }

    slices
}
