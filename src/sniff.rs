//! Counting sniffer
//!
//! [`Sniffer`] sits between a byte source and its consumer. It counts every
//! byte that goes through and classifies the content type from the first
//! [`SNIFF_LEN`] bytes, without ever asking the source for more than the
//! consumer requested.

use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::io::{AsyncRead, ReadBuf};

/// Bytes needed by the longest signature in the `infer` table (tar)
pub const SNIFF_LEN: usize = 261;

/// Label used when no signature matches
pub const UNKNOWN_TYPE: &str = "application/octet-stream";

#[derive(Debug)]
pub struct Sniffer<R> {
    inner: R,
    count: u64,
    // cleared once the label is resolved
    prefix: Vec<u8>,
    label: Option<&'static str>,
    source_failed: bool,
}

impl<R> Sniffer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            count: 0,
            prefix: Vec::with_capacity(SNIFF_LEN),
            label: None,
            source_failed: false,
        }
    }

    /// Bytes read so far
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// `None` until [`SNIFF_LEN`] bytes or EOF have been seen
    pub const fn content_type(&self) -> Option<&'static str> {
        self.label
    }

    /// True if the wrapped source returned an error
    pub const fn source_failed(&self) -> bool {
        self.source_failed
    }

    /// Resolve the label with whatever was collected, for callers that stop
    /// reading before EOF
    pub fn finish(&mut self) -> &'static str {
        self.resolve()
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn observe(&mut self, bytes: &[u8], had_room: bool) {
        self.count += bytes.len() as u64;

        if self.label.is_some() {
            return;
        }

        // a read of 0 bytes into a non-full buffer is EOF
        if bytes.is_empty() {
            if had_room {
                self.resolve();
            }
            return;
        }

        let wanted = SNIFF_LEN.saturating_sub(self.prefix.len()).min(bytes.len());
        self.prefix
            .extend_from_slice(bytes.get(..wanted).unwrap_or_default());

        if self.prefix.len() >= SNIFF_LEN {
            self.resolve();
        }
    }

    fn resolve(&mut self) -> &'static str {
        if let Some(label) = self.label {
            return label;
        }

        let label = infer::get(&self.prefix).map_or(UNKNOWN_TYPE, |t| t.mime_type());

        self.label = Some(label);
        self.prefix = Vec::new();

        label
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for Sniffer<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let had_room = buf.remaining() > 0;

        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => {
                this.source_failed = true;
                Poll::Ready(Err(e))
            }
            Poll::Ready(Ok(())) => {
                this.observe(buf.filled().get(before..).unwrap_or_default(), had_room);
                Poll::Ready(Ok(()))
            }
        }
    }
}
