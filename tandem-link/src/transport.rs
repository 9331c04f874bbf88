//! Ready-made transport strategies.
//!
//! The DMA-style strategy is target-specific and lives with the board
//! support code; it only has to implement [`FrameTransport`]. The blocking
//! strategy below works over any [`embedded_io::Write`] and is acceptable
//! because frames are small and fixed-size.

use crate::traits::FrameTransport;

/// Synchronous byte-at-a-time transport over an `embedded-io` writer.
///
/// Returns only once every byte has been handed to the peripheral. Write
/// errors are swallowed: the send contract is best effort and the protocol
/// recovers by retry.
#[derive(Debug)]
pub struct BlockingWriter<W> {
    inner: W,
}

impl<W> BlockingWriter<W> {
    /// Wrap a writer bound to the inter-board serial channel
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Give back the wrapped writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: embedded_io::Write> FrameTransport for BlockingWriter<W> {
    fn send(&mut self, buffer: &[u8]) {
        let _ = self.inner.write_all(buffer);
        let _ = self.inner.flush();
    }
}
