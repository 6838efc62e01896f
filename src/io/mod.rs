//! I/O layer: the frame source and sink boundaries the filter runs against,
//! plus in-memory (`ndarray`) and multi-page TIFF adapters and the JSON run sidecar.
use crate::error::Result;
use crate::types::FrameDimensions;

pub mod memory;
pub use memory::{InMemoryStack, StackCollector};

pub mod tiff;
pub use self::tiff::{TiffStackReader, TiffStackWriter};

pub mod sidecar;

/// Read-only, randomly addressable sequence of equally sized 16-bit frames.
pub trait FrameSource {
    /// Number of frames in the stack.
    fn frame_count(&self) -> usize;

    fn dimensions(&self) -> FrameDimensions;

    /// Copy frame `index` (1-based) into `buf`, which holds exactly one frame.
    ///
    /// # Errors
    ///
    /// Fails if the index is outside `1..=frame_count()` or the frame cannot be decoded.
    fn read_frame(&mut self, index: usize, buf: &mut [u16]) -> Result<()>;
}

/// Consumer of filtered frames, fed in ascending frame order.
pub trait FrameSink {
    /// Accept the filtered version of source frame `index`.
    ///
    /// Returning an error aborts the run before the next slide.
    fn push_frame(&mut self, index: usize, samples: &[u16]) -> Result<()>;

    /// Called once after the last frame was pushed.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn frame_count(&self) -> usize {
        (**self).frame_count()
    }

    fn dimensions(&self) -> FrameDimensions {
        (**self).dimensions()
    }

    fn read_frame(&mut self, index: usize, buf: &mut [u16]) -> Result<()> {
        (**self).read_frame(index, buf)
    }
}

impl<K: FrameSink + ?Sized> FrameSink for &mut K {
    fn push_frame(&mut self, index: usize, samples: &[u16]) -> Result<()> {
        (**self).push_frame(index, samples)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}
