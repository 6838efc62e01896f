use ndarray::{Array3, ArrayView2, Axis};

use crate::error::{Error, Result};
use crate::io::{FrameSink, FrameSource};
use crate::types::FrameDimensions;

/// Stack held in memory as a `frames x height x width` array.
#[derive(Debug, Clone)]
pub struct InMemoryStack {
    frames: Array3<u16>,
}

impl InMemoryStack {
    pub fn new(frames: Array3<u16>) -> Self {
        Self { frames }
    }

    /// Build a stack from flat, row-major frames of identical size.
    pub fn from_frames(dims: FrameDimensions, frames: &[Vec<u16>]) -> Result<Self> {
        let mut data = Vec::with_capacity(frames.len() * dims.dimension());
        for (i, frame) in frames.iter().enumerate() {
            if frame.len() != dims.dimension() {
                return Err(Error::DimensionMismatch {
                    index: i + 1,
                    expected: dims.dimension(),
                    actual: frame.len(),
                });
            }
            data.extend_from_slice(frame);
        }
        let frames = Array3::from_shape_vec((frames.len(), dims.height, dims.width), data)?;
        Ok(Self { frames })
    }

    pub fn frames(&self) -> &Array3<u16> {
        &self.frames
    }

    /// View of frame `index` (1-based).
    pub fn frame(&self, index: usize) -> Option<ArrayView2<'_, u16>> {
        if index == 0 || index > self.frames.len_of(Axis(0)) {
            return None;
        }
        Some(self.frames.index_axis(Axis(0), index - 1))
    }
}

impl FrameSource for InMemoryStack {
    fn frame_count(&self) -> usize {
        self.frames.len_of(Axis(0))
    }

    fn dimensions(&self) -> FrameDimensions {
        let (_, height, width) = self.frames.dim();
        FrameDimensions::new(width, height)
    }

    fn read_frame(&mut self, index: usize, buf: &mut [u16]) -> Result<()> {
        let count = self.frame_count();
        let view = self
            .frame(index)
            .ok_or(Error::FrameOutOfRange { index, count })?;
        if view.len() != buf.len() {
            return Err(Error::DimensionMismatch {
                index,
                expected: buf.len(),
                actual: view.len(),
            });
        }
        match view.as_slice() {
            Some(slice) => buf.copy_from_slice(slice),
            None => buf.iter_mut().zip(view.iter()).for_each(|(d, &s)| *d = s),
        }
        Ok(())
    }
}

/// Sink that keeps every emitted frame, in emission order.
#[derive(Debug, Clone)]
pub struct StackCollector {
    dims: FrameDimensions,
    indices: Vec<usize>,
    data: Vec<u16>,
}

impl StackCollector {
    pub fn new(dims: FrameDimensions) -> Self {
        Self {
            dims,
            indices: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Source frame indices of the collected frames.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Flat samples of the `n`-th collected frame (0-based).
    pub fn frame(&self, n: usize) -> Option<&[u16]> {
        let dimension = self.dims.dimension();
        self.data.get(n * dimension..(n + 1) * dimension)
    }

    pub fn into_array(self) -> Result<Array3<u16>> {
        let shape = (self.indices.len(), self.dims.height, self.dims.width);
        Ok(Array3::from_shape_vec(shape, self.data)?)
    }
}

impl FrameSink for StackCollector {
    fn push_frame(&mut self, index: usize, samples: &[u16]) -> Result<()> {
        if samples.len() != self.dims.dimension() {
            return Err(Error::DimensionMismatch {
                index,
                expected: self.dims.dimension(),
                actual: samples.len(),
            });
        }
        self.indices.push(index);
        self.data.extend_from_slice(samples);
        Ok(())
    }
}
