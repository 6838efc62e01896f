//! Multi-page 16-bit grayscale TIFF stacks, one page per frame.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use ::tiff::ColorType;
use ::tiff::decoder::{Decoder, DecodingResult, Limits};
use ::tiff::encoder::{TiffEncoder, TiffKindBig, colortype};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::{FrameSink, FrameSource};
use crate::types::FrameDimensions;

/// Lazily decoded TIFF stack; pages are read on demand.
pub struct TiffStackReader {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
    dims: FrameDimensions,
    frames: usize,
}

impl TiffStackReader {
    /// Open `path` and check that every page is a 16-bit gray image of the
    /// same size as the first one.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());

        let dims = page_dimensions(&mut decoder, 1)?;
        let mut frames = 1;
        while decoder.more_images() {
            decoder.next_image()?;
            frames += 1;
            let page = page_dimensions(&mut decoder, frames)?;
            if page != dims {
                return Err(Error::DimensionMismatch {
                    index: frames,
                    expected: dims.dimension(),
                    actual: page.dimension(),
                });
            }
        }
        decoder.seek_to_image(0)?;

        info!(
            "Opened {} ({} frames of {})",
            path.display(),
            frames,
            dims
        );

        Ok(Self {
            path: path.to_path_buf(),
            decoder,
            dims,
            frames,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn page_dimensions(
    decoder: &mut Decoder<BufReader<File>>,
    page: usize,
) -> Result<FrameDimensions> {
    match decoder.colortype()? {
        ColorType::Gray(16) => {}
        other => {
            return Err(Error::UnsupportedSampleFormat(format!(
                "page {page} is {other:?}, expected 16-bit grayscale"
            )));
        }
    }
    let (width, height) = decoder.dimensions()?;
    Ok(FrameDimensions::new(width as usize, height as usize))
}

impl FrameSource for TiffStackReader {
    fn frame_count(&self) -> usize {
        self.frames
    }

    fn dimensions(&self) -> FrameDimensions {
        self.dims
    }

    fn read_frame(&mut self, index: usize, buf: &mut [u16]) -> Result<()> {
        if index == 0 || index > self.frames {
            return Err(Error::FrameOutOfRange {
                index,
                count: self.frames,
            });
        }
        self.decoder.seek_to_image(index - 1)?;
        match self.decoder.read_image()? {
            DecodingResult::U16(data) => {
                if data.len() != buf.len() {
                    return Err(Error::DimensionMismatch {
                        index,
                        expected: buf.len(),
                        actual: data.len(),
                    });
                }
                buf.copy_from_slice(&data);
                Ok(())
            }
            _ => Err(Error::UnsupportedSampleFormat(format!(
                "page {index} did not decode to 16-bit samples"
            ))),
        }
    }
}

/// Largest file a classic TIFF can address with its 32-bit offsets.
const CLASSIC_TIFF_LIMIT: u64 = u32::MAX as u64;

/// Whether `frames` pages of `dims` need BigTIFF's 64-bit offsets.
///
/// Counts the pixel payload plus a per-page allowance for the IFD and strip tables.
pub fn needs_big_tiff(dims: FrameDimensions, frames: usize) -> bool {
    let page = dims.dimension() as u64 * 2;
    let tables = 1024 + dims.dimension() as u64 / 256;
    (page + tables).saturating_mul(frames as u64) > CLASSIC_TIFF_LIMIT
}

enum StackEncoder {
    Classic(TiffEncoder<File>),
    Big(TiffEncoder<File, TiffKindBig>),
}

/// Writes every pushed frame as a new page of a 16-bit grayscale TIFF.
pub struct TiffStackWriter {
    path: PathBuf,
    encoder: StackEncoder,
    dims: FrameDimensions,
    written: usize,
}

impl TiffStackWriter {
    /// Create a writer for `frames` pages, switching to BigTIFF when a classic
    /// file could not hold them.
    pub fn create(path: &Path, dims: FrameDimensions, frames: usize) -> Result<Self> {
        if needs_big_tiff(dims, frames) {
            Self::create_big(path, dims)
        } else {
            let file = create_file(path)?;
            Ok(Self::with_encoder(path, dims, StackEncoder::Classic(TiffEncoder::new(file)?)))
        }
    }

    /// Create a BigTIFF writer regardless of the expected size.
    pub fn create_big(path: &Path, dims: FrameDimensions) -> Result<Self> {
        let file = create_file(path)?;
        info!("Writing {} as BigTIFF", path.display());
        Ok(Self::with_encoder(path, dims, StackEncoder::Big(TiffEncoder::new_big(file)?)))
    }

    fn with_encoder(path: &Path, dims: FrameDimensions, encoder: StackEncoder) -> Self {
        Self {
            path: path.to_path_buf(),
            encoder,
            dims,
            written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_big_tiff(&self) -> bool {
        matches!(self.encoder, StackEncoder::Big(_))
    }

    /// Pages written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

impl FrameSink for TiffStackWriter {
    fn push_frame(&mut self, index: usize, samples: &[u16]) -> Result<()> {
        if samples.len() != self.dims.dimension() {
            return Err(Error::DimensionMismatch {
                index,
                expected: self.dims.dimension(),
                actual: samples.len(),
            });
        }
        let (width, height) = (self.dims.width as u32, self.dims.height as u32);
        match &mut self.encoder {
            StackEncoder::Classic(encoder) => {
                encoder.write_image::<colortype::Gray16>(width, height, samples)?
            }
            StackEncoder::Big(encoder) => {
                encoder.write_image::<colortype::Gray16>(width, height, samples)?
            }
        }
        self.written += 1;
        debug!("Wrote page {} (source frame {})", self.written, index);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!("Saved {} frames to {}", self.written, self.path.display());
        Ok(())
    }
}
