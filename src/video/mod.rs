//! Frame containers and the remapping engine.

#[cfg(feature = "decode")]
pub mod decode;
mod pixel;
pub mod remap;

use crate::RemapError;
pub use pixel::*;

/// Row alignment of freshly allocated planes, in samples.
const PLANE_ALIGNMENT: usize = 64;

/// A container holding the data for one video frame. This includes all planes
/// of the video. Currently, only planar YUV/YCbCr formats are supported. Bit
/// depths up to 16-bit are supported.
#[derive(Clone, Debug)]
pub struct FrameInfo<T: Pixel> {
    /// A container holding three planes worth of video data.
    /// The indices in the array correspond to the following planes:
    ///
    /// - 0 - Y/Luma plane
    /// - 1 - U/Cb plane
    /// - 2 - V/Cr plane
    ///
    /// For monochrome video the chroma planes are empty.
    pub planes: [PlaneData<T>; 3],
    /// The number of bits per pixel.
    pub bit_depth: usize,
    /// The chroma sampling format of the video. Most videos are in 4:2:0 format.
    pub chroma_sampling: ChromaSampling,
}

impl<T: Pixel> FrameInfo<T> {
    /// Allocates a zeroed frame of the given luma dimensions. Chroma planes
    /// are dimensioned by the chroma sampling, rounding odd luma sizes up.
    pub fn new(
        width: usize,
        height: usize,
        bit_depth: usize,
        chroma_sampling: ChromaSampling,
    ) -> Self {
        let (chroma_width, chroma_height) = chroma_sampling.get_chroma_dimensions(width, height);
        FrameInfo {
            planes: [
                PlaneData::new(width, height),
                PlaneData::new(chroma_width, chroma_height),
                PlaneData::new(chroma_width, chroma_height),
            ],
            bit_depth,
            chroma_sampling,
        }
    }

    /// The number of planes carrying data for this frame's chroma sampling.
    pub fn plane_count(&self) -> usize {
        if self.chroma_sampling == ChromaSampling::Cs400 {
            1
        } else {
            3
        }
    }

    pub(crate) fn can_remap(&self) -> Result<(), RemapError> {
        if self.bit_depth > 16 {
            return Err(RemapError::UnsupportedInput {
                reason: "Bit depths above 16 are not supported",
            });
        }
        for plane in self.planes.iter().take(self.plane_count()) {
            if plane.width == 0 || plane.height == 0 {
                return Err(RemapError::UnsupportedInput {
                    reason: "Zero-sized planes cannot be remapped",
                });
            }
            if plane.stride < plane.width || plane.data.len() < plane.stride * plane.height {
                return Err(RemapError::UnsupportedInput {
                    reason: "Plane buffers must cover stride * height samples",
                });
            }
        }
        if self.plane_count() == 3
            && (self.planes[1].width != self.planes[2].width
                || self.planes[1].height != self.planes[2].height
                || self.planes[1].stride != self.planes[2].stride)
        {
            return Err(RemapError::UnsupportedInput {
                reason: "U and V planes must share dimensions and stride",
            });
        }
        Ok(())
    }
}

/// Contains the data for one plane in a video frame. For chroma planes, this
/// data is represented in the original chroma sampling. E.g. if this is a
/// 4:2:0 video clip, the chroma planes will have half the resolution, in each
/// dimension, of the luma plane.
#[derive(Clone, Debug)]
pub struct PlaneData<T: Pixel> {
    /// The width, in pixels, of this plane.
    pub width: usize,
    /// The height, in pixels, of this plane.
    pub height: usize,
    /// The distance between the starts of two consecutive rows, in samples.
    /// Always at least `width`; the samples past `width` in each row are
    /// padding and carry no image data.
    pub stride: usize,
    /// A plane's samples are contained in this `Vec`, in row-major order,
    /// `stride * height` long. A `u8` should be used for low-bit-depth
    /// video, and `u16` for high-bit-depth.
    pub data: Vec<T>,
}

impl<T: Pixel> PlaneData<T> {
    /// Allocates a zeroed plane with an aligned stride.
    pub fn new(width: usize, height: usize) -> Self {
        let stride = if width == 0 {
            0
        } else {
            (width + PLANE_ALIGNMENT - 1) & !(PLANE_ALIGNMENT - 1)
        };
        PlaneData {
            width,
            height,
            stride,
            data: vec![T::cast_from(0u8); stride * height],
        }
    }

    /// Returns the visible samples of the row at vertical index `y`.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        &self.data[y * self.stride..y * self.stride + self.width]
    }

    /// Returns the visible samples of the row at vertical index `y`, mutably.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let stride = self.stride;
        let width = self.width;
        &mut self.data[y * stride..y * stride + width]
    }

    /// Copies raw little-endian sample data into this plane.
    /// `source_bytewidth` is the number of bytes per sample (1 or 2).
    pub fn copy_from_raw_u8(
        &mut self,
        source: &[u8],
        source_stride: usize,
        source_bytewidth: usize,
    ) {
        let width = self.width;
        for (self_row, source_row) in self
            .data
            .chunks_mut(self.stride.max(1))
            .zip(source.chunks(source_stride))
        {
            match source_bytewidth {
                1 => {
                    for (out, input) in self_row.iter_mut().zip(source_row.iter()).take(width) {
                        *out = T::cast_from(*input);
                    }
                }
                2 => {
                    for (out, bytes) in self_row.iter_mut().zip(source_row.chunks(2)).take(width) {
                        *out = T::cast_from(u16::from(bytes[1]) << 8 | u16::from(bytes[0]));
                    }
                }
                _ => unreachable!("samples wider than 2 bytes are not supported"),
            }
        }
    }

    /// Serializes the visible samples of this plane to raw little-endian
    /// bytes, dropping the stride padding.
    pub fn to_raw_u8(&self, dest_bytewidth: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * self.height * dest_bytewidth);
        for y in 0..self.height {
            for sample in self.row(y) {
                let v: u32 = (*sample).into();
                match dest_bytewidth {
                    1 => out.push(v as u8),
                    2 => {
                        out.push(v as u8);
                        out.push((v >> 8) as u8);
                    }
                    _ => unreachable!("samples wider than 2 bytes are not supported"),
                }
            }
        }
        out
    }
}

/// Available chroma sampling formats.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ChromaSampling {
    /// Both vertically and horizontally subsampled.
    Cs420,
    /// Horizontally subsampled.
    Cs422,
    /// Not subsampled.
    Cs444,
    /// Monochrome.
    Cs400,
}

impl Default for ChromaSampling {
    fn default() -> Self {
        ChromaSampling::Cs420
    }
}

impl ChromaSampling {
    /// Provides the amount to right shift the luma plane dimensions to get the
    ///  chroma plane dimensions.
    /// Only values 0 or 1 are ever returned.
    /// The plane dimensions must also be rounded up to accommodate odd luma plane
    ///  sizes.
    /// Cs400 returns None, as there are no chroma planes.
    pub(crate) fn get_decimation(self) -> Option<(usize, usize)> {
        use self::ChromaSampling::*;
        match self {
            Cs420 => Some((1, 1)),
            Cs422 => Some((1, 0)),
            Cs444 => Some((0, 0)),
            Cs400 => None,
        }
    }

    /// Calculates the size of a chroma plane for this sampling type, given the luma plane dimensions.
    pub(crate) fn get_chroma_dimensions(
        self,
        luma_width: usize,
        luma_height: usize,
    ) -> (usize, usize) {
        if let Some((ss_x, ss_y)) = self.get_decimation() {
            ((luma_width + ss_x) >> ss_x, (luma_height + ss_y) >> ss_y)
        } else {
            (0, 0)
        }
    }
}
