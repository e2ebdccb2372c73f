//! Per-output-pixel weight tables.
//!
//! For every output pixel the builder walks a super-sampling grid, maps
//! each sub-sample through the geometry kernel, and accumulates how often
//! each input sample is hit. The resampler later replays these counts as a
//! weighted mean.

use super::geometry::SampleMapper;
use crate::RemapError;

/// Bits of a packed pair holding the sub-sample count. The remaining high
/// bits hold the input sample offset.
const COUNT_BITS: u32 = 8;
const COUNT_MASK: u32 = (1 << COUNT_BITS) - 1;

/// The largest input sample offset a packed pair can address.
const MAX_OFFSET: usize = (1 << (32 - COUNT_BITS)) - 1;

/// The weight table for one output plane.
///
/// Pairs of all pixels live in one flat vector; `starts[i]..starts[i + 1]`
/// is pixel `i`'s slice, in row-major pixel order. Each pair packs an input
/// sample offset (24 bits, stride already applied) with the number of
/// sub-samples that landed on it (8 bits). Per pixel the counts sum to
/// exactly `subs`.
#[derive(Debug)]
pub(crate) struct PlaneMap {
    width: usize,
    height: usize,
    subs: u32,
    starts: Vec<u32>,
    pairs: Vec<u32>,
}

#[inline(always)]
pub(crate) fn pair_offset(pair: u32) -> usize {
    (pair >> COUNT_BITS) as usize
}

#[inline(always)]
pub(crate) fn pair_count(pair: u32) -> u32 {
    pair & COUNT_MASK
}

impl PlaneMap {
    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn height(&self) -> usize {
        self.height
    }

    /// Total sub-samples per output pixel.
    pub(crate) fn subs(&self) -> u32 {
        self.subs
    }

    /// The packed pairs contributing to the output pixel at row-major
    /// index `idx`.
    #[inline]
    pub(crate) fn pairs_for(&self, idx: usize) -> &[u32] {
        &self.pairs[self.starts[idx] as usize..self.starts[idx + 1] as usize]
    }
}

/// Builds the weight table mapping an `out_width` x `out_height` output
/// plane onto an input plane of the given dimensions and stride (in
/// samples). Runs once per stream and plane kind.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build(
    mapper: &SampleMapper,
    out_width: usize,
    out_height: usize,
    in_width: usize,
    in_height: usize,
    in_stride: usize,
    w_sub: u32,
    h_sub: u32,
) -> Result<PlaneMap, RemapError> {
    debug_assert!(in_width <= in_stride);
    if (in_height - 1) * in_stride + (in_width - 1) > MAX_OFFSET {
        return Err(RemapError::MapOverflow);
    }

    let subs = w_sub * h_sub;
    let mut starts = Vec::with_capacity(out_width * out_height + 1);
    let mut pairs = Vec::with_capacity(out_width * out_height);
    // Distinct input samples hit by the current pixel's grid.
    let mut scratch: Vec<(u32, u32)> = Vec::with_capacity(subs as usize);

    for i in 0..out_height {
        for j in 0..out_width {
            scratch.clear();
            for (sub_y, sub_x) in iproduct!(0..h_sub, 0..w_sub) {
                let x = (j as f64 + (sub_x as f64 + 0.5) / w_sub as f64) / out_width as f64;
                let y = (i as f64 + (sub_y as f64 + 0.5) / h_sub as f64) / out_height as f64;
                let (x_in, y_in) = mapper.map(x, y);
                let in_x = ((x_in * in_width as f64) as usize).min(in_width - 1);
                let in_y = ((y_in * in_height as f64) as usize).min(in_height - 1);
                let id = (in_y * in_stride + in_x) as u32;
                match scratch.iter_mut().find(|(offset, _)| *offset == id) {
                    Some(entry) => entry.1 += 1,
                    None => scratch.push((id, 1)),
                }
            }
            debug_assert_eq!(scratch.iter().map(|(_, count)| count).sum::<u32>(), subs);
            starts.push(pairs.len() as u32);
            pairs.extend(
                scratch
                    .iter()
                    .map(|&(offset, count)| offset << COUNT_BITS | count),
            );
        }
    }
    starts.push(pairs.len() as u32);

    Ok(PlaneMap {
        width: out_width,
        height: out_height,
        subs,
        starts,
        pairs,
    })
}
