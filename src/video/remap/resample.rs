//! Tile-parallel consumer of the weight tables.

use super::map::{pair_count, pair_offset, PlaneMap};
use crate::video::{CastFromPrimitive, PlaneData, Pixel};
use rayon::prelude::*;

/// Output tiles are squares of this many pixels per side. A band of tiles
/// (16 output rows) is the unit of work handed to one rayon worker.
const TILE_SIZE: usize = 16;

/// Fills one output plane from one input plane using a prebuilt weight
/// table. Every output sample is written by exactly one worker; the input
/// plane and the map are shared read-only.
pub(crate) fn resample_plane<T: Pixel>(
    map: &PlaneMap,
    input: &PlaneData<T>,
    output: &mut PlaneData<T>,
) {
    let width = map.width();
    let height = map.height();
    debug_assert_eq!(width, output.width);
    debug_assert_eq!(height, output.height);
    let out_stride = output.stride;
    let subs = map.subs();
    let half = subs / 2;
    let in_data = &input.data[..];

    output
        .data
        .par_chunks_mut(TILE_SIZE * out_stride)
        .enumerate()
        .for_each(|(band, out_rows)| {
            let tile_y = band * TILE_SIZE;
            let band_height = TILE_SIZE.min(height - tile_y);
            let mut tile_x = 0;
            while tile_x < width {
                let tile_width = TILE_SIZE.min(width - tile_x);
                for row in 0..band_height {
                    let map_row = (tile_y + row) * width;
                    let out_row = &mut out_rows[row * out_stride..];
                    for col in tile_x..tile_x + tile_width {
                        let pairs = map.pairs_for(map_row + col);
                        out_row[col] = if pairs.len() == 1 {
                            in_data[pair_offset(pairs[0])]
                        } else {
                            let mut sum = 0u32;
                            for &pair in pairs {
                                let sample: u32 = in_data[pair_offset(pair)].into();
                                sum += sample * pair_count(pair);
                            }
                            T::cast_from((sum + half) / subs)
                        };
                    }
                }
                tile_x += TILE_SIZE;
            }
        });
}

#[cfg(test)]
mod tests {
    use super::super::geometry::SampleMapper;
    use super::super::map;
    use super::*;
    use crate::video::remap::{Layout, RemapConfig};

    fn identity_map(width: usize, height: usize, stride: usize) -> PlaneMap {
        let config = RemapConfig {
            input_layout: Layout::Cubemap,
            output_layout: Layout::Cubemap,
            ..Default::default()
        };
        config.validate().unwrap();
        map::build(
            &SampleMapper::new(&config),
            width,
            height,
            width,
            height,
            stride,
            1,
            1,
        )
        .unwrap()
    }

    #[test]
    fn single_contributor_passes_through() {
        let mut input: PlaneData<u8> = PlaneData::new(40, 35);
        for y in 0..35 {
            for (x, sample) in input.row_mut(y).iter_mut().enumerate() {
                *sample = (y * 40 + x) as u8;
            }
        }
        let map = identity_map(40, 35, input.stride);
        let mut output: PlaneData<u8> = PlaneData::new(40, 35);
        resample_plane(&map, &input, &mut output);
        for y in 0..35 {
            assert_eq!(input.row(y), output.row(y));
        }
    }

    #[test]
    fn weighted_mean_rounds_to_nearest() {
        // A 2x2 grid over a 2:1 downscale blends four sources with equal
        // weight: (0 + 0 + 255 + 255 + 2) / 4 = 128.
        let config = RemapConfig {
            input_layout: Layout::Cubemap,
            output_layout: Layout::Cubemap,
            w_subdivisions: 2,
            h_subdivisions: 2,
            ..Default::default()
        };
        config.validate().unwrap();
        let mut input: PlaneData<u8> = PlaneData::new(2, 2);
        input.row_mut(0).copy_from_slice(&[0, 0]);
        input.row_mut(1).copy_from_slice(&[255, 255]);
        let map = map::build(
            &SampleMapper::new(&config),
            1,
            1,
            2,
            2,
            input.stride,
            2,
            2,
        )
        .unwrap();
        let mut output: PlaneData<u8> = PlaneData::new(1, 1);
        resample_plane(&map, &input, &mut output);
        assert_eq!(output.row(0), &[128]);
    }

    #[test]
    fn sixteen_bit_samples_survive_the_mean() {
        let config = RemapConfig {
            input_layout: Layout::Cubemap,
            output_layout: Layout::Cubemap,
            w_subdivisions: 2,
            h_subdivisions: 2,
            ..Default::default()
        };
        config.validate().unwrap();
        let mut input: PlaneData<u16> = PlaneData::new(2, 2);
        input.row_mut(0).copy_from_slice(&[0, 0]);
        input.row_mut(1).copy_from_slice(&[65535, 65535]);
        let map = map::build(
            &SampleMapper::new(&config),
            1,
            1,
            2,
            2,
            input.stride,
            2,
            2,
        )
        .unwrap();
        let mut output: PlaneData<u16> = PlaneData::new(1, 1);
        resample_plane(&map, &input, &mut output);
        assert_eq!(output.row(0), &[32768]);
    }
}
