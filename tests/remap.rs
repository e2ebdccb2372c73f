use av_remap::video::remap::{Layout, RemapConfig, Remapper, StereoFormat};
use av_remap::video::{CastFromPrimitive, ChromaSampling, FrameInfo, Pixel, PlaneData};
use av_remap::RemapError;

/// Luma paint values for the six cube faces, indexed right, left, top,
/// bottom, front, back.
const FACE_VALUES: [u8; 6] = [40, 70, 100, 130, 160, 190];

fn paint_plane<T: Pixel, F: Fn(usize, usize) -> u16>(plane: &mut PlaneData<T>, f: F) {
    for y in 0..plane.height {
        for (x, sample) in plane.row_mut(y).iter_mut().enumerate() {
            *sample = T::cast_from(f(x, y));
        }
    }
}

fn pattern_frame(width: usize, height: usize) -> FrameInfo<u8> {
    let mut frame = FrameInfo::new(width, height, 8, ChromaSampling::Cs420);
    paint_plane(&mut frame.planes[0], |x, y| ((x * 7 + y * 31) % 256) as u16);
    paint_plane(&mut frame.planes[1], |x, y| ((x * 13 + y * 5) % 256) as u16);
    paint_plane(&mut frame.planes[2], |x, y| ((x * 3 + y * 17) % 256) as u16);
    frame
}

/// A frame in the single-strip cubemap layout with each face painted a
/// constant value.
fn face_strip_frame(width: usize, height: usize) -> FrameInfo<u8> {
    let mut frame = FrameInfo::new(width, height, 8, ChromaSampling::Cs420);
    paint_plane(&mut frame.planes[0], |x, _| {
        let face = (x * 6 / width).min(5);
        FACE_VALUES[face] as u16
    });
    paint_plane(&mut frame.planes[1], |_, _| 128);
    paint_plane(&mut frame.planes[2], |_, _| 128);
    frame
}

/// A frame in the 3x2 cubemap layout with each face painted a constant
/// value. The face in grid column h and row r is h + (1 - (1 - r)) * 3,
/// i.e. the top image row carries faces 0..3.
fn face_grid_frame(width: usize, height: usize) -> FrameInfo<u8> {
    let mut frame = FrameInfo::new(width, height, 8, ChromaSampling::Cs420);
    paint_plane(&mut frame.planes[0], |x, y| {
        let hslot = (x * 3 / width).min(2);
        let row = (y * 2 / height).min(1);
        FACE_VALUES[hslot + row * 3] as u16
    });
    paint_plane(&mut frame.planes[1], |_, _| 128);
    paint_plane(&mut frame.planes[2], |_, _| 128);
    frame
}

/// Direction of an input pixel of the single-strip cubemap layout,
/// evaluated independently of the library's geometry kernel.
fn cubemap_pixel_direction(x: f64, y: f64) -> [f64; 3] {
    #[rustfmt::skip]
    const FACE_BASIS: [([f64; 3], [f64; 3], [f64; 3]); 6] = [
        ([ 1.0, -1.0,  1.0], [ 0.0, 0.0, -1.0], [0.0, 1.0,  0.0]),
        ([-1.0, -1.0, -1.0], [ 0.0, 0.0,  1.0], [0.0, 1.0,  0.0]),
        ([-1.0,  1.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 0.0, -1.0]),
        ([-1.0, -1.0, -1.0], [ 1.0, 0.0,  0.0], [0.0, 0.0,  1.0]),
        ([-1.0, -1.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
        ([ 1.0, -1.0, -1.0], [-1.0, 0.0,  0.0], [0.0, 1.0,  0.0]),
    ];
    let y = 1.0 - y;
    let face = ((x * 6.0) as usize).min(5);
    let u = x * 6.0 - face as f64;
    let v = y;
    let (p, ex, ey) = FACE_BASIS[face];
    let q = [
        p[0] + 2.0 * u * ex[0] + 2.0 * v * ey[0],
        p[1] + 2.0 * u * ex[1] + 2.0 * v * ey[1],
        p[2] + 2.0 * u * ex[2] + 2.0 * v * ey[2],
    ];
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2]).sqrt();
    [q[0] / len, q[1] / len, q[2] / len]
}

/// A cubemap frame painted with a function that is smooth on the sphere, so
/// resampling it twice moves values by at most one code value.
fn smooth_sphere_frame(width: usize, height: usize) -> FrameInfo<u8> {
    let mut frame = FrameInfo::new(width, height, 8, ChromaSampling::Cs420);
    paint_plane(&mut frame.planes[0], |x, y| {
        let d = cubemap_pixel_direction(
            (x as f64 + 0.5) / width as f64,
            (y as f64 + 0.5) / height as f64,
        );
        (128.0 + 15.0 * d[2] + 12.0 * d[0] - 6.0 * d[1]).round() as u16
    });
    paint_plane(&mut frame.planes[1], |_, _| 128);
    paint_plane(&mut frame.planes[2], |_, _| 128);
    frame
}

fn config(input_layout: Layout, output_layout: Layout) -> RemapConfig {
    RemapConfig {
        input_layout,
        output_layout,
        ..Default::default()
    }
}

fn assert_planes_eq(a: &FrameInfo<u8>, b: &FrameInfo<u8>) {
    for p in 0..a.plane_count() {
        for y in 0..a.planes[p].height {
            assert_eq!(a.planes[p].row(y), b.planes[p].row(y), "plane {} row {}", p, y);
        }
    }
}

/// The fraction of luma pixels carrying each face value, in face order.
fn face_fractions(frame: &FrameInfo<u8>) -> [f64; 6] {
    let plane = &frame.planes[0];
    let mut counts = [0usize; 6];
    for y in 0..plane.height {
        for &sample in plane.row(y) {
            if let Some(face) = FACE_VALUES.iter().position(|&v| v == sample) {
                counts[face] += 1;
            }
        }
    }
    let total = (plane.width * plane.height) as f64;
    let mut fractions = [0.0; 6];
    for face in 0..6 {
        fractions[face] = counts[face] as f64 / total;
    }
    fractions
}

#[test]
fn same_layout_is_the_identity() {
    let frame = pattern_frame(384, 256);
    let mut remapper = Remapper::new(config(Layout::Cubemap, Layout::Cubemap), 384, 256).unwrap();
    let out = remapper.remap_frame(&frame).unwrap();
    assert_planes_eq(&frame, &out);
}

#[test]
fn cubemap_strip_to_grid_places_every_face() {
    let frame = face_strip_frame(384, 256);
    let mut remapper = Remapper::new(config(Layout::Cubemap, Layout::Cubemap32), 288, 192).unwrap();
    let out = remapper.remap_frame(&frame).unwrap();
    // Face f lands in grid column f % 3; faces 0..3 fill the top image row.
    for face in 0..6 {
        let x0 = (face % 3) * 96;
        let y0 = if face < 3 { 0 } else { 96 };
        for y in y0..y0 + 96 {
            for &sample in &out.planes[0].row(y)[x0..x0 + 96] {
                assert_eq!(sample, FACE_VALUES[face], "face {} at row {}", face, y);
            }
        }
    }
    // Chroma carries no face structure and must stay flat.
    assert!(out.planes[1].row(40).iter().all(|&s| s == 128));
}

#[test]
fn cubemap_grid_to_strip_is_the_inverse_placement() {
    let frame = face_grid_frame(288, 192);
    let mut remapper = Remapper::new(config(Layout::Cubemap32, Layout::Cubemap), 384, 256).unwrap();
    let out = remapper.remap_frame(&frame).unwrap();
    for face in 0..6 {
        let x0 = face * 64;
        for y in 0..256 {
            for &sample in &out.planes[0].row(y)[x0..x0 + 64] {
                assert_eq!(sample, FACE_VALUES[face], "face {} at row {}", face, y);
            }
        }
    }
}

#[test]
fn flat_fixed_center_samples_the_front_face_center() {
    let mut frame = pattern_frame(384, 256);
    paint_plane(&mut frame.planes[0], |_, _| 50);
    // Center of the front face strip of a 384x256 cubemap.
    frame.planes[0].row_mut(128)[288] = 200;
    let mut remapper =
        Remapper::new(config(Layout::Cubemap, Layout::FlatFixed), 256, 256).unwrap();
    let out = remapper.remap_frame(&frame).unwrap();
    assert_eq!(out.planes[0].row(128)[128], 200);
}

#[test]
fn cubemap_180_compresses_the_back_hemisphere() {
    let frame = face_grid_frame(288, 192);
    let mut remapper =
        Remapper::new(config(Layout::Cubemap32, Layout::Cubemap180), 288, 192).unwrap();
    let out = remapper.remap_frame(&frame).unwrap();

    // Area shares from the fixed partition: the front face covers 4/15 of
    // the output at full resolution, the back face 1/15 at quarter
    // resolution, each side face 1/6 split between its two halves.
    let fractions = face_fractions(&out);
    assert!((fractions[4] - 4.0 / 15.0).abs() < 0.02, "front {}", fractions[4]);
    assert!((fractions[5] - 1.0 / 15.0).abs() < 0.02, "back {}", fractions[5]);
    for face in 0..4 {
        assert!(
            (fractions[face] - 1.0 / 6.0).abs() < 0.02,
            "face {} fraction {}",
            face,
            fractions[face]
        );
    }
    // The full-resolution regions cover at least three quarters of the
    // output.
    let quarter_res = fractions[5]
        + (fractions[0] + fractions[1] + fractions[2] + fractions[3]) * (1.0 / 30.0) / (1.0 / 6.0);
    assert!(1.0 - quarter_res >= 0.75);

    // The front face occupies the left block of the output, upright.
    for y in 2..126 {
        for &sample in &out.planes[0].row(y)[2..113] {
            assert_eq!(sample, FACE_VALUES[4], "front block row {}", y);
        }
    }
    // The back face sits in its quarter-resolution middle block.
    for y in 66..126 {
        for &sample in &out.planes[0].row(y)[176..228] {
            assert_eq!(sample, FACE_VALUES[5], "back block row {}", y);
        }
    }
}

#[test]
fn super_sampling_stays_within_one_code_value() {
    let frame = smooth_sphere_frame(384, 256);
    let mut single = Remapper::new(
        RemapConfig {
            yaw: 45.0,
            ..config(Layout::Cubemap, Layout::Cubemap)
        },
        384,
        256,
    )
    .unwrap();
    let mut supersampled = Remapper::new(
        RemapConfig {
            yaw: 45.0,
            w_subdivisions: 2,
            h_subdivisions: 2,
            ..config(Layout::Cubemap, Layout::Cubemap)
        },
        384,
        256,
    )
    .unwrap();
    let a = single.remap_frame(&frame).unwrap();
    let b = supersampled.remap_frame(&frame).unwrap();
    let mut close = 0usize;
    for y in 0..256 {
        for (&pa, &pb) in a.planes[0].row(y).iter().zip(b.planes[0].row(y)) {
            if (pa as i32 - pb as i32).abs() <= 1 {
                close += 1;
            }
        }
    }
    assert!(
        close as f64 >= 0.95 * (384 * 256) as f64,
        "only {} pixels within one code value",
        close
    );
}

#[test]
fn yaw_composes_across_passes() {
    let frame = smooth_sphere_frame(384, 256);
    let remap_with_yaw = |input: &FrameInfo<u8>, yaw: f64| {
        let mut remapper = Remapper::new(
            RemapConfig {
                yaw,
                ..config(Layout::Cubemap, Layout::Cubemap)
            },
            384,
            256,
        )
        .unwrap();
        remapper.remap_frame(input).unwrap()
    };
    let two_passes = remap_with_yaw(&remap_with_yaw(&frame, 30.0), 15.0);
    let one_pass = remap_with_yaw(&frame, 45.0);
    let mut close = 0usize;
    for y in 0..256 {
        for (&pa, &pb) in two_passes.planes[0]
            .row(y)
            .iter()
            .zip(one_pass.planes[0].row(y))
        {
            if (pa as i32 - pb as i32).abs() <= 1 {
                close += 1;
            }
        }
    }
    assert!(
        close as f64 >= 0.99 * (384 * 256) as f64,
        "only {} pixels within one code value",
        close
    );
}

#[test]
fn top_bottom_stereo_round_trips() {
    let frame = pattern_frame(384, 256);
    let stereo_config = RemapConfig {
        stereo: StereoFormat::TopBottom,
        ..config(Layout::Cubemap, Layout::Cubemap)
    };
    let mut first = Remapper::new(stereo_config, 384, 256).unwrap();
    let mut second = Remapper::new(stereo_config, 384, 256).unwrap();
    let once = first.remap_frame(&frame).unwrap();
    // A top/bottom pass is the identity on each eye's half.
    assert_planes_eq(&frame, &once);
    let twice = second.remap_frame(&once).unwrap();
    assert_planes_eq(&frame, &twice);
}

#[test]
fn vflip_mirrors_the_right_eye_and_round_trips() {
    let frame = pattern_frame(384, 256);
    let flip_config = RemapConfig {
        stereo: StereoFormat::TopBottom,
        vflip: true,
        ..config(Layout::Cubemap, Layout::Cubemap)
    };
    let mut first = Remapper::new(flip_config, 384, 256).unwrap();
    let once = first.remap_frame(&frame).unwrap();
    for y in 0..128 {
        assert_eq!(frame.planes[0].row(y), once.planes[0].row(y));
        assert_eq!(
            frame.planes[0].row(255 - y),
            once.planes[0].row(128 + y),
            "bottom half must be flipped at row {}",
            y
        );
    }
    // Flipping the right eye twice restores the frame.
    let mut second = Remapper::new(flip_config, 384, 256).unwrap();
    let twice = second.remap_frame(&once).unwrap();
    assert_planes_eq(&frame, &twice);
}

#[test]
fn left_right_stereo_restacks_to_top_bottom() {
    let mut frame = pattern_frame(384, 256);
    // Column-only pattern: the vertical 2x stretch of each eye view then
    // cannot alias between neighboring rows.
    paint_plane(&mut frame.planes[0], |x, _| ((x * 5 + 17) % 256) as u16);
    let mut remapper = Remapper::new(
        RemapConfig {
            stereo: StereoFormat::LeftRight,
            ..config(Layout::Cubemap, Layout::Cubemap)
        },
        384,
        256,
    )
    .unwrap();
    let out = remapper.remap_frame(&frame).unwrap();
    for y in 0..256 {
        let eye_offset = if y < 128 { 0 } else { 192 };
        for (x, &sample) in out.planes[0].row(y).iter().enumerate() {
            let expected = frame.planes[0].row(0)[eye_offset + x / 2];
            assert_eq!(sample, expected, "row {} col {}", y, x);
        }
    }
}

#[test]
fn flat_fixed_cannot_be_an_input_layout() {
    let err = Remapper::new(config(Layout::FlatFixed, Layout::Cubemap), 64, 64).unwrap_err();
    assert!(matches!(err, RemapError::InvalidConfig { .. }));
}

#[test]
fn oversubdivided_configs_are_rejected() {
    let err = Remapper::new(
        RemapConfig {
            w_subdivisions: 16,
            h_subdivisions: 16,
            ..config(Layout::Cubemap, Layout::Cubemap)
        },
        64,
        64,
    )
    .unwrap_err();
    assert!(matches!(err, RemapError::InvalidConfig { .. }));
}

#[test]
fn changing_frame_geometry_mid_stream_fails() {
    let mut remapper = Remapper::new(config(Layout::Cubemap, Layout::Cubemap), 192, 128).unwrap();
    remapper.remap_frame(&pattern_frame(384, 256)).unwrap();
    // The tables built on the first frame are reused for matching frames.
    remapper.remap_frame(&pattern_frame(384, 256)).unwrap();
    let err = remapper.remap_frame(&pattern_frame(192, 128)).unwrap_err();
    assert!(matches!(err, RemapError::InputMismatch { .. }));
}

#[test]
fn pooled_output_frames_are_refilled() {
    let frame = pattern_frame(384, 256);
    let mut remapper = Remapper::new(config(Layout::Cubemap, Layout::Cubemap), 384, 256).unwrap();
    remapper.prepare(&frame).unwrap();
    let mut pooled = FrameInfo::new(384, 256, 8, ChromaSampling::Cs420);
    remapper.remap_frame_into(&frame, &mut pooled).unwrap();
    assert_planes_eq(&frame, &pooled);
    // A stale pooled frame is fully overwritten on the next call.
    paint_plane(&mut pooled.planes[0], |_, _| 7);
    remapper.remap_frame_into(&frame, &mut pooled).unwrap();
    assert_planes_eq(&frame, &pooled);

    let mut wrong_size = FrameInfo::new(192, 128, 8, ChromaSampling::Cs420);
    let err = remapper.remap_frame_into(&frame, &mut wrong_size).unwrap_err();
    assert!(matches!(err, RemapError::InputMismatch { .. }));
}

#[test]
fn sixteen_bit_identity_round_trips() {
    let mut frame: FrameInfo<u16> = FrameInfo::new(96, 64, 10, ChromaSampling::Cs420);
    paint_plane(&mut frame.planes[0], |x, y| ((x * 11 + y * 3) % 1024) as u16);
    paint_plane(&mut frame.planes[1], |x, y| ((x * 5 + y * 7) % 1024) as u16);
    paint_plane(&mut frame.planes[2], |x, y| ((x + y) % 1024) as u16);
    let mut remapper = Remapper::new(config(Layout::Cubemap, Layout::Cubemap), 96, 64).unwrap();
    let out = remapper.remap_frame(&frame).unwrap();
    for p in 0..3 {
        for y in 0..frame.planes[p].height {
            assert_eq!(frame.planes[p].row(y), out.planes[p].row(y));
        }
    }
}
