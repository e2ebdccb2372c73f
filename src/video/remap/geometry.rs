//! Analytical mapping between output and input layout coordinates.
//!
//! All image coordinates are normalized to [0,1)² with the origin at the
//! top-left corner. Layouts meet on an equirectangular interchange
//! coordinate: x proportional to longitude, y to latitude, with the front
//! of the sphere at the center of the range.

use super::{Layout, RemapConfig, StereoFormat};
use std::f64::consts::PI;

/// Cube faces, in the packing order of the plain cubemap layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Face {
    Right = 0,
    Left = 1,
    Top = 2,
    Bottom = 3,
    Front = 4,
    Back = 5,
}

const FACES: [Face; 6] = [
    Face::Right,
    Face::Left,
    Face::Top,
    Face::Bottom,
    Face::Front,
    Face::Back,
];

/// Face order of the PLANE_* layouts: horizon walk starting at the front,
/// poles last. Indexed by packing slot.
const PLANE_FACE_ORDER: [Face; 6] = [
    Face::Front,
    Face::Right,
    Face::Back,
    Face::Left,
    Face::Top,
    Face::Bottom,
];

/// Packing slot of each face in the PLANE_* layouts. Indexed by face.
const PLANE_FACE_SLOT: [usize; 6] = [1, 3, 4, 5, 0, 2];

/// Per-face origin and in-face basis: a point on the unit cube is
/// `q = origin + 2u*ex + 2v*ey` for (u,v) in [0,1]². v grows towards the
/// top of the sphere, u with longitude.
#[rustfmt::skip]
const FACE_BASIS: [([f64; 3], [f64; 3], [f64; 3]); 6] = [
    ([ 1.0, -1.0,  1.0], [ 0.0, 0.0, -1.0], [0.0, 1.0,  0.0]), // right
    ([-1.0, -1.0, -1.0], [ 0.0, 0.0,  1.0], [0.0, 1.0,  0.0]), // left
    ([-1.0,  1.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 0.0, -1.0]), // top
    ([-1.0, -1.0, -1.0], [ 1.0, 0.0,  0.0], [0.0, 0.0,  1.0]), // bottom
    ([-1.0, -1.0,  1.0], [ 1.0, 0.0,  0.0], [0.0, 1.0,  0.0]), // front
    ([ 1.0, -1.0, -1.0], [-1.0, 0.0,  0.0], [0.0, 1.0,  0.0]), // back
];

/// Maps normalized output coordinates to normalized input coordinates for
/// one validated configuration. Stateless apart from precomputed trig.
pub(crate) struct SampleMapper {
    input_layout: Layout,
    output_layout: Layout,
    stereo: StereoFormat,
    vflip: bool,
    expand_coef: f64,
    main_plane_ratio: f64,
    yaw: f64,
    pitch: f64,
    hfov: f64,
    vfov: f64,
    sin_yaw: f64,
    cos_yaw: f64,
    sin_pitch: f64,
    cos_pitch: f64,
}

impl SampleMapper {
    pub(crate) fn new(config: &RemapConfig) -> Self {
        let yaw_rad = config.yaw * PI / 180.0;
        let pitch_rad = config.pitch * PI / 180.0;
        SampleMapper {
            input_layout: config.input_layout,
            output_layout: config.output_layout,
            stereo: config.stereo,
            vflip: config.vflip,
            expand_coef: config.expand_coef,
            main_plane_ratio: config.main_plane_ratio,
            yaw: config.yaw,
            pitch: config.pitch,
            hfov: config.hfov,
            vfov: config.vfov,
            sin_yaw: yaw_rad.sin(),
            cos_yaw: yaw_rad.cos(),
            sin_pitch: pitch_rad.sin(),
            cos_pitch: pitch_rad.cos(),
        }
    }

    /// Maps one normalized output coordinate to the normalized input
    /// coordinate it samples. Results are clamped to [0, 1].
    pub(crate) fn map(&self, x: f64, y: f64) -> (f64, f64) {
        let mut y = y;
        let mut right = false;
        if self.stereo != StereoFormat::Mono {
            // The output is always packed top/bottom when stereo is enabled.
            if y > 0.5 {
                right = true;
                y = (y - 0.5) * 2.0;
                if self.vflip {
                    y = 1.0 - y;
                }
            } else {
                y *= 2.0;
            }
        }

        let (xe, ye) = self.output_to_equirect(x, y);
        let (xi, yi) = self.equirect_to_input(xe, ye);
        debug_assert!(
            (-1e-6..=1.0 + 1e-6).contains(&xi) && (-1e-6..=1.0 + 1e-6).contains(&yi),
            "layout mapping left the unit square: ({}, {}) -> ({}, {})",
            x,
            y,
            xi,
            yi
        );
        let mut xi = xi.max(0.0).min(1.0);
        let mut yi = yi.max(0.0).min(1.0);

        match self.stereo {
            StereoFormat::Mono => {}
            StereoFormat::TopBottom => yi = yi * 0.5 + if right { 0.5 } else { 0.0 },
            StereoFormat::LeftRight => xi = xi * 0.5 + if right { 0.5 } else { 0.0 },
        }
        (xi, yi)
    }

    /// Output-layout branch: one mono eye's coordinate to the
    /// equirectangular interchange, rotation applied.
    fn output_to_equirect(&self, x: f64, y: f64) -> (f64, f64) {
        match self.output_layout {
            Layout::PlanePoles => {
                let r = self.main_plane_ratio;
                if x < r {
                    (x / r, y * 0.5 + 0.25)
                } else {
                    let dx = (2.0 * x - 1.0 - r) / (1.0 - r);
                    if y < 0.5 {
                        let dy = (y - 0.125) / 0.25;
                        disc_to_equirect(dx, dy, true)
                    } else {
                        let dy = (y - 0.875) / 0.25;
                        disc_to_equirect(dx, dy, false)
                    }
                }
            }
            Layout::PlanePoles6 => {
                let strip = ((x * 6.0) as usize).min(5);
                match strip {
                    0..=3 => (x * 1.5, y * 0.5 + 0.25),
                    strip => {
                        let dx = 2.0 * (x * 6.0 - strip as f64) - 1.0;
                        let dy = 2.0 * y - 1.0;
                        disc_to_equirect(dx, dy, strip == 5)
                    }
                }
            }
            Layout::FlatFixed => {
                let mut xe = ((x - 0.5) * self.hfov + self.yaw) / 360.0 + 0.5;
                let mut ye = ((y - 0.5) * self.vfov - self.pitch) / 180.0 + 0.5;
                // Past a pole the viewport sees the far side of the sphere.
                if ye < 0.0 {
                    ye = -ye;
                    xe += 0.5;
                } else if ye > 1.0 {
                    ye = 2.0 - ye;
                    xe += 0.5;
                }
                (xe.rem_euclid(1.0), ye)
            }
            layout => {
                let y = 1.0 - y;
                let (face, u, v) = match layout {
                    Layout::Cubemap32 | Layout::PlaneCubemap32 => {
                        let (slot, u, v) = cubemap32_partition(x, y);
                        (slot_to_face(layout, slot), u, v)
                    }
                    Layout::Cubemap180 => cubemap180_partition(x, y),
                    _ => {
                        let (slot, u, v) = cubemap_partition(x, y);
                        (slot_to_face(layout, slot), u, v)
                    }
                };
                let u = (u - 0.5) * self.expand_coef + 0.5;
                let v = (v - 0.5) * self.expand_coef + 0.5;
                let t = self.rotate(direction_from_face(face, u, v));
                direction_to_equirect(t)
            }
        }
    }

    /// Input-layout branch: the equirectangular interchange to the input
    /// frame's coordinate, inverting the layout's packing.
    fn equirect_to_input(&self, xe: f64, ye: f64) -> (f64, f64) {
        match self.input_layout {
            Layout::PlanePoles => {
                let r = self.main_plane_ratio;
                if (0.25..0.75).contains(&ye) {
                    (xe * r, (ye - 0.25) * 2.0)
                } else {
                    let (dx, dy) = equirect_to_disc(xe, ye);
                    let x = (dx * (1.0 - r) + 1.0 + r) * 0.5;
                    let y = if ye < 0.25 {
                        dy * 0.25 + 0.125
                    } else {
                        dy * 0.25 + 0.875
                    };
                    (x.max(r).min(1.0), y.max(0.0).min(1.0))
                }
            }
            Layout::PlanePoles6 => {
                if (0.25..0.75).contains(&ye) {
                    (xe / 1.5, (ye - 0.25) * 2.0)
                } else {
                    let (dx, dy) = equirect_to_disc(xe, ye);
                    let strip = if ye < 0.25 { 5.0 } else { 4.0 };
                    let x = (strip + (dx + 1.0) * 0.5) / 6.0;
                    (x, (dy + 1.0) * 0.5)
                }
            }
            Layout::FlatFixed => unreachable!("flat_fixed is rejected as an input layout"),
            layout => {
                let t = equirect_to_direction(xe, ye);
                let (face, u, v) = face_from_direction(t);
                let (x, y) = match layout {
                    Layout::Cubemap32 | Layout::PlaneCubemap32 => {
                        let slot = face_to_slot(layout, face);
                        let hslot = slot % 3;
                        let vslot = 1 - slot / 3;
                        ((hslot as f64 + u) / 3.0, (vslot as f64 + v) / 2.0)
                    }
                    Layout::Cubemap180 => cubemap180_inverse(face, u, v),
                    _ => {
                        let slot = face_to_slot(layout, face);
                        ((slot as f64 + u) / 6.0, v)
                    }
                };
                (x, 1.0 - y)
            }
        }
    }

    /// Yaw/pitch view rotation of a cube direction.
    fn rotate(&self, q: [f64; 3]) -> [f64; 3] {
        let (sy, cy) = (self.sin_yaw, self.cos_yaw);
        let (sp, cp) = (self.sin_pitch, self.cos_pitch);
        [
            q[0] * cy - q[1] * sy * sp + q[2] * sy * cp,
            q[1] * cp + q[2] * sp,
            -q[0] * sy - q[1] * cy * sp + q[2] * cy * cp,
        ]
    }
}

/// Plain cubemap: six faces in one horizontal strip.
fn cubemap_partition(x: f64, y: f64) -> (usize, f64, f64) {
    let slot = ((x * 6.0) as usize).min(5);
    (slot, x * 6.0 - slot as f64, y)
}

/// 3x2 cubemap: slot = hslot + (1 - vslot) * 3.
fn cubemap32_partition(x: f64, y: f64) -> (usize, f64, f64) {
    let hslot = ((x * 3.0) as usize).min(2);
    let vslot = ((y * 2.0) as usize).min(1);
    (
        hslot + (1 - vslot) * 3,
        x * 3.0 - hslot as f64,
        y * 2.0 - vslot as f64,
    )
}

/// Hemisphere-packed cubemap: the front hemisphere (the front face and the
/// adjacent halves of its neighbors) at full resolution, the back
/// hemisphere at half resolution in each axis.
fn cubemap180_partition(x: f64, y: f64) -> (Face, f64, f64) {
    const THIRD: f64 = 1.0 / 3.0;
    const SIXTH: f64 = 1.0 / 6.0;
    if x < 0.4 {
        if y >= THIRD {
            (Face::Front, x / 0.4, (y - THIRD) * 1.5)
        } else if x < 0.1 {
            (Face::Left, x / 0.2, y * 3.0)
        } else if x < 0.2 {
            (Face::Right, (x - 0.1) / 0.2 + 0.5, y * 3.0)
        } else if y >= SIXTH {
            (Face::Top, (x - 0.2) / 0.2, (y - SIXTH) * 3.0 + 0.5)
        } else {
            (Face::Bottom, (x - 0.2) / 0.2, y * 3.0)
        }
    } else if x < 0.6 {
        if y >= THIRD {
            (Face::Left, (x - 0.4) / 0.4 + 0.5, (y - THIRD) * 1.5)
        } else {
            (Face::Bottom, (x - 0.4) / 0.4, y * 1.5 + 0.5)
        }
    } else if x < 0.8 {
        if y >= 2.0 * THIRD {
            (Face::Top, (x - 0.6) / 0.4, (y - 2.0 * THIRD) * 1.5)
        } else if y >= THIRD {
            (Face::Back, (x - 0.6) / 0.2, (y - THIRD) * 3.0)
        } else {
            (Face::Bottom, (x - 0.4) / 0.4, y * 1.5 + 0.5)
        }
    } else if y >= 2.0 * THIRD {
        (Face::Top, (x - 0.6) / 0.4, (y - 2.0 * THIRD) * 1.5)
    } else {
        (Face::Right, (x - 0.8) / 0.4, y * 1.5)
    }
}

/// Inverse of [`cubemap180_partition`]. The left/right faces split between
/// their full-resolution front half and quarter-resolution back half on u,
/// the top/bottom faces on v.
fn cubemap180_inverse(face: Face, u: f64, v: f64) -> (f64, f64) {
    const THIRD: f64 = 1.0 / 3.0;
    const SIXTH: f64 = 1.0 / 6.0;
    match face {
        Face::Front => (u * 0.4, v / 1.5 + THIRD),
        Face::Left => {
            if u >= 0.5 {
                ((u - 0.5) * 0.4 + 0.4, v / 1.5 + THIRD)
            } else {
                (u * 0.2, v * THIRD)
            }
        }
        Face::Right => {
            if u < 0.5 {
                (u * 0.4 + 0.8, v / 1.5)
            } else {
                ((u - 0.5) * 0.2 + 0.1, v * THIRD)
            }
        }
        Face::Top => {
            if v < 0.5 {
                (u * 0.4 + 0.6, v / 1.5 + 2.0 * THIRD)
            } else {
                (u * 0.2 + 0.2, (v - 0.5) * THIRD + SIXTH)
            }
        }
        Face::Bottom => {
            if v >= 0.5 {
                (u * 0.4 + 0.4, (v - 0.5) / 1.5)
            } else {
                (u * 0.2 + 0.2, v * THIRD)
            }
        }
        Face::Back => (u * 0.2 + 0.6, v * THIRD + THIRD),
    }
}

fn slot_to_face(layout: Layout, slot: usize) -> Face {
    match layout {
        Layout::PlaneCubemap | Layout::PlaneCubemap32 | Layout::PlanePolesCubemap => {
            PLANE_FACE_ORDER[slot]
        }
        _ => FACES[slot],
    }
}

fn face_to_slot(layout: Layout, face: Face) -> usize {
    match layout {
        Layout::PlaneCubemap | Layout::PlaneCubemap32 | Layout::PlanePolesCubemap => {
            PLANE_FACE_SLOT[face as usize]
        }
        _ => face as usize,
    }
}

/// A point on the unit cube from a face and intra-face coordinates.
fn direction_from_face(face: Face, u: f64, v: f64) -> [f64; 3] {
    let (p, ex, ey) = FACE_BASIS[face as usize];
    [
        p[0] + 2.0 * u * ex[0] + 2.0 * v * ey[0],
        p[1] + 2.0 * u * ex[1] + 2.0 * v * ey[1],
        p[2] + 2.0 * u * ex[2] + 2.0 * v * ey[2],
    ]
}

/// The dominant-axis face of a direction and its intra-face coordinates.
fn face_from_direction(t: [f64; 3]) -> (Face, f64, f64) {
    let ax = t[0].abs();
    let ay = t[1].abs();
    let az = t[2].abs();
    let face = if ax >= ay && ax >= az {
        if t[0] >= 0.0 {
            Face::Right
        } else {
            Face::Left
        }
    } else if ay >= az {
        if t[1] >= 0.0 {
            Face::Top
        } else {
            Face::Bottom
        }
    } else if t[2] >= 0.0 {
        Face::Front
    } else {
        Face::Back
    };
    let m = ax.max(ay).max(az);
    let c = [t[0] / m, t[1] / m, t[2] / m];
    let (p, ex, ey) = FACE_BASIS[face as usize];
    let u = ((c[0] - p[0]) * ex[0] + (c[1] - p[1]) * ex[1] + (c[2] - p[2]) * ex[2]) * 0.5;
    let v = ((c[0] - p[0]) * ey[0] + (c[1] - p[1]) * ey[1] + (c[2] - p[2]) * ey[2]) * 0.5;
    (face, u.max(0.0).min(1.0), v.max(0.0).min(1.0))
}

/// Equirectangular projection of a direction (not necessarily unit length).
fn direction_to_equirect(t: [f64; 3]) -> (f64, f64) {
    let d = (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt();
    let xe = -(-t[0] / d).atan2(t[2] / d) / (2.0 * PI) + 0.5;
    let ye = (-t[1] / d).max(-1.0).min(1.0).asin() / PI + 0.5;
    (xe, ye)
}

/// Unit direction of an equirectangular coordinate.
fn equirect_to_direction(xe: f64, ye: f64) -> [f64; 3] {
    let theta = (0.5 - xe) * 2.0 * PI;
    let phi = (ye - 0.5) * PI;
    let r = phi.cos();
    [-r * theta.sin(), -phi.sin(), r * theta.cos()]
}

/// A polar disc coordinate to the equirectangular interchange. `near` picks
/// the pole the top of the frame shows (ye near 0 rather than near 1).
fn disc_to_equirect(dx: f64, dy: f64, near: bool) -> (f64, f64) {
    let rho = (dx * dx + dy * dy).sqrt();
    let xe = (dy.atan2(dx) / (2.0 * PI) + 0.75).rem_euclid(1.0);
    let ye = if near { rho * 0.25 } else { 1.0 - rho * 0.25 };
    (xe, ye)
}

/// Inverse of [`disc_to_equirect`]; the caller picks the disc from ye.
fn equirect_to_disc(xe: f64, ye: f64) -> (f64, f64) {
    let rho = if ye < 0.25 { ye * 4.0 } else { (1.0 - ye) * 4.0 };
    let angle = (xe - 0.75) * 2.0 * PI;
    (rho * angle.cos(), rho * angle.sin())
}
