//! Layout remapping of 360-degree video frames.
//!
//! A [`Remapper`](struct.Remapper.html) converts frames between planar
//! sphere layouts. The conversion is described once by a
//! [`RemapConfig`](struct.RemapConfig.html); per-output-pixel weight tables
//! are built lazily from the first frame's geometry and reused for the rest
//! of the stream.

mod geometry;
mod map;
mod resample;

use crate::video::{ChromaSampling, FrameInfo, Pixel};
use crate::RemapError;
use geometry::SampleMapper;
use log::{debug, trace};
use map::PlaneMap;
use std::str::FromStr;

/// The planar layouts a sphere (or cube) surface can be packed into.
///
/// `FlatFixed` is a rectilinear viewport and therefore only valid as an
/// output layout; every other layout covers the full sphere and can appear
/// on either side of the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    /// Six cube faces in one horizontal strip.
    Cubemap,
    /// Six cube faces in a 3x2 grid.
    Cubemap32,
    /// Front hemisphere at full resolution, back hemisphere packed at a
    /// quarter of the area.
    Cubemap180,
    /// Equirectangular middle band plus two polar discs in a side strip.
    PlanePoles,
    /// Six vertical strips: four carrying the equirectangular middle band,
    /// two carrying the polar discs.
    PlanePoles6,
    /// As `Cubemap`, with the front-first face ordering of the plane layouts.
    PlanePolesCubemap,
    /// As `Cubemap`, with the front-first face ordering of the plane layouts.
    PlaneCubemap,
    /// As `Cubemap32`, with the front-first face ordering of the plane layouts.
    PlaneCubemap32,
    /// A fixed rectilinear viewport with configurable field of view.
    /// Output only.
    FlatFixed,
}

impl Layout {
    /// The option names accepted by [`from_str`](#method.from_str), in
    /// declaration order.
    pub const NAMES: [&'static str; 9] = [
        "cubemap",
        "cubemap_32",
        "cubemap_180",
        "plane_poles",
        "plane_poles_6",
        "plane_poles_cubemap",
        "plane_cubemap",
        "plane_cubemap_32",
        "flat_fixed",
    ];

    /// The option name of this layout.
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Cubemap => "cubemap",
            Layout::Cubemap32 => "cubemap_32",
            Layout::Cubemap180 => "cubemap_180",
            Layout::PlanePoles => "plane_poles",
            Layout::PlanePoles6 => "plane_poles_6",
            Layout::PlanePolesCubemap => "plane_poles_cubemap",
            Layout::PlaneCubemap => "plane_cubemap",
            Layout::PlaneCubemap32 => "plane_cubemap_32",
            Layout::FlatFixed => "flat_fixed",
        }
    }
}

impl FromStr for Layout {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "cubemap" => Layout::Cubemap,
            "cubemap_32" => Layout::Cubemap32,
            "cubemap_180" => Layout::Cubemap180,
            "plane_poles" => Layout::PlanePoles,
            "plane_poles_6" => Layout::PlanePoles6,
            "plane_poles_cubemap" => Layout::PlanePolesCubemap,
            "plane_cubemap" => Layout::PlaneCubemap,
            "plane_cubemap_32" => Layout::PlaneCubemap32,
            "flat_fixed" => Layout::FlatFixed,
            _ => {
                return Err(RemapError::InvalidConfig {
                    reason: "Unknown layout name",
                })
            }
        })
    }
}

/// How the two eye views of stereoscopic content are packed into one frame.
///
/// When stereo is enabled the output frame is always packed top/bottom; the
/// input packing is whatever the source carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StereoFormat {
    /// A single view.
    Mono,
    /// Left eye in the top half, right eye in the bottom half.
    TopBottom,
    /// Left eye in the left half, right eye in the right half.
    LeftRight,
}

impl StereoFormat {
    /// The option names accepted by [`from_str`](#method.from_str).
    pub const NAMES: [&'static str; 3] = ["mono", "tb", "lr"];

    /// The option name of this stereo format.
    pub fn as_str(self) -> &'static str {
        match self {
            StereoFormat::Mono => "mono",
            StereoFormat::TopBottom => "tb",
            StereoFormat::LeftRight => "lr",
        }
    }
}

impl FromStr for StereoFormat {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mono" => StereoFormat::Mono,
            "tb" => StereoFormat::TopBottom,
            "lr" => StereoFormat::LeftRight,
            _ => {
                return Err(RemapError::InvalidConfig {
                    reason: "Unknown stereo format name",
                })
            }
        })
    }
}

/// The full description of one layout conversion. Immutable once validated.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemapConfig {
    /// Layout of the incoming frames.
    pub input_layout: Layout,
    /// Layout of the produced frames.
    pub output_layout: Layout,
    /// View rotation around the vertical axis, in degrees.
    pub yaw: f64,
    /// View rotation around the horizontal axis, in degrees.
    pub pitch: f64,
    /// Horizontal field of view of the `FlatFixed` viewport, in degrees.
    pub hfov: f64,
    /// Vertical field of view of the `FlatFixed` viewport, in degrees.
    pub vfov: f64,
    /// Face-expansion scalar for cube faces. 1.0 samples faces exactly;
    /// values above 1.0 oversample across face seams.
    pub expand_coef: f64,
    /// Fraction of the width taken by the equirectangular middle band in the
    /// `PlanePoles` layout.
    pub main_plane_ratio: f64,
    /// Horizontal super-sampling factor per output pixel.
    pub w_subdivisions: u32,
    /// Vertical super-sampling factor per output pixel.
    pub h_subdivisions: u32,
    /// Eye packing of the incoming frames.
    pub stereo: StereoFormat,
    /// Whether the right eye is stored vertically flipped inside its half.
    pub vflip: bool,
}

impl Default for RemapConfig {
    fn default() -> Self {
        RemapConfig {
            input_layout: Layout::Cubemap,
            output_layout: Layout::Cubemap32,
            yaw: 0.0,
            pitch: 0.0,
            hfov: 90.0,
            vfov: 90.0,
            expand_coef: 1.0,
            main_plane_ratio: 0.75,
            w_subdivisions: 1,
            h_subdivisions: 1,
            stereo: StereoFormat::Mono,
            vflip: false,
        }
    }
}

impl RemapConfig {
    /// Checks every option against its documented range.
    pub fn validate(&self) -> Result<(), RemapError> {
        if self.input_layout == Layout::FlatFixed {
            return Err(RemapError::InvalidConfig {
                reason: "flat_fixed covers only part of the sphere and cannot be an input layout",
            });
        }
        if !self.yaw.is_finite() || !self.pitch.is_finite() {
            return Err(RemapError::InvalidConfig {
                reason: "yaw and pitch must be finite",
            });
        }
        if self.pitch < -90.0 || self.pitch > 90.0 {
            return Err(RemapError::InvalidConfig {
                reason: "pitch must lie in [-90, 90] degrees",
            });
        }
        if !(self.hfov > 0.0 && self.hfov <= 360.0) {
            return Err(RemapError::InvalidConfig {
                reason: "hfov must lie in (0, 360] degrees",
            });
        }
        if !(self.vfov > 0.0 && self.vfov <= 180.0) {
            return Err(RemapError::InvalidConfig {
                reason: "vfov must lie in (0, 180] degrees",
            });
        }
        if !(self.expand_coef > 0.0 && self.expand_coef <= 2.0) {
            return Err(RemapError::InvalidConfig {
                reason: "expand_coef must lie in (0, 2]",
            });
        }
        if !(self.main_plane_ratio > 0.0 && self.main_plane_ratio < 1.0) {
            return Err(RemapError::InvalidConfig {
                reason: "main_plane_ratio must lie in (0, 1)",
            });
        }
        if self.w_subdivisions < 1
            || self.w_subdivisions > 16
            || self.h_subdivisions < 1
            || self.h_subdivisions > 16
        {
            return Err(RemapError::InvalidConfig {
                reason: "subdivision factors must lie in [1, 16]",
            });
        }
        if self.w_subdivisions * self.h_subdivisions > 255 {
            return Err(RemapError::InvalidConfig {
                reason: "the product of the subdivision factors must not exceed 255",
            });
        }
        Ok(())
    }
}

/// Weight tables built for one negotiated frame geometry.
#[derive(Debug)]
struct RemapMaps {
    luma: PlaneMap,
    chroma: Option<PlaneMap>,
    chroma_sampling: ChromaSampling,
    in_width: usize,
    in_height: usize,
    in_strides: [usize; 2],
}

/// A configured layout conversion and its lazily built weight tables.
///
/// The geometry of the incoming stream (dimensions, strides, chroma
/// sampling) is captured from the first frame; later frames must match it.
#[derive(Debug)]
pub struct Remapper {
    config: RemapConfig,
    out_width: usize,
    out_height: usize,
    maps: Option<RemapMaps>,
}

impl Remapper {
    /// Creates a remapper producing frames of the given dimensions.
    pub fn new(
        config: RemapConfig,
        out_width: usize,
        out_height: usize,
    ) -> Result<Self, RemapError> {
        config.validate()?;
        if out_width == 0 || out_height == 0 {
            return Err(RemapError::InvalidConfig {
                reason: "output dimensions must be nonzero",
            });
        }
        Ok(Remapper {
            config,
            out_width,
            out_height,
            maps: None,
        })
    }

    /// The validated configuration this remapper was built with.
    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    /// Width of the produced frames.
    pub fn out_width(&self) -> usize {
        self.out_width
    }

    /// Height of the produced frames.
    pub fn out_height(&self) -> usize {
        self.out_height
    }

    /// Builds the weight tables for the given frame geometry ahead of the
    /// first [`remap_frame`](#method.remap_frame) call.
    ///
    /// Remapping is lazy by default; calling this up front moves the one-off
    /// table construction out of the streaming path.
    pub fn prepare<T: Pixel>(&mut self, frame: &FrameInfo<T>) -> Result<(), RemapError> {
        frame.can_remap()?;
        self.ensure_maps(frame)
    }

    /// Remaps one frame into a freshly allocated output frame, forwarding
    /// bit depth and chroma sampling.
    pub fn remap_frame<T: Pixel>(
        &mut self,
        frame: &FrameInfo<T>,
    ) -> Result<FrameInfo<T>, RemapError> {
        frame.can_remap()?;
        let mut out = FrameInfo::new(
            self.out_width,
            self.out_height,
            frame.bit_depth,
            frame.chroma_sampling,
        );
        self.remap_frame_into(frame, &mut out)?;
        Ok(out)
    }

    /// Remaps one frame into a caller-owned output frame of the configured
    /// dimensions. This is the pooled-buffer path: the output's allocation
    /// (including its strides) is reused across calls.
    pub fn remap_frame_into<T: Pixel>(
        &mut self,
        frame: &FrameInfo<T>,
        out: &mut FrameInfo<T>,
    ) -> Result<(), RemapError> {
        frame.can_remap()?;
        out.can_remap()?;
        if out.bit_depth != frame.bit_depth || out.chroma_sampling != frame.chroma_sampling {
            return Err(RemapError::InputMismatch {
                reason: "Output frame format does not match the input frame",
            });
        }
        self.ensure_maps(frame)?;
        let maps = self.maps.as_ref().unwrap();
        if out.planes[0].width != maps.luma.width() || out.planes[0].height != maps.luma.height() {
            return Err(RemapError::InputMismatch {
                reason: "Output frame does not have the configured dimensions",
            });
        }
        for p in 0..frame.plane_count() {
            let map = if p == 0 {
                &maps.luma
            } else {
                maps.chroma.as_ref().unwrap()
            };
            if out.planes[p].width != map.width() || out.planes[p].height != map.height() {
                return Err(RemapError::InputMismatch {
                    reason: "Output chroma plane does not have the configured dimensions",
                });
            }
            trace!(
                "remapping plane {} ({}x{})",
                p,
                map.width(),
                map.height()
            );
            resample::resample_plane(map, &frame.planes[p], &mut out.planes[p]);
        }
        Ok(())
    }

    /// Builds the weight tables on the first frame, or checks that a later
    /// frame still matches the geometry they were built for.
    fn ensure_maps<T: Pixel>(&mut self, frame: &FrameInfo<T>) -> Result<(), RemapError> {
        let in_width = frame.planes[0].width;
        let in_height = frame.planes[0].height;
        let in_strides = [frame.planes[0].stride, frame.planes[1].stride];
        if let Some(maps) = &self.maps {
            if maps.in_width != in_width
                || maps.in_height != in_height
                || maps.in_strides != in_strides
                || maps.chroma_sampling != frame.chroma_sampling
            {
                return Err(RemapError::InputMismatch {
                    reason: "Frame geometry changed after the weight tables were built",
                });
            }
            return Ok(());
        }

        debug!(
            "building remap tables: {}x{} {} -> {}x{} {} ({}x{} subdivisions)",
            in_width,
            in_height,
            self.config.input_layout.as_str(),
            self.out_width,
            self.out_height,
            self.config.output_layout.as_str(),
            self.config.w_subdivisions,
            self.config.h_subdivisions,
        );
        let mapper = SampleMapper::new(&self.config);
        let luma = map::build(
            &mapper,
            self.out_width,
            self.out_height,
            in_width,
            in_height,
            frame.planes[0].stride,
            self.config.w_subdivisions,
            self.config.h_subdivisions,
        )?;
        let chroma = if frame.chroma_sampling == ChromaSampling::Cs400 {
            None
        } else {
            let (out_cw, out_ch) = frame
                .chroma_sampling
                .get_chroma_dimensions(self.out_width, self.out_height);
            Some(map::build(
                &mapper,
                out_cw,
                out_ch,
                frame.planes[1].width,
                frame.planes[1].height,
                frame.planes[1].stride,
                self.config.w_subdivisions,
                self.config.h_subdivisions,
            )?)
        };
        self.maps = Some(RemapMaps {
            luma,
            chroma,
            chroma_sampling: frame.chroma_sampling,
            in_width,
            in_height,
            in_strides,
        });
        Ok(())
    }
}
