//! `av_remap` is a geometric remapping engine for 360-degree video frames.
//! It converts frames between planar sphere layouts (cubemap variants,
//! pole-plane layouts, fixed rectilinear viewports), optionally applying a
//! yaw/pitch rotation, a stereoscopic eye split, and box super-sampling.

#![allow(clippy::cast_lossless)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::unreadable_literal)]
#![deny(missing_docs)]

#[macro_use]
extern crate itertools;

pub mod video;

use thiserror::Error;

/// Possible errors that may occur while configuring or running a remap.
///
/// This enum may be added to in the future and should not be assumed to be exhaustive.
#[derive(Debug, Error)]
pub enum RemapError {
    /// Indicates an invalid remap configuration, e.g. an unknown layout name
    /// or an option outside its documented range.
    #[error("Invalid remap configuration: {reason}")]
    InvalidConfig {
        #[doc(hidden)]
        reason: &'static str,
    },
    /// Indicates an input frame that cannot be remapped at all.
    #[error("Input type not supported: {reason}")]
    UnsupportedInput {
        #[doc(hidden)]
        reason: &'static str,
    },
    /// Indicates a frame whose geometry does not match the maps built for
    /// this remapper, or an output frame of the wrong dimensions.
    #[error("Input does not match the configured remap: {reason}")]
    InputMismatch {
        #[doc(hidden)]
        reason: &'static str,
    },
    /// Indicates an input plane too large for the 24-bit sample offsets of
    /// the weight table.
    #[error("Input plane exceeds the addressable weight-table range")]
    MapOverflow,
    /// Placeholder
    #[doc(hidden)]
    #[error("Unreachable")]
    NonExhaustive,
}

#[cfg(test)]
#[inline(always)]
fn assert_coord_eq(expected: f64, value: f64) {
    assert!(
        (expected - value).abs() < 1e-9,
        "Expected {}, got {}",
        expected,
        value
    );
}
