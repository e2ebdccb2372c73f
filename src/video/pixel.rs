//! Traits for generic code over low and high bit depth video.
//!
//! Borrowed from rav1e.

use num_traits::{AsPrimitive, PrimInt};
use std::fmt::{Debug, Display};

/// Defines a type which supports being cast to from a generic integer type.
///
/// Intended for casting to and from a [`Pixel`](trait.Pixel.html).
pub trait CastFromPrimitive<T>: Copy + 'static {
    /// Cast from a generic integer type to the given type.
    fn cast_from(v: T) -> Self;
}

macro_rules! impl_cast_from_primitive {
  ( $T:ty => $U:ty ) => {
    impl CastFromPrimitive<$U> for $T {
      #[inline(always)]
      fn cast_from(v: $U) -> Self { v as Self }
    }
  };
  ( $T:ty => { $( $U:ty ),* } ) => {
    $( impl_cast_from_primitive!($T => $U); )*
  };
}

impl_cast_from_primitive!(u8 => { u8, u16, u32, u64, usize });
impl_cast_from_primitive!(u16 => { u8, u16, u32, u64, usize });

/// A trait for types which may represent a pixel in a video.
/// Currently implemented for `u8` and `u16`.
/// `u8` should be used for low-bit-depth video, and `u16`
/// for high-bit-depth video.
pub trait Pixel:
    PrimInt
    + Into<u32>
    + AsPrimitive<u32>
    + AsPrimitive<usize>
    + CastFromPrimitive<u8>
    + CastFromPrimitive<u16>
    + CastFromPrimitive<u32>
    + CastFromPrimitive<usize>
    + Debug
    + Display
    + Send
    + Sync
    + 'static
{
}

impl Pixel for u8 {}
impl Pixel for u16 {}
