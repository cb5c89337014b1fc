//! Conversion between world precision and tile precision.
//!
//! World coordinates carry 32 bits per axis. A tile at zoom `z` rendered with
//! `detail` bits of resolution needs `detail` bits, so the conversion is a
//! power-of-two rescale by `shift = 32 - detail - z`:
//!
//! ```text
//! shift >= 0   world -> tile divides by 2^shift (rounded, lossy)
//! shift <  0   world -> tile multiplies by 2^-shift (exact)
//! ```
//!
//! [`from_tile_scale`] goes back the other way without any rounding, so a
//! round trip only recovers the original to within half a tile unit when
//! `shift >= 0`.

use crate::geometry::{Draw, DrawVec};
use crate::tile::WORLD_BITS;

/// Power-of-two exponent between world and tile precision
pub fn scale_shift(z: u8, detail: u8) -> i32 {
    WORLD_BITS as i32 - detail as i32 - z as i32
}

/// Rescale world coordinates to tile coordinates in place.
///
/// Operation codes are left untouched, including the placeholder coordinates
/// of `ClosePath`.
pub fn to_tile_scale(geom: &mut [Draw], z: u8, detail: u8) {
    let shift = scale_shift(z, detail);

    if shift < 0 {
        let factor = 1i64 << -shift;
        for d in geom.iter_mut() {
            d.x *= factor;
            d.y *= factor;
        }
    } else {
        let divisor = (1i64 << shift) as f64;
        for d in geom.iter_mut() {
            d.x = (d.x as f64 / divisor).round() as i64;
            d.y = (d.y as f64 / divisor).round() as i64;
        }
    }
}

/// Rescale tile coordinates back to world coordinates.
///
/// Not an exact inverse of [`to_tile_scale`] when `shift >= 0`: the rounding
/// done on the way down is not undone.
pub fn from_tile_scale(geom: &[Draw], z: u8, detail: u8) -> DrawVec {
    let shift = scale_shift(z, detail);

    geom.iter()
        .map(|d| {
            let mut d = *d;
            if shift >= 0 {
                d.x <<= shift;
                d.y <<= shift;
            } else {
                // Tile values below world precision were produced by an exact
                // multiplication, so this division is exact too.
                let divisor = 1i64 << -shift;
                d.x /= divisor;
                d.y /= divisor;
            }
            d
        })
        .collect()
}
