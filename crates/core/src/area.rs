//! Signed ring area that keeps its sign under floating-point overflow.
//!
//! World coordinates are ~34-bit integers (32 bits for the plane plus room to
//! stick off either side), so their products do not fit exactly in a double,
//! whose largest exact integer is 2^53 - 1. The shoelace sum is therefore
//! computed relative to the ring's first vertex, which shrinks the operands
//! for anything smaller than the whole world.
//!
//! If the running sum still crosses 2^53 - 1 at any step, the area is
//! recomputed on a coarsened copy of the ring. That result is less precise,
//! but its sign is right, and the sign is what decides winding. The original
//! (more precise, possibly overflowed) magnitude is kept with the trusted
//! sign.
//!
//! Positive area is counter-clockwise with y pointing up.

use geo::Coord;

use crate::geometry::{subpaths, Draw};
use crate::{Error, Result};

/// Largest integer a double represents exactly
const MAX_EXACT_DOUBLE: f64 = ((1i64 << 53) - 1) as f64;

/// Upper bound (exclusive) on the coarsening factor tried by [`scaled_area`]
const MAX_AREA_SCALE: i64 = 1 << 30;

/// Shoelace accumulation over a closed ring (wrap-around), with every
/// coordinate taken relative to the first vertex and divided by `scale`.
///
/// Returns twice the signed area and whether any partial sum reached 2^53 - 1.
/// When `stop_on_overflow` is set the sum is abandoned at the first overflow.
fn shoelace(ring: &[Coord<i64>], scale: i64, stop_on_overflow: bool) -> (f64, bool) {
    let n = ring.len();
    if n == 0 {
        return (0.0, false);
    }

    let base = ring[0];
    let rel = |c: Coord<i64>| ((c.x - base.x) / scale, (c.y - base.y) / scale);

    let mut area = 0.0;
    let mut overflow = false;

    for k in 0..n {
        let (x0, y0) = rel(ring[k]);
        let (x1, y1) = rel(ring[(k + 1) % n]);

        area += x0 as f64 * y1 as f64;
        if area.abs() >= MAX_EXACT_DOUBLE {
            overflow = true;
            if stop_on_overflow {
                break;
            }
        }

        area -= y0 as f64 * x1 as f64;
        if area.abs() >= MAX_EXACT_DOUBLE {
            overflow = true;
            if stop_on_overflow {
                break;
            }
        }
    }

    (area, overflow)
}

/// Area of a ring recomputed at the finest power-of-two coarsening that does
/// not overflow.
///
/// Fails with [`Error::AreaOverflow`] if no scale below 2^30 works, which
/// cannot happen for coordinates within the world plane's bounds.
pub fn scaled_area(ring: &[Coord<i64>]) -> Result<f64> {
    let mut scale = 2;

    while scale < MAX_AREA_SCALE {
        let (area, overflow) = shoelace(ring, scale, true);
        if !overflow {
            let scale = scale as f64;
            return Ok(area / 2.0 * scale * scale);
        }
        scale *= 2;
    }

    log::error!("ring area overflows at every scale ({} vertices)", ring.len());
    Err(Error::AreaOverflow)
}

/// Signed area of a closed ring given as a vertex list.
///
/// The ring may or may not repeat its first vertex; a repeated vertex adds a
/// zero-length edge and does not change the result.
pub fn ring_area(ring: &[Coord<i64>]) -> Result<f64> {
    let (twice, overflow) = shoelace(ring, 1, false);
    let mut area = twice / 2.0;

    if overflow {
        let scaled = scaled_area(ring)?;
        log::trace!("area overflow: raw {} scaled {}", area, scaled);
        if (area < 0.0 && scaled > 0.0) || (area > 0.0 && scaled < 0.0) {
            area = -area;
        }
    }

    Ok(area)
}

/// Signed area of the ring formed by `geom[i..j]`, closing back from the last
/// draw to the first.
pub fn signed_area(geom: &[Draw], i: usize, j: usize) -> Result<f64> {
    let ring: Vec<Coord<i64>> = geom[i..j].iter().map(Draw::coord).collect();
    ring_area(&ring)
}

/// Sum of the signed areas of every subpath in the stream.
///
/// Outer rings and holes are not told apart: holes already carry the
/// opposite sign, so the sum is the covered area of a well-wound polygon.
pub fn multi_polygon_area(geom: &[Draw]) -> Result<f64> {
    let mut total = 0.0;
    for run in subpaths(geom) {
        total += signed_area(geom, run.start, run.end)?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DrawVec;

    fn ring(points: &[(i64, i64)]) -> Vec<Coord<i64>> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn draws(points: &[(i64, i64)]) -> DrawVec {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| {
                if i == 0 {
                    Draw::move_to(x, y)
                } else {
                    Draw::line_to(x, y)
                }
            })
            .collect()
    }

    /// Exact doubled area via 128-bit integers
    fn exact_twice_area(ring: &[Coord<i64>]) -> i128 {
        let n = ring.len();
        (0..n)
            .map(|k| {
                let a = ring[k];
                let b = ring[(k + 1) % n];
                a.x as i128 * b.y as i128 - a.y as i128 * b.x as i128
            })
            .sum()
    }

    // ========== Basic Area Tests ==========

    #[test]
    fn test_rectangle_area_ccw_positive() {
        let r = ring(&[(0, 0), (30, 0), (30, 20), (0, 20), (0, 0)]);
        assert_eq!(ring_area(&r).unwrap(), 600.0);
    }

    #[test]
    fn test_rectangle_area_reversed_negative() {
        let mut r = ring(&[(0, 0), (30, 0), (30, 20), (0, 20), (0, 0)]);
        r.reverse();
        assert_eq!(ring_area(&r).unwrap(), -600.0);
    }

    #[test]
    fn test_area_translation_invariant() {
        let r = ring(&[
            (4_000_000_000, 4_000_000_000),
            (4_000_000_030, 4_000_000_000),
            (4_000_000_030, 4_000_000_020),
            (4_000_000_000, 4_000_000_020),
        ]);
        assert_eq!(ring_area(&r).unwrap(), 600.0);
    }

    #[test]
    fn test_area_implicitly_closed_ring() {
        let r = ring(&[(0, 0), (30, 0), (30, 20), (0, 20)]);
        assert_eq!(ring_area(&r).unwrap(), 600.0);
    }

    #[test]
    fn test_area_empty_and_degenerate() {
        assert_eq!(ring_area(&[]).unwrap(), 0.0);
        assert_eq!(ring_area(&ring(&[(5, 5)])).unwrap(), 0.0);
        assert_eq!(ring_area(&ring(&[(0, 0), (10, 10), (0, 0)])).unwrap(), 0.0);
    }

    #[test]
    fn test_signed_area_on_stream_range() {
        let mut geom = draws(&[(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)]);
        geom.extend(draws(&[(0, 0), (0, 4), (4, 4), (4, 0), (0, 0)]));

        assert_eq!(signed_area(&geom, 0, 5).unwrap(), 100.0);
        assert_eq!(signed_area(&geom, 5, 10).unwrap(), -16.0);
    }

    #[test]
    fn test_multi_polygon_area_sums_rings() {
        let mut geom = draws(&[(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)]);
        geom.extend(draws(&[(2, 2), (2, 6), (6, 6), (6, 2), (2, 2)]));
        geom.extend(draws(&[(20, 0), (25, 0), (25, 5), (20, 5), (20, 0)]));

        assert_eq!(multi_polygon_area(&geom).unwrap(), 100.0 - 16.0 + 25.0);
    }

    #[test]
    fn test_multi_polygon_area_ignores_closepath() {
        let mut geom = draws(&[(0, 0), (10, 0), (10, 10), (0, 10)]);
        geom.push(Draw::close_path());
        assert_eq!(multi_polygon_area(&geom).unwrap(), 100.0);
    }

    // ========== Overflow Recovery Tests ==========

    #[test]
    fn test_overflow_flagged_for_large_ring() {
        let big = 1i64 << 33;
        let r = ring(&[(0, 0), (big, 0), (big, big), (0, big), (0, 0)]);
        let (_, overflow) = shoelace(&r, 1, false);
        assert!(overflow, "2^33 square should overflow the exact range");
    }

    #[test]
    fn test_scaled_area_large_square() {
        let big = 1i64 << 33;
        let r = ring(&[(0, 0), (big, 0), (big, big), (0, big), (0, 0)]);
        let scaled = scaled_area(&r).unwrap();
        assert_eq!(scaled, (big as f64) * (big as f64));
    }

    #[test]
    fn test_large_ring_sign_matches_exact() {
        let big = 1i64 << 33;
        let shapes = [
            // Square, both orientations
            ring(&[(0, 0), (big, 0), (big, big), (0, big), (0, 0)]),
            ring(&[(0, 0), (0, big), (big, big), (big, 0), (0, 0)]),
            // Thin sliver across the world, whose partial sums are huge but
            // whose total is small
            ring(&[
                (-big, -big),
                (big, big - 3),
                (big, big),
                (-big, -big + 5),
                (-big, -big),
            ]),
            ring(&[
                (-big, -big),
                (-big, -big + 5),
                (big, big),
                (big, big - 3),
                (-big, -big),
            ]),
            // Irregular world-sized ring
            ring(&[
                (-3_000_000_001, 17),
                (5_123_456_789, -4_000_000_003),
                (7_999_999_999, 6_543_210_987),
                (-1_234_567_891, 8_000_000_001),
                (-3_000_000_001, 17),
            ]),
        ];

        for r in &shapes {
            let exact = exact_twice_area(r);
            let area = ring_area(r).unwrap();
            assert_eq!(
                area.signum(),
                (exact as f64).signum(),
                "sign mismatch: area {} exact {}",
                area,
                exact
            );
        }
    }

    #[test]
    fn test_overflow_keeps_raw_magnitude() {
        let big = 1i64 << 33;
        let r = ring(&[(0, 0), (big, 0), (big, big), (0, big), (0, 0)]);
        let area = ring_area(&r).unwrap();
        // 2^66 is exactly representable, the raw sum is used as is
        assert_eq!(area, (big as f64) * (big as f64));
    }
}
