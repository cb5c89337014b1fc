//! Geometry clipping to tile bounds.
//!
//! Clips geometry streams to the tile rectangle grown by an overdraw buffer, so
//! that features crossing a tile edge still render without visible seams.
//!
//! # Tippecanoe Alignment
//!
//! - **Buffer**: measured in "screen pixels" where 1 pixel = 1/256th of the
//!   tile side, applied to all four edges
//! - **Points**: kept if inside the closed buffered rectangle
//! - **Lines**: each segment is clipped on its own; a clipped segment restarts
//!   at its true endpoint so the next segment of the same line can continue
//!   from there
//! - **Polygons**: [`simple_clip_poly`] clips each ring independently with
//!   Sutherland-Hodgman. It does not repair rings; use
//!   [`crate::clean::clean_or_clip_poly`] when a robust result is needed.

use geo::Coord;

use crate::geometry::{run_end, Draw, DrawVec, Op, Ring};
use crate::segment::{clip_segment, ClipOutcome};
use crate::tile::TileRect;
use crate::{Error, Result};

/// Keep the points that fall inside the closed rectangle.
///
/// Every draw is tested on its own; the stream has no connectivity.
pub fn clip_points(geom: &[Draw], rect: &TileRect) -> DrawVec {
    geom.iter()
        .filter(|d| rect.contains(d.x, d.y))
        .copied()
        .collect()
}

/// [`clip_points`] against the tile at zoom `z` grown by `buffer` 1/256ths
pub fn clip_points_for_zoom(geom: &[Draw], z: u8, buffer: i64) -> DrawVec {
    clip_points(geom, &TileRect::buffered(z, buffer))
}

/// Clip every segment of a line stream to the rectangle.
///
/// One input line can come out as several disconnected subpaths. A segment
/// that had to be shortened is emitted as its own `MoveTo`/`LineTo` pair and
/// followed by a `MoveTo` back to the original vertex; a segment that is
/// entirely outside leaves only that `MoveTo`.
pub fn clip_lines(geom: &[Draw], rect: &TileRect) -> DrawVec {
    let mut out = Vec::with_capacity(geom.len());

    for (i, d) in geom.iter().enumerate() {
        let continues = i > 0 && matches!(geom[i - 1].op, Op::MoveTo | Op::LineTo);
        if !continues || d.op != Op::LineTo {
            out.push(*d);
            continue;
        }

        let prev = &geom[i - 1];
        let mut a = Coord {
            x: prev.x as f64,
            y: prev.y as f64,
        };
        let mut b = Coord {
            x: d.x as f64,
            y: d.y as f64,
        };

        match clip_segment(&mut a, &mut b, rect) {
            ClipOutcome::Unchanged => out.push(*d),
            ClipOutcome::Clipped => {
                out.push(Draw::move_to(a.x as i64, a.y as i64));
                out.push(Draw::line_to(b.x as i64, b.y as i64));
                out.push(Draw::move_to(d.x, d.y));
            }
            ClipOutcome::Rejected => out.push(Draw::move_to(d.x, d.y)),
        }
    }

    out
}

/// [`clip_lines`] against the tile at zoom `z` grown by `buffer` 1/256ths
pub fn clip_lines_for_zoom(geom: &[Draw], z: u8, buffer: i64) -> DrawVec {
    clip_lines(geom, &TileRect::buffered(z, buffer))
}

/// Clip each polygon ring to the rectangle.
///
/// Rings must be `MoveTo` + `LineTo*` runs; anything else (such as a
/// `ClosePath`) means the stream was not built as open-encoded polygon rings,
/// which is an upstream bug and fails with [`Error::UnexpectedOperation`].
///
/// Rings entirely outside the rectangle disappear. Rings that survive are
/// closed by repeating their first point.
pub fn simple_clip_poly(geom: &[Draw], rect: &TileRect) -> Result<DrawVec> {
    let mut out = Vec::with_capacity(geom.len());
    let mut i = 0;

    while i < geom.len() {
        if geom[i].op != Op::MoveTo {
            log::error!("Unexpected operation in polygon {:?}", geom[i].op);
            return Err(Error::UnexpectedOperation {
                op: geom[i].op,
                index: i,
            });
        }

        let j = run_end(geom, i);
        let ring: Vec<Coord<i64>> = geom[i..j].iter().map(Draw::coord).collect();
        Ring::new(sutherland_hodgman_clip(&ring, rect)).write_draws(&mut out);

        i = j;
    }

    Ok(out)
}

/// [`simple_clip_poly`] against the tile at zoom `z` grown by `buffer` 1/256ths
pub fn simple_clip_poly_for_zoom(geom: &[Draw], z: u8, buffer: i64) -> Result<DrawVec> {
    simple_clip_poly(geom, &TileRect::buffered(z, buffer))
}

/// Sutherland-Hodgman ring clipping against an axis-aligned rectangle.
///
/// Returns an empty ring if fewer than 3 vertices survive, otherwise a ring
/// whose last point equals its first. Intersections are truncated toward zero
/// on the axis that is not fixed by the edge.
pub fn sutherland_hodgman_clip(ring: &[Coord<i64>], rect: &TileRect) -> Vec<Coord<i64>> {
    let mut output: Vec<Coord<i64>> = ring.to_vec();

    // Left edge
    output = clip_against_edge(
        &output,
        |c| c.x >= rect.min_x,
        |c1, c2| Coord {
            x: rect.min_x,
            y: interpolate(c1.y, c2.y, rect.min_x - c1.x, c2.x - c1.x),
        },
    );

    // Right edge
    output = clip_against_edge(
        &output,
        |c| c.x <= rect.max_x,
        |c1, c2| Coord {
            x: rect.max_x,
            y: interpolate(c1.y, c2.y, rect.max_x - c1.x, c2.x - c1.x),
        },
    );

    // Bottom edge
    output = clip_against_edge(
        &output,
        |c| c.y >= rect.min_y,
        |c1, c2| Coord {
            x: interpolate(c1.x, c2.x, rect.min_y - c1.y, c2.y - c1.y),
            y: rect.min_y,
        },
    );

    // Top edge
    output = clip_against_edge(
        &output,
        |c| c.y <= rect.max_y,
        |c1, c2| Coord {
            x: interpolate(c1.x, c2.x, rect.max_y - c1.y, c2.y - c1.y),
            y: rect.max_y,
        },
    );

    if output.len() < 3 {
        return Vec::new();
    }

    // Close the ring if needed
    if output.first() != output.last() {
        output.push(output[0]);
    }

    output
}

/// `from + (to - from) * num / den`, computed in doubles and truncated
fn interpolate(from: i64, to: i64, num: i64, den: i64) -> i64 {
    (from as f64 + (to - from) as f64 * num as f64 / den as f64) as i64
}

/// Clip polygon vertices against a single edge
fn clip_against_edge<F, I>(vertices: &[Coord<i64>], inside: F, intersect: I) -> Vec<Coord<i64>>
where
    F: Fn(&Coord<i64>) -> bool,
    I: Fn(&Coord<i64>, &Coord<i64>) -> Coord<i64>,
{
    if vertices.is_empty() {
        return Vec::new();
    }

    let mut output = Vec::with_capacity(vertices.len() + 4);

    for i in 0..vertices.len() {
        let current = &vertices[i];
        let next = &vertices[(i + 1) % vertices.len()];

        let current_inside = inside(current);
        let next_inside = inside(next);

        if current_inside {
            output.push(*current);
            if !next_inside {
                // Exiting: add intersection
                output.push(intersect(current, next));
            }
        } else if next_inside {
            // Entering: add intersection
            output.push(intersect(current, next));
        }
    }

    output
}
