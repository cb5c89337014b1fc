//! Removal of degenerate drawing operations.
//!
//! Zero-length edges and empty subpaths carry no visible geometry but upset
//! the clippers and the polygon engine. They are detected at a reduced
//! resolution: two coordinates are "the same" if they agree after dividing by
//! `2^shift` and rounding. The stored coordinates are never modified.

use crate::geometry::{Draw, DrawVec, GeomType, Op};

/// Coordinate at the reduced comparison resolution
fn reduced(v: i64, shift: u32) -> i64 {
    (v as f64 / (1i64 << shift) as f64).round() as i64
}

fn same_reduced(a: &Draw, b: &Draw, shift: u32) -> bool {
    reduced(a.x, shift) == reduced(b.x, shift) && reduced(a.y, shift) == reduced(b.y, shift)
}

/// Remove zero-length `LineTo`s, empty subpaths, and (for lines) restarts at
/// the point the previous subpath ended on.
///
/// Points skip the subpath passes since a point stream has no connectivity.
pub fn remove_noop(geom: &[Draw], geom_type: GeomType, shift: u32) -> DrawVec {
    let mut out = drop_empty_linetos(geom, shift);

    if geom_type != GeomType::Point {
        out = drop_unused_movetos(&out);
    }

    if geom_type == GeomType::Line {
        out = drop_repeated_movetos(&out, shift);
    }

    out
}

/// Pass 1: drop `LineTo`s that do not move from the last retained vertex.
fn drop_empty_linetos(geom: &[Draw], shift: u32) -> DrawVec {
    let mut out = Vec::with_capacity(geom.len());
    let (mut x, mut y) = (0, 0);

    for d in geom {
        if d.op == Op::LineTo && reduced(d.x, shift) == x && reduced(d.y, shift) == y {
            continue;
        }

        if d.op != Op::ClosePath {
            x = reduced(d.x, shift);
            y = reduced(d.y, shift);
        }
        out.push(*d);
    }

    out
}

/// Pass 2: drop `MoveTo`s that start an empty subpath.
fn drop_unused_movetos(geom: &[Draw]) -> DrawVec {
    let mut out = Vec::with_capacity(geom.len());
    let mut i = 0;

    while i < geom.len() {
        if geom[i].op == Op::MoveTo {
            match geom.get(i + 1).map(|d| d.op) {
                None | Some(Op::MoveTo) => {
                    i += 1;
                    continue;
                }
                Some(Op::ClosePath) => {
                    log::warn!("MoveTo at index {} immediately closed; dropping both", i);
                    i += 2;
                    continue;
                }
                Some(Op::LineTo) => {}
            }
        }

        out.push(geom[i]);
        i += 1;
    }

    out
}

/// Pass 3: drop a `MoveTo` that restarts where the preceding `LineTo` ended.
fn drop_repeated_movetos(geom: &[Draw], shift: u32) -> DrawVec {
    let mut out = Vec::with_capacity(geom.len());

    for (i, d) in geom.iter().enumerate() {
        if d.op == Op::MoveTo && i > 0 {
            let prev = &geom[i - 1];
            if prev.op == Op::LineTo && same_reduced(prev, d, shift) {
                continue;
            }
        }
        out.push(*d);
    }

    out
}
