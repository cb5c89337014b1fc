//! Conversion of explicitly closed rings to `ClosePath` encoding.

use crate::geometry::{subpaths, Draw, DrawVec};

/// Replace each ring's repeated closing vertex with a `ClosePath`.
///
/// The last vertex of every subpath is dropped whether or not it matches the
/// first; a mismatch is logged. Single-vertex subpaths and draws outside any
/// subpath do not survive.
pub fn close_poly(geom: &[Draw]) -> DrawVec {
    let mut out = Vec::with_capacity(geom.len());

    for run in subpaths(geom) {
        let ring = &geom[run.clone()];

        if ring.len() < 2 {
            log::warn!("dropping single-vertex ring at index {}", run.start);
            continue;
        }

        let first = &ring[0];
        let last = &ring[ring.len() - 1];
        if !first.same_point(last) {
            log::warn!(
                "Ring not closed: ({},{}) vs ({},{})",
                first.x,
                first.y,
                last.x,
                last.y
            );
        }

        out.extend_from_slice(&ring[..ring.len() - 1]);
        out.push(Draw::close_path());
    }

    out
}
