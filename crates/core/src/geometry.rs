//! Geometry stream model.
//!
//! A feature's geometry travels through the pipeline as a flat list of drawing
//! operations ([`Draw`]), the same MoveTo/LineTo/ClosePath vocabulary the MVT
//! encoder speaks. Coordinates are integers in the world plane (2^32 per axis,
//! with room for features that stick off either side).
//!
//! Subpath scanning lives here and nowhere else: [`subpaths`] finds every
//! `MoveTo` + `LineTo*` run and [`Ring`] gives that run an owned, explicit form.

use std::ops::Range;

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Drawing operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    MoveTo,
    LineTo,
    ClosePath,
}

/// Geometry type of a stream, which decides how cleanup treats it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeomType {
    Point,
    Line,
    Polygon,
}

/// A single drawing operation with its coordinates.
///
/// `ClosePath` carries no meaningful coordinates; it is conventionally (0, 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Draw {
    pub op: Op,
    pub x: i64,
    pub y: i64,
}

pub type DrawVec = Vec<Draw>;

impl Draw {
    pub fn new(op: Op, x: i64, y: i64) -> Self {
        Self { op, x, y }
    }

    pub fn move_to(x: i64, y: i64) -> Self {
        Self::new(Op::MoveTo, x, y)
    }

    pub fn line_to(x: i64, y: i64) -> Self {
        Self::new(Op::LineTo, x, y)
    }

    pub fn close_path() -> Self {
        Self::new(Op::ClosePath, 0, 0)
    }

    pub fn coord(&self) -> Coord<i64> {
        Coord {
            x: self.x,
            y: self.y,
        }
    }

    /// Same position, ignoring the operation
    pub fn same_point(&self, other: &Draw) -> bool {
        self.x == other.x && self.y == other.y
    }
}

/// Iterator over the index ranges of `MoveTo` + `LineTo*` runs.
///
/// Draws that are neither a `MoveTo` nor part of a run (a `ClosePath`, or a
/// `LineTo` with no preceding `MoveTo`) are skipped.
pub struct Subpaths<'a> {
    geom: &'a [Draw],
    pos: usize,
}

impl Iterator for Subpaths<'_> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        while self.pos < self.geom.len() {
            let start = self.pos;
            self.pos += 1;

            if self.geom[start].op != Op::MoveTo {
                continue;
            }

            let end = run_end(self.geom, start);
            self.pos = end;
            return Some(start..end);
        }

        None
    }
}

/// Every subpath of a stream, as index ranges into it.
pub fn subpaths(geom: &[Draw]) -> Subpaths<'_> {
    Subpaths { geom, pos: 0 }
}

/// Index one past the last `LineTo` continuing the `MoveTo` at `start`.
pub fn run_end(geom: &[Draw], start: usize) -> usize {
    let mut end = start + 1;
    while end < geom.len() && geom[end].op == Op::LineTo {
        end += 1;
    }
    end
}

/// A polygon ring (or line subpath) in owned form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    pub points: Vec<Coord<i64>>,
    /// Last point repeats the first, or the run ended in a `ClosePath`
    pub closed: bool,
}

impl Ring {
    pub fn new(points: Vec<Coord<i64>>) -> Self {
        let closed = points.len() > 1 && points.first() == points.last();
        Self { points, closed }
    }

    /// Build the ring for the subpath at `range` of `geom`.
    pub fn from_run(geom: &[Draw], range: Range<usize>) -> Self {
        let explicit_close = geom
            .get(range.end)
            .map(|d| d.op == Op::ClosePath)
            .unwrap_or(false);

        let mut ring = Self::new(geom[range].iter().map(Draw::coord).collect());
        ring.closed |= explicit_close;
        ring
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append `MoveTo` + `LineTo*` for this ring's points.
    pub fn write_draws(&self, out: &mut DrawVec) {
        for (k, p) in self.points.iter().enumerate() {
            let op = if k == 0 { Op::MoveTo } else { Op::LineTo };
            out.push(Draw::new(op, p.x, p.y));
        }
    }
}

/// All subpaths of `geom` as owned rings.
pub fn rings(geom: &[Draw]) -> Vec<Ring> {
    subpaths(geom)
        .map(|range| Ring::from_run(geom, range))
        .collect()
}
