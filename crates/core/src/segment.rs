//! Cohen–Sutherland line segment clipping against a tile rectangle.

use geo::Coord;

use crate::tile::TileRect;

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

/// Result of clipping one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    /// Segment lies entirely outside; endpoints may have been partially
    /// moved and must not be used
    Rejected,
    /// Segment lies entirely inside and was not modified
    Unchanged,
    /// At least one endpoint was moved onto the rectangle boundary
    Clipped,
}

fn out_code(p: &Coord<f64>, rect: &Bounds) -> u8 {
    let mut code = INSIDE;

    if p.x < rect.min_x {
        code |= LEFT;
    } else if p.x > rect.max_x {
        code |= RIGHT;
    }

    if p.y < rect.min_y {
        code |= BOTTOM;
    } else if p.y > rect.max_y {
        code |= TOP;
    }

    code
}

struct Bounds {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl From<&TileRect> for Bounds {
    fn from(rect: &TileRect) -> Self {
        Self {
            min_x: rect.min_x as f64,
            min_y: rect.min_y as f64,
            max_x: rect.max_x as f64,
            max_y: rect.max_y as f64,
        }
    }
}

/// Clip the segment `a`–`b` to `rect`, moving the endpoints in place.
///
/// Each round moves one outside endpoint onto the first edge it violates, in
/// the order top, bottom, right, left, until the segment is trivially
/// accepted or trivially rejected.
pub fn clip_segment(a: &mut Coord<f64>, b: &mut Coord<f64>, rect: &TileRect) -> ClipOutcome {
    let bounds = Bounds::from(rect);
    let mut code_a = out_code(a, &bounds);
    let mut code_b = out_code(b, &bounds);
    let mut changed = false;

    loop {
        if code_a | code_b == 0 {
            return if changed {
                ClipOutcome::Clipped
            } else {
                ClipOutcome::Unchanged
            };
        }
        if code_a & code_b != 0 {
            return ClipOutcome::Rejected;
        }

        let moving_a = code_a != 0;
        let code_out = if moving_a { code_a } else { code_b };

        let p = if code_out & TOP != 0 {
            Coord {
                x: a.x + (b.x - a.x) * (bounds.max_y - a.y) / (b.y - a.y),
                y: bounds.max_y,
            }
        } else if code_out & BOTTOM != 0 {
            Coord {
                x: a.x + (b.x - a.x) * (bounds.min_y - a.y) / (b.y - a.y),
                y: bounds.min_y,
            }
        } else if code_out & RIGHT != 0 {
            Coord {
                x: bounds.max_x,
                y: a.y + (b.y - a.y) * (bounds.max_x - a.x) / (b.x - a.x),
            }
        } else {
            Coord {
                x: bounds.min_x,
                y: a.y + (b.y - a.y) * (bounds.min_x - a.x) / (b.x - a.x),
            }
        };

        if moving_a {
            *a = p;
            code_a = out_code(a, &bounds);
        } else {
            *b = p;
            code_b = out_code(b, &bounds);
        }
        changed = true;
    }
}
