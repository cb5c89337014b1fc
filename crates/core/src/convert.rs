//! Conversion between `geo` geometries and draw streams.
//!
//! Coordinates are rounded to the nearest integer on the way in. Polygon rings
//! are written with their closing vertex repeated (no `ClosePath`), which is
//! the form the clippers and the cleaner take.

use geo::{Area, Coord, Geometry, LineString, MultiPolygon, Polygon};

use crate::geometry::{rings, Draw, DrawVec, GeomType, Op};

/// Encode a geometry as a draw stream.
///
/// Returns `None` for geometry kinds without a stream encoding (collections,
/// rectangles, triangles, bare lines).
pub fn geometry_to_draws(geom: &Geometry<f64>) -> Option<(GeomType, DrawVec)> {
    let mut out = Vec::new();

    let kind = match geom {
        Geometry::Point(p) => {
            out.push(draw(Op::MoveTo, p.0));
            GeomType::Point
        }
        Geometry::MultiPoint(mp) => {
            out.extend(mp.iter().map(|p| draw(Op::MoveTo, p.0)));
            GeomType::Point
        }
        Geometry::LineString(ls) => {
            push_path(&mut out, ls);
            GeomType::Line
        }
        Geometry::MultiLineString(mls) => {
            for ls in mls {
                push_path(&mut out, ls);
            }
            GeomType::Line
        }
        Geometry::Polygon(poly) => {
            push_polygon(&mut out, poly);
            GeomType::Polygon
        }
        Geometry::MultiPolygon(mp) => {
            for poly in mp {
                push_polygon(&mut out, poly);
            }
            GeomType::Polygon
        }
        _ => return None,
    };

    Some((kind, out))
}

fn draw(op: Op, c: Coord<f64>) -> Draw {
    Draw::new(op, c.x.round() as i64, c.y.round() as i64)
}

fn push_path(out: &mut DrawVec, ls: &LineString<f64>) {
    for (k, c) in ls.coords().enumerate() {
        let op = if k == 0 { Op::MoveTo } else { Op::LineTo };
        out.push(draw(op, *c));
    }
}

fn push_polygon(out: &mut DrawVec, poly: &Polygon<f64>) {
    push_path(out, poly.exterior());
    for hole in poly.interiors() {
        push_path(out, hole);
    }
}

/// Group the rings of a polygon stream into polygons.
///
/// A ring with positive area starts a new polygon; a ring with negative area
/// becomes a hole of the polygon before it. Zero-area rings, and holes with no
/// polygon to attach to, are dropped.
pub fn draws_to_multi_polygon(geom: &[Draw]) -> MultiPolygon<f64> {
    let mut polygons: Vec<Polygon<f64>> = Vec::new();

    for ring in rings(geom) {
        let ls: LineString<f64> = ring
            .points
            .iter()
            .map(|c| Coord {
                x: c.x as f64,
                y: c.y as f64,
            })
            .collect();

        let area = Polygon::new(ls.clone(), vec![]).signed_area();

        if area > 0.0 {
            polygons.push(Polygon::new(ls, vec![]));
        } else if area < 0.0 {
            match polygons.last_mut() {
                Some(poly) => poly.interiors_push(ls),
                None => log::warn!("dropping hole with no enclosing ring"),
            }
        }
    }

    MultiPolygon::new(polygons)
}
