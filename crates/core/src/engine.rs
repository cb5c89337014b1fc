//! Polygon boolean engine interface.
//!
//! The cleaner hands rings to a [`BooleanEngine`] and trusts it to repair
//! self-intersections, assign holes, and compute intersections robustly. What
//! it does not trust is the winding of the result, which it checks itself.
//!
//! [`OverlayEngine`] is the production implementation, built on `i_overlay`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use geo::Coord;
use i_overlay::core::fill_rule::FillRule as OverlayFillRule;
use i_overlay::core::overlay::{Overlay, ShapeType};
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use i_overlay::i_float::int::point::IntPoint;

/// Which operand a ring belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonRole {
    Subject,
    Clip,
}

/// How the (self-unioned) subject combines with the clip operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipType {
    /// Subject ∪ clip; with no clip rings, the union of the subject rings
    Union,
    /// Subject ∩ clip
    Intersection,
}

/// Winding rule deciding which regions of an operand are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    EvenOdd,
    NonZero,
    Positive,
    Negative,
}

impl From<FillRule> for OverlayFillRule {
    fn from(rule: FillRule) -> Self {
        match rule {
            FillRule::EvenOdd => OverlayFillRule::EvenOdd,
            FillRule::NonZero => OverlayFillRule::NonZero,
            FillRule::Positive => OverlayFillRule::Positive,
            FillRule::Negative => OverlayFillRule::Negative,
        }
    }
}

/// A ring in engine form: closed, last point equal to the first
pub type EngineRing = Vec<Coord<i64>>;

/// Outer ring first, holes after
pub type EnginePolygon = Vec<EngineRing>;

/// Unrecoverable failure inside the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct EngineFault {
    pub message: String,
}

impl EngineFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub trait BooleanEngine {
    /// Register a ring as part of the subject or the clip operand.
    fn add_ring(&mut self, ring: EngineRing, role: PolygonRole);

    /// Run the operation over every ring added so far.
    ///
    /// Each returned polygon starts with its outer ring (non-negative signed
    /// area) followed by its holes (non-positive signed area).
    fn execute(
        &mut self,
        clip_type: ClipType,
        subject_fill: FillRule,
        clip_fill: FillRule,
    ) -> Result<Vec<EnginePolygon>, EngineFault>;
}

/// Largest distance from the working origin the integer overlay is fed.
///
/// `i_overlay` multiplies coordinate differences in 64 bits, and its own float
/// adapter keeps inputs within this bound for the same reason.
const EXACT_LIMIT: i64 = 1 << 30;

/// Fewest points an output ring keeps after closing (a closed triangle)
const MIN_RING_POINTS: usize = 4;

type FloatContour = Vec<[f64; 2]>;

/// [`BooleanEngine`] backed by `i_overlay`.
///
/// Inputs are shifted so the centre of their combined bounding box sits at
/// the origin. When everything then lies within 2^30 of it, the integer
/// overlay runs at full precision and no output vertex moves. Wider inputs
/// fall back to the float overlay, which rescales to fit and may snap
/// vertices to a coarser grid.
///
/// Both operands share one fill rule. Every ring is returned explicitly
/// closed; rings that collapse below a triangle are left out.
#[derive(Debug, Default)]
pub struct OverlayEngine {
    subject: Vec<EngineRing>,
    clip: Vec<EngineRing>,
}

impl OverlayEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BooleanEngine for OverlayEngine {
    fn add_ring(&mut self, mut ring: EngineRing, role: PolygonRole) {
        // i_overlay closes contours implicitly
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        match role {
            PolygonRole::Subject => self.subject.push(ring),
            PolygonRole::Clip => self.clip.push(ring),
        }
    }

    fn execute(
        &mut self,
        clip_type: ClipType,
        subject_fill: FillRule,
        clip_fill: FillRule,
    ) -> Result<Vec<EnginePolygon>, EngineFault> {
        let subject = std::mem::take(&mut self.subject);
        let clip = std::mem::take(&mut self.clip);

        if !clip.is_empty() && subject_fill != clip_fill {
            return Err(EngineFault::new(format!(
                "overlay needs one fill rule for both operands, got {:?} and {:?}",
                subject_fill, clip_fill
            )));
        }

        if subject.is_empty() {
            return Ok(Vec::new());
        }

        let rule = match clip_type {
            ClipType::Union => OverlayRule::Union,
            ClipType::Intersection => OverlayRule::Intersect,
        };
        let fill: OverlayFillRule = subject_fill.into();

        log::trace!(
            "overlay {:?}: {} subject rings, {} clip rings",
            clip_type,
            subject.len(),
            clip.len()
        );

        let origin = exact_origin(&subject, &clip);
        if origin.is_none() {
            log::warn!(
                "polygon spans more than 2^31 units; overlay falls back to float precision"
            );
        }

        let shapes = panic::catch_unwind(AssertUnwindSafe(|| match origin {
            Some(origin) => overlay_exact(&subject, &clip, origin, rule, fill),
            None => overlay_adaptive(&subject, &clip, rule, fill),
        }))
        .map_err(|payload| EngineFault::new(panic_message(payload)))?;

        Ok(shapes.into_iter().filter_map(decode_shape).collect())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("polygon overlay failed: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("polygon overlay failed: {}", msg)
    } else {
        "polygon overlay failed".to_string()
    }
}

/// Centre of the combined bounding box, if every point lies within
/// [`EXACT_LIMIT`] of it.
fn exact_origin(subject: &[EngineRing], clip: &[EngineRing]) -> Option<Coord<i64>> {
    let mut points = subject.iter().chain(clip).flatten();
    let first = *points.next()?;

    let (mut min, mut max) = (first, first);
    for c in points {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        max.x = max.x.max(c.x);
        max.y = max.y.max(c.y);
    }

    let origin = Coord {
        x: min.x + (max.x - min.x) / 2,
        y: min.y + (max.y - min.y) / 2,
    };

    let fits = max.x - origin.x <= EXACT_LIMIT && max.y - origin.y <= EXACT_LIMIT;
    fits.then_some(origin)
}

/// Integer overlay at unit scale around `origin`.
fn overlay_exact(
    subject: &[EngineRing],
    clip: &[EngineRing],
    origin: Coord<i64>,
    rule: OverlayRule,
    fill: OverlayFillRule,
) -> Vec<Vec<EngineRing>> {
    let to_int = |c: &Coord<i64>| IntPoint::new((c.x - origin.x) as i32, (c.y - origin.y) as i32);

    let capacity = subject.iter().chain(clip).map(Vec::len).sum();
    let mut overlay = Overlay::new(capacity);
    for ring in subject {
        let contour: Vec<IntPoint> = ring.iter().map(to_int).collect();
        overlay.add_contour(&contour, ShapeType::Subject);
    }
    for ring in clip {
        let contour: Vec<IntPoint> = ring.iter().map(to_int).collect();
        overlay.add_contour(&contour, ShapeType::Clip);
    }

    overlay
        .overlay(rule, fill)
        .into_iter()
        .map(|shape| {
            shape
                .into_iter()
                .map(|contour| {
                    contour
                        .into_iter()
                        .map(|p| Coord {
                            x: p.x as i64 + origin.x,
                            y: p.y as i64 + origin.y,
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Float overlay, which picks its own power-of-two grid for the input extent.
fn overlay_adaptive(
    subject: &[EngineRing],
    clip: &[EngineRing],
    rule: OverlayRule,
    fill: OverlayFillRule,
) -> Vec<Vec<EngineRing>> {
    let to_float = |ring: &EngineRing| -> FloatContour {
        ring.iter().map(|c| [c.x as f64, c.y as f64]).collect()
    };
    let subject: Vec<FloatContour> = subject.iter().map(to_float).collect();
    let clip: Vec<FloatContour> = clip.iter().map(to_float).collect();

    subject
        .overlay(&clip, rule, fill)
        .iter()
        .map(|shape| shape.iter().map(|c| round_contour(c)).collect())
        .collect()
}

fn round_contour(contour: &[[f64; 2]]) -> EngineRing {
    contour
        .iter()
        .map(|p| Coord {
            x: p[0].round() as i64,
            y: p[1].round() as i64,
        })
        .collect()
}

/// Convert one overlay shape to engine form.
///
/// i_overlay winds outer boundaries clockwise and holes counter-clockwise, so
/// every contour is reversed as a whole. Nothing is re-oriented per ring: a
/// contour that breaks the convention keeps its wrong sign for the caller's
/// winding check. Consecutive duplicates are merged and the ring is closed.
/// A shape whose outer ring collapses is dropped along with its holes.
fn decode_shape(shape: Vec<EngineRing>) -> Option<EnginePolygon> {
    let mut polygon = Vec::with_capacity(shape.len());

    for (j, contour) in shape.into_iter().enumerate() {
        let mut ring: EngineRing = Vec::with_capacity(contour.len() + 1);
        for c in contour.into_iter().rev() {
            if ring.last() != Some(&c) {
                ring.push(c);
            }
        }

        if let Some(&first) = ring.first() {
            if ring.last() != Some(&first) {
                ring.push(first);
            }
        }

        if ring.len() < MIN_RING_POINTS {
            log::debug!("dropping ring {} collapsed to {} points", j, ring.len());
            if j == 0 {
                return None;
            }
            continue;
        }

        polygon.push(ring);
    }

    (!polygon.is_empty()).then_some(polygon)
}
