//! Polygon cleaning and robust clipping through a boolean engine.
//!
//! Polygon rings coming out of simplification can self-intersect, overlap
//! each other, or be wound the wrong way. Cleaning feeds every ring to a
//! [`BooleanEngine`], which unions them (and optionally intersects them with
//! the buffered tile) and returns well-formed polygons.
//!
//! The engine is trusted for topology but not for winding: every ring it
//! returns is checked, and an outer ring with negative area or a hole with
//! positive area stops processing with [`Error::WrongWinding`].

use std::fs;
use std::path::{Path, PathBuf};

use geo::Coord;

use crate::area::ring_area;
use crate::engine::{
    BooleanEngine, ClipType, EngineFault, EnginePolygon, EngineRing, FillRule, OverlayEngine,
    PolygonRole,
};
use crate::geometry::{subpaths, Draw, DrawVec, GeomType, Op};
use crate::noop::remove_noop;
use crate::tile::{clean_clip_rect, TileRect};
use crate::{Error, Result};

/// Default location of the engine-fault diagnostic dump
pub const DEFAULT_DIAGNOSTIC_PATH: &str = "/tmp/tilegeom-clean.log";

/// Fewest draws a subpath needs to be handed to the engine (a closed triangle)
const MIN_RING_DRAWS: usize = 4;

/// Options for polygon cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct CleanOptions {
    /// Where the input rings are dumped when the engine faults
    pub diagnostic_path: PathBuf,
    /// Fill rule applied to both the subject and clip operands
    pub fill_rule: FillRule,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            diagnostic_path: PathBuf::from(DEFAULT_DIAGNOSTIC_PATH),
            fill_rule: FillRule::NonZero,
        }
    }
}

impl CleanOptions {
    /// Set the diagnostic dump location
    pub fn with_diagnostic_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.diagnostic_path = path.into();
        self
    }

    /// Set the fill rule
    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }
}

/// Clean a polygon stream with the `i_overlay` engine and default options.
///
/// See [`clean_or_clip_poly_with`].
pub fn clean_or_clip_poly(geom: &[Draw], z: u8, buffer: i64, clip: bool) -> Result<DrawVec> {
    let mut engine = OverlayEngine::new();
    clean_or_clip_poly_with(&mut engine, &CleanOptions::default(), geom, z, buffer, clip)
}

/// Union every ring of a polygon stream and, if `clip` is set, intersect the
/// result with the tile at zoom `z` grown by `buffer` 1/256ths.
///
/// Output rings are `MoveTo` + `LineTo*` with the first vertex repeated at
/// the end, outer rings counter-clockwise and holes clockwise, each polygon's
/// outer ring directly followed by its holes.
pub fn clean_or_clip_poly_with<E: BooleanEngine + ?Sized>(
    engine: &mut E,
    options: &CleanOptions,
    geom: &[Draw],
    z: u8,
    buffer: i64,
    clip: bool,
) -> Result<DrawVec> {
    let geom = remove_noop(geom, GeomType::Polygon, 0);

    let mut subject: Vec<EngineRing> = Vec::new();
    for run in subpaths(&geom) {
        if run.len() >= MIN_RING_DRAWS {
            subject.push(geom[run].iter().map(Draw::coord).collect());
        }
    }

    // Clip ring trimmed to the subject's bounds; the intersection is the same
    let clip_rect = if clip {
        let bounds = TileRect::bounding(subject.iter().flatten());
        match bounds.and_then(|b| b.intersection(&clean_clip_rect(z, buffer))) {
            Some(rect) => Some(rect),
            None => return Ok(Vec::new()),
        }
    } else {
        None
    };

    for ring in &subject {
        engine.add_ring(ring.clone(), PolygonRole::Subject);
    }

    let clip_type = match clip_rect {
        Some(rect) => {
            engine.add_ring(rect.to_ring(), PolygonRole::Clip);
            ClipType::Intersection
        }
        None => ClipType::Union,
    };

    log::debug!(
        "cleaning {} rings at z{} ({:?})",
        subject.len(),
        z,
        clip_type
    );

    match engine.execute(clip_type, options.fill_rule, options.fill_rule) {
        Ok(polygons) => decode_polygons(&polygons),
        Err(fault) => Err(report_fault(&fault, &subject, &options.diagnostic_path)),
    }
}

/// Emit engine polygons as draws, closing rings and checking winding.
fn decode_polygons(polygons: &[EnginePolygon]) -> Result<DrawVec> {
    let mut out = Vec::new();

    for (i, polygon) in polygons.iter().enumerate() {
        for (j, ring) in polygon.iter().enumerate() {
            let (first, rest) = match ring.split_first() {
                Some(split) => split,
                None => continue,
            };

            let start = out.len();
            out.push(Draw::new(Op::MoveTo, first.x, first.y));
            out.extend(rest.iter().map(|c| Draw::new(Op::LineTo, c.x, c.y)));

            if ring.last() != Some(first) {
                log::warn!("had to close ring");
                out.push(Draw::new(Op::LineTo, first.x, first.y));
            }

            let closed: Vec<Coord<i64>> = out[start..].iter().map(Draw::coord).collect();
            let area = ring_area(&closed)?;

            if (j == 0 && area < 0.0) || (j != 0 && area > 0.0) {
                log::error!(
                    "Ring area has wrong sign: {} for {} of {}",
                    area,
                    j,
                    polygon.len()
                );
                return Err(Error::WrongWinding {
                    polygon: i,
                    ring: j,
                    area,
                });
            }
        }
    }

    Ok(out)
}

/// Dump the input and turn an engine fault into the fatal error.
fn report_fault(fault: &EngineFault, subject: &[EngineRing], path: &Path) -> Error {
    log::error!("{}", fault.message);

    match write_diagnostic(path, &fault.message, subject) {
        Ok(()) => log::error!("Polygon input logged to {}", path.display()),
        Err(e) => log::error!("Could not write {}: {}", path.display(), e),
    }

    Error::EngineFault {
        message: fault.message.clone(),
        log_path: path.to_path_buf(),
    }
}

/// Write the message, then every subject ring as `[[[x,y],...],...]`.
fn write_diagnostic(path: &Path, message: &str, subject: &[EngineRing]) -> Result<()> {
    let rings: Vec<Vec<[i64; 2]>> = subject
        .iter()
        .map(|ring| ring.iter().map(|c| [c.x, c.y]).collect())
        .collect();

    let body = format!("{}\n{}\n\n\n\n\n", message, serde_json::to_string(&rings)?);
    fs::write(path, body)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records what it was given and replays a canned answer
    struct ScriptedEngine {
        added: Vec<(EngineRing, PolygonRole)>,
        clip_type: Option<ClipType>,
        answer: std::result::Result<Vec<EnginePolygon>, EngineFault>,
    }

    impl ScriptedEngine {
        fn returning(answer: std::result::Result<Vec<EnginePolygon>, EngineFault>) -> Self {
            Self {
                added: Vec::new(),
                clip_type: None,
                answer,
            }
        }
    }

    impl BooleanEngine for ScriptedEngine {
        fn add_ring(&mut self, ring: EngineRing, role: PolygonRole) {
            self.added.push((ring, role));
        }

        fn execute(
            &mut self,
            clip_type: ClipType,
            _subject_fill: FillRule,
            _clip_fill: FillRule,
        ) -> std::result::Result<Vec<EnginePolygon>, EngineFault> {
            self.clip_type = Some(clip_type);
            self.answer.clone()
        }
    }

    fn ring(points: &[(i64, i64)]) -> EngineRing {
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

    // ========== Engine Input Tests ==========

    #[test]
    fn test_short_subpaths_not_sent_to_engine() {
        let mut geom = draws(&[(0, 0), (10, 0), (10, 10), (0, 0)]);
        geom.extend(draws(&[(20, 20), (30, 30), (20, 20)]));

        let mut engine = ScriptedEngine::returning(Ok(Vec::new()));
        let out =
            clean_or_clip_poly_with(&mut engine, &CleanOptions::default(), &geom, 0, 5, false)
                .unwrap();

        assert!(out.is_empty());
        assert_eq!(engine.added.len(), 1);
        assert_eq!(engine.added[0].1, PolygonRole::Subject);
        assert_eq!(engine.clip_type, Some(ClipType::Union));
    }

    #[test]
    fn test_clip_adds_tile_ring() {
        let geom = draws(&[(0, 0), (10, 0), (10, 10), (0, 0)]);

        let mut engine = ScriptedEngine::returning(Ok(Vec::new()));
        clean_or_clip_poly_with(&mut engine, &CleanOptions::default(), &geom, 14, 16, true)
            .unwrap();

        assert_eq!(engine.clip_type, Some(ClipType::Intersection));
        let (clip_ring, role) = engine.added.last().unwrap();
        assert_eq!(*role, PolygonRole::Clip);
        assert_eq!(*clip_ring, TileRect::new(0, 0, 10, 10).to_ring());
    }

    #[test]
    fn test_clip_ring_stops_at_tile_edge() {
        // Hangs 50000 units off the left of the z14 tile; the buffer is 16384
        let geom = draws(&[(-50_000, 0), (100, 0), (100, 100), (-50_000, 0)]);

        let mut engine = ScriptedEngine::returning(Ok(Vec::new()));
        clean_or_clip_poly_with(&mut engine, &CleanOptions::default(), &geom, 14, 16, true)
            .unwrap();

        let (clip_ring, _) = engine.added.last().unwrap();
        assert_eq!(*clip_ring, TileRect::new(-16384, 0, 100, 100).to_ring());
    }

    #[test]
    fn test_subject_outside_tile_skips_engine() {
        let geom = draws(&[(-500, -500), (-400, -500), (-400, -400), (-500, -500)]);

        let mut engine = ScriptedEngine::returning(Err(EngineFault::new("not reached")));
        let out =
            clean_or_clip_poly_with(&mut engine, &CleanOptions::default(), &geom, 14, 0, true)
                .unwrap();

        assert!(out.is_empty());
        assert!(engine.added.is_empty());
        assert_eq!(engine.clip_type, None);
    }

    #[test]
    fn test_degenerate_edges_removed_before_engine() {
        let geom = draws(&[(0, 0), (0, 0), (10, 0), (10, 0), (10, 10), (0, 0)]);

        let mut engine = ScriptedEngine::returning(Ok(Vec::new()));
        clean_or_clip_poly_with(&mut engine, &CleanOptions::default(), &geom, 0, 5, false)
            .unwrap();

        assert_eq!(engine.added[0].0, ring(&[(0, 0), (10, 0), (10, 10), (0, 0)]));
    }

    // ========== Decode Tests ==========

    #[test]
    fn test_decode_outer_and_hole() {
        let polygons = vec![vec![
            ring(&[(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)]),
            ring(&[(2, 2), (2, 4), (4, 4), (4, 2), (2, 2)]),
        ]];

        let out = decode_polygons(&polygons).unwrap();
        assert_eq!(out.len(), 10);
        assert_eq!(out[0].op, Op::MoveTo);
        assert_eq!(out[5], Draw::move_to(2, 2));
    }

    #[test]
    fn test_decode_closes_open_ring() {
        let polygons = vec![vec![ring(&[(0, 0), (10, 0), (10, 10)])]];
        let out = decode_polygons(&polygons).unwrap();

        assert_eq!(out.len(), 4);
        assert_eq!(out[3], Draw::line_to(0, 0));
    }

    #[test]
    fn test_decode_rejects_clockwise_outer() {
        let polygons = vec![vec![ring(&[(0, 0), (0, 10), (10, 10), (10, 0), (0, 0)])]];

        match decode_polygons(&polygons) {
            Err(Error::WrongWinding { polygon, ring, area }) => {
                assert_eq!(polygon, 0);
                assert_eq!(ring, 0);
                assert_eq!(area, -100.0);
            }
            other => panic!("expected WrongWinding, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_counter_clockwise_hole() {
        let polygons = vec![
            vec![ring(&[(20, 0), (30, 0), (30, 10), (20, 0)])],
            vec![
                ring(&[(0, 0), (10, 0), (10, 10), (0, 10), (0, 0)]),
                ring(&[(2, 2), (4, 2), (4, 4), (2, 4), (2, 2)]),
            ],
        ];

        match decode_polygons(&polygons) {
            Err(Error::WrongWinding { polygon, ring, .. }) => {
                assert_eq!(polygon, 1);
                assert_eq!(ring, 1);
            }
            other => panic!("expected WrongWinding, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_allows_zero_area() {
        let polygons = vec![vec![
            ring(&[(0, 0), (10, 0), (20, 0), (0, 0)]),
            ring(&[(1, 1), (2, 2), (1, 1)]),
        ]];
        assert!(decode_polygons(&polygons).is_ok());
    }

    // ========== Fault Tests ==========

    #[test]
    fn test_engine_fault_writes_diagnostic() {
        let path = std::env::temp_dir().join("tilegeom-clean-unit-fault.log");
        let _ = fs::remove_file(&path);

        let geom = draws(&[(0, 0), (10, 0), (10, 10), (0, 0)]);
        let mut engine = ScriptedEngine::returning(Err(EngineFault::new("boom")));
        let options = CleanOptions::default().with_diagnostic_path(&path);

        let err = clean_or_clip_poly_with(&mut engine, &options, &geom, 0, 5, false).unwrap_err();
        assert!(err.is_impossible());
        match &err {
            Error::EngineFault { message, log_path } => {
                assert_eq!(message, "boom");
                assert_eq!(log_path, &path);
            }
            other => panic!("expected EngineFault, got {:?}", other),
        }

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "boom\n[[[0,0],[10,0],[10,10],[0,0]]]\n\n\n\n\n");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_engine_fault_survives_unwritable_diagnostic() {
        let path = std::env::temp_dir()
            .join("tilegeom-no-such-dir")
            .join("nested")
            .join("fault.log");

        let geom = draws(&[(0, 0), (10, 0), (10, 10), (0, 0)]);
        let mut engine = ScriptedEngine::returning(Err(EngineFault::new("boom")));
        let options = CleanOptions::default().with_diagnostic_path(&path);

        let err = clean_or_clip_poly_with(&mut engine, &options, &geom, 0, 5, false).unwrap_err();
        assert!(matches!(err, Error::EngineFault { .. }));
    }

    // ========== Options Tests ==========

    #[test]
    fn test_default_options() {
        let options = CleanOptions::default();
        assert_eq!(options.diagnostic_path, PathBuf::from("/tmp/tilegeom-clean.log"));
        assert_eq!(options.fill_rule, FillRule::NonZero);

        let options = options.with_fill_rule(FillRule::EvenOdd);
        assert_eq!(options.fill_rule, FillRule::EvenOdd);
    }
}
