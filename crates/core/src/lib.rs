//! Clipping and cleaning of tile geometry.
//!
//! Geometry arrives as a flat stream of MoveTo/LineTo/ClosePath operations in
//! world coordinates (2^32 per axis). This library turns it into geometry that
//! is safe to encode into a single tile:
//!
//! - [`clip`]: points, lines and polygon rings clipped to the buffered tile
//! - [`clean`]: polygon rings unioned and repaired through a boolean engine,
//!   with the engine's output winding verified
//! - [`area`]: signed ring areas whose sign survives floating-point overflow
//! - [`scale`]: conversion between world and tile precision
//! - [`noop`] and [`close`]: degenerate-operation removal and ring closing
//!
//! # Examples
//!
//! ```
//! use tilegeom_core::clip::clip_lines;
//! use tilegeom_core::geometry::Draw;
//! use tilegeom_core::tile::TileRect;
//!
//! let line = vec![Draw::move_to(-10, 5), Draw::line_to(10, 5)];
//! let clipped = clip_lines(&line, &TileRect::new(0, 0, 8, 8));
//!
//! assert_eq!(clipped[1], Draw::move_to(0, 5));
//! assert_eq!(clipped[2], Draw::line_to(8, 5));
//! ```
//!
//! # Fatal conditions
//!
//! Some failures mean an upstream invariant is broken rather than that the
//! input was bad: a malformed polygon stream, an area that overflows at every
//! scale, mis-wound engine output, or an engine fault. These surface as the
//! [`Error`] variants for which [`Error::is_impossible`] is true; binaries
//! should stop with [`EXIT_IMPOSSIBLE`] when they see one.

use std::path::PathBuf;

use thiserror::Error;

pub mod area;
pub mod clean;
pub mod clip;
pub mod close;
pub mod convert;
pub mod engine;
pub mod geometry;
pub mod noop;
pub mod scale;
pub mod segment;
pub mod tile;

pub use clean::{clean_or_clip_poly, clean_or_clip_poly_with, CleanOptions};
pub use geometry::{Draw, DrawVec, GeomType, Op, Ring};
pub use tile::TileRect;

/// Process exit status for conditions that should be impossible
pub const EXIT_IMPOSSIBLE: i32 = 113;

/// Errors that can occur while clipping or cleaning geometry
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unexpected operation {op:?} at index {index} in polygon")]
    UnexpectedOperation { op: Op, index: usize },

    #[error("Ring area overflows at every scale")]
    AreaOverflow,

    #[error("Ring area has wrong sign: {area} for ring {ring} of polygon {polygon}")]
    WrongWinding {
        polygon: usize,
        ring: usize,
        area: f64,
    },

    #[error("Polygon cleaning failed: {message} (input logged to {})", log_path.display())]
    EngineFault { message: String, log_path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for broken internal invariants, which must stop the process
    pub fn is_impossible(&self) -> bool {
        matches!(
            self,
            Error::UnexpectedOperation { .. }
                | Error::AreaOverflow
                | Error::WrongWinding { .. }
                | Error::EngineFault { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impossible_classification() {
        assert!(Error::AreaOverflow.is_impossible());
        assert!(Error::UnexpectedOperation {
            op: Op::ClosePath,
            index: 3
        }
        .is_impossible());
        assert!(Error::EngineFault {
            message: "boom".to_string(),
            log_path: PathBuf::from("/tmp/x.log"),
        }
        .is_impossible());

        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(!io.is_impossible());
    }

    #[test]
    fn test_error_messages() {
        let err = Error::WrongWinding {
            polygon: 0,
            ring: 1,
            area: 12.5,
        };
        assert_eq!(
            err.to_string(),
            "Ring area has wrong sign: 12.5 for ring 1 of polygon 0"
        );
    }
}
