//! Tile rectangle math in world coordinates.
//!
//! The world plane is `2^32` units per axis. At zoom `z` it is split into
//! `2^z` tiles per axis, so every tile is `2^(32 - z)` units wide in its own
//! tile-relative frame, with the tile's origin at (0, 0).
//!
//! Buffers are measured in 1/256ths of the tile side (tippecanoe's "screen
//! pixels"), applied symmetrically to all four edges.

use geo::Coord;

/// Bits of precision in the world plane
pub const WORLD_BITS: u32 = 32;

/// Default overdraw buffer, in 1/256ths of the tile side
pub const DEFAULT_BUFFER: i64 = 5;

/// Default tile-local resolution in bits (4096 units per tile)
pub const DEFAULT_DETAIL: u8 = 12;

/// Axis-aligned clip rectangle, inclusive on all edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl TileRect {
    /// Create a new rectangle
    pub fn new(min_x: i64, min_y: i64, max_x: i64, max_y: i64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Tile rectangle at zoom `z`, grown by `buffer` 1/256ths of the tile side
    pub fn buffered(z: u8, buffer: i64) -> Self {
        Self::around_extent(tile_extent(z), buffer)
    }

    fn around_extent(area: i64, buffer: i64) -> Self {
        let pad = buffer * area / 256;
        Self::new(-pad, -pad, area + pad, area + pad)
    }

    /// Smallest rectangle holding every point, or `None` for no points
    pub fn bounding<'a>(points: impl IntoIterator<Item = &'a Coord<i64>>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for c in points {
            rect.min_x = rect.min_x.min(c.x);
            rect.min_y = rect.min_y.min(c.y);
            rect.max_x = rect.max_x.max(c.x);
            rect.max_y = rect.max_y.max(c.y);
        }
        Some(rect)
    }

    /// Overlap of two rectangles; touching edges count as overlap
    pub fn intersection(&self, other: &TileRect) -> Option<Self> {
        let rect = Self::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        );
        (rect.min_x <= rect.max_x && rect.min_y <= rect.max_y).then_some(rect)
    }

    /// Closed-bounds containment
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.min_x && y >= self.min_y && x <= self.max_x && y <= self.max_y
    }

    /// The rectangle as a 5-point closed ring, starting at the minimum corner
    /// and running up the left edge first.
    pub fn to_ring(&self) -> Vec<Coord<i64>> {
        vec![
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
            Coord {
                x: self.min_x,
                y: self.max_y,
            },
            Coord {
                x: self.max_x,
                y: self.max_y,
            },
            Coord {
                x: self.max_x,
                y: self.min_y,
            },
            Coord {
                x: self.min_x,
                y: self.min_y,
            },
        ]
    }
}

/// Side length of one tile at zoom `z`, in world units
pub fn tile_extent(z: u8) -> i64 {
    1i64 << (WORLD_BITS - z as u32)
}

/// Clip rectangle used when cleaning polygons.
///
/// At zoom 0 the extent is the largest 32-bit value rather than `2^32`,
/// which keeps the whole world rectangle inside unsigned 32-bit range.
pub fn clean_clip_rect(z: u8, buffer: i64) -> TileRect {
    let area = if z == 0 { 0xFFFF_FFFF } else { tile_extent(z) };
    TileRect::around_extent(area, buffer)
}

/// Convert a buffer in 1/256ths of the tile side to tile-local units.
///
/// # Arguments
///
/// * `buffer` - Buffer in 1/256ths of the tile side (e.g., 5)
/// * `extent` - Tile extent in units (e.g., 4096)
pub fn buffer_units(buffer: i64, extent: i64) -> i64 {
    buffer * extent / 256
}
