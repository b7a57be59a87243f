//! Window geometry shared by the client core, the registry and the event loop.
//!
//! Everything here is a plain value type: no protocol requests are issued
//! from this module.

use std::fmt;

// X carries coordinates as INT16 and sizes as CARD16
pub const WIRE_COORD_MIN: i32 = i16::MIN as i32;
pub const WIRE_COORD_MAX: i32 = i16::MAX as i32;
pub const WIRE_EXTENT_MAX: u32 = u16::MAX as u32;

/// Window geometry in root coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Grow the rectangle by `inset` pixels on every side.
    ///
    /// This is how a decoration surface is derived from the client it wraps.
    pub fn inflate(&self, inset: u32) -> Self {
        let inset_i = i32::try_from(inset).unwrap_or(i32::MAX);
        Self {
            x: self.x.saturating_sub(inset_i),
            y: self.y.saturating_sub(inset_i),
            width: self.width.saturating_add(inset.saturating_mul(2)),
            height: self.height.saturating_add(inset.saturating_mul(2)),
        }
    }

    /// Same position, size raised to at least `min_width` x `min_height`.
    pub fn clamp_size(&self, min_width: u32, min_height: u32) -> Self {
        Self {
            width: self.width.max(min_width),
            height: self.height.max(min_height),
            ..*self
        }
    }

    /// Clamp so that both this rectangle and `inflate(inset)` of it can be
    /// sent to the server without truncation. Sizes never drop below 1.
    pub fn fit_wire(&self, inset: u32) -> Self {
        let inset = inset.min((WIRE_EXTENT_MAX - 1) / 2);
        let max_extent = WIRE_EXTENT_MAX - 2 * inset;
        let min_coord = WIRE_COORD_MIN + inset as i32;
        Self {
            x: self.x.clamp(min_coord, WIRE_COORD_MAX),
            y: self.y.clamp(min_coord, WIRE_COORD_MAX),
            width: self.width.clamp(1, max_extent),
            height: self.height.clamp(1, max_extent),
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Edge a relative resize is applied from
///
/// A positive delta pushes the edge outward (the window grows), a negative
/// delta pulls it inward. `Left` and `Top` are the leading edges: resizing
/// from them moves the window origin so the opposite edge stays put.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub fn is_leading(self) -> bool {
        matches!(self, Edge::Left | Edge::Top)
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }

    /// Edge of `geometry` closest to the point `(x, y)`. Points on the
    /// border outside the rectangle count by their distance too.
    ///
    /// Ties go to the trailing edges, so a press in the exact corner grows
    /// the window to the right.
    pub fn nearest(geometry: Geometry, x: i32, y: i32) -> Edge {
        let (x, y) = (x as i64, y as i64);
        let left = x - geometry.x as i64;
        let top = y - geometry.y as i64;
        let right = geometry.x as i64 + geometry.width as i64 - x;
        let bottom = geometry.y as i64 + geometry.height as i64 - y;

        [(Edge::Right, right), (Edge::Bottom, bottom), (Edge::Left, left), (Edge::Top, top)]
            .into_iter()
            .min_by_key(|&(_, distance)| distance.abs())
            .map(|(edge, _)| edge)
            .unwrap_or(Edge::Right)
    }
}
