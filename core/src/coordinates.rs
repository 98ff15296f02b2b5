//! Hex coordinates, edge directions and the metrics that tie them to world space.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Distance from a cell center to any of its corners, in world units.
pub const OUTER_RADIUS: f32 = 10.0;

/// Ratio between the inner and the outer radius of a regular hexagon.
pub const OUTER_TO_INNER: f32 = 0.866_025_404;

/// Distance from a cell center to the middle of any of its edges.
pub const INNER_RADIUS: f32 = OUTER_RADIUS * OUTER_TO_INNER;

/// Width of a cell measured between two opposite edges.
pub const INNER_DIAMETER: f32 = INNER_RADIUS * 2.0;

/// The six edges of a hex cell, clockwise from the upper right.
///
/// The discriminants double as the bit positions used by [`crate::RoadFlags`]
/// and by the persisted river bytes, so their order is part of the map format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HexDirection {
    /// Upper right edge.
    NorthEast,
    /// Right edge.
    East,
    /// Lower right edge.
    SouthEast,
    /// Lower left edge.
    SouthWest,
    /// Left edge.
    West,
    /// Upper left edge.
    NorthWest,
}

impl HexDirection {
    /// Every direction in index order.
    pub const ALL: [HexDirection; 6] = [
        HexDirection::NorthEast,
        HexDirection::East,
        HexDirection::SouthEast,
        HexDirection::SouthWest,
        HexDirection::West,
        HexDirection::NorthWest,
    ];

    /// Zero-based index of the direction.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Resolves a direction from its index, if the index names one.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::ALL.len() {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Direction pointing back across the same edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::ALL[(self.index() + 3) % 6]
    }

    /// Neighboring direction counter-clockwise.
    #[must_use]
    pub const fn previous(self) -> Self {
        Self::ALL[(self.index() + 5) % 6]
    }

    /// Neighboring direction clockwise.
    #[must_use]
    pub const fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % 6]
    }

    /// Axial `(x, z)` step taken when crossing the edge.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::NorthEast => (0, 1),
            Self::East => (1, 0),
            Self::SouthEast => (1, -1),
            Self::SouthWest => (0, -1),
            Self::West => (-1, 0),
            Self::NorthWest => (-1, 1),
        }
    }
}

/// Classification of the elevation change across an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// Both sides share the same elevation.
    Flat,
    /// The sides differ by a single elevation step.
    Slope,
    /// The sides differ by two or more elevation steps.
    Cliff,
}

impl EdgeType {
    /// Classifies the edge between two elevations.
    #[must_use]
    pub const fn between(elevation: i32, other: i32) -> Self {
        match elevation.abs_diff(other) {
            0 => Self::Flat,
            1 => Self::Slope,
            _ => Self::Cliff,
        }
    }
}

/// Horizontal wraparound applied to coordinates and distances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Wrapping {
    /// The map has hard east and west borders.
    #[default]
    Disabled,
    /// The east border connects back to the west border.
    Horizontal {
        /// Number of offset columns after which the map repeats.
        size: i32,
    },
}

impl Wrapping {
    /// Wrap size when wraparound is active.
    #[must_use]
    pub const fn size(self) -> Option<i32> {
        match self {
            Self::Disabled => None,
            Self::Horizontal { size } => Some(size),
        }
    }
}

/// Cube coordinate of a hex cell stored in axial form.
///
/// Only `x` and `z` are stored; `y` is derived so that `x + y + z == 0`
/// always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AxialCoordinate {
    x: i32,
    z: i32,
}

/// Largest axial component [`AxialCoordinate::from_position`] produces, so
/// derived components and wraparound shifts stay within `i32`.
const MAX_POSITION_COMPONENT: u32 = (i32::MAX / 4) as u32;

impl AxialCoordinate {
    /// Creates a coordinate without any wraparound normalization.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Creates a coordinate, shifting `x` by one wrap size when its offset
    /// column falls outside `[0, size)`.
    #[must_use]
    pub const fn with_wrapping(x: i32, z: i32, wrapping: Wrapping) -> Self {
        let mut x = x;
        if let Wrapping::Horizontal { size } = wrapping {
            let column = x + z / 2;
            if column < 0 {
                x += size;
            } else if column >= size {
                x -= size;
            }
        }
        Self { x, z }
    }

    /// Converts an offset `(column, row)` position into axial form.
    #[must_use]
    pub const fn from_offset(column: i32, row: i32, wrapping: Wrapping) -> Self {
        Self::with_wrapping(column - row / 2, row, wrapping)
    }

    /// Resolves the cell containing a world-space position on the map plane.
    ///
    /// Each cube axis is rounded independently. When the rounded triple does
    /// not sum to zero the axis with the largest rounding error is rebuilt
    /// from the other two, checking `x` before `z`.
    ///
    /// Returns `None` for non-finite positions and for positions so far from
    /// the origin that no grid could contain them.
    #[must_use]
    pub fn from_position(world_x: f32, world_z: f32, wrapping: Wrapping) -> Option<Self> {
        let mut x = world_x / INNER_DIAMETER;
        let mut y = -x;

        let offset = world_z / (OUTER_RADIUS * 3.0);
        x -= offset;
        y -= offset;

        let limit = MAX_POSITION_COMPONENT as f32;
        if !(x.abs() <= limit && y.abs() <= limit && (x + y).abs() <= limit) {
            return None;
        }

        let mut rounded_x = x.round_ties_even() as i64;
        let rounded_y = y.round_ties_even() as i64;
        let mut rounded_z = (-x - y).round_ties_even() as i64;

        if rounded_x + rounded_y + rounded_z != 0 {
            let delta_x = (x - rounded_x as f32).abs();
            let delta_y = (y - rounded_y as f32).abs();
            let delta_z = (-x - y - rounded_z as f32).abs();

            if delta_x > delta_y && delta_x > delta_z {
                rounded_x = -rounded_y - rounded_z;
            } else if delta_z > delta_y {
                rounded_z = -rounded_x - rounded_y;
            }
            debug!(world_x, world_z, "corrected cube rounding error");
        }

        let bounded = |value: i64| {
            i32::try_from(value)
                .ok()
                .filter(|value| value.unsigned_abs() <= MAX_POSITION_COMPONENT)
        };
        Some(Self::with_wrapping(
            bounded(rounded_x)?,
            bounded(rounded_z)?,
            wrapping,
        ))
    }

    /// The `x` cube component.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// The derived `y` cube component.
    #[must_use]
    pub const fn y(&self) -> i32 {
        -self.x - self.z
    }

    /// The `z` cube component, equal to the offset row.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Offset column of the coordinate.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.x + self.z / 2
    }

    /// Coordinate one step across the given edge.
    #[must_use]
    pub const fn neighbor(self, direction: HexDirection) -> Self {
        let (dx, dz) = direction.offset();
        Self::new(self.x + dx, self.z + dz)
    }

    /// World-space `(x, z)` of the cell center.
    #[must_use]
    pub fn position(&self) -> (f32, f32) {
        let x = (self.x as f32 + self.z as f32 * 0.5) * INNER_DIAMETER;
        let z = self.z as f32 * OUTER_RADIUS * 1.5;
        (x, z)
    }

    /// Number of steps between two cells on an unbounded plane.
    #[must_use]
    pub fn distance_to(self, other: AxialCoordinate) -> u32 {
        (self.x.abs_diff(other.x) + self.y().abs_diff(other.y()) + self.z.abs_diff(other.z)) / 2
    }

    /// Number of steps between two cells, taking the shorter way around the
    /// seam when wraparound is active.
    #[must_use]
    pub fn wrapped_distance_to(self, other: AxialCoordinate, wrapping: Wrapping) -> u32 {
        let horizontal = |other_x: i32| {
            let other_y = -other_x - other.z;
            self.x.abs_diff(other_x) + self.y().abs_diff(other_y)
        };

        let mut xy = horizontal(other.x);
        if let Some(size) = wrapping.size() {
            xy = xy.min(horizontal(other.x + size)).min(horizontal(other.x - size));
        }

        (xy + self.z.abs_diff(other.z)) / 2
    }
}

impl fmt::Display for AxialCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y(), self.z)
    }
}
