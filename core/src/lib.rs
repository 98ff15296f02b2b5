#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the hexmap workspace.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative terrain grid and the pure systems built around it. Adapters
//! submit [`Command`] values describing terrain edits, the world executes them
//! through its `apply` entry point and reports the consequences as [`Event`]
//! values. Systems consume those events, query the grid and respond with new
//! command batches. Coordinates, edge directions and the persisted map format
//! live here so every layer agrees on them.

mod coordinates;
pub mod format;

pub use coordinates::{
    AxialCoordinate, EdgeType, HexDirection, Wrapping, INNER_DIAMETER, INNER_RADIUS,
    OUTER_RADIUS, OUTER_TO_INNER,
};

use serde::{Deserialize, Serialize};

use crate::format::GridRecord;

/// Stable address of a cell inside the grid arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellIndex(u32);

impl CellIndex {
    /// Creates a new cell index with the provided arena offset.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Offset of the cell inside slices ordered like the grid arena.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier assigned to an entity that contributes to cell visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObserverId(u32);

impl ObserverId {
    /// Creates a new observer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Set of edges crossed by a road, one bit per [`HexDirection`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoadFlags(u8);

impl RoadFlags {
    /// No road on any edge.
    pub const NONE: Self = Self(0);

    const MASK: u8 = 0b0011_1111;

    /// Builds the set from raw bits, rejecting bits beyond the six edges.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !Self::MASK == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Reports whether a road crosses the given edge.
    #[must_use]
    pub const fn contains(self, direction: HexDirection) -> bool {
        self.0 & (1 << direction.index()) != 0
    }

    /// Copy of the set with a road on the given edge.
    #[must_use]
    pub const fn with(self, direction: HexDirection) -> Self {
        Self(self.0 | (1 << direction.index()))
    }

    /// Copy of the set without a road on the given edge.
    #[must_use]
    pub const fn without(self, direction: HexDirection) -> Self {
        Self(self.0 & !(1 << direction.index()))
    }

    /// Adds or removes the road on the given edge in place.
    pub fn set(&mut self, direction: HexDirection, present: bool) {
        *self = if present {
            self.with(direction)
        } else {
            self.without(direction)
        };
    }

    /// Reports whether no edge carries a road.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the edges carrying a road in direction order.
    pub fn iter(self) -> impl Iterator<Item = HexDirection> {
        HexDirection::ALL
            .into_iter()
            .filter(move |direction| self.contains(*direction))
    }
}

/// Turn during which a unit with the given speed reaches the given distance.
///
/// Distance zero and the first `speed` points all belong to turn zero. A zero
/// speed is treated as one.
#[must_use]
pub const fn turn_for(distance: u32, speed: u32) -> u32 {
    let speed = if speed == 0 { 1 } else { speed };
    distance.saturating_sub(1) / speed
}

/// Dimensions and layout options used to build a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    /// Number of offset columns.
    pub width: u32,
    /// Number of offset rows.
    pub height: u32,
    /// Columns per render chunk. The width must be a multiple of it.
    pub chunk_width: u32,
    /// Rows per render chunk. The height must be a multiple of it.
    pub chunk_height: u32,
    /// Whether the east border wraps around to the west border.
    pub wrapping: bool,
}

impl GridConfig {
    /// Chunk width used when none is configured.
    pub const DEFAULT_CHUNK_WIDTH: u32 = 5;
    /// Chunk height used when none is configured.
    pub const DEFAULT_CHUNK_HEIGHT: u32 = 5;

    /// Creates a non-wrapping configuration with the default chunk size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            chunk_width: Self::DEFAULT_CHUNK_WIDTH,
            chunk_height: Self::DEFAULT_CHUNK_HEIGHT,
            wrapping: false,
        }
    }

    /// Copy of the configuration using another chunk size.
    #[must_use]
    pub const fn with_chunk_size(self, chunk_width: u32, chunk_height: u32) -> Self {
        Self {
            chunk_width,
            chunk_height,
            ..self
        }
    }

    /// Copy of the configuration with horizontal wraparound toggled.
    #[must_use]
    pub const fn with_wrapping(self, wrapping: bool) -> Self {
        Self { wrapping, ..self }
    }

    /// Copy of the configuration with other dimensions and the same layout.
    #[must_use]
    pub const fn resized(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    /// Reports whether a grid can be built from this configuration.
    ///
    /// Both dimensions must be positive multiples of the chunk size and the
    /// cell count must be addressable by a [`CellIndex`].
    #[must_use]
    pub const fn supports_dimensions(&self) -> bool {
        if self.width == 0 || self.height == 0 {
            return false;
        }
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return false;
        }
        if self.width % self.chunk_width != 0 || self.height % self.chunk_height != 0 {
            return false;
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return false;
        }
        self.width.checked_mul(self.height).is_some()
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of chunk columns.
    #[must_use]
    pub const fn chunk_columns(&self) -> u32 {
        self.width / self.chunk_width
    }

    /// Number of chunk rows.
    #[must_use]
    pub const fn chunk_rows(&self) -> u32 {
        self.height / self.chunk_height
    }

    /// Coordinate wraparound implied by the configuration.
    #[must_use]
    pub const fn coordinate_wrapping(&self) -> Wrapping {
        if self.wrapping {
            Wrapping::Horizontal {
                size: self.width as i32,
            }
        } else {
            Wrapping::Disabled
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new(20, 15)
    }
}

/// Which cells must be redrawn after an edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshScope {
    /// Only the edited cell changed appearance.
    Cell,
    /// The edited cell and its neighbors share changed edges.
    CellAndNeighbors,
}

/// Reasons the world declines a terrain edit.
///
/// A rejected edit leaves the grid untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditRejection {
    /// The cell index does not address a cell of the current grid.
    UnknownCell,
    /// The edit needs a neighbor in a direction where the grid ends.
    MissingNeighbor,
    /// The river would flow uphill onto a neighbor it cannot spill into.
    InvalidRiverDestination,
    /// Special features cannot be placed on cells with a river.
    RiverPresent,
    /// A river already crosses the edge.
    RiverOnEdge,
    /// Roads cannot connect to cells holding a special feature.
    SpecialFeature,
    /// The elevation gap across the edge is too steep for a road.
    ElevationGap,
}

/// Commands that express all permissible grid mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Rebuilds the grid with new dimensions, discarding every cell.
    Resize {
        /// Number of offset columns.
        width: u32,
        /// Number of offset rows.
        height: u32,
    },
    /// Assigns a terrain type to a cell.
    SetTerrainType {
        /// Cell to edit.
        cell: CellIndex,
        /// Index of the terrain type.
        terrain_type: u8,
    },
    /// Raises or lowers a cell.
    SetElevation {
        /// Cell to edit.
        cell: CellIndex,
        /// New elevation level.
        elevation: i32,
    },
    /// Floods or drains a cell.
    SetWaterLevel {
        /// Cell to edit.
        cell: CellIndex,
        /// New water surface level.
        water_level: i32,
    },
    /// Changes the urban density of a cell.
    SetUrbanLevel {
        /// Cell to edit.
        cell: CellIndex,
        /// New density level.
        level: u8,
    },
    /// Changes the farm density of a cell.
    SetFarmLevel {
        /// Cell to edit.
        cell: CellIndex,
        /// New density level.
        level: u8,
    },
    /// Changes the plant density of a cell.
    SetPlantLevel {
        /// Cell to edit.
        cell: CellIndex,
        /// New density level.
        level: u8,
    },
    /// Places or clears a special feature. Zero clears it.
    SetSpecialIndex {
        /// Cell to edit.
        cell: CellIndex,
        /// Index of the special feature.
        special_index: u8,
    },
    /// Surrounds a cell with walls or tears them down.
    SetWalled {
        /// Cell to edit.
        cell: CellIndex,
        /// Whether the cell is walled.
        walled: bool,
    },
    /// Starts a river at the cell flowing across the given edge.
    SetOutgoingRiver {
        /// Cell the river leaves.
        cell: CellIndex,
        /// Edge the river crosses.
        direction: HexDirection,
    },
    /// Removes the river leaving the cell.
    RemoveOutgoingRiver {
        /// Cell to edit.
        cell: CellIndex,
    },
    /// Removes the river entering the cell.
    RemoveIncomingRiver {
        /// Cell to edit.
        cell: CellIndex,
    },
    /// Removes every river entering or leaving the cell.
    RemoveRiver {
        /// Cell to edit.
        cell: CellIndex,
    },
    /// Builds a road across the given edge.
    AddRoad {
        /// Cell the road starts from.
        cell: CellIndex,
        /// Edge the road crosses.
        direction: HexDirection,
    },
    /// Removes every road touching the cell.
    RemoveRoads {
        /// Cell to edit.
        cell: CellIndex,
    },
    /// Adds one visibility reference to every cell within range of the origin.
    IncreaseVisibility {
        /// Cell the observer stands on.
        origin: CellIndex,
        /// Number of steps the observer can see.
        range: u32,
    },
    /// Removes one visibility reference from every cell within range of the origin.
    DecreaseVisibility {
        /// Cell the observer stood on.
        origin: CellIndex,
        /// Number of steps the observer could see.
        range: u32,
    },
    /// Clears every visibility counter while keeping explored flags.
    ResetVisibility,
    /// Replaces every cell with the persisted contents of a map.
    LoadGrid {
        /// Decoded grid contents.
        record: GridRecord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A cell changed in a way that affects how it is drawn.
    CellRefreshed {
        /// Cell that changed.
        cell: CellIndex,
        /// Cells that must be redrawn.
        scope: RefreshScope,
    },
    /// The highest of elevation and water level changed for a cell.
    ViewElevationChanged {
        /// Cell whose view elevation changed.
        cell: CellIndex,
    },
    /// A cell received a different terrain type.
    TerrainTypeChanged {
        /// Cell that changed.
        cell: CellIndex,
    },
    /// A cell became visible or hidden.
    VisibilityChanged {
        /// Cell whose visibility flipped.
        cell: CellIndex,
        /// Whether the cell is now visible.
        visible: bool,
    },
    /// Every cell was discarded and rebuilt.
    GridRebuilt {
        /// Number of offset columns.
        width: u32,
        /// Number of offset rows.
        height: u32,
    },
    /// A resize was declined because the dimensions are not chunk aligned.
    ResizeRejected {
        /// Requested number of offset columns.
        width: u32,
        /// Requested number of offset rows.
        height: u32,
    },
    /// The grid now holds the contents of a persisted map.
    MapLoaded {
        /// Number of offset columns.
        width: u32,
        /// Number of offset rows.
        height: u32,
    },
    /// A persisted map was declined because its cell list has the wrong length.
    LoadRejected {
        /// Number of cells the record's dimensions require.
        expected: usize,
        /// Number of cells the record holds.
        found: usize,
    },
    /// A terrain edit was declined and left the grid untouched.
    EditRejected {
        /// Cell the edit targeted.
        cell: CellIndex,
        /// Reason the edit was declined.
        reason: EditRejection,
    },
}

/// One cell along a computed path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Cell visited by the path.
    pub cell: CellIndex,
    /// Accumulated, turn-quantized movement cost on arrival.
    pub distance: u32,
    /// Turn during which the cell is reached.
    pub turn: u32,
}
