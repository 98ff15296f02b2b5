#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Movement rules for units travelling across the terrain grid.
//!
//! [`UnitMovement`] prices every edge of the grid for a unit and plugs into the
//! world's path search through [`MovementCost`]. Roads make travel cheap,
//! slopes and dense features make it expensive, while water, cliffs and walls
//! block it outright.

use hexmap_core::{CellIndex, EdgeType, HexDirection, PathStep};
use hexmap_world::{query, HexGrid, MovementCost, TerrainCell};

/// Cost of following a road across an edge.
pub const ROAD_COST: u32 = 1;

/// Cost of crossing a flat edge without a road.
pub const FLAT_COST: u32 = 5;

/// Cost of climbing or descending a single elevation step without a road.
pub const SLOPE_COST: u32 = 10;

/// Movement points a unit receives per turn unless configured otherwise.
pub const DEFAULT_SPEED: u32 = 24;

/// Movement rules of a land unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitMovement {
    speed: u32,
}

impl UnitMovement {
    /// Creates movement rules for a unit with the given speed per turn.
    #[must_use]
    pub const fn new(speed: u32) -> Self {
        Self { speed }
    }

    /// Movement points available per turn.
    #[must_use]
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Whether a unit may end its move on the cell.
    ///
    /// Units only travel to cells they have explored and that are dry.
    #[must_use]
    pub const fn is_valid_destination(&self, cell: &TerrainCell) -> bool {
        cell.is_explored() && !cell.is_underwater()
    }

    /// Finds the cheapest route between two cells and labels every step with
    /// its arrival distance and turn.
    ///
    /// The route stays selected on the grid afterwards.
    pub fn plan_route(
        &self,
        grid: &mut HexGrid,
        from: CellIndex,
        to: CellIndex,
    ) -> Option<Vec<PathStep>> {
        if grid.find_path(from, to, self) {
            query::path_steps(grid)
        } else {
            None
        }
    }
}

impl Default for UnitMovement {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}

impl MovementCost for UnitMovement {
    fn movement_speed(&self) -> u32 {
        self.speed
    }

    fn edge_cost(
        &self,
        from: &TerrainCell,
        to: &TerrainCell,
        direction: HexDirection,
    ) -> Option<u32> {
        if to.is_underwater() {
            return None;
        }

        let edge = EdgeType::between(from.elevation(), to.elevation());
        if edge == EdgeType::Cliff {
            return None;
        }

        if from.has_road_through_edge(direction) {
            return Some(ROAD_COST);
        }
        if from.is_walled() != to.is_walled() {
            return None;
        }

        let base = if edge == EdgeType::Flat {
            FLAT_COST
        } else {
            SLOPE_COST
        };
        Some(
            base + u32::from(to.urban_level())
                + u32::from(to.farm_level())
                + u32::from(to.plant_level()),
        )
    }
}
