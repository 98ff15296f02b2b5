#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative terrain grid for the hexmap workspace.
//!
//! The grid owns a dense arena of [`TerrainCell`] values addressed by
//! [`CellIndex`]. Neighbor links are arena indices, so the cyclic adjacency
//! graph needs no shared ownership. Terrain edits arrive as commands through
//! [`apply`], which enforces the river, road and elevation rules and reports
//! what changed as events. Path finding and the visibility flood share a
//! phase-tagged frontier search; the grid keeps one engine for each so that
//! updating visibility never disturbs the most recent path.

mod cell;
mod editing;
pub mod frontier;
mod persistence;
mod search;
mod topology;

pub use cell::{TerrainCell, UNSET_ELEVATION};

use hexmap_core::{CellIndex, Command, EditRejection, Event, GridConfig, HexDirection};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{editing::Editor, search::GridSearch};

/// Errors raised while constructing a grid.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// The dimensions are zero or not multiples of the chunk size.
    #[error(
        "grid of {width}x{height} cells cannot be divided into {chunk_width}x{chunk_height} chunks"
    )]
    UnsupportedDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
        /// Configured chunk width.
        chunk_width: u32,
        /// Configured chunk height.
        chunk_height: u32,
    },
}

/// Largest edge cost the path search accepts. Edges priced above it are
/// treated as impassable, which bounds the frontier's bucket array.
pub const MAX_EDGE_COST: u32 = 4_096;

/// Prices movement between neighboring cells for path finding.
pub trait MovementCost {
    /// Movement points available per turn.
    fn movement_speed(&self) -> u32;

    /// Cost of crossing from `from` into `to` through the `direction` edge of
    /// `from`, or `None` when the edge cannot be crossed. Costs above
    /// [`MAX_EDGE_COST`] count as `None`.
    fn edge_cost(&self, from: &TerrainCell, to: &TerrainCell, direction: HexDirection)
        -> Option<u32>;
}

impl<T: MovementCost + ?Sized> MovementCost for &T {
    fn movement_speed(&self) -> u32 {
        (**self).movement_speed()
    }

    fn edge_cost(
        &self,
        from: &TerrainCell,
        to: &TerrainCell,
        direction: HexDirection,
    ) -> Option<u32> {
        (**self).edge_cost(from, to, direction)
    }
}

#[derive(Clone, Copy, Debug)]
struct PathQuery {
    from: CellIndex,
    to: CellIndex,
    speed: u32,
    exists: bool,
}

/// Hexagonal grid of terrain cells.
#[derive(Debug)]
pub struct HexGrid {
    config: GridConfig,
    cells: Vec<TerrainCell>,
    pathfinding: GridSearch,
    sight: GridSearch,
    current_path: Option<PathQuery>,
}

impl HexGrid {
    /// Builds a flat grid with every cell at elevation zero.
    pub fn new(config: GridConfig) -> Result<Self, GridError> {
        if !config.supports_dimensions() {
            return Err(GridError::UnsupportedDimensions {
                width: config.width,
                height: config.height,
                chunk_width: config.chunk_width,
                chunk_height: config.chunk_height,
            });
        }

        let mut grid = Self {
            config,
            cells: Vec::new(),
            pathfinding: GridSearch::default(),
            sight: GridSearch::default(),
            current_path: None,
        };
        grid.rebuild(config);
        Ok(grid)
    }

    /// Configuration the grid was last built from.
    #[must_use]
    pub const fn config(&self) -> GridConfig {
        self.config
    }

    /// Searches for the cheapest turn-quantized path between two cells.
    ///
    /// Any previously found path is discarded first. Returns whether the
    /// destination is reachable; the path itself is available through
    /// [`HexGrid::path`] until the next search or rebuild.
    pub fn find_path<C>(&mut self, from: CellIndex, to: CellIndex, cost: &C) -> bool
    where
        C: MovementCost + ?Sized,
    {
        self.clear_path();
        if !self.contains(from) || !self.contains(to) {
            debug!(from = from.get(), to = to.get(), "path endpoints outside grid");
            return false;
        }

        let exists = self.pathfinding.find_path(
            &self.cells,
            from,
            to,
            cost,
            self.config.coordinate_wrapping(),
        );
        self.current_path = Some(PathQuery {
            from,
            to,
            speed: cost.movement_speed(),
            exists,
        });
        exists
    }

    /// Cells of the most recent successful path, from source to destination.
    #[must_use]
    pub fn path(&self) -> Option<Vec<CellIndex>> {
        let query = self.current_path.filter(|query| query.exists)?;
        self.pathfinding.trace(query.from, query.to)
    }

    /// Whether the most recent search found a path that is still current.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.current_path.is_some_and(|query| query.exists)
    }

    /// Forgets the most recent path.
    pub fn clear_path(&mut self) {
        self.current_path = None;
    }

    pub(crate) fn contains(&self, cell: CellIndex) -> bool {
        cell.index() < self.cells.len()
    }

    pub(crate) fn rebuild(&mut self, config: GridConfig) {
        self.config = config;
        self.current_path = None;
        self.cells = topology::build_cells(config);
        self.pathfinding.reset(self.cells.len());
        self.sight.reset(self.cells.len());
        info!(
            width = config.width,
            height = config.height,
            wrapping = config.wrapping,
            "built grid"
        );
    }

    fn resize(&mut self, width: u32, height: u32, out_events: &mut Vec<Event>) {
        let config = self.config.resized(width, height);
        if !config.supports_dimensions() {
            warn!(width, height, "rejected unsupported grid dimensions");
            out_events.push(Event::ResizeRejected { width, height });
            return;
        }

        self.rebuild(config);
        out_events.push(Event::GridRebuilt { width, height });
    }

    fn change_visibility(
        &mut self,
        origin: CellIndex,
        range: u32,
        increase: bool,
        out_events: &mut Vec<Event>,
    ) {
        if !self.contains(origin) {
            reject(origin, EditRejection::UnknownCell, out_events);
            return;
        }

        let visible = self.sight.visible_cells(&self.cells, origin, range);
        let mut editor = Editor::new(&mut self.cells, out_events);
        for cell in visible {
            if increase {
                editor.increase_visibility(cell);
            } else {
                editor.decrease_visibility(cell);
            }
        }
    }

    fn edit<F>(&mut self, cell: CellIndex, out_events: &mut Vec<Event>, edit: F)
    where
        F: FnOnce(&mut Editor<'_>) -> Result<(), EditRejection>,
    {
        let outcome = if self.contains(cell) {
            edit(&mut Editor::new(&mut self.cells, out_events))
        } else {
            Err(EditRejection::UnknownCell)
        };

        if let Err(reason) = outcome {
            reject(cell, reason, out_events);
        }
    }
}

fn reject(cell: CellIndex, reason: EditRejection, out_events: &mut Vec<Event>) {
    debug!(cell = cell.get(), ?reason, "rejected terrain edit");
    out_events.push(Event::EditRejected { cell, reason });
}

/// Applies the provided command to the grid, mutating state deterministically.
///
/// Edits that would break a terrain rule leave the grid untouched and report
/// [`Event::EditRejected`]. Edits that would not change anything report
/// nothing.
pub fn apply(grid: &mut HexGrid, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Resize { width, height } => grid.resize(width, height, out_events),
        Command::SetTerrainType { cell, terrain_type } => grid.edit(cell, out_events, |editor| {
            editor.set_terrain_type(cell, terrain_type);
            Ok(())
        }),
        Command::SetElevation { cell, elevation } => grid.edit(cell, out_events, |editor| {
            editor.set_elevation(cell, elevation);
            Ok(())
        }),
        Command::SetWaterLevel { cell, water_level } => grid.edit(cell, out_events, |editor| {
            editor.set_water_level(cell, water_level);
            Ok(())
        }),
        Command::SetUrbanLevel { cell, level } => grid.edit(cell, out_events, |editor| {
            editor.set_density(cell, level, |target| &mut target.urban_level);
            Ok(())
        }),
        Command::SetFarmLevel { cell, level } => grid.edit(cell, out_events, |editor| {
            editor.set_density(cell, level, |target| &mut target.farm_level);
            Ok(())
        }),
        Command::SetPlantLevel { cell, level } => grid.edit(cell, out_events, |editor| {
            editor.set_density(cell, level, |target| &mut target.plant_level);
            Ok(())
        }),
        Command::SetSpecialIndex {
            cell,
            special_index,
        } => grid.edit(cell, out_events, |editor| {
            editor.set_special_index(cell, special_index)
        }),
        Command::SetWalled { cell, walled } => grid.edit(cell, out_events, |editor| {
            editor.set_walled(cell, walled);
            Ok(())
        }),
        Command::SetOutgoingRiver { cell, direction } => grid.edit(cell, out_events, |editor| {
            editor.set_outgoing_river(cell, direction)
        }),
        Command::RemoveOutgoingRiver { cell } => grid.edit(cell, out_events, |editor| {
            editor.remove_outgoing_river(cell);
            Ok(())
        }),
        Command::RemoveIncomingRiver { cell } => grid.edit(cell, out_events, |editor| {
            editor.remove_incoming_river(cell);
            Ok(())
        }),
        Command::RemoveRiver { cell } => grid.edit(cell, out_events, |editor| {
            editor.remove_river(cell);
            Ok(())
        }),
        Command::AddRoad { cell, direction } => grid.edit(cell, out_events, |editor| {
            editor.add_road(cell, direction)
        }),
        Command::RemoveRoads { cell } => grid.edit(cell, out_events, |editor| {
            editor.remove_roads(cell);
            Ok(())
        }),
        Command::IncreaseVisibility { origin, range } => {
            grid.change_visibility(origin, range, true, out_events)
        }
        Command::DecreaseVisibility { origin, range } => {
            grid.change_visibility(origin, range, false, out_events)
        }
        Command::ResetVisibility => Editor::new(&mut grid.cells, out_events).reset_visibility(),
        Command::LoadGrid { record } => persistence::load(grid, record, out_events),
    }
}

/// Query functions that provide read-only access to the grid state.
pub mod query {
    use hexmap_core::{
        format::GridRecord, turn_for, AxialCoordinate, CellIndex, EdgeType, GridConfig,
        HexDirection, PathStep,
    };

    use super::{persistence, search::GridSearch, HexGrid, TerrainCell};

    /// Retrieves the configuration the grid was built from.
    #[must_use]
    pub fn config(grid: &HexGrid) -> GridConfig {
        grid.config
    }

    /// Provides read-only access to every cell in arena order.
    #[must_use]
    pub fn cells(grid: &HexGrid) -> &[TerrainCell] {
        &grid.cells
    }

    /// Looks up a cell by arena index.
    #[must_use]
    pub fn cell(grid: &HexGrid, index: CellIndex) -> Option<&TerrainCell> {
        grid.cells.get(index.index())
    }

    /// Looks up the cell at a hex coordinate.
    ///
    /// Columns outside the map wrap around when the grid wraps.
    #[must_use]
    pub fn cell_at(grid: &HexGrid, coordinates: AxialCoordinate) -> Option<&TerrainCell> {
        let width = i64::from(grid.config.width);
        let height = i64::from(grid.config.height);

        let row = i64::from(coordinates.z());
        if row < 0 || row >= height {
            return None;
        }

        let mut column = i64::from(coordinates.x()) + row / 2;
        if grid.config.wrapping {
            column = column.rem_euclid(width);
        }
        if column < 0 || column >= width {
            return None;
        }

        grid.cells.get((column + row * width) as usize)
    }

    /// Looks up the cell at an offset `(column, row)` position.
    #[must_use]
    pub fn cell_at_offset(grid: &HexGrid, column: i32, row: i32) -> Option<&TerrainCell> {
        cell_at(
            grid,
            AxialCoordinate::from_offset(column, row, grid.config.coordinate_wrapping()),
        )
    }

    /// Looks up the cell containing a world-space position on the map plane.
    ///
    /// Non-finite and far off-map positions have no cell.
    #[must_use]
    pub fn cell_at_position(grid: &HexGrid, world_x: f32, world_z: f32) -> Option<&TerrainCell> {
        let coordinates =
            AxialCoordinate::from_position(world_x, world_z, grid.config.coordinate_wrapping())?;
        cell_at(grid, coordinates)
    }

    /// Looks up the neighbor across an edge of a cell.
    #[must_use]
    pub fn neighbor(
        grid: &HexGrid,
        index: CellIndex,
        direction: HexDirection,
    ) -> Option<&TerrainCell> {
        cell(grid, index)?
            .neighbor(direction)
            .and_then(|neighbor| cell(grid, neighbor))
    }

    /// Classifies the elevation change across an edge of a cell.
    #[must_use]
    pub fn edge_type(grid: &HexGrid, index: CellIndex, direction: HexDirection) -> Option<EdgeType> {
        let from = cell(grid, index)?;
        let to = neighbor(grid, index, direction)?;
        Some(EdgeType::between(from.elevation(), to.elevation()))
    }

    /// Number of render chunks covering the grid.
    #[must_use]
    pub fn chunk_count(grid: &HexGrid) -> usize {
        grid.config.chunk_columns() as usize * grid.config.chunk_rows() as usize
    }

    /// Describes every cell of the most recent path with its arrival
    /// distance and turn.
    #[must_use]
    pub fn path_steps(grid: &HexGrid) -> Option<Vec<PathStep>> {
        let query = grid.current_path.filter(|query| query.exists)?;
        let path = grid.pathfinding.trace(query.from, query.to)?;
        Some(
            path.into_iter()
                .map(|cell| {
                    let distance = grid.pathfinding.distance(cell);
                    PathStep {
                        cell,
                        distance,
                        turn: turn_for(distance, query.speed),
                    }
                })
                .collect(),
        )
    }

    /// Lists the cells an observer at `origin` would see with the given
    /// range, without changing any visibility counter.
    ///
    /// Runs on a freshly allocated search state, costing time and memory
    /// proportional to the whole grid on every call. Visibility commands
    /// reuse the grid's own search state instead.
    #[must_use]
    pub fn visible_cells(grid: &HexGrid, origin: CellIndex, range: u32) -> Option<Vec<CellIndex>> {
        let _ = cell(grid, origin)?;
        let mut search = GridSearch::with_capacity(grid.cells.len());
        Some(search.visible_cells(&grid.cells, origin, range))
    }

    /// Captures the persisted contents of the grid.
    #[must_use]
    pub fn grid_record(grid: &HexGrid) -> GridRecord {
        persistence::capture(grid)
    }
}
