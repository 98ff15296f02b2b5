//! Terrain edits that keep rivers, roads and elevations consistent.
//!
//! Every edit touching an edge updates both cells sharing it, so the grid
//! never holds a river or road that only one side knows about.

use hexmap_core::{CellIndex, EditRejection, Event, HexDirection, RefreshScope};
use tracing::warn;

use crate::TerrainCell;

/// Borrowed view of the cell arena that records the events of each edit.
///
/// Callers guarantee that every index handed to an editor addresses a cell.
pub(crate) struct Editor<'a> {
    cells: &'a mut [TerrainCell],
    out_events: &'a mut Vec<Event>,
}

impl<'a> Editor<'a> {
    pub(crate) fn new(cells: &'a mut [TerrainCell], out_events: &'a mut Vec<Event>) -> Self {
        Self { cells, out_events }
    }

    pub(crate) fn set_terrain_type(&mut self, cell: CellIndex, terrain_type: u8) {
        let target = &mut self.cells[cell.index()];
        if target.terrain_type != terrain_type {
            target.terrain_type = terrain_type;
            self.out_events.push(Event::TerrainTypeChanged { cell });
        }
    }

    pub(crate) fn set_elevation(&mut self, cell: CellIndex, elevation: i32) {
        let target = &mut self.cells[cell.index()];
        if target.elevation == elevation {
            return;
        }

        let view_elevation = target.view_elevation();
        target.elevation = elevation;
        if target.view_elevation() != view_elevation {
            self.out_events.push(Event::ViewElevationChanged { cell });
        }

        self.validate_rivers(cell);

        for direction in HexDirection::ALL {
            let target = &self.cells[cell.index()];
            if !target.has_road_through_edge(direction) {
                continue;
            }
            let too_steep = target
                .neighbor(direction)
                .is_some_and(|neighbor| target.elevation_difference(&self.cells[neighbor.index()]) > 1);
            if too_steep {
                self.set_road(cell, direction, false);
            }
        }

        self.refresh(cell, RefreshScope::CellAndNeighbors);
    }

    pub(crate) fn set_water_level(&mut self, cell: CellIndex, water_level: i32) {
        let target = &mut self.cells[cell.index()];
        if target.water_level == water_level {
            return;
        }

        let view_elevation = target.view_elevation();
        target.water_level = water_level;
        if target.view_elevation() != view_elevation {
            self.out_events.push(Event::ViewElevationChanged { cell });
        }

        self.validate_rivers(cell);
        self.refresh(cell, RefreshScope::CellAndNeighbors);
    }

    pub(crate) fn set_density<F>(&mut self, cell: CellIndex, level: u8, slot: F)
    where
        F: FnOnce(&mut TerrainCell) -> &mut u8,
    {
        let current = slot(&mut self.cells[cell.index()]);
        if *current != level {
            *current = level;
            self.refresh(cell, RefreshScope::Cell);
        }
    }

    pub(crate) fn set_special_index(
        &mut self,
        cell: CellIndex,
        special_index: u8,
    ) -> Result<(), EditRejection> {
        let target = &self.cells[cell.index()];
        if target.has_river() {
            return Err(EditRejection::RiverPresent);
        }
        if target.special_index == special_index {
            return Ok(());
        }

        self.cells[cell.index()].special_index = special_index;
        self.remove_roads(cell);
        self.refresh(cell, RefreshScope::Cell);
        Ok(())
    }

    pub(crate) fn set_walled(&mut self, cell: CellIndex, walled: bool) {
        let target = &mut self.cells[cell.index()];
        if target.walled != walled {
            target.walled = walled;
            self.refresh(cell, RefreshScope::CellAndNeighbors);
        }
    }

    pub(crate) fn set_outgoing_river(
        &mut self,
        cell: CellIndex,
        direction: HexDirection,
    ) -> Result<(), EditRejection> {
        let source = &self.cells[cell.index()];
        if source.outgoing_river == Some(direction) {
            return Ok(());
        }
        let neighbor = source
            .neighbor(direction)
            .ok_or(EditRejection::MissingNeighbor)?;
        if !self.is_valid_river_destination(cell, neighbor) {
            return Err(EditRejection::InvalidRiverDestination);
        }

        self.remove_outgoing_river(cell);
        if self.cells[cell.index()].incoming_river == Some(direction) {
            self.remove_incoming_river(cell);
        }
        let source = &mut self.cells[cell.index()];
        source.outgoing_river = Some(direction);
        source.special_index = 0;

        self.remove_incoming_river(neighbor);
        let destination = &mut self.cells[neighbor.index()];
        destination.incoming_river = Some(direction.opposite());
        destination.special_index = 0;

        self.set_road(cell, direction, false);
        Ok(())
    }

    pub(crate) fn remove_river(&mut self, cell: CellIndex) {
        self.remove_outgoing_river(cell);
        self.remove_incoming_river(cell);
    }

    pub(crate) fn remove_outgoing_river(&mut self, cell: CellIndex) {
        let source = &mut self.cells[cell.index()];
        let Some(direction) = source.outgoing_river.take() else {
            return;
        };
        let neighbor = source.neighbor(direction);
        self.refresh(cell, RefreshScope::Cell);

        if let Some(neighbor) = neighbor {
            self.cells[neighbor.index()].incoming_river = None;
            self.refresh(neighbor, RefreshScope::Cell);
        }
    }

    pub(crate) fn remove_incoming_river(&mut self, cell: CellIndex) {
        let destination = &mut self.cells[cell.index()];
        let Some(direction) = destination.incoming_river.take() else {
            return;
        };
        let neighbor = destination.neighbor(direction);
        self.refresh(cell, RefreshScope::Cell);

        if let Some(neighbor) = neighbor {
            self.cells[neighbor.index()].outgoing_river = None;
            self.refresh(neighbor, RefreshScope::Cell);
        }
    }

    pub(crate) fn add_road(
        &mut self,
        cell: CellIndex,
        direction: HexDirection,
    ) -> Result<(), EditRejection> {
        let source = &self.cells[cell.index()];
        if source.has_road_through_edge(direction) {
            return Ok(());
        }
        let neighbor = source
            .neighbor(direction)
            .ok_or(EditRejection::MissingNeighbor)?;
        let destination = &self.cells[neighbor.index()];

        if source.has_river_through_edge(direction) {
            return Err(EditRejection::RiverOnEdge);
        }
        if source.is_special() || destination.is_special() {
            return Err(EditRejection::SpecialFeature);
        }
        if source.elevation_difference(destination) > 1 {
            return Err(EditRejection::ElevationGap);
        }

        self.set_road(cell, direction, true);
        Ok(())
    }

    pub(crate) fn remove_roads(&mut self, cell: CellIndex) {
        for direction in HexDirection::ALL {
            if self.cells[cell.index()].has_road_through_edge(direction) {
                self.set_road(cell, direction, false);
            }
        }
    }

    pub(crate) fn increase_visibility(&mut self, cell: CellIndex) {
        let target = &mut self.cells[cell.index()];
        target.visibility = target.visibility.saturating_add(1);
        if target.visibility == 1 {
            target.explored = true;
            self.out_events.push(Event::VisibilityChanged {
                cell,
                visible: true,
            });
        }
    }

    pub(crate) fn decrease_visibility(&mut self, cell: CellIndex) {
        let target = &mut self.cells[cell.index()];
        if target.visibility == 0 {
            warn!(cell = cell.get(), "visibility decreased below zero");
            return;
        }

        target.visibility -= 1;
        if target.visibility == 0 {
            self.out_events.push(Event::VisibilityChanged {
                cell,
                visible: false,
            });
        }
    }

    pub(crate) fn reset_visibility(&mut self) {
        for target in self.cells.iter_mut() {
            if target.visibility > 0 {
                target.visibility = 0;
                self.out_events.push(Event::VisibilityChanged {
                    cell: target.index,
                    visible: false,
                });
            }
        }
    }

    fn is_valid_river_destination(&self, from: CellIndex, to: CellIndex) -> bool {
        let source = &self.cells[from.index()];
        let destination = &self.cells[to.index()];
        source.elevation >= destination.elevation || source.water_level == destination.elevation
    }

    fn validate_rivers(&mut self, cell: CellIndex) {
        let target = &self.cells[cell.index()];

        if let Some(direction) = target.outgoing_river {
            let valid = target
                .neighbor(direction)
                .is_some_and(|neighbor| self.is_valid_river_destination(cell, neighbor));
            if !valid {
                self.remove_outgoing_river(cell);
            }
        }

        let target = &self.cells[cell.index()];
        if let Some(direction) = target.incoming_river {
            let valid = target
                .neighbor(direction)
                .is_some_and(|neighbor| self.is_valid_river_destination(neighbor, cell));
            if !valid {
                self.remove_incoming_river(cell);
            }
        }
    }

    fn set_road(&mut self, cell: CellIndex, direction: HexDirection, present: bool) {
        let Some(neighbor) = self.cells[cell.index()].neighbor(direction) else {
            return;
        };

        self.cells[cell.index()].roads.set(direction, present);
        self.cells[neighbor.index()]
            .roads
            .set(direction.opposite(), present);
        self.refresh(neighbor, RefreshScope::Cell);
        self.refresh(cell, RefreshScope::Cell);
    }

    fn refresh(&mut self, cell: CellIndex, scope: RefreshScope) {
        self.out_events.push(Event::CellRefreshed { cell, scope });
    }
}
