//! Conversion between grid cells and persisted map records.

use hexmap_core::{
    format::{CellRecord, GridRecord},
    Event,
};
use tracing::{info, warn};

use crate::{HexGrid, TerrainCell};

/// Replaces the grid contents with a persisted record.
///
/// Persisted values are trusted and assigned without re-running the edit
/// rules. Visibility counters are left untouched.
pub(crate) fn load(grid: &mut HexGrid, record: GridRecord, out_events: &mut Vec<Event>) {
    let expected = record.expected_cell_count();
    if record.cells.len() != expected {
        warn!(
            expected,
            found = record.cells.len(),
            "rejected map with mismatched cell count"
        );
        out_events.push(Event::LoadRejected {
            expected,
            found: record.cells.len(),
        });
        return;
    }

    if (record.width, record.height) != (grid.config.width, grid.config.height) {
        let config = grid.config.resized(record.width, record.height);
        if !config.supports_dimensions() {
            warn!(
                width = record.width,
                height = record.height,
                "rejected map with unsupported dimensions"
            );
            out_events.push(Event::ResizeRejected {
                width: record.width,
                height: record.height,
            });
            return;
        }
        grid.rebuild(config);
        out_events.push(Event::GridRebuilt {
            width: record.width,
            height: record.height,
        });
    }

    grid.clear_path();
    for (cell, stored) in grid.cells.iter_mut().zip(record.cells) {
        restore(cell, stored);
    }

    info!(width = record.width, height = record.height, "loaded map");
    out_events.push(Event::MapLoaded {
        width: record.width,
        height: record.height,
    });
}

/// Captures the persisted fields of every cell.
pub(crate) fn capture(grid: &HexGrid) -> GridRecord {
    GridRecord {
        width: grid.config.width,
        height: grid.config.height,
        cells: grid.cells.iter().map(cell_record).collect(),
    }
}

fn cell_record(cell: &TerrainCell) -> CellRecord {
    CellRecord {
        terrain_type: cell.terrain_type,
        elevation: cell.elevation,
        water_level: cell.water_level,
        urban_level: cell.urban_level,
        farm_level: cell.farm_level,
        plant_level: cell.plant_level,
        special_index: cell.special_index,
        walled: cell.walled,
        incoming_river: cell.incoming_river,
        outgoing_river: cell.outgoing_river,
        roads: cell.roads,
        explored: cell.explored,
    }
}

fn restore(cell: &mut TerrainCell, record: CellRecord) {
    cell.terrain_type = record.terrain_type;
    cell.elevation = record.elevation;
    cell.water_level = record.water_level;
    cell.urban_level = record.urban_level;
    cell.farm_level = record.farm_level;
    cell.plant_level = record.plant_level;
    cell.special_index = record.special_index;
    cell.walled = record.walled;
    cell.incoming_river = record.incoming_river;
    cell.outgoing_river = record.outgoing_river;
    cell.roads = record.roads;
    cell.explored = record.explored;
}
