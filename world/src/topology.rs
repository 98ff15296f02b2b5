//! Cell arena construction and neighbor linkage.

use hexmap_core::{AxialCoordinate, CellIndex, GridConfig, HexDirection};

use crate::{editing::Editor, TerrainCell};

/// Builds every cell of a grid in row-major order with linked neighbors and
/// elevation zero.
///
/// The configuration must support its dimensions.
pub(crate) fn build_cells(config: GridConfig) -> Vec<TerrainCell> {
    let width = config.width as usize;
    let height = config.height as usize;
    let chunk_width = config.chunk_width as usize;
    let chunk_height = config.chunk_height as usize;
    let chunk_columns = config.chunk_columns() as usize;
    let wrapping = config.coordinate_wrapping();

    let mut cells = Vec::with_capacity(config.cell_count());
    let mut initialization_events = Vec::new();

    for z in 0..height {
        for x in 0..width {
            let i = cells.len();
            let index = CellIndex::new(i as u32);
            let coordinates = AxialCoordinate::from_offset(x as i32, z as i32, wrapping);
            let chunk = x / chunk_width + (z / chunk_height) * chunk_columns;
            cells.push(TerrainCell::new(index, coordinates, chunk));

            if x > 0 {
                link(&mut cells, i, HexDirection::West, i - 1);
                if config.wrapping && x == width - 1 {
                    link(&mut cells, i, HexDirection::East, i - x);
                }
            }
            if z > 0 {
                if z % 2 == 0 {
                    link(&mut cells, i, HexDirection::SouthEast, i - width);
                    if x > 0 {
                        link(&mut cells, i, HexDirection::SouthWest, i - width - 1);
                    } else if config.wrapping {
                        link(&mut cells, i, HexDirection::SouthWest, i - 1);
                    }
                } else {
                    link(&mut cells, i, HexDirection::SouthWest, i - width);
                    if x < width - 1 {
                        link(&mut cells, i, HexDirection::SouthEast, i - width + 1);
                    } else if config.wrapping {
                        link(&mut cells, i, HexDirection::SouthEast, i + 1 - 2 * width);
                    }
                }
            }

            Editor::new(&mut cells, &mut initialization_events).set_elevation(index, 0);
            initialization_events.clear();
        }
    }

    cells
}

fn link(cells: &mut [TerrainCell], cell: usize, direction: HexDirection, other: usize) {
    cells[cell].neighbors[direction.index()] = Some(cells[other].index);
    cells[other].neighbors[direction.opposite().index()] = Some(cells[cell].index);
}
