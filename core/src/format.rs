//! Binary map files.
//!
//! A map file stores a version header, the grid dimensions, one fixed-size
//! record per cell in row-major order and finally the unit list. Every
//! multi-byte value is little-endian with a fixed width. Files written by
//! versions 2 through 4 are readable; files are written back using the
//! version they were read with so they round-trip byte for byte.

use std::io::{Read, Write};

use bincode::Options;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{AxialCoordinate, HexDirection, RoadFlags};

/// Version written for newly created maps.
pub const MAP_FORMAT_VERSION: i32 = 4;

/// Oldest version this codec can read.
pub const OLDEST_SUPPORTED_VERSION: i32 = 2;

const EXPLORED_SINCE_VERSION: i32 = 3;
const ELEVATION_OFFSET_SINCE_VERSION: i32 = 4;
const ELEVATION_OFFSET: i32 = 127;
const RIVER_FLAG: u8 = 128;

/// Errors raised while encoding or decoding map files.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The version header names a format this codec cannot handle.
    #[error("unsupported map format version {0}")]
    UnsupportedVersion(i32),
    /// The stored dimensions cannot describe a grid.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Stored number of columns.
        width: i64,
        /// Stored number of rows.
        height: i64,
    },
    /// The record holds a different number of cells than its dimensions need.
    #[error("grid record holds {found} cells but its dimensions require {expected}")]
    CellCountMismatch {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of cells present.
        found: usize,
    },
    /// A river byte is neither zero nor a flagged direction.
    #[error("invalid river byte {0:#04x}")]
    InvalidRiver(u8),
    /// The road bits name edges beyond the six sides of a cell.
    #[error("invalid road bits {0:#010b}")]
    InvalidRoadFlags(u8),
    /// The stored unit count is negative or too large.
    #[error("invalid unit count {0}")]
    InvalidUnitCount(i64),
    /// A cell value does not fit the byte reserved for it.
    #[error("{field} {value} cannot be stored in a map file")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was rejected.
        value: i64,
    },
    /// The underlying codec failed, including unexpected end of input.
    #[error("map codec failure")]
    Codec(#[from] bincode::Error),
}

/// Persisted state of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRecord {
    /// Index of the terrain type.
    pub terrain_type: u8,
    /// Elevation level.
    pub elevation: i32,
    /// Water surface level.
    pub water_level: i32,
    /// Urban density.
    pub urban_level: u8,
    /// Farm density.
    pub farm_level: u8,
    /// Plant density.
    pub plant_level: u8,
    /// Index of the special feature, zero when absent.
    pub special_index: u8,
    /// Whether the cell is walled.
    pub walled: bool,
    /// Edge the incoming river enters through.
    pub incoming_river: Option<HexDirection>,
    /// Edge the outgoing river leaves through.
    pub outgoing_river: Option<HexDirection>,
    /// Edges crossed by roads.
    pub roads: RoadFlags,
    /// Whether the cell has ever been seen.
    pub explored: bool,
}

/// Persisted contents of a grid.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridRecord {
    /// Number of offset columns.
    pub width: u32,
    /// Number of offset rows.
    pub height: u32,
    /// Cells in row-major order.
    pub cells: Vec<CellRecord>,
}

impl GridRecord {
    /// Number of cells implied by the dimensions.
    #[must_use]
    pub fn expected_cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Persisted placement of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Cell the unit stands on.
    pub coordinates: AxialCoordinate,
    /// Facing in degrees.
    pub orientation: f32,
}

/// Complete contents of a map file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapFile {
    /// Format version the file was written with.
    pub version: i32,
    /// Terrain grid.
    pub grid: GridRecord,
    /// Units standing on the grid.
    pub units: Vec<UnitRecord>,
}

impl MapFile {
    /// Creates a map in the current format version without units.
    #[must_use]
    pub fn new(grid: GridRecord) -> Self {
        Self {
            version: MAP_FORMAT_VERSION,
            grid,
            units: Vec::new(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CellBytes {
    terrain_type: u8,
    elevation: u8,
    water_level: u8,
    urban_level: u8,
    farm_level: u8,
    plant_level: u8,
    special_index: u8,
    walled: bool,
    incoming_river: u8,
    outgoing_river: u8,
    roads: u8,
}

impl CellBytes {
    fn encode(cell: &CellRecord, version: i32) -> Result<Self, FormatError> {
        let elevation = if version >= ELEVATION_OFFSET_SINCE_VERSION {
            cell.elevation.checked_add(ELEVATION_OFFSET)
        } else {
            Some(cell.elevation)
        };

        Ok(Self {
            terrain_type: cell.terrain_type,
            elevation: elevation
                .and_then(|value| u8::try_from(value).ok())
                .ok_or(out_of_range("elevation", cell.elevation))?,
            water_level: u8::try_from(cell.water_level)
                .map_err(|_| out_of_range("water level", cell.water_level))?,
            urban_level: cell.urban_level,
            farm_level: cell.farm_level,
            plant_level: cell.plant_level,
            special_index: cell.special_index,
            walled: cell.walled,
            incoming_river: river_byte(cell.incoming_river),
            outgoing_river: river_byte(cell.outgoing_river),
            roads: cell.roads.bits(),
        })
    }

    fn decode(self, version: i32, explored: bool) -> Result<CellRecord, FormatError> {
        let elevation = if version >= ELEVATION_OFFSET_SINCE_VERSION {
            i32::from(self.elevation) - ELEVATION_OFFSET
        } else {
            i32::from(self.elevation)
        };

        Ok(CellRecord {
            terrain_type: self.terrain_type,
            elevation,
            water_level: i32::from(self.water_level),
            urban_level: self.urban_level,
            farm_level: self.farm_level,
            plant_level: self.plant_level,
            special_index: self.special_index,
            walled: self.walled,
            incoming_river: river_direction(self.incoming_river)?,
            outgoing_river: river_direction(self.outgoing_river)?,
            roads: RoadFlags::from_bits(self.roads)
                .ok_or(FormatError::InvalidRoadFlags(self.roads))?,
            explored,
        })
    }
}

#[derive(Serialize, Deserialize)]
struct UnitBytes {
    x: i32,
    z: i32,
    orientation: f32,
}

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

fn out_of_range(field: &'static str, value: i32) -> FormatError {
    FormatError::OutOfRange {
        field,
        value: i64::from(value),
    }
}

fn river_byte(direction: Option<HexDirection>) -> u8 {
    direction.map_or(0, |direction| direction.index() as u8 + RIVER_FLAG)
}

fn river_direction(byte: u8) -> Result<Option<HexDirection>, FormatError> {
    if byte == 0 {
        return Ok(None);
    }
    if byte < RIVER_FLAG {
        return Err(FormatError::InvalidRiver(byte));
    }
    HexDirection::from_index(usize::from(byte - RIVER_FLAG))
        .map(Some)
        .ok_or(FormatError::InvalidRiver(byte))
}

fn check_version(version: i32) -> Result<(), FormatError> {
    if (OLDEST_SUPPORTED_VERSION..=MAP_FORMAT_VERSION).contains(&version) {
        Ok(())
    } else {
        Err(FormatError::UnsupportedVersion(version))
    }
}

/// Encodes a map file into the writer.
///
/// The cell records are written with the layout of `map.version`. Elevations
/// and water levels must fit the single byte that version reserves for them,
/// otherwise [`FormatError::OutOfRange`] is returned and the writer may hold a
/// partial file.
pub fn write_map<W: Write>(mut writer: W, map: &MapFile) -> Result<(), FormatError> {
    check_version(map.version)?;

    let grid = &map.grid;
    let invalid_dimensions = || FormatError::InvalidDimensions {
        width: i64::from(grid.width),
        height: i64::from(grid.height),
    };
    let width = i32::try_from(grid.width).map_err(|_| invalid_dimensions())?;
    let height = i32::try_from(grid.height).map_err(|_| invalid_dimensions())?;
    if grid.cells.len() != grid.expected_cell_count() {
        return Err(FormatError::CellCountMismatch {
            expected: grid.expected_cell_count(),
            found: grid.cells.len(),
        });
    }

    options().serialize_into(&mut writer, &map.version)?;
    options().serialize_into(&mut writer, &width)?;
    options().serialize_into(&mut writer, &height)?;

    for cell in &grid.cells {
        options().serialize_into(&mut writer, &CellBytes::encode(cell, map.version)?)?;
        if map.version >= EXPLORED_SINCE_VERSION {
            options().serialize_into(&mut writer, &cell.explored)?;
        }
    }

    let unit_count = i32::try_from(map.units.len())
        .map_err(|_| FormatError::InvalidUnitCount(map.units.len() as i64))?;
    options().serialize_into(&mut writer, &unit_count)?;
    for unit in &map.units {
        let bytes = UnitBytes {
            x: unit.coordinates.x(),
            z: unit.coordinates.z(),
            orientation: unit.orientation,
        };
        options().serialize_into(&mut writer, &bytes)?;
    }

    Ok(())
}

/// Decodes a map file from the reader.
pub fn read_map<R: Read>(mut reader: R) -> Result<MapFile, FormatError> {
    let version: i32 = options().deserialize_from(&mut reader)?;
    check_version(version)?;

    let width: i32 = options().deserialize_from(&mut reader)?;
    let height: i32 = options().deserialize_from(&mut reader)?;
    let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
        (Ok(width), Ok(height)) if width > 0 && height > 0 => (width, height),
        _ => {
            return Err(FormatError::InvalidDimensions {
                width: i64::from(width),
                height: i64::from(height),
            })
        }
    };

    let cell_count = width as usize * height as usize;
    let mut cells = Vec::new();
    for _ in 0..cell_count {
        let bytes: CellBytes = options().deserialize_from(&mut reader)?;
        let explored = if version >= EXPLORED_SINCE_VERSION {
            options().deserialize_from(&mut reader)?
        } else {
            false
        };
        cells.push(bytes.decode(version, explored)?);
    }

    let unit_count: i32 = options().deserialize_from(&mut reader)?;
    let unit_count =
        usize::try_from(unit_count).map_err(|_| FormatError::InvalidUnitCount(i64::from(unit_count)))?;
    let mut units = Vec::new();
    for _ in 0..unit_count {
        let bytes: UnitBytes = options().deserialize_from(&mut reader)?;
        units.push(UnitRecord {
            coordinates: AxialCoordinate::new(bytes.x, bytes.z),
            orientation: bytes.orientation,
        });
    }

    debug!(version, width, height, units = units.len(), "decoded map file");

    Ok(MapFile {
        version,
        grid: GridRecord {
            width,
            height,
            cells,
        },
        units,
    })
}
