//! Terrain cells stored in the grid arena.

use hexmap_core::{AxialCoordinate, CellIndex, HexDirection, RoadFlags};

/// Elevation assigned to cells before the grid initializes them.
///
/// It compares unequal to every real elevation, so the first elevation write
/// always takes effect.
pub const UNSET_ELEVATION: i32 = i32::MIN;

/// Terrain attributes, river and road connectivity and visibility of one cell.
///
/// Cells are only mutated through the world's `apply` entry point, which keeps
/// rivers and roads mirrored on both sides of every edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainCell {
    pub(crate) index: CellIndex,
    pub(crate) coordinates: AxialCoordinate,
    pub(crate) chunk: usize,
    pub(crate) terrain_type: u8,
    pub(crate) elevation: i32,
    pub(crate) water_level: i32,
    pub(crate) urban_level: u8,
    pub(crate) farm_level: u8,
    pub(crate) plant_level: u8,
    pub(crate) special_index: u8,
    pub(crate) walled: bool,
    pub(crate) incoming_river: Option<HexDirection>,
    pub(crate) outgoing_river: Option<HexDirection>,
    pub(crate) roads: RoadFlags,
    pub(crate) visibility: u32,
    pub(crate) explored: bool,
    pub(crate) neighbors: [Option<CellIndex>; 6],
}

impl TerrainCell {
    pub(crate) fn new(index: CellIndex, coordinates: AxialCoordinate, chunk: usize) -> Self {
        Self {
            index,
            coordinates,
            chunk,
            terrain_type: 0,
            elevation: UNSET_ELEVATION,
            water_level: 0,
            urban_level: 0,
            farm_level: 0,
            plant_level: 0,
            special_index: 0,
            walled: false,
            incoming_river: None,
            outgoing_river: None,
            roads: RoadFlags::NONE,
            visibility: 0,
            explored: false,
            neighbors: [None; 6],
        }
    }

    /// Arena index of the cell.
    #[must_use]
    pub const fn index(&self) -> CellIndex {
        self.index
    }

    /// Hex coordinate of the cell.
    #[must_use]
    pub const fn coordinates(&self) -> AxialCoordinate {
        self.coordinates
    }

    /// Render chunk containing the cell.
    #[must_use]
    pub const fn chunk(&self) -> usize {
        self.chunk
    }

    /// Index of the terrain type.
    #[must_use]
    pub const fn terrain_type(&self) -> u8 {
        self.terrain_type
    }

    /// Elevation level.
    #[must_use]
    pub const fn elevation(&self) -> i32 {
        self.elevation
    }

    /// Water surface level.
    #[must_use]
    pub const fn water_level(&self) -> i32 {
        self.water_level
    }

    /// Urban density.
    #[must_use]
    pub const fn urban_level(&self) -> u8 {
        self.urban_level
    }

    /// Farm density.
    #[must_use]
    pub const fn farm_level(&self) -> u8 {
        self.farm_level
    }

    /// Plant density.
    #[must_use]
    pub const fn plant_level(&self) -> u8 {
        self.plant_level
    }

    /// Index of the special feature, zero when absent.
    #[must_use]
    pub const fn special_index(&self) -> u8 {
        self.special_index
    }

    /// Whether a special feature occupies the cell.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.special_index > 0
    }

    /// Whether the cell is walled.
    #[must_use]
    pub const fn is_walled(&self) -> bool {
        self.walled
    }

    /// Higher of the elevation and the water surface.
    #[must_use]
    pub fn view_elevation(&self) -> i32 {
        self.elevation.max(self.water_level)
    }

    /// Whether water covers the cell.
    #[must_use]
    pub const fn is_underwater(&self) -> bool {
        self.water_level > self.elevation
    }

    /// Edge the incoming river enters through.
    #[must_use]
    pub const fn incoming_river(&self) -> Option<HexDirection> {
        self.incoming_river
    }

    /// Edge the outgoing river leaves through.
    #[must_use]
    pub const fn outgoing_river(&self) -> Option<HexDirection> {
        self.outgoing_river
    }

    /// Whether any river enters or leaves the cell.
    #[must_use]
    pub const fn has_river(&self) -> bool {
        self.incoming_river.is_some() || self.outgoing_river.is_some()
    }

    /// Whether a river starts or ends in the cell rather than passing through.
    #[must_use]
    pub const fn has_river_begin_or_end(&self) -> bool {
        self.incoming_river.is_some() != self.outgoing_river.is_some()
    }

    /// Edge of the only river connection when the river starts or ends here.
    #[must_use]
    pub fn river_begin_or_end_direction(&self) -> Option<HexDirection> {
        match (self.incoming_river, self.outgoing_river) {
            (Some(direction), None) | (None, Some(direction)) => Some(direction),
            _ => None,
        }
    }

    /// Whether a river crosses the given edge in either direction.
    #[must_use]
    pub fn has_river_through_edge(&self, direction: HexDirection) -> bool {
        self.incoming_river == Some(direction) || self.outgoing_river == Some(direction)
    }

    /// Edges crossed by roads.
    #[must_use]
    pub const fn roads(&self) -> RoadFlags {
        self.roads
    }

    /// Whether a road crosses the given edge.
    #[must_use]
    pub const fn has_road_through_edge(&self, direction: HexDirection) -> bool {
        self.roads.contains(direction)
    }

    /// Whether any road touches the cell.
    #[must_use]
    pub const fn has_roads(&self) -> bool {
        !self.roads.is_empty()
    }

    /// Number of observers currently seeing the cell.
    #[must_use]
    pub const fn visibility(&self) -> u32 {
        self.visibility
    }

    /// Whether at least one observer sees the cell.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visibility > 0
    }

    /// Whether the cell has ever been seen.
    #[must_use]
    pub const fn is_explored(&self) -> bool {
        self.explored
    }

    /// Neighbor across the given edge, absent at the border of the map.
    #[must_use]
    pub const fn neighbor(&self, direction: HexDirection) -> Option<CellIndex> {
        self.neighbors[direction.index()]
    }

    /// Absolute elevation difference to another cell.
    #[must_use]
    pub const fn elevation_difference(&self, other: &TerrainCell) -> u32 {
        self.elevation.abs_diff(other.elevation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> TerrainCell {
        let mut cell = TerrainCell::new(CellIndex::new(0), AxialCoordinate::new(0, 0), 0);
        cell.elevation = 0;
        cell
    }

    #[test]
    fn water_above_elevation_submerges_the_cell() {
        let mut cell = cell();
        assert!(!cell.is_underwater());
        assert_eq!(cell.view_elevation(), 0);

        cell.water_level = 2;
        assert!(cell.is_underwater());
        assert_eq!(cell.view_elevation(), 2);
    }

    #[test]
    fn river_ends_are_detected() {
        let mut cell = cell();
        assert!(!cell.has_river());

        cell.outgoing_river = Some(HexDirection::East);
        assert!(cell.has_river_begin_or_end());
        assert_eq!(cell.river_begin_or_end_direction(), Some(HexDirection::East));
        assert!(cell.has_river_through_edge(HexDirection::East));

        cell.incoming_river = Some(HexDirection::West);
        assert!(cell.has_river());
        assert!(!cell.has_river_begin_or_end());
        assert_eq!(cell.river_begin_or_end_direction(), None);
    }

    #[test]
    fn unset_elevation_differs_from_every_level() {
        let fresh = TerrainCell::new(CellIndex::new(1), AxialCoordinate::new(1, 0), 0);
        assert_eq!(fresh.elevation(), UNSET_ELEVATION);
        assert_eq!(fresh.elevation_difference(&cell()), i32::MIN.unsigned_abs());
    }
}
