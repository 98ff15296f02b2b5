//! Phase-tagged frontier search shared by path finding and visibility.

use hexmap_core::{turn_for, CellIndex, HexDirection, Wrapping};

use crate::{frontier::BucketQueue, MovementCost, TerrainCell, MAX_EDGE_COST};

#[derive(Clone, Copy, Debug, Default)]
struct SearchNode {
    phase: u32,
    distance: u32,
    heuristic: u32,
    path_from: Option<CellIndex>,
}

impl SearchNode {
    fn priority(&self) -> usize {
        self.distance.saturating_add(self.heuristic) as usize
    }
}

/// Reusable search state indexed like the grid arena.
///
/// Each search advances the phase by two. A node whose phase equals the
/// current phase sits in the frontier, a node one past it has been settled
/// and anything older is left over from a previous search. This avoids
/// resetting every node between searches; the phase counter overflows after
/// roughly two billion searches.
#[derive(Clone, Debug, Default)]
pub(crate) struct GridSearch {
    phase: u32,
    nodes: Vec<SearchNode>,
    frontier: BucketQueue,
}

impl GridSearch {
    pub(crate) fn with_capacity(cell_count: usize) -> Self {
        let mut search = Self::default();
        search.reset(cell_count);
        search
    }

    /// Discards every node, for use after the grid is rebuilt.
    pub(crate) fn reset(&mut self, cell_count: usize) {
        self.phase = 0;
        self.nodes = vec![SearchNode::default(); cell_count];
        self.frontier.clear();
    }

    /// Runs an A* search and reports whether `to` is reachable from `from`.
    ///
    /// Distances are quantized to the unit's speed: a move that would end in
    /// a later turn than it started costs the full remainder of the turn.
    pub(crate) fn find_path<C>(
        &mut self,
        cells: &[TerrainCell],
        from: CellIndex,
        to: CellIndex,
        cost: &C,
        wrapping: Wrapping,
    ) -> bool
    where
        C: MovementCost + ?Sized,
    {
        self.begin(cells.len());

        let speed = cost.movement_speed();
        let destination = cells[to.index()].coordinates();
        let heuristic =
            |cell: CellIndex| cells[cell.index()].coordinates().wrapped_distance_to(destination, wrapping);
        self.open(from, heuristic(from));

        while let Some(current) = self.frontier.dequeue() {
            self.settle(current);
            if current == to {
                return true;
            }

            let current_distance = self.nodes[current.index()].distance;
            let cell = &cells[current.index()];
            for direction in HexDirection::ALL {
                let Some(neighbor) = cell.neighbor(direction) else {
                    continue;
                };
                if self.is_settled(neighbor) {
                    continue;
                }
                let Some(move_cost) = cost
                    .edge_cost(cell, &cells[neighbor.index()], direction)
                    .filter(|move_cost| *move_cost <= MAX_EDGE_COST)
                else {
                    continue;
                };

                let distance = quantized_distance(current_distance, move_cost, speed);
                self.relax(neighbor, current, distance, || heuristic(neighbor));
            }
        }

        false
    }

    /// Collects every cell within `range` steps of `origin` in settle order.
    pub(crate) fn visible_cells(
        &mut self,
        cells: &[TerrainCell],
        origin: CellIndex,
        range: u32,
    ) -> Vec<CellIndex> {
        self.begin(cells.len());
        self.open(origin, 0);

        let mut visible = Vec::new();
        while let Some(current) = self.frontier.dequeue() {
            self.settle(current);
            visible.push(current);

            let distance = self.nodes[current.index()].distance + 1;
            if distance > range {
                continue;
            }

            for direction in HexDirection::ALL {
                let Some(neighbor) = cells[current.index()].neighbor(direction) else {
                    continue;
                };
                if self.is_settled(neighbor) {
                    continue;
                }
                self.relax(neighbor, current, distance, || 0);
            }
        }

        visible
    }

    /// Accumulated distance recorded for a cell by the latest search.
    pub(crate) fn distance(&self, cell: CellIndex) -> u32 {
        self.nodes[cell.index()].distance
    }

    /// Follows back-pointers from `to` to `from`, returning the cells in
    /// travel order.
    pub(crate) fn trace(&self, from: CellIndex, to: CellIndex) -> Option<Vec<CellIndex>> {
        let mut path = vec![to];
        let mut current = to;
        while current != from {
            current = self.nodes[current.index()].path_from?;
            path.push(current);
            if path.len() > self.nodes.len() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    fn begin(&mut self, cell_count: usize) {
        debug_assert_eq!(self.nodes.len(), cell_count, "search state out of sync with the grid");
        self.phase += 2;
        self.frontier.clear();
    }

    fn open(&mut self, cell: CellIndex, heuristic: u32) {
        let node = &mut self.nodes[cell.index()];
        *node = SearchNode {
            phase: self.phase,
            distance: 0,
            heuristic,
            path_from: None,
        };
        self.frontier.enqueue(cell, node.priority());
    }

    fn relax<H>(&mut self, cell: CellIndex, from: CellIndex, distance: u32, heuristic: H)
    where
        H: FnOnce() -> u32,
    {
        let node = &mut self.nodes[cell.index()];
        if node.phase < self.phase {
            *node = SearchNode {
                phase: self.phase,
                distance,
                heuristic: heuristic(),
                path_from: Some(from),
            };
            self.frontier.enqueue(cell, node.priority());
        } else if distance < node.distance {
            let old_priority = node.priority();
            node.distance = distance;
            node.path_from = Some(from);
            self.frontier.change(cell, old_priority, node.priority());
        }
    }

    fn settle(&mut self, cell: CellIndex) {
        self.nodes[cell.index()].phase += 1;
    }

    fn is_settled(&self, cell: CellIndex) -> bool {
        self.nodes[cell.index()].phase > self.phase
    }
}

/// Distance after paying `move_cost` from `current_distance`.
///
/// When the move would finish in a later turn than the unit is currently in,
/// the unit waits out the rest of its turn and starts the move fresh.
pub(crate) fn quantized_distance(current_distance: u32, move_cost: u32, speed: u32) -> u32 {
    let distance = current_distance.saturating_add(move_cost);
    let turn = turn_for(distance, speed);
    if turn > turn_for(current_distance, speed) {
        turn.saturating_mul(speed.max(1)).saturating_add(move_cost)
    } else {
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{query, HexGrid};
    use hexmap_core::GridConfig;

    struct Flat;

    impl MovementCost for Flat {
        fn movement_speed(&self) -> u32 {
            1_000
        }

        fn edge_cost(&self, _: &TerrainCell, _: &TerrainCell, _: HexDirection) -> Option<u32> {
            Some(5)
        }
    }

    fn grid() -> HexGrid {
        HexGrid::new(GridConfig::new(6, 6).with_chunk_size(3, 3)).expect("chunk aligned grid")
    }

    fn offset(grid: &HexGrid, column: i32, row: i32) -> CellIndex {
        query::cell_at_offset(grid, column, row)
            .expect("cell inside grid")
            .index()
    }

    #[test]
    fn move_straddling_a_turn_starts_at_the_next_turn() {
        assert_eq!(quantized_distance(4, 3, 5), 8);
        assert_eq!(quantized_distance(0, 3, 5), 3);
        assert_eq!(quantized_distance(2, 3, 5), 5);
        assert_eq!(quantized_distance(5, 3, 5), 8);
    }

    #[test]
    fn quantized_distance_saturates() {
        assert_eq!(quantized_distance(u32::MAX - 1, 5, 1_000), u32::MAX);
        assert_eq!(quantized_distance(7, u32::MAX, 0), u32::MAX);
    }

    struct Toll {
        blocked: CellIndex,
    }

    impl MovementCost for Toll {
        fn movement_speed(&self) -> u32 {
            24
        }

        fn edge_cost(&self, _: &TerrainCell, to: &TerrainCell, _: HexDirection) -> Option<u32> {
            if to.index() == self.blocked {
                Some(u32::MAX)
            } else {
                Some(5)
            }
        }
    }

    #[test]
    fn edges_above_the_cost_limit_are_impassable() {
        let grid = grid();
        let mut search = GridSearch::with_capacity(grid.cells.len());
        let from = offset(&grid, 0, 0);
        let to = offset(&grid, 2, 0);
        let toll = Toll {
            blocked: offset(&grid, 1, 0),
        };

        assert!(search.find_path(&grid.cells, from, to, &toll, Wrapping::Disabled));
        let path = search.trace(from, to).expect("path");
        assert!(!path.contains(&toll.blocked));
        assert!(search.distance(to) < 1_000);

        assert!(!search.find_path(&grid.cells, from, toll.blocked, &toll, Wrapping::Disabled));
    }

    #[test]
    fn flood_covers_cells_within_range() {
        let grid = grid();
        let mut search = GridSearch::with_capacity(grid.cells.len());
        let center = offset(&grid, 2, 2);

        assert_eq!(search.visible_cells(&grid.cells, center, 0), vec![center]);
        assert_eq!(search.visible_cells(&grid.cells, center, 1).len(), 7);
        assert_eq!(search.visible_cells(&grid.cells, center, 2).len(), 19);
    }

    #[test]
    fn flood_stops_at_the_border() {
        let grid = grid();
        let mut search = GridSearch::with_capacity(grid.cells.len());
        let corner = offset(&grid, 0, 0);

        let visible = search.visible_cells(&grid.cells, corner, 1);
        assert_eq!(visible.len(), 3);
        assert_eq!(visible[0], corner);
    }

    #[test]
    fn repeated_searches_reuse_state() {
        let grid = grid();
        let mut search = GridSearch::with_capacity(grid.cells.len());
        let from = offset(&grid, 0, 0);
        let to = offset(&grid, 5, 5);

        assert!(search.find_path(&grid.cells, from, to, &Flat, Wrapping::Disabled));
        let first = search.trace(from, to);
        assert!(search.find_path(&grid.cells, from, to, &Flat, Wrapping::Disabled));
        assert_eq!(search.trace(from, to), first);
        assert_eq!(search.distance(to), 40);
    }
}
