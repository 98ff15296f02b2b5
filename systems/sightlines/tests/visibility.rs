use hexmap_core::{CellIndex, Command, Event, GridConfig, ObserverId};
use hexmap_system_sightlines::{Sightlines, DEFAULT_VISION_RANGE};
use hexmap_world::{apply, query, HexGrid};

fn grid() -> HexGrid {
    HexGrid::new(GridConfig::new(10, 10)).expect("aligned grid")
}

fn offset(grid: &HexGrid, column: i32, row: i32) -> CellIndex {
    query::cell_at_offset(grid, column, row)
        .expect("cell inside grid")
        .index()
}

fn pump(grid: &mut HexGrid, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        apply(grid, command, &mut events);
    }
    events
}

fn visible_count(grid: &HexGrid) -> usize {
    query::cells(grid)
        .iter()
        .filter(|cell| cell.is_visible())
        .count()
}

#[test]
fn observers_reveal_cells_within_range() {
    let mut grid = grid();
    let mut sightlines = Sightlines::new();
    let mut commands = Vec::new();
    let center = offset(&grid, 5, 5);

    sightlines.place(ObserverId::new(1), center, DEFAULT_VISION_RANGE, &mut commands);
    let events = pump(&mut grid, commands);

    assert_eq!(visible_count(&grid), 37);
    assert_eq!(events.len(), 37);
    let expected = query::visible_cells(&grid, center, DEFAULT_VISION_RANGE).expect("origin");
    for cell in expected {
        assert!(query::cell(&grid, cell).expect("cell").is_visible());
    }
}

#[test]
fn moving_an_observer_keeps_counters_balanced() {
    let mut grid = grid();
    let mut sightlines = Sightlines::new();
    let first = ObserverId::new(1);
    let second = ObserverId::new(2);
    let mut commands = Vec::new();

    sightlines.place(first, offset(&grid, 2, 2), 2, &mut commands);
    sightlines.place(second, offset(&grid, 3, 2), 2, &mut commands);
    let _ = pump(&mut grid, std::mem::take(&mut commands));
    assert_eq!(
        query::cell(&grid, offset(&grid, 2, 2))
            .expect("cell")
            .visibility(),
        2
    );

    assert!(sightlines.relocate(first, offset(&grid, 7, 7), &mut commands));
    let _ = pump(&mut grid, std::mem::take(&mut commands));
    assert_eq!(
        query::cell(&grid, offset(&grid, 2, 2))
            .expect("cell")
            .visibility(),
        1
    );

    assert!(sightlines.remove(first, &mut commands));
    assert!(sightlines.remove(second, &mut commands));
    let _ = pump(&mut grid, commands);

    assert_eq!(visible_count(&grid), 0);
    assert!(query::cell(&grid, offset(&grid, 7, 7))
        .expect("cell")
        .is_explored());
    assert!(!query::cell(&grid, offset(&grid, 0, 9))
        .expect("cell")
        .is_explored());
}

#[test]
fn resizing_forgets_observers() {
    let mut grid = grid();
    let mut sightlines = Sightlines::new();
    let mut commands = Vec::new();
    sightlines.place(ObserverId::new(1), offset(&grid, 5, 5), 1, &mut commands);
    let _ = pump(&mut grid, commands);

    let events = pump(
        &mut grid,
        vec![Command::Resize {
            width: 15,
            height: 10,
        }],
    );
    let mut commands = Vec::new();
    sightlines.handle(&events, &mut commands);

    assert!(commands.is_empty());
    assert_eq!(sightlines.iter().count(), 0);
    assert_eq!(visible_count(&grid), 0);
}

#[test]
fn loading_a_map_clears_stale_visibility() {
    let mut grid = grid();
    let mut sightlines = Sightlines::new();
    let mut commands = Vec::new();
    sightlines.place(ObserverId::new(1), offset(&grid, 5, 5), 2, &mut commands);
    let _ = pump(&mut grid, commands);

    let record = query::grid_record(&grid);
    let events = pump(&mut grid, vec![Command::LoadGrid { record }]);
    let mut commands = Vec::new();
    sightlines.handle(&events, &mut commands);
    let _ = pump(&mut grid, commands);

    assert_eq!(visible_count(&grid), 0);
    assert!(query::cell(&grid, offset(&grid, 5, 5))
        .expect("cell")
        .is_explored());
}
