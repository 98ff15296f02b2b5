use hexmap_core::{CellIndex, Command, EditRejection, Event, GridConfig, HexDirection};
use hexmap_world::{apply, query, HexGrid, TerrainCell};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn grid() -> HexGrid {
    HexGrid::new(GridConfig::new(6, 6).with_chunk_size(3, 3)).expect("aligned grid")
}

fn offset(grid: &HexGrid, column: i32, row: i32) -> CellIndex {
    query::cell_at_offset(grid, column, row)
        .expect("cell inside grid")
        .index()
}

fn cell(grid: &HexGrid, index: CellIndex) -> &TerrainCell {
    query::cell(grid, index).expect("cell inside grid")
}

fn run(grid: &mut HexGrid, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    apply(grid, command, &mut events);
    events
}

fn rejection(events: &[Event]) -> Option<EditRejection> {
    events.iter().find_map(|event| match event {
        Event::EditRejected { reason, .. } => Some(*reason),
        _ => None,
    })
}

fn assert_edges_consistent(grid: &HexGrid) {
    for cell in query::cells(grid) {
        for direction in HexDirection::ALL {
            let Some(neighbor) = query::neighbor(grid, cell.index(), direction) else {
                assert!(!cell.has_road_through_edge(direction));
                assert!(!cell.has_river_through_edge(direction));
                continue;
            };
            let opposite = direction.opposite();

            assert_eq!(
                cell.has_road_through_edge(direction),
                neighbor.has_road_through_edge(opposite)
            );
            if cell.has_road_through_edge(direction) {
                assert!(cell.elevation_difference(neighbor) <= 1);
            }
            assert_eq!(
                cell.outgoing_river() == Some(direction),
                neighbor.incoming_river() == Some(opposite)
            );
            if cell.outgoing_river() == Some(direction) {
                assert!(
                    cell.elevation() >= neighbor.elevation()
                        || cell.water_level() == neighbor.elevation(),
                    "river flows uphill out of {:?}",
                    cell.index()
                );
            }
        }
        assert!(!(cell.is_special() && cell.has_river()));
        assert!(!(cell.is_special() && cell.has_roads()));
    }
}

#[test]
fn roads_mirror_on_both_sides() {
    let mut grid = grid();
    let from = offset(&grid, 2, 2);
    let events = run(
        &mut grid,
        Command::AddRoad {
            cell: from,
            direction: HexDirection::East,
        },
    );
    assert_eq!(rejection(&events), None);

    let to = offset(&grid, 3, 2);
    assert!(cell(&grid, from).has_road_through_edge(HexDirection::East));
    assert!(cell(&grid, to).has_road_through_edge(HexDirection::West));
    assert_edges_consistent(&grid);

    let _ = run(&mut grid, Command::RemoveRoads { cell: to });
    assert!(!cell(&grid, from).has_roads());
    assert!(!cell(&grid, to).has_roads());
}

#[test]
fn roads_cannot_leave_the_map() {
    let mut grid = grid();
    let corner = offset(&grid, 0, 0);
    let events = run(
        &mut grid,
        Command::AddRoad {
            cell: corner,
            direction: HexDirection::West,
        },
    );
    assert_eq!(rejection(&events), Some(EditRejection::MissingNeighbor));
}

#[test]
fn roads_refuse_steep_edges_and_specials() {
    let mut grid = grid();
    let from = offset(&grid, 2, 2);
    let east = offset(&grid, 3, 2);
    let west = offset(&grid, 1, 2);

    let _ = run(&mut grid, Command::SetElevation { cell: east, elevation: 2 });
    let events = run(
        &mut grid,
        Command::AddRoad {
            cell: from,
            direction: HexDirection::East,
        },
    );
    assert_eq!(rejection(&events), Some(EditRejection::ElevationGap));

    let _ = run(
        &mut grid,
        Command::SetSpecialIndex {
            cell: west,
            special_index: 1,
        },
    );
    let events = run(
        &mut grid,
        Command::AddRoad {
            cell: from,
            direction: HexDirection::West,
        },
    );
    assert_eq!(rejection(&events), Some(EditRejection::SpecialFeature));
    assert!(!cell(&grid, from).has_roads());
}

#[test]
fn raising_a_cell_removes_roads_that_become_too_steep() {
    let mut grid = grid();
    let from = offset(&grid, 2, 2);
    let to = offset(&grid, 3, 2);
    let _ = run(
        &mut grid,
        Command::AddRoad {
            cell: from,
            direction: HexDirection::East,
        },
    );

    let _ = run(&mut grid, Command::SetElevation { cell: to, elevation: 1 });
    assert!(cell(&grid, from).has_road_through_edge(HexDirection::East));

    let _ = run(&mut grid, Command::SetElevation { cell: to, elevation: 2 });
    assert!(!cell(&grid, from).has_roads());
    assert!(!cell(&grid, to).has_roads());
    assert_edges_consistent(&grid);
}

#[test]
fn rivers_link_source_and_destination() {
    let mut grid = grid();
    let source = offset(&grid, 2, 2);
    let destination = offset(&grid, 3, 2);
    let _ = run(
        &mut grid,
        Command::SetSpecialIndex {
            cell: destination,
            special_index: 2,
        },
    );

    let events = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: source,
            direction: HexDirection::East,
        },
    );
    assert_eq!(rejection(&events), None);
    assert_eq!(cell(&grid, source).outgoing_river(), Some(HexDirection::East));
    assert_eq!(
        cell(&grid, destination).incoming_river(),
        Some(HexDirection::West)
    );
    assert!(!cell(&grid, destination).is_special());
    assert_edges_consistent(&grid);

    let _ = run(&mut grid, Command::RemoveIncomingRiver { cell: destination });
    assert!(!cell(&grid, source).has_river());
    assert!(!cell(&grid, destination).has_river());
}

#[test]
fn rivers_do_not_flow_uphill() {
    let mut grid = grid();
    let source = offset(&grid, 2, 2);
    let destination = offset(&grid, 3, 2);
    let _ = run(
        &mut grid,
        Command::SetElevation {
            cell: destination,
            elevation: 1,
        },
    );

    let before = query::grid_record(&grid);
    let events = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: source,
            direction: HexDirection::East,
        },
    );
    assert_eq!(
        rejection(&events),
        Some(EditRejection::InvalidRiverDestination)
    );
    assert_eq!(query::grid_record(&grid), before);
}

#[test]
fn rivers_may_spill_from_a_lake_onto_its_shore() {
    let mut grid = grid();
    let source = offset(&grid, 2, 2);
    let destination = offset(&grid, 3, 2);
    let _ = run(
        &mut grid,
        Command::SetElevation {
            cell: destination,
            elevation: 1,
        },
    );
    let _ = run(
        &mut grid,
        Command::SetWaterLevel {
            cell: source,
            water_level: 1,
        },
    );

    let events = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: source,
            direction: HexDirection::East,
        },
    );
    assert_eq!(rejection(&events), None);
    assert_eq!(cell(&grid, source).outgoing_river(), Some(HexDirection::East));
}

#[test]
fn draining_the_lake_drops_its_spill_river() {
    let mut grid = grid();
    let source = offset(&grid, 2, 2);
    let destination = offset(&grid, 3, 2);
    let _ = run(
        &mut grid,
        Command::SetElevation {
            cell: destination,
            elevation: 1,
        },
    );
    let _ = run(
        &mut grid,
        Command::SetWaterLevel {
            cell: source,
            water_level: 1,
        },
    );
    let _ = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: source,
            direction: HexDirection::East,
        },
    );
    assert_eq!(cell(&grid, destination).incoming_river(), Some(HexDirection::West));

    let events = run(
        &mut grid,
        Command::SetWaterLevel {
            cell: source,
            water_level: 0,
        },
    );
    assert_eq!(rejection(&events), None);
    assert_eq!(cell(&grid, source).outgoing_river(), None);
    assert_eq!(cell(&grid, destination).incoming_river(), None);
    assert_edges_consistent(&grid);
}

#[test]
fn rivers_replace_roads_and_specials() {
    let mut grid = grid();
    let source = offset(&grid, 2, 2);
    let destination = offset(&grid, 3, 2);
    let _ = run(
        &mut grid,
        Command::AddRoad {
            cell: source,
            direction: HexDirection::East,
        },
    );

    let _ = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: source,
            direction: HexDirection::East,
        },
    );
    assert!(!cell(&grid, source).has_roads());
    assert!(!cell(&grid, destination).has_roads());

    let events = run(
        &mut grid,
        Command::AddRoad {
            cell: source,
            direction: HexDirection::East,
        },
    );
    assert_eq!(rejection(&events), Some(EditRejection::RiverOnEdge));

    let events = run(
        &mut grid,
        Command::SetSpecialIndex {
            cell: destination,
            special_index: 1,
        },
    );
    assert_eq!(rejection(&events), Some(EditRejection::RiverPresent));
    assert_edges_consistent(&grid);
}

#[test]
fn a_new_river_takes_over_the_destination_inflow() {
    let mut grid = grid();
    let destination = offset(&grid, 3, 2);
    let west = offset(&grid, 2, 2);
    let east = offset(&grid, 4, 2);

    let _ = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: west,
            direction: HexDirection::East,
        },
    );
    let _ = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: east,
            direction: HexDirection::West,
        },
    );

    assert_eq!(cell(&grid, west).outgoing_river(), None);
    assert_eq!(
        cell(&grid, destination).incoming_river(),
        Some(HexDirection::East)
    );
    assert_edges_consistent(&grid);
}

#[test]
fn reversing_a_river_replaces_the_inflow() {
    let mut grid = grid();
    let a = offset(&grid, 2, 2);
    let b = offset(&grid, 3, 2);

    let _ = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: a,
            direction: HexDirection::East,
        },
    );
    let _ = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: b,
            direction: HexDirection::West,
        },
    );

    assert_eq!(cell(&grid, a).outgoing_river(), None);
    assert_eq!(cell(&grid, a).incoming_river(), Some(HexDirection::East));
    assert_eq!(cell(&grid, b).outgoing_river(), Some(HexDirection::West));
    assert_eq!(cell(&grid, b).incoming_river(), None);
    assert_edges_consistent(&grid);
}

#[test]
fn raising_the_destination_drops_the_river() {
    let mut grid = grid();
    let source = offset(&grid, 2, 2);
    let destination = offset(&grid, 3, 2);
    let _ = run(
        &mut grid,
        Command::SetOutgoingRiver {
            cell: source,
            direction: HexDirection::East,
        },
    );

    let _ = run(
        &mut grid,
        Command::SetElevation {
            cell: destination,
            elevation: 1,
        },
    );
    assert!(!cell(&grid, source).has_river());
    assert!(!cell(&grid, destination).has_river());
}

#[test]
fn special_features_clear_roads() {
    let mut grid = grid();
    let target = offset(&grid, 2, 2);
    let _ = run(
        &mut grid,
        Command::AddRoad {
            cell: target,
            direction: HexDirection::NorthEast,
        },
    );
    let _ = run(
        &mut grid,
        Command::AddRoad {
            cell: target,
            direction: HexDirection::SouthWest,
        },
    );

    let _ = run(
        &mut grid,
        Command::SetSpecialIndex {
            cell: target,
            special_index: 3,
        },
    );
    assert!(cell(&grid, target).is_special());
    assert!(!cell(&grid, target).has_roads());
    assert_edges_consistent(&grid);
}

#[test]
fn arbitrary_edit_sequences_keep_edges_consistent() {
    let mut grid = grid();
    let mut rng = ChaCha8Rng::seed_from_u64(0x9e37_79b9_7f4a_7c15);

    for _ in 0..2_000 {
        let cell = CellIndex::new(rng.gen_range(0..36));
        let direction = HexDirection::ALL[rng.gen_range(0..6)];
        let command = match rng.gen_range(0..7) {
            0 => Command::SetElevation {
                cell,
                elevation: rng.gen_range(0..4),
            },
            1 => Command::SetWaterLevel {
                cell,
                water_level: rng.gen_range(0..3),
            },
            2 => Command::SetOutgoingRiver { cell, direction },
            3 => Command::AddRoad { cell, direction },
            4 => Command::SetSpecialIndex {
                cell,
                special_index: rng.gen_range(0..3),
            },
            5 => Command::RemoveRiver { cell },
            _ => Command::RemoveRoads { cell },
        };
        let _ = run(&mut grid, command);
        assert_edges_consistent(&grid);
    }
}
