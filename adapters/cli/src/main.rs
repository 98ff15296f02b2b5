#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that creates hexmap files and answers movement and
//! visibility queries about them.

mod map_io;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use hexmap_core::{
    format::MapFile, AxialCoordinate, CellIndex, GridConfig, HexDirection, ObserverId,
};
use hexmap_system_movement::{UnitMovement, DEFAULT_SPEED};
use hexmap_system_sightlines::{Sightlines, DEFAULT_VISION_RANGE};
use hexmap_world::{apply, query, HexGrid, TerrainCell};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hexmap", about = "Create and query hex terrain maps")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Write a blank, flat map
    New {
        /// Number of offset columns
        #[arg(long)]
        width: u32,
        /// Number of offset rows
        #[arg(long)]
        height: u32,
        #[command(flatten)]
        layout: LayoutArgs,
        /// Destination file
        output: PathBuf,
    },
    /// Summarize the contents of a map
    Inspect {
        /// Map file to read
        map: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Find the cheapest route between two cells
    Path {
        /// Map file to read
        map: PathBuf,
        /// Starting cell as `column,row`
        #[arg(long, value_parser = parse_offset)]
        from: Offset,
        /// Destination cell as `column,row`
        #[arg(long, value_parser = parse_offset)]
        to: Offset,
        /// Movement points per turn
        #[arg(long, default_value_t = DEFAULT_SPEED)]
        speed: u32,
        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// List the cells an observer can see
    Visible {
        /// Map file to read
        map: PathBuf,
        /// Observer cell as `column,row`
        #[arg(long, value_parser = parse_offset)]
        from: Offset,
        /// Number of steps the observer can see
        #[arg(long, default_value_t = DEFAULT_VISION_RANGE)]
        range: u32,
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Debug, Args)]
struct LayoutArgs {
    /// Columns per render chunk
    #[arg(long, default_value_t = GridConfig::DEFAULT_CHUNK_WIDTH)]
    chunk_width: u32,
    /// Rows per render chunk
    #[arg(long, default_value_t = GridConfig::DEFAULT_CHUNK_HEIGHT)]
    chunk_height: u32,
    /// Wrap the east border around to the west border
    #[arg(long)]
    wrap: bool,
}

impl LayoutArgs {
    fn config(&self, width: u32, height: u32) -> GridConfig {
        GridConfig::new(width, height)
            .with_chunk_size(self.chunk_width, self.chunk_height)
            .with_wrapping(self.wrap)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Offset {
    column: i32,
    row: i32,
}

fn parse_offset(value: &str) -> Result<Offset, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, found `{value}`"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<i32>()
            .map_err(|error| format!("invalid coordinate `{part}`: {error}"))
    };
    Ok(Offset {
        column: parse(column)?,
        row: parse(row)?,
    })
}

/// Entry point for the hexmap command-line interface.
fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        CliCommand::New {
            width,
            height,
            layout,
            output,
        } => {
            let map = map_io::blank_map(layout.config(width, height))?;
            map_io::write_map_file(&output, &map)
        }
        CliCommand::Inspect { map, layout } => {
            let file = map_io::read_map_file(&map)?;
            let grid = map_io::load_grid(&file, layout.config(0, 0))?;
            print!("{}", summarize(&grid, &file));
            Ok(())
        }
        CliCommand::Path {
            map,
            from,
            to,
            speed,
            layout,
        } => {
            let file = map_io::read_map_file(&map)?;
            let mut grid = map_io::load_grid(&file, layout.config(0, 0))?;
            let from = locate(&grid, from)?;
            let to = locate(&grid, to)?;

            match UnitMovement::new(speed).plan_route(&mut grid, from, to) {
                Some(steps) => {
                    for step in steps {
                        let cell = query::cell(&grid, step.cell).context("path left the grid")?;
                        println!(
                            "{} turn {} distance {}",
                            describe(cell),
                            step.turn,
                            step.distance
                        );
                    }
                }
                None => println!("no path"),
            }
            Ok(())
        }
        CliCommand::Visible {
            map,
            from,
            range,
            layout,
        } => {
            let file = map_io::read_map_file(&map)?;
            let mut grid = map_io::load_grid(&file, layout.config(0, 0))?;
            let origin = locate(&grid, from)?;

            for cell in observe(&mut grid, origin, range) {
                println!("{}", describe(cell));
            }
            Ok(())
        }
    }
}

fn locate(grid: &HexGrid, offset: Offset) -> Result<CellIndex> {
    query::cell_at_offset(grid, offset.column, offset.row)
        .map(TerrainCell::index)
        .with_context(|| format!("cell {},{} lies outside the map", offset.column, offset.row))
}

fn observe(grid: &mut HexGrid, origin: CellIndex, range: u32) -> Vec<&TerrainCell> {
    let mut sightlines = Sightlines::new();
    let mut commands = Vec::new();
    sightlines.place(ObserverId::new(0), origin, range, &mut commands);

    let mut events = Vec::new();
    for command in commands {
        apply(grid, command, &mut events);
    }

    query::cells(grid)
        .iter()
        .filter(|cell| cell.is_visible())
        .collect()
}

fn describe(cell: &TerrainCell) -> String {
    let coordinates: AxialCoordinate = cell.coordinates();
    format!(
        "{},{} {} elevation {}",
        coordinates.column(),
        coordinates.z(),
        coordinates,
        cell.elevation()
    )
}

fn summarize(grid: &HexGrid, file: &MapFile) -> String {
    let config = query::config(grid);
    let cells = query::cells(grid);
    let count = |predicate: fn(&TerrainCell) -> bool| cells.iter().filter(|cell| predicate(cell)).count();
    let road_edges: usize = cells
        .iter()
        .map(|cell| {
            HexDirection::ALL
                .iter()
                .filter(|direction| cell.has_road_through_edge(**direction))
                .count()
        })
        .sum::<usize>()
        / 2;

    format!(
        "version {}\n\
         size {}x{} ({} chunks)\n\
         rivers {}\n\
         roads {}\n\
         underwater {}\n\
         special {}\n\
         walled {}\n\
         explored {}\n\
         units {}\n",
        file.version,
        config.width,
        config.height,
        query::chunk_count(grid),
        count(|cell| cell.outgoing_river().is_some()),
        road_edges,
        count(TerrainCell::is_underwater),
        count(TerrainCell::is_special),
        count(TerrainCell::is_walled),
        count(TerrainCell::is_explored),
        file.units.len(),
    )
}
