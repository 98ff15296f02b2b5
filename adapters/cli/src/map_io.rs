//! Reading and writing map files for the command-line adapter.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::{bail, Context, Result};
use hexmap_core::{
    format::{self, MapFile},
    Command, Event, GridConfig,
};
use hexmap_world::{apply, query, HexGrid};
use tracing::info;

/// Decodes the map stored at `path`.
pub(crate) fn read_map_file(path: &Path) -> Result<MapFile> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let map = format::read_map(BufReader::new(file))
        .with_context(|| format!("failed to decode {}", path.display()))?;
    info!(path = %path.display(), version = map.version, "read map");
    Ok(map)
}

/// Encodes `map` into a new file at `path`, replacing any existing file.
pub(crate) fn write_map_file(path: &Path, map: &MapFile) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    format::write_map(&mut writer, map)
        .with_context(|| format!("failed to encode {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote map");
    Ok(())
}

/// Creates a blank map in the current format.
pub(crate) fn blank_map(config: GridConfig) -> Result<MapFile> {
    let grid = HexGrid::new(config)?;
    Ok(MapFile::new(query::grid_record(&grid)))
}

/// Builds a grid holding the contents of `map`.
///
/// The chunk size and wraparound of `layout` are kept; its dimensions are
/// replaced by the map's.
pub(crate) fn load_grid(map: &MapFile, layout: GridConfig) -> Result<HexGrid> {
    let config = layout.resized(map.grid.width, map.grid.height);
    let mut grid = HexGrid::new(config).context("map dimensions do not fit the chunk size")?;

    let mut events = Vec::new();
    apply(
        &mut grid,
        Command::LoadGrid {
            record: map.grid.clone(),
        },
        &mut events,
    );
    if let Some(rejection) = events
        .iter()
        .find(|event| !matches!(event, Event::MapLoaded { .. }))
    {
        bail!("map could not be loaded: {rejection:?}");
    }

    Ok(grid)
}
